//! Template lexer.
//!
//! The lexer has two modes. In text mode everything up to the next `{` is a
//! single `Text` token. A `{` switches to tag mode, where whitespace separates
//! tokens and braces nest, so an attribute value may itself be an
//! interpolation (`title={page.title | escape}`). Text mode resumes when the
//! outermost brace closes.
//!
//! Comments (`{!-- ... --}`) are recognised in text mode only and produce a
//! single `Comment` token holding the text between the delimiters.

use crate::ast::Location;
use crate::error::LexError;
use crate::token::{Token, TokenKind, TokenValue};

/// Tokenize template text. The result always ends with an `Eof` token.
///
/// # Example
///
/// ```
/// use ikb_template::{TokenKind, tokenize};
///
/// let kinds: Vec<TokenKind> = tokenize("{ikb_image /}").unwrap().iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![TokenKind::LBrace, TokenKind::Ident, TokenKind::Slash, TokenKind::RBrace, TokenKind::Eof]
/// );
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// Single-use lexer over one template.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    column: usize,
    /// One entry per open brace; `true` once a `|` was seen directly inside it
    braces: Vec<bool>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
            braces: Vec::new(),
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while self.peek().is_some() {
            if self.braces.is_empty() {
                self.lex_text_mode()?;
            } else {
                self.lex_tag_mode()?;
            }
        }

        let end = self.mark();
        self.push(TokenKind::Eof, TokenValue::None, end);
        tracing::trace!(tokens = self.tokens.len(), "tokenized template");
        Ok(self.tokens)
    }

    // ---- cursor -------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.source[self.offset()..].starts_with(prefix)
    }

    fn mark(&self) -> Location {
        Location::new(self.line, self.column, self.offset())
    }

    fn push(&mut self, kind: TokenKind, value: TokenValue, at: Location) {
        self.tokens
            .push(Token::new(kind, value, at.line, at.column, at.offset));
    }

    fn error(reason: impl Into<String>, at: Location) -> LexError {
        LexError::new(reason, at.line, at.column, at.offset)
    }

    // ---- text mode ----------------------------------------------------

    fn lex_text_mode(&mut self) -> Result<(), LexError> {
        if self.starts_with("{!--") {
            return self.lex_comment();
        }

        let start = self.mark();
        if self.peek() == Some('{') {
            self.bump();
            self.push(TokenKind::LBrace, TokenValue::None, start);
            self.braces.push(false);
            return Ok(());
        }

        let source = self.source;
        while let Some(c) = self.peek() {
            if c == '{' {
                break;
            }
            self.bump();
        }
        let text = source[start.offset..self.offset()].to_string();
        self.push(TokenKind::Text, TokenValue::Str(text), start);
        Ok(())
    }

    fn lex_comment(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        for _ in 0..4 {
            self.bump();
        }

        let source = self.source;
        let inner_start = self.offset();
        loop {
            if self.starts_with("--}") {
                let inner = source[inner_start..self.offset()].to_string();
                for _ in 0..3 {
                    self.bump();
                }
                self.push(TokenKind::Comment, TokenValue::Str(inner), start);
                return Ok(());
            }
            if self.bump().is_none() {
                return Err(Self::error("unterminated comment", start));
            }
        }
    }

    // ---- tag mode -----------------------------------------------------

    fn lex_tag_mode(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        let Some(c) = self.peek() else {
            return Ok(());
        };

        let simple = match c {
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '/' => Some(TokenKind::Slash),
            '=' => Some(TokenKind::Equal),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '|' => Some(TokenKind::Pipe),
            _ => None,
        };

        if let Some(kind) = simple {
            self.bump();
            match kind {
                TokenKind::LBrace => self.braces.push(false),
                TokenKind::RBrace => {
                    self.braces.pop();
                }
                TokenKind::Pipe => {
                    if let Some(seen_pipe) = self.braces.last_mut() {
                        *seen_pipe = true;
                    }
                }
                _ => {}
            }
            self.push(kind, TokenValue::None, start);
            return Ok(());
        }

        if c.is_whitespace() {
            self.bump();
            Ok(())
        } else if c == '"' {
            self.lex_string()
        } else if is_word_start(c) {
            self.lex_word()
        } else {
            Err(Self::error(
                format!("unexpected character '{}'", c),
                start,
            ))
        }
    }

    fn lex_string(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        self.bump();

        let mut value = String::new();
        loop {
            let escape_at = self.mark();
            match self.bump() {
                None => return Err(Self::error("unterminated string", start)),
                Some('"') => break,
                Some('\\') => {
                    let decoded = match self.bump() {
                        None => return Err(Self::error("unterminated string", start)),
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('{') => '{',
                        Some('}') => '}',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('u') => self.lex_unicode_escape(escape_at)?,
                        Some(_) => return Err(Self::error("invalid escape", escape_at)),
                    };
                    value.push(decoded);
                }
                Some(c) => value.push(c),
            }
        }

        self.push(TokenKind::String, TokenValue::Str(value), start);
        Ok(())
    }

    fn lex_unicode_escape(&mut self, escape_at: Location) -> Result<char, LexError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| Self::error("invalid escape", escape_at))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| Self::error("invalid escape", escape_at))
    }

    fn lex_word(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        let namespace_allowed = !self.braces.last().copied().unwrap_or(false);
        let mut saw_namespace = false;

        loop {
            match self.peek() {
                Some(c) if is_word_char(c) => {
                    self.bump();
                }
                Some('[') => self.lex_bracket_group()?,
                Some(':')
                    if namespace_allowed
                        && !saw_namespace
                        && self
                            .peek_at(1)
                            .is_some_and(|c| c.is_alphabetic() || c == '_') =>
                {
                    saw_namespace = true;
                    self.bump();
                }
                _ => break,
            }
        }

        let source = self.source;
        let word = &source[start.offset..self.offset()];
        let (kind, value) = classify_word(word).ok_or_else(|| {
            Self::error(format!("integer literal out of range: {}", word), start)
        })?;
        self.push(kind, value, start);
        Ok(())
    }

    /// Consume `[...]` inside a path, including quoted keys.
    fn lex_bracket_group(&mut self) -> Result<(), LexError> {
        let start = self.mark();
        self.bump();
        let mut in_string = false;
        loop {
            match self.bump() {
                None => return Err(Self::error("unterminated '['", start)),
                Some('\\') if in_string => {
                    self.bump();
                }
                Some('"') => in_string = !in_string,
                Some(']') if !in_string => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '?')
}

/// Classify a bare word as number, keyword or identifier.
///
/// Returns `None` only for integers that do not fit in an `i64`.
fn classify_word(word: &str) -> Option<(TokenKind, TokenValue)> {
    if is_number(word) {
        if word.contains('.') {
            let n: f64 = word.parse().ok()?;
            return Some((TokenKind::Number, TokenValue::Float(n)));
        }
        let n: i64 = word.parse().ok()?;
        return Some((TokenKind::Number, TokenValue::Int(n)));
    }

    Some(match word {
        "true" => (TokenKind::Bool, TokenValue::Bool(true)),
        "false" => (TokenKind::Bool, TokenValue::Bool(false)),
        "null" => (TokenKind::Null, TokenValue::None),
        _ => (TokenKind::Ident, TokenValue::Str(word.to_string())),
    })
}

/// `-?[0-9]+(\.[0-9]+)?`
fn is_number(word: &str) -> bool {
    let unsigned = word.strip_prefix('-').unwrap_or(word);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use TokenKind::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    // =========================================================================
    // Text and comments
    // =========================================================================

    #[test]
    fn test_text_is_single_token() {
        let tokens = tokenize("Hello,\n  world!").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, Text);
        assert_eq!(tokens[0].text(), "Hello,\n  world!");
        assert_eq!(tokens[1].kind, Eof);
    }

    #[test]
    fn test_empty_input_is_eof_only() {
        assert_eq!(kinds(""), vec![Eof]);
    }

    #[test]
    fn test_comment_token() {
        let tokens = tokenize("a{!-- note {x} --}b").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Text, Comment, Text, Eof]);
        assert_eq!(tokens[1].text(), " note {x} ");
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("x\n{!-- never closed").unwrap_err();
        assert_eq!(err.reason, "unterminated comment");
        assert_eq!((err.line, err.column), (2, 1));
    }

    // =========================================================================
    // Tags
    // =========================================================================

    #[test]
    fn test_open_close_and_self_closing() {
        assert_eq!(kinds("{a}"), vec![LBrace, Ident, RBrace, Eof]);
        assert_eq!(kinds("{/a}"), vec![LBrace, Slash, Ident, RBrace, Eof]);
        assert_eq!(kinds("{a /}"), vec![LBrace, Ident, Slash, RBrace, Eof]);
    }

    #[test]
    fn test_attribute_values() {
        let tokens = tokenize(r#"{a s="x" i=12 f=1.5 n=-3 b=true z=null}"#).unwrap();
        let values: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.is_literal())
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(
            values,
            vec![
                TokenValue::Str("x".to_string()),
                TokenValue::Int(12),
                TokenValue::Float(1.5),
                TokenValue::Int(-3),
                TokenValue::Bool(true),
                TokenValue::None,
            ]
        );
        assert_eq!(tokens.iter().filter(|t| t.kind == Equal).count(), 6);
    }

    #[test]
    fn test_identifier_shapes() {
        let tokens = tokenize("{core:text}{ikb-custom-tag}{2col}").unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == Ident)
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(idents, vec!["core:text", "ikb-custom-tag", "2col"]);
    }

    #[test]
    fn test_only_one_namespace_separator() {
        assert_eq!(kinds("{a:b:c}"), vec![LBrace, Ident, Colon, Ident, RBrace, Eof]);
    }

    #[test]
    fn test_path_identifiers() {
        let tokens = tokenize(r#"{a.b[0]["k"]}{user?.name}"#).unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == Ident)
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(idents, vec![r#"a.b[0]["k"]"#, "user?.name"]);
    }

    // =========================================================================
    // Filters
    // =========================================================================

    #[test]
    fn test_filter_chain() {
        assert_eq!(
            kinds(r#"{title | truncate:10,end="..." | upper}"#),
            vec![
                LBrace, Ident, Pipe, Ident, Colon, Number, Comma, Ident, Equal, String, Pipe,
                Ident, RBrace, Eof
            ]
        );
    }

    #[test]
    fn test_colon_after_pipe_is_argument_separator() {
        assert_eq!(
            kinds("{x | date:fmt}"),
            vec![LBrace, Ident, Pipe, Ident, Colon, Ident, RBrace, Eof]
        );
    }

    #[test]
    fn test_nested_interpolation_in_attribute() {
        assert_eq!(
            kinds("{a t={x | e}}rest"),
            vec![
                LBrace, Ident, Ident, Equal, LBrace, Ident, Pipe, Ident, RBrace, RBrace, Text, Eof
            ]
        );
    }

    // =========================================================================
    // Strings
    // =========================================================================

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"{a v="q\" b\\ s\/ n\n t\t \{\} é"}"#).unwrap();
        assert_eq!(tokens[4].text(), "q\" b\\ s/ n\n t\t {} \u{e9}");
    }

    #[test]
    fn test_string_may_span_lines() {
        let tokens = tokenize("{a v=\"one\ntwo\"}{b}").unwrap();
        assert_eq!(tokens[4].text(), "one\ntwo");
        assert_eq!(tokens[6].line, 2);
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r#"{a v="bad \q"}"#).unwrap_err();
        assert_eq!(err.reason, "invalid escape");
        assert_eq!(err.column, 11);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("{a v=\"open}").unwrap_err();
        assert_eq!(err.reason, "unterminated string");
        assert_eq!((err.line, err.column, err.offset), (1, 6, 5));
    }

    // =========================================================================
    // Positions and errors
    // =========================================================================

    #[test]
    fn test_positions() {
        let tokens = tokenize("ab\n {x}").unwrap();
        assert_eq!(tokens[1].kind, LBrace);
        assert_eq!((tokens[1].line, tokens[1].column, tokens[1].offset), (2, 2, 4));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_columns_count_characters() {
        let tokens = tokenize("é{x}").unwrap();
        assert_eq!((tokens[1].column, tokens[1].offset), (2, 2));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("{a @}").unwrap_err();
        assert_eq!(err.reason, "unexpected character '@'");
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_eof_inside_tag() {
        assert_eq!(kinds("{a"), vec![LBrace, Ident, Eof]);
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = tokenize("{a n=99999999999999999999}").unwrap_err();
        assert!(err.reason.starts_with("integer literal out of range"));
    }

    #[test]
    fn test_is_number() {
        assert!(is_number("0"));
        assert!(is_number("-12"));
        assert!(is_number("3.25"));
        assert!(!is_number("3."));
        assert!(!is_number(".5"));
        assert!(!is_number("-"));
        assert!(!is_number("1.2.3"));
    }
}
