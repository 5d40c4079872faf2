// Interpolation expressions: `head | filter:arg,name=value | filter`
//
// The lexer from ikb-template does the tokenizing; this module only walks the
// token stream and splits the head into a variable path.

use ikb_error_reporting::{ValidationError, codes};
use ikb_registry::FilterArg;
use ikb_template::{Token, TokenKind, TokenValue, tokenize};
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;

/// Why an expression could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Invalid expression syntax: {0}")]
    Syntax(String),

    #[error("Invalid variable path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl ExpressionError {
    pub fn code(&self) -> &'static str {
        match self {
            ExpressionError::Syntax(_) => codes::EXPRESSION_SYNTAX,
            ExpressionError::InvalidPath { .. } => codes::INVALID_VARIABLE_PATH,
        }
    }

    pub fn to_diagnostic(&self) -> ValidationError {
        ValidationError::error(self.code(), self.to_string())
    }
}

/// One step of a variable path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathSegment {
    /// `.name`
    Field {
        name: String,
        /// Followed by `?.`: evaluates to null instead of failing when missing
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        safe: bool,
    },
    /// `[0]`
    Index {
        value: i64,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        safe: bool,
    },
    /// `["key"]`
    Key {
        value: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        safe: bool,
    },
}

impl PathSegment {
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field {
            name: name.into(),
            safe: false,
        }
    }

    pub fn is_safe(&self) -> bool {
        match self {
            PathSegment::Field { safe, .. }
            | PathSegment::Index { safe, .. }
            | PathSegment::Key { safe, .. } => *safe,
        }
    }

    fn mark_safe(&mut self) {
        match self {
            PathSegment::Field { safe, .. }
            | PathSegment::Index { safe, .. }
            | PathSegment::Key { safe, .. } => *safe = true,
        }
    }
}

/// A filter argument as written. `reference` is set for bare identifiers,
/// which name a variable rather than spell a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallArg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reference: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<CallArg>,
}

impl FilterCall {
    pub fn positional_count(&self) -> usize {
        self.args.iter().filter(|a| a.name.is_none()).count()
    }

    /// Arguments in the form the registry's filter functions take.
    pub fn filter_args(&self) -> Vec<FilterArg> {
        self.args
            .iter()
            .map(|arg| FilterArg {
                name: arg.name.clone(),
                value: arg.value.clone(),
            })
            .collect()
    }
}

/// Structured form of an interpolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpression {
    /// Head as written: a variable path, or the literal's source form
    pub variable: String,
    /// Empty when the head is a literal
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<Value>,
    pub filters: Vec<FilterCall>,
    /// Whether any filter in the chain is an escaping filter
    pub has_escaping: bool,
}

/// Parse an expression, with or without its surrounding braces.
///
/// `is_escaping` decides which filter names count as escaping.
pub fn parse_expression_with(
    text: &str,
    is_escaping: impl Fn(&str) -> bool,
) -> Result<ParsedExpression, ExpressionError> {
    let trimmed = text.trim();
    let source = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        format!("{{{}}}", trimmed)
    };
    let tokens = tokenize(&source).map_err(|e| ExpressionError::Syntax(e.reason))?;
    let mut cursor = Cursor { tokens, pos: 0 };

    cursor.expect(TokenKind::LBrace)?;
    let head = cursor.bump();
    let (variable, path, literal) = match head.kind {
        TokenKind::Ident => {
            let variable = head.text().to_string();
            let path = parse_variable_path(&variable)?;
            (variable, path, None)
        }
        kind if kind.is_literal() => {
            let value = literal_value(&head);
            (value.to_string(), Vec::new(), Some(value))
        }
        _ => {
            return Err(ExpressionError::Syntax(format!(
                "expected a variable or literal, found {}",
                head.describe()
            )));
        }
    };

    let mut filters = Vec::new();
    while cursor.peek_kind() == TokenKind::Pipe {
        cursor.bump();
        let name = cursor.expect(TokenKind::Ident)?.text().to_string();
        let mut args = Vec::new();
        if cursor.peek_kind() == TokenKind::Colon {
            cursor.bump();
            loop {
                args.push(cursor.parse_arg()?);
                if cursor.peek_kind() != TokenKind::Comma {
                    break;
                }
                cursor.bump();
            }
        }
        filters.push(FilterCall { name, args });
    }

    cursor.expect(TokenKind::RBrace)?;
    cursor.expect(TokenKind::Eof)?;

    let has_escaping = filters.iter().any(|f| is_escaping(&f.name));
    Ok(ParsedExpression {
        variable,
        path,
        literal,
        filters,
        has_escaping,
    })
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, TokenValue::None, 0, 0, 0));
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ExpressionError> {
        let token = self.bump();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(ExpressionError::Syntax(format!(
                "expected {}, found {}",
                kind.describe(),
                token.describe()
            )))
        }
    }

    fn parse_arg(&mut self) -> Result<CallArg, ExpressionError> {
        let first = self.bump();
        if first.kind == TokenKind::Ident && self.peek_kind() == TokenKind::Equal {
            self.bump();
            let value = self.bump();
            let (value, reference) = arg_value(&value)?;
            return Ok(CallArg {
                name: Some(first.text().to_string()),
                value,
                reference,
            });
        }
        let (value, reference) = arg_value(&first)?;
        Ok(CallArg {
            name: None,
            value,
            reference,
        })
    }
}

fn arg_value(token: &Token) -> Result<(Value, bool), ExpressionError> {
    match token.kind {
        TokenKind::Ident => Ok((Value::String(token.text().to_string()), true)),
        kind if kind.is_literal() => Ok((literal_value(token), false)),
        _ => Err(ExpressionError::Syntax(format!(
            "expected a filter argument, found {}",
            token.describe()
        ))),
    }
}

fn literal_value(token: &Token) -> Value {
    match &token.value {
        TokenValue::Str(s) => Value::String(s.clone()),
        TokenValue::Int(n) => Value::from(*n),
        TokenValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        TokenValue::Bool(b) => Value::Bool(*b),
        TokenValue::None => Value::Null,
    }
}

/// Split a dotted path into segments.
///
/// Supports `a.b`, `a[0]`, `a["key"]`, `a['key']` and the null-safe `a?.b`,
/// which marks the segment before `?.` as safe.
pub fn parse_variable_path(path: &str) -> Result<Vec<PathSegment>, ExpressionError> {
    let invalid = |reason: String| ExpressionError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(invalid("path is empty".to_string()));
    }

    let chars: Vec<char> = path.chars().collect();
    let mut segments: Vec<PathSegment> = Vec::new();
    let mut i = 0;

    loop {
        let start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-') {
            i += 1;
        }
        if start == i {
            return Err(invalid(format!("expected a name at position {}", start)));
        }
        if chars[start].is_ascii_digit() || chars[start] == '-' {
            return Err(invalid(format!(
                "names must start with a letter or '_' (position {})",
                start
            )));
        }
        segments.push(PathSegment::field(chars[start..i].iter().collect::<String>()));

        while i < chars.len() && chars[i] == '[' {
            let (segment, next) = parse_bracket(&chars, i).map_err(&invalid)?;
            segments.push(segment);
            i = next;
        }

        if i == chars.len() {
            return Ok(segments);
        }
        if chars[i] == '?' && chars.get(i + 1) == Some(&'.') {
            if let Some(last) = segments.last_mut() {
                last.mark_safe();
            }
            i += 2;
            continue;
        }
        if chars[i] == '.' {
            i += 1;
            continue;
        }
        return Err(invalid(format!(
            "unexpected '{}' at position {}",
            chars[i], i
        )));
    }
}

/// Parse `[...]` starting at `open`; returns the segment and the index after `]`.
fn parse_bracket(chars: &[char], open: usize) -> Result<(PathSegment, usize), String> {
    let mut i = open + 1;
    let quote = chars.get(i).copied().filter(|c| *c == '"' || *c == '\'');

    let segment = if let Some(quote) = quote {
        i += 1;
        let mut key = String::new();
        loop {
            match chars.get(i) {
                None => return Err(format!("unterminated key at position {}", open)),
                Some('\\') => {
                    if let Some(c) = chars.get(i + 1) {
                        key.push(*c);
                    }
                    i += 2;
                }
                Some(c) if *c == quote => {
                    i += 1;
                    break;
                }
                Some(c) => {
                    key.push(*c);
                    i += 1;
                }
            }
        }
        PathSegment::Key {
            value: key,
            safe: false,
        }
    } else {
        let start = i;
        while i < chars.len() && chars[i] != ']' {
            i += 1;
        }
        let text: String = chars[start..i].iter().collect();
        let value = text
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid index '{}' at position {}", text, open))?;
        PathSegment::Index { value, safe: false }
    };

    if chars.get(i) != Some(&']') {
        return Err(format!("unterminated '[' at position {}", open));
    }
    Ok((segment, i + 1))
}
