//! Template parser.
//!
//! Turns a token stream into a located [`Document`]. The parser keeps an
//! explicit stack of open tags. Structural mistakes (mismatched or stray
//! closing tags, misplaced headers) are fatal [`ParseError`]s; tags still
//! open at end of input are not.
//!
//! # Unclosed tags
//!
//! A tag that is never closed is treated as empty: content that followed it
//! is reattached as its following siblings, and the tag is recorded in
//! [`Document::unclosed`]. This keeps partially written templates usable,
//! e.g. `{a}{b /}{c}` parses to three sibling tags.
//!
//! # Tags versus expressions
//!
//! `{name ...}` is a tag. A brace is an interpolation [`Expression`] when its
//! head is a path (`page.title`, `items[0]`, `user?.name`), a literal, or is
//! followed by a filter pipe (`{title | escape}`).

use crate::ast::{
    AttrValue, CmsHeader, Comment, Document, Expression, Location, Node, PlatformHeader, Tag,
    Text, UnclosedTag, format_float,
};
use crate::error::{ParseError, ParseErrorKind, TemplateResult};
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind, TokenValue};

/// Tag name of the CMS header declaration.
pub const CMS_HEADER_TAG: &str = "ikb_cms";

/// Tag name of the platform header declaration.
pub const PLATFORM_HEADER_TAG: &str = "ikb_platform";

/// Maximum number of tags that may be open at once.
///
/// Documents are walked, dropped and serialized recursively further down the
/// pipeline, so deeper input is rejected here as a [`ParseError`] rather than
/// exhausting the stack later.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Parse a token stream into a document.
pub fn parse(tokens: Vec<Token>) -> Result<Document, ParseError> {
    Parser::new(tokens).parse_document()
}

/// Tokenize and parse template text.
///
/// # Example
///
/// ```
/// use ikb_template::{Node, parse_template};
///
/// let doc = parse_template("{!-- hero --}{ikb_section type=\"hero\"}Hi{/ikb_section}").unwrap();
/// assert_eq!(doc.children.len(), 2);
/// assert!(matches!(&doc.children[1], Node::Tag(tag) if tag.name == "ikb_section"));
/// ```
pub fn parse_template(source: &str) -> TemplateResult<Document> {
    let tokens = tokenize(source)?;
    Ok(parse(tokens)?)
}

/// Result of parsing one `{...}` group at document level.
enum Brace {
    Open(Tag),
    SelfClosing(Tag),
    Close { name: String, at: Location },
    Expression(Expression),
}

/// Recursive-descent parser over a token list.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let (line, column, offset) = tokens
                .last()
                .map_or((1, 1, 0), |t| (t.line, t.column, t.offset));
            tokens.push(Token::new(TokenKind::Eof, TokenValue::None, line, column, offset));
        }
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind_at(&self, n: usize) -> TokenKind {
        let last = self.tokens.len() - 1;
        self.tokens[(self.pos + n).min(last)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(expected, &token))
        }
    }

    /// Parse the whole token stream.
    pub fn parse_document(mut self) -> Result<Document, ParseError> {
        let mut doc = Document::default();
        let mut stack: Vec<Tag> = Vec::new();
        let mut content_started = false;

        loop {
            let token = self.advance();
            let loc = location(&token);
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Text => {
                    let value = token.text().to_string();
                    if !value.trim().is_empty() {
                        content_started = true;
                    }
                    children_of(&mut doc.children, &mut stack).push(Node::Text(Text { value, loc }));
                }
                TokenKind::Comment => {
                    let value = token.text().to_string();
                    children_of(&mut doc.children, &mut stack)
                        .push(Node::Comment(Comment { value, loc }));
                }
                TokenKind::LBrace => match self.parse_brace(&token)? {
                    Brace::Open(tag) | Brace::SelfClosing(tag) if is_header(&tag.name) => {
                        let nested = !stack.is_empty();
                        attach_header(&mut doc, tag, content_started || nested)?;
                    }
                    Brace::Open(tag) => {
                        if stack.len() >= MAX_NESTING_DEPTH {
                            return Err(ParseError::new(
                                ParseErrorKind::NestingTooDeep,
                                format!("at most {} nested tags", MAX_NESTING_DEPTH),
                                format!("{{{}}}", tag.name),
                                loc.line,
                                loc.column,
                                loc.offset,
                            ));
                        }
                        content_started = true;
                        stack.push(tag);
                    }
                    Brace::SelfClosing(tag) => {
                        content_started = true;
                        children_of(&mut doc.children, &mut stack).push(Node::Tag(tag));
                    }
                    Brace::Close { name, at } => {
                        let Some(open) = stack.pop() else {
                            return Err(ParseError::new(
                                ParseErrorKind::StrayClose,
                                "an open tag",
                                format!("{{/{}}}", name),
                                at.line,
                                at.column,
                                at.offset,
                            ));
                        };
                        if open.name != name {
                            return Err(ParseError::new(
                                ParseErrorKind::MismatchedClose,
                                format!("{{/{}}}", open.name),
                                format!("{{/{}}}", name),
                                at.line,
                                at.column,
                                at.offset,
                            ));
                        }
                        children_of(&mut doc.children, &mut stack).push(Node::Tag(open));
                    }
                    Brace::Expression(expr) => {
                        content_started = true;
                        children_of(&mut doc.children, &mut stack).push(Node::Expression(expr));
                    }
                },
                _ => return Err(unexpected("text or '{'", &token)),
            }
        }

        // Innermost first, so hoisted content lands in the right parent
        while let Some(mut tag) = stack.pop() {
            tracing::debug!(tag = %tag.name, line = tag.loc.line, "tag not closed before end of input");
            doc.unclosed.push(UnclosedTag {
                name: tag.name.clone(),
                loc: tag.loc,
            });
            let hoisted = std::mem::take(&mut tag.children);
            let parent = children_of(&mut doc.children, &mut stack);
            parent.push(Node::Tag(tag));
            parent.extend(hoisted);
        }
        doc.unclosed.reverse();

        Ok(doc)
    }

    fn parse_brace(&mut self, open: &Token) -> Result<Brace, ParseError> {
        let next = self.peek().clone();
        match next.kind {
            TokenKind::Slash => {
                self.advance();
                let name = self.expect(TokenKind::Ident, "closing tag name")?;
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(Brace::Close {
                    name: name.text().to_string(),
                    at: location(open),
                })
            }
            TokenKind::Ident => {
                if is_path(next.text()) || self.peek_kind_at(1) == TokenKind::Pipe {
                    Ok(Brace::Expression(self.parse_expression_body(open)?))
                } else {
                    self.parse_tag(open)
                }
            }
            kind if kind.is_literal() => Ok(Brace::Expression(self.parse_expression_body(open)?)),
            _ => Err(unexpected("tag name or expression", &next)),
        }
    }

    fn parse_tag(&mut self, open: &Token) -> Result<Brace, ParseError> {
        let name = self.advance();
        let mut tag = Tag::new(name.text(), location(open));

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::RBrace => return Ok(Brace::Open(tag)),
                TokenKind::Slash => {
                    self.expect(TokenKind::RBrace, "'}' after '/'")?;
                    tag.self_closing = true;
                    return Ok(Brace::SelfClosing(tag));
                }
                TokenKind::Ident => {
                    let value = if self.peek().kind == TokenKind::Equal {
                        self.advance();
                        self.parse_attr_value()?
                    } else {
                        AttrValue::Bool(true)
                    };
                    tag.attrs.insert(token.text().to_string(), value);
                }
                _ => return Err(unexpected("attribute name, '/' or '}'", &token)),
            }
        }
    }

    fn parse_attr_value(&mut self) -> Result<AttrValue, ParseError> {
        let token = self.advance();
        match (token.kind, &token.value) {
            (TokenKind::String, TokenValue::Str(s)) | (TokenKind::Ident, TokenValue::Str(s)) => {
                Ok(AttrValue::Str(s.clone()))
            }
            (TokenKind::Number, TokenValue::Int(n)) => Ok(AttrValue::Int(*n)),
            (TokenKind::Number, TokenValue::Float(n)) => Ok(AttrValue::Float(*n)),
            (TokenKind::Bool, TokenValue::Bool(b)) => Ok(AttrValue::Bool(*b)),
            (TokenKind::Null, _) => Ok(AttrValue::Null),
            (TokenKind::LBrace, _) => Ok(AttrValue::Expression(
                self.parse_expression_body(&token)?,
            )),
            _ => Err(unexpected("attribute value", &token)),
        }
    }

    /// Parse `head (| filter (:arg (,arg)*)?)* }` after the opening brace.
    fn parse_expression_body(&mut self, open: &Token) -> Result<Expression, ParseError> {
        let head = self.advance();
        let mut raw = match head.kind {
            TokenKind::Ident => head.text().to_string(),
            kind if kind.is_literal() => render_literal(&head),
            _ => return Err(unexpected("variable path", &head)),
        };

        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Pipe => {
                    let name = self.expect(TokenKind::Ident, "filter name")?;
                    raw.push_str(" | ");
                    raw.push_str(name.text());
                    if self.peek().kind == TokenKind::Colon {
                        self.advance();
                        let mut args = vec![self.parse_filter_arg()?];
                        while self.peek().kind == TokenKind::Comma {
                            self.advance();
                            args.push(self.parse_filter_arg()?);
                        }
                        raw.push(':');
                        raw.push_str(&args.join(","));
                    }
                }
                _ => return Err(unexpected("'|' or '}'", &token)),
            }
        }

        Ok(Expression {
            raw,
            loc: location(open),
        })
    }

    /// Parse one filter argument and return its canonical spelling.
    fn parse_filter_arg(&mut self) -> Result<String, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident if self.peek().kind == TokenKind::Equal => {
                self.advance();
                let value = self.advance();
                let rendered = match value.kind {
                    TokenKind::Ident => value.text().to_string(),
                    kind if kind.is_literal() => render_literal(&value),
                    _ => return Err(unexpected("argument value", &value)),
                };
                Ok(format!("{}={}", token.text(), rendered))
            }
            TokenKind::Ident => Ok(token.text().to_string()),
            kind if kind.is_literal() => Ok(render_literal(&token)),
            _ => Err(unexpected("filter argument", &token)),
        }
    }
}

fn children_of<'a>(root: &'a mut Vec<Node>, stack: &'a mut [Tag]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(tag) => &mut tag.children,
        None => root,
    }
}

fn location(token: &Token) -> Location {
    Location::new(token.line, token.column, token.offset)
}

fn unexpected(expected: &str, found: &Token) -> ParseError {
    ParseError::new(
        ParseErrorKind::Unexpected,
        expected,
        found.describe(),
        found.line,
        found.column,
        found.offset,
    )
}

fn is_header(name: &str) -> bool {
    name == CMS_HEADER_TAG || name == PLATFORM_HEADER_TAG
}

fn is_path(head: &str) -> bool {
    head.contains(['.', '[', '?'])
}

/// Spell a literal token so the lexer reads it back as the same value.
fn render_literal(token: &Token) -> String {
    match &token.value {
        TokenValue::Str(s) => serde_json::Value::String(s.clone()).to_string(),
        TokenValue::Int(n) => n.to_string(),
        TokenValue::Float(n) => format_float(*n),
        TokenValue::Bool(b) => b.to_string(),
        TokenValue::None => "null".to_string(),
    }
}

fn attach_header(doc: &mut Document, tag: Tag, after_content: bool) -> Result<(), ParseError> {
    let loc = tag.loc;
    let err = |kind, expected: &str, found: String| {
        ParseError::new(kind, expected, found, loc.line, loc.column, loc.offset)
    };

    if after_content {
        return Err(err(
            ParseErrorKind::HeaderAfterContent,
            "header before any content",
            format!("{{{}}}", tag.name),
        ));
    }
    if !tag.self_closing {
        return Err(err(
            ParseErrorKind::HeaderNotSelfClosing,
            "self-closing header",
            format!("{{{}}}", tag.name),
        ));
    }

    if tag.name == CMS_HEADER_TAG {
        if doc.cms_header.is_some() {
            return Err(err(
                ParseErrorKind::DuplicateHeader,
                "a single CMS header",
                format!("{{{} /}}", tag.name),
            ));
        }
        doc.cms_header = Some(CmsHeader {
            cms_type: tag.attr("type").map(AttrValue::to_plain_string),
            set: split_list(tag.attr("set")),
            loc,
        });
    } else {
        if doc.platform_header.is_some() {
            return Err(err(
                ParseErrorKind::DuplicateHeader,
                "a single platform header",
                format!("{{{} /}}", tag.name),
            ));
        }
        doc.platform_header = Some(PlatformHeader {
            platform_type: tag.attr("type").map(AttrValue::to_plain_string),
            targets: split_list(tag.attr("targets")),
            version: tag.attr("version").map(AttrValue::to_plain_string),
            loc,
        });
    }
    Ok(())
}

fn split_list(value: Option<&AttrValue>) -> Vec<String> {
    value
        .map(AttrValue::to_plain_string)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use pretty_assertions::assert_eq;

    fn doc(source: &str) -> Document {
        parse_template(source).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        match parse_template(source) {
            Err(TemplateError::Parse(err)) => err,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    fn tag_at(nodes: &[Node], i: usize) -> &Tag {
        nodes[i].as_tag().unwrap()
    }

    fn names(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| match n {
                Node::Tag(t) => t.name.clone(),
                other => other.kind().to_string(),
            })
            .collect()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[test]
    fn test_sibling_order_with_unclosed_tags() {
        let d = doc("{a}{b/}{c}");
        assert_eq!(names(&d.children), vec!["a", "b", "c"]);
        let unclosed: Vec<_> = d.unclosed.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(unclosed, vec!["a", "c"]);
        assert!(tag_at(&d.children, 0).children.is_empty());
    }

    #[test]
    fn test_nesting() {
        let d = doc("{a}x{b}y{/b}{/a}z");
        assert_eq!(names(&d.children), vec!["a", "text"]);
        let a = tag_at(&d.children, 0);
        assert_eq!(names(&a.children), vec!["text", "b"]);
        let b = tag_at(&a.children, 1);
        assert_eq!(names(&b.children), vec!["text"]);
        assert!(d.is_fully_closed());
    }

    #[test]
    fn test_unclosed_inner_tag_hoists_into_parent() {
        let d = doc("{a}{b}text");
        assert_eq!(names(&d.children), vec!["a", "b", "text"]);
        let unclosed: Vec<_> = d.unclosed.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(unclosed, vec!["a", "b"]);
    }

    #[test]
    fn test_self_closing_equivalence() {
        let short = doc("{x /}");
        let long = doc("{x}{/x}");
        let (s, l) = (tag_at(&short.children, 0), tag_at(&long.children, 0));
        assert!(s.children.is_empty());
        assert!(l.children.is_empty());
        assert!(s.self_closing);
        assert!(!l.self_closing);
        assert_eq!(s.name, l.name);
        assert_eq!(s.attrs, l.attrs);
    }

    #[test]
    fn test_text_and_comments_are_siblings_without_trimming() {
        let d = doc("  {!-- c --}\n hi \n");
        assert_eq!(d.children.len(), 3);
        match &d.children[2] {
            Node::Text(t) => assert_eq!(t.value, "\n hi \n"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attribute_values() {
        let d = doc(r#"{t s="str" i=123 f=1.5 b=false z=null flag word=plain /}"#);
        let t = tag_at(&d.children, 0);
        assert_eq!(t.attr("s"), Some(&AttrValue::Str("str".to_string())));
        assert_eq!(t.attr("i"), Some(&AttrValue::Int(123)));
        assert_eq!(t.attr("f"), Some(&AttrValue::Float(1.5)));
        assert_eq!(t.attr("b"), Some(&AttrValue::Bool(false)));
        assert_eq!(t.attr("z"), Some(&AttrValue::Null));
        assert_eq!(t.attr("flag"), Some(&AttrValue::Bool(true)));
        assert_eq!(t.attr("word"), Some(&AttrValue::Str("plain".to_string())));
        let order: Vec<_> = t.attrs.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["s", "i", "f", "b", "z", "flag", "word"]);
    }

    #[test]
    fn test_expression_attribute() {
        let d = doc("{ikb_text content={post.title | esc_html} /}");
        let t = tag_at(&d.children, 0);
        match t.attr("content") {
            Some(AttrValue::Expression(e)) => {
                assert_eq!(e.raw, "post.title | esc_html");
                assert_eq!(e.loc.column, 19);
            }
            other => panic!("expected expression, got {:?}", other),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr_raw(source: &str) -> String {
        match &doc(source).children[0] {
            Node::Expression(e) => e.raw.clone(),
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_expression_detection() {
        assert_eq!(expr_raw("{title | escape}"), "title | escape");
        assert_eq!(expr_raw("{page.title}"), "page.title");
        assert_eq!(expr_raw("{user?.name}"), "user?.name");
        assert_eq!(expr_raw(r#"{"hi" | upper}"#), r#""hi" | upper"#);
        assert!(matches!(&doc("{name}").children[0], Node::Tag(_)));
    }

    #[test]
    fn test_expression_raw_is_canonical() {
        assert_eq!(
            expr_raw(r#"{ x|truncate:10, end = "..." |upper }"#),
            r#"x | truncate:10,end="..." | upper"#
        );
        assert_eq!(
            expr_raw(r#"{x | default:"a \"q\""}"#),
            r#"x | default:"a \"q\"""#
        );
        assert_eq!(expr_raw("{x | f:2.0,true,null,y}"), "x | f:2.0,true,null,y");
    }

    #[test]
    fn test_expression_requires_filter_name() {
        let err = parse_err("{x | }");
        assert_eq!(err.kind, ParseErrorKind::Unexpected);
        assert_eq!(err.expected, "filter name");
    }

    // =========================================================================
    // Structural errors
    // =========================================================================

    #[test]
    fn test_mismatched_close() {
        let err = parse_err("{a}\n  {/b}");
        assert_eq!(err.kind, ParseErrorKind::MismatchedClose);
        assert_eq!(err.expected, "{/a}");
        assert_eq!(err.found, "{/b}");
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn test_stray_close() {
        let err = parse_err("text{/a}");
        assert_eq!(err.kind, ParseErrorKind::StrayClose);
        assert_eq!(err.found, "{/a}");
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "{a}".repeat(depth), "{/a}".repeat(depth))
    }

    #[test]
    fn test_nesting_limit() {
        let deepest = doc(&nested(MAX_NESTING_DEPTH));
        assert!(deepest.is_fully_closed());
        assert_eq!(deepest.node_count(), MAX_NESTING_DEPTH);

        let err = parse_err(&nested(MAX_NESTING_DEPTH + 1));
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
        assert_eq!(err.found, "{a}");
        assert_eq!((err.line, err.column), (1, 3 * MAX_NESTING_DEPTH + 1));

        // Self-closing tags do not open a level
        let source = format!("{}{{b /}}", "{a}".repeat(MAX_NESTING_DEPTH));
        assert_eq!(doc(&source).unclosed.len(), MAX_NESTING_DEPTH);

        let err = parse_err(&"{a}".repeat(50_000));
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
    }

    #[test]
    fn test_eof_inside_tag() {
        let err = parse_err("{a x=1");
        assert_eq!(err.kind, ParseErrorKind::Unexpected);
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn test_lex_error_propagates() {
        assert!(matches!(
            parse_template("{a v=\"open"),
            Err(TemplateError::Lex(_))
        ));
    }

    // =========================================================================
    // Headers
    // =========================================================================

    #[test]
    fn test_cms_header_after_comment() {
        let d = doc(r#"{!-- comment --}{ikb_cms type="drupal" set="views, blocks" /}"#);
        let header = d.cms_header.unwrap();
        assert_eq!(header.cms_type.as_deref(), Some("drupal"));
        assert_eq!(header.set, vec!["views", "blocks"]);
        assert_eq!(names(&d.children), vec!["comment"]);
    }

    #[test]
    fn test_platform_header() {
        let d = doc("\n{ikb_platform type=\"web\" targets=\"wordpress,joomla\" version=\"1.2.0\" /}\n{x /}");
        let header = d.platform_header.unwrap();
        assert_eq!(header.platform_type.as_deref(), Some("web"));
        assert_eq!(header.targets, vec!["wordpress", "joomla"]);
        assert_eq!(header.version.as_deref(), Some("1.2.0"));
        assert_eq!(header.loc.line, 2);
        assert_eq!(names(&d.children), vec!["text", "text", "x"]);
    }

    #[test]
    fn test_both_headers() {
        let d = doc(r#"{ikb_cms type="wordpress" /}{ikb_platform type="web" /}"#);
        assert!(d.cms_header.is_some());
        assert!(d.platform_header.is_some());
    }

    #[test]
    fn test_header_after_content_rejected() {
        let err = parse_err(r#"{x /}{ikb_cms type="drupal" /}"#);
        assert_eq!(err.kind, ParseErrorKind::HeaderAfterContent);

        let err = parse_err(r#"Hello {ikb_cms type="drupal" /}"#);
        assert_eq!(err.kind, ParseErrorKind::HeaderAfterContent);
    }

    #[test]
    fn test_header_inside_tag_rejected() {
        let err = parse_err(r#"{a}{ikb_cms type="drupal" /}{/a}"#);
        assert_eq!(err.kind, ParseErrorKind::HeaderAfterContent);
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let err = parse_err(r#"{ikb_cms type="drupal" /}{ikb_cms type="joomla" /}"#);
        assert_eq!(err.kind, ParseErrorKind::DuplicateHeader);
    }

    #[test]
    fn test_header_must_self_close() {
        let err = parse_err(r#"{ikb_cms type="drupal"}"#);
        assert_eq!(err.kind, ParseErrorKind::HeaderNotSelfClosing);
    }

    #[test]
    fn test_parse_without_eof_token() {
        let mut tokens = tokenize("{a /}").unwrap();
        tokens.pop();
        let d = parse(tokens).unwrap();
        assert_eq!(names(&d.children), vec!["a"]);
    }
}
