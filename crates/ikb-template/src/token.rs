//! Token types produced by the lexer.

use serde::Serialize;
use std::fmt;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    LBrace,
    RBrace,
    Slash,
    Ident,
    String,
    Number,
    Bool,
    Null,
    Equal,
    Colon,
    Comma,
    Pipe,
    Text,
    Comment,
    Eof,
}

impl TokenKind {
    /// Short description used in parse error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Slash => "'/'",
            TokenKind::Ident => "identifier",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Bool => "boolean",
            TokenKind::Null => "null",
            TokenKind::Equal => "'='",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Pipe => "'|'",
            TokenKind::Text => "text",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of input",
        }
    }

    /// Whether a token of this kind can be an attribute or argument value.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Number | TokenKind::Bool | TokenKind::Null
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Literal payload carried by a token.
///
/// Strings are already de-escaped. Numbers keep the int/float distinction
/// from their source spelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    None,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl TokenValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A token with its start position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// 0-based byte offset
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, line: usize, column: usize, offset: usize) -> Self {
        Self {
            kind,
            value,
            line,
            column,
            offset,
        }
    }

    /// The identifier, string or text payload, or `""` for other tokens.
    pub fn text(&self) -> &str {
        self.value.as_str().unwrap_or("")
    }

    /// Human-readable rendering of this token for error messages.
    pub fn describe(&self) -> String {
        match (&self.kind, &self.value) {
            (TokenKind::Ident, TokenValue::Str(s)) => format!("identifier '{}'", s),
            (TokenKind::String, TokenValue::Str(s)) => format!("string \"{}\"", s),
            (TokenKind::Number, TokenValue::Int(n)) => format!("number {}", n),
            (TokenKind::Number, TokenValue::Float(n)) => format!("number {}", n),
            (TokenKind::Bool, TokenValue::Bool(b)) => format!("boolean {}", b),
            (kind, _) => kind.describe().to_string(),
        }
    }
}
