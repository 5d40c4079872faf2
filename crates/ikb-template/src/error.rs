//! Fatal error types for lexing and parsing.
//!
//! These errors stop the pipeline. Everything recoverable is reported later
//! as a diagnostic by the grammar and compiler instead.

use ikb_error_reporting::{ValidationError, codes};
use std::fmt;
use thiserror::Error;

/// Failure to tokenize template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at line {line}, column {column}")]
pub struct LexError {
    pub reason: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl LexError {
    pub fn new(reason: impl Into<String>, line: usize, column: usize, offset: usize) -> Self {
        Self {
            reason: reason.into(),
            line,
            column,
            offset,
        }
    }
}

/// What kind of structural problem a [`ParseError`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token that cannot appear here
    Unexpected,
    /// `{/b}` while `{a}` is the innermost open tag
    MismatchedClose,
    /// `{/a}` with no open tag
    StrayClose,
    /// Header declared after structural content or inside a tag
    HeaderAfterContent,
    /// Second header of the same kind
    DuplicateHeader,
    /// Header written as an opening tag instead of `{ikb_cms ... /}`
    HeaderNotSelfClosing,
    /// More open tags than [`crate::MAX_NESTING_DEPTH`]
    NestingTooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseErrorKind::Unexpected => "unexpected token",
            ParseErrorKind::MismatchedClose => "mismatched closing tag",
            ParseErrorKind::StrayClose => "closing tag without an open tag",
            ParseErrorKind::HeaderAfterContent => "header declared after content",
            ParseErrorKind::DuplicateHeader => "duplicate header",
            ParseErrorKind::HeaderNotSelfClosing => "header must be self-closing",
            ParseErrorKind::NestingTooDeep => "tags nested too deeply",
        };
        f.write_str(s)
    }
}

/// Failure to build a document from a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: expected {expected}, found {found} at line {line}, column {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub expected: String,
    pub found: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        expected: impl Into<String>,
        found: impl Into<String>,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Self {
        Self {
            kind,
            expected: expected.into(),
            found: found.into(),
            line,
            column,
            offset,
        }
    }
}

/// Any fatal error from turning text into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl TemplateError {
    pub fn line(&self) -> usize {
        match self {
            TemplateError::Lex(e) => e.line,
            TemplateError::Parse(e) => e.line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            TemplateError::Lex(e) => e.column,
            TemplateError::Parse(e) => e.column,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            TemplateError::Lex(e) => e.offset,
            TemplateError::Parse(e) => e.offset,
        }
    }

    /// Stable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            TemplateError::Lex(_) => codes::LEX_ERROR,
            TemplateError::Parse(_) => codes::PARSE_ERROR,
        }
    }

    /// Convert into a diagnostic so it can be rendered like any other finding.
    pub fn to_diagnostic(&self) -> ValidationError {
        let message = match self {
            TemplateError::Lex(e) => e.reason.clone(),
            TemplateError::Parse(e) => format!(
                "{}: expected {}, found {}",
                e.kind, e.expected, e.found
            ),
        };
        ValidationError::error(self.code(), message).at(self.line(), self.column(), self.offset())
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
