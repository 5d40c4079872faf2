//! Error types for ikb-compiler

use ikb_error_reporting::ValidationError;
use ikb_registry::RegistryError;
use ikb_template::{LexError, ParseError, TemplateError};
use thiserror::Error;

/// A failure that stops compilation.
///
/// Validation findings are never reported this way; they land in the
/// compiled document's metadata.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Template(err.into())
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Template(err.into())
    }
}

impl CompileError {
    /// The error as a located diagnostic, when it came from the template text.
    pub fn to_diagnostic(&self) -> Option<ValidationError> {
        match self {
            CompileError::Template(err) => Some(err.to_diagnostic()),
            CompileError::Registry(_) => None,
        }
    }

    /// Render for a terminal, with a source excerpt when `source` is given.
    pub fn to_text(&self, source: Option<&str>) -> String {
        match self.to_diagnostic() {
            Some(diagnostic) => diagnostic.to_text(source),
            None => format!("error: {}\n", self),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ikb_error_reporting::codes;

    #[test]
    fn test_template_errors_become_diagnostics() {
        let err: CompileError = LexError::new("unterminated string", 1, 5, 4).into();
        let diagnostic = err.to_diagnostic().unwrap();
        assert_eq!(diagnostic.code, codes::LEX_ERROR);
        assert_eq!(diagnostic.line, Some(1));
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_registry_errors_have_no_location() {
        let err: CompileError = RegistryError::UnknownCms("typo3".to_string()).into();
        assert!(err.to_diagnostic().is_none());
        assert!(err.to_text(None).starts_with("error: Registry error:"));
    }
}
