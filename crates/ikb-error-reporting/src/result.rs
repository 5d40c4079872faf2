//! Collected diagnostics.

use crate::diagnostic::{Severity, ValidationError};
use serde::{Deserialize, Serialize};

/// An ordered collection of diagnostics from one validation or compile run.
///
/// A result is valid when it holds no diagnostic of severity
/// [`Severity::Error`]; warnings never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: ValidationError) {
        self.errors.push(diagnostic);
    }

    /// Record an error diagnostic and return a handle for positioning it.
    pub fn error(&mut self, code: &str, message: impl Into<String>) -> &mut ValidationError {
        self.errors.push(ValidationError::error(code, message));
        let last = self.errors.len() - 1;
        &mut self.errors[last]
    }

    /// Record a warning diagnostic and return a handle for positioning it.
    pub fn warning(&mut self, code: &str, message: impl Into<String>) -> &mut ValidationError {
        self.errors.push(ValidationError::warning(code, message));
        let last = self.errors.len() - 1;
        &mut self.errors[last]
    }

    /// Append every diagnostic of `other`, preserving order.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Warning)
    }

    pub fn errors_only(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors_only().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors_only().next()
    }

    /// Collapse into the first error, if any.
    ///
    /// This is the bridge between the collecting validators and the
    /// first-error-wins validator variants.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self
            .errors
            .into_iter()
            .find(|e| e.severity == Severity::Error)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Fill missing snippets from the template text.
    pub fn fill_snippets(&mut self, source: &str) {
        for diag in &mut self.errors {
            diag.fill_snippet(source);
        }
    }

    /// Render every diagnostic, in order.
    pub fn to_text(&self, source: Option<&str>) -> String {
        self.errors
            .iter()
            .map(|diag| diag.to_text(source))
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "valid": self.is_valid(),
            "errors": self.errors,
        })
    }
}

impl From<ValidationError> for ValidationResult {
    fn from(diagnostic: ValidationError) -> Self {
        Self {
            errors: vec![diagnostic],
        }
    }
}

impl Extend<ValidationError> for ValidationResult {
    fn extend<T: IntoIterator<Item = ValidationError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ValidationResult {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationResult {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
