//! Compiler output handed to renderers.

use ikb_error_reporting::ValidationError;
use ikb_template::Document;
use serde::Serialize;

/// Diagnostics and timing for one compilation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompilationMetadata {
    /// Wall-clock time spent validating and normalizing, in milliseconds
    pub compilation_time_ms: f64,

    /// Findings that block rendering
    pub errors: Vec<ValidationError>,

    /// Findings reported to the author; the document still renders
    pub warnings: Vec<ValidationError>,
}

impl CompilationMetadata {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors then warnings.
    pub fn diagnostics(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// A validated document with registry defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledDocument {
    pub document: Document,
    pub metadata: CompilationMetadata,
}

impl CompiledDocument {
    /// Whether a renderer may consume this document.
    pub fn is_renderable(&self) -> bool {
        !self.metadata.has_errors()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
