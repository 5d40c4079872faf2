//! Core diagnostic types.
//!
//! A [`ValidationError`] is a single non-fatal finding produced by the grammar
//! or the compiler. Despite the name it may carry either severity; whether it
//! blocks rendering is decided by [`Severity`], not by the type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the document from reaching a renderer
    Error,
    /// Reported to the author, but the document still renders
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic with a stable code and an optional source position.
///
/// Positions are 1-based (`line`, `column`) plus a 0-based byte `offset` into
/// the template text. All positional fields are optional because diagnostics
/// can also be produced for values that never came from a template (for
/// example when validating a prop value supplied by a visual builder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable description
    pub message: String,

    /// Stable code from [`crate::codes`]
    pub code: String,

    /// Whether the finding blocks rendering
    pub severity: Severity,

    /// Kind of node the finding is about ("tag", "expression", "attribute", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_kind: Option<String>,

    /// Name of the node (tag name, attribute name, filter name, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    /// The source line the finding points at, trimmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl ValidationError {
    /// Create a diagnostic with the given severity.
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            severity,
            node_kind: None,
            node_name: None,
            line: None,
            column: None,
            offset: None,
            snippet: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Attach the kind and name of the node this finding is about.
    pub fn with_node(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.node_kind = Some(kind.into());
        self.node_name = Some(name.into());
        self
    }

    /// Attach a source position.
    pub fn at(mut self, line: usize, column: usize, offset: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self.offset = Some(offset);
        self
    }

    /// Attach a source snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Fill `snippet` from the template text if a line is known and no
    /// snippet was set yet.
    pub fn fill_snippet(&mut self, source: &str) {
        if self.snippet.is_some() {
            return;
        }
        if let Some(line) = self.line {
            if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.snippet = Some(trimmed.to_string());
                }
            }
        }
    }

    /// Render this diagnostic as text.
    ///
    /// When the template text is supplied and the diagnostic has an offset,
    /// an ariadne report with the source line is produced. Otherwise a
    /// compact single-block rendering is used:
    ///
    /// ```text
    /// error[UNKNOWN_FILTER] 3:14: Unknown filter 'shout'
    ///   | {title | shout}
    /// ```
    ///
    /// # Example
    ///
    /// ```
    /// use ikb_error_reporting::ValidationError;
    ///
    /// let diag = ValidationError::error("UNKNOWN_FILTER", "Unknown filter 'shout'").at(3, 14, 40);
    /// let text = diag.to_text(None);
    /// assert!(text.starts_with("error[UNKNOWN_FILTER] 3:14:"));
    /// ```
    pub fn to_text(&self, source: Option<&str>) -> String {
        if let (Some(source), Some(offset)) = (source, self.offset) {
            if let Some(rendered) = self.render_ariadne_source_context(source, offset) {
                return rendered;
            }
        }

        let mut result = format!("{}[{}]", self.severity, self.code);
        if let (Some(line), Some(column)) = (self.line, self.column) {
            result.push_str(&format!(" {}:{}", line, column));
        }
        result.push_str(": ");
        result.push_str(&self.message);
        result.push('\n');
        if let Some(snippet) = &self.snippet {
            result.push_str("  | ");
            result.push_str(snippet);
            result.push('\n');
        }
        result
    }

    /// Render source context using ariadne (private helper for to_text).
    fn render_ariadne_source_context(&self, source: &str, offset: usize) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        // ariadne spans count characters, not bytes
        let start = source.get(..offset)?.chars().count();
        let width = self
            .node_name
            .as_ref()
            .map_or(1, |name| name.chars().count().max(1));
        let total = source.chars().count();
        let end = (start + width).min(total).max(start);

        let (report_kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let file = "template".to_string();
        let report = Report::build(report_kind, file.clone(), start)
            .with_config(Config::default().with_color(false))
            .with_message(format!("[{}] {}", self.code, self.message))
            .with_label(
                Label::new((file.clone(), start..end))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish();

        let mut output = Vec::new();
        report
            .write((file, Source::from(source)), &mut output)
            .ok()?;
        String::from_utf8(output).ok()
    }
}
