// Output escaping checks

use ikb_error_reporting::{Severity, ValidationError, codes};
use ikb_template::{AttrValue, Document, Expression, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::expression::ParsedExpression;

/// How an interpolation without an escaping filter is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Unescaped output is an error
    #[default]
    Strict,
    /// Unescaped output is a warning
    Lenient,
}

impl SecurityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityMode::Strict => "strict",
            SecurityMode::Lenient => "lenient",
        }
    }

    /// Severity given to unescaped output in this mode.
    pub fn severity(&self) -> Severity {
        match self {
            SecurityMode::Strict => Severity::Error,
            SecurityMode::Lenient => Severity::Warning,
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(SecurityMode::Strict),
            "lenient" => Ok(SecurityMode::Lenient),
            other => Err(format!(
                "unknown security mode '{}' (expected strict or lenient)",
                other
            )),
        }
    }
}

/// The finding for an expression whose chain has no escaping filter.
pub fn escaping_finding(
    parsed: &ParsedExpression,
    raw: &str,
    mode: SecurityMode,
) -> Option<ValidationError> {
    if parsed.has_escaping {
        return None;
    }
    Some(ValidationError::new(
        mode.severity(),
        codes::MISSING_ESCAPING,
        format!(
            "Expression '{}' is output without an escaping filter (add | escape or another escaping filter)",
            raw
        ),
    ))
}

/// Every interpolation site in document order: expression nodes and
/// expression-valued attributes.
pub fn expression_sites(doc: &Document) -> Vec<&Expression> {
    let mut sites = Vec::new();
    doc.walk(&mut |node| match node {
        Node::Expression(expr) => sites.push(expr),
        Node::Tag(tag) => {
            for value in tag.attrs.values() {
                if let AttrValue::Expression(expr) = value {
                    sites.push(expr);
                }
            }
        }
        _ => {}
    });
    sites
}
