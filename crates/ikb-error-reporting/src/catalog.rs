//! Error code catalog and lookup.
//!
//! This module provides access to the centralized error catalog, which maps
//! stable diagnostic codes (like `UNKNOWN_FILTER`) to their metadata.

use crate::diagnostic::Severity;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "filters", "components", "security")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message template (may include placeholders)
    pub message_template: String,

    /// Severity the code is reported with unless a mode overrides it
    pub default_severity: Severity,

    /// When this code was introduced (version)
    pub since_version: String,
}

/// Global error catalog, loaded lazily from JSON embedded at compile time.
///
/// # Panics
///
/// Panics if the embedded JSON is invalid. This can only happen if someone
/// edits `error_catalog.json` incorrectly.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON - this is a bug in ikb")
});

/// Look up error code information.
///
/// Returns `None` if the code is not in the catalog.
///
/// # Example
///
/// ```
/// use ikb_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("UNKNOWN_FILTER").unwrap();
/// assert_eq!(info.subsystem, "filters");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get the subsystem name for an error code.
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

/// Get the default severity for an error code.
pub fn default_severity(code: &str) -> Option<Severity> {
    ERROR_CATALOG.get(code).map(|info| info.default_severity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn test_catalog_loads() {
        assert!(!ERROR_CATALOG.is_empty());
    }

    #[test]
    fn test_every_code_is_catalogued() {
        for code in codes::ALL {
            assert!(
                get_error_info(code).is_some(),
                "code {} is missing from error_catalog.json",
                code
            );
        }
        assert_eq!(codes::ALL.len(), ERROR_CATALOG.len());
    }

    #[test]
    fn test_get_subsystem() {
        assert_eq!(get_subsystem(codes::MISSING_ESCAPING), Some("security"));
        assert_eq!(get_subsystem("NOT_A_CODE"), None);
    }

    #[test]
    fn test_default_severity() {
        assert_eq!(
            default_severity(codes::UNKNOWN_COMPONENT),
            Some(Severity::Warning)
        );
        assert_eq!(default_severity(codes::UNKNOWN_FILTER), Some(Severity::Error));
    }
}
