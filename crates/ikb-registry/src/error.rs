//! Error types for registry loading.

use thiserror::Error;

/// Errors that can occur while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown profile: {0} (expected one of minimal, full, headless)")]
    UnknownProfile(String),

    #[error("Unknown CMS: {0} (expected one of wordpress, drupal, joomla, native)")]
    UnknownCms(String),

    #[error("Built-in manifest not found: {0}")]
    MissingManifest(String),

    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
