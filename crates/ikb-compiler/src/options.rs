//! Compiler configuration.

use ikb_grammar::SecurityMode;
use ikb_registry::{CmsType, Profile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a compilation targets and how strictly it is checked.
///
/// Every field has a default, so a config file only needs to name the
/// fields it changes:
///
/// ```toml
/// cms = "wordpress"
/// platform = "web"
/// mode = "lenient"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Which built-in manifests make up the registry
    pub profile: Profile,

    /// CMS whose manifest is merged last
    pub cms: CmsType,

    /// Delivery platform id (`web`, `ios`, ...) used to gate components and
    /// filters. `None` disables platform checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    pub mode: SecurityMode,

    /// Extra manifest files. The compiler does no I/O; front ends read these
    /// and add them to the manifest catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<PathBuf>,
}

impl CompilerOptions {
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_cms(mut self, cms: CmsType) -> Self {
        self.cms = cms;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_mode(mut self, mode: SecurityMode) -> Self {
        self.mode = mode;
        self
    }
}
