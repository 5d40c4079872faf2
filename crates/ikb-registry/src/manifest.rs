//! Manifest files and the catalog that selects them.
//!
//! A manifest is a JSON document declaring components, filters, platforms and
//! namespace aliases. The built-in manifests are embedded at compile time;
//! callers may add more sources (text they have already read themselves).

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::Registry;
use crate::types::{CmsType, ComponentSpec, FilterSpec, ManifestInfo, PlatformSpec, Profile};

/// Embedded built-in manifests, by name.
const BUILTIN_MANIFESTS: &[(&str, &str)] = &[
    ("core", include_str!("../manifests/core.json")),
    ("layout", include_str!("../manifests/layout.json")),
    ("content", include_str!("../manifests/content.json")),
    ("media", include_str!("../manifests/media.json")),
    ("forms", include_str!("../manifests/forms.json")),
    ("headless", include_str!("../manifests/headless.json")),
    ("wordpress", include_str!("../manifests/wordpress.json")),
    ("drupal", include_str!("../manifests/drupal.json")),
    ("joomla", include_str!("../manifests/joomla.json")),
    ("native", include_str!("../manifests/native.json")),
];

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

/// One parsed manifest file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,

    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Namespace assigned to components that do not name one
    #[serde(default)]
    pub namespace: Option<String>,

    /// Namespace alias table: `core` → `ikb_` makes `core:text` mean `ikb_text`
    #[serde(default)]
    pub namespaces: IndexMap<String, String>,

    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,

    #[serde(default)]
    pub components: IndexMap<String, ComponentSpec>,

    #[serde(default)]
    pub filters: IndexMap<String, FilterSpec>,
}

impl Manifest {
    /// Parse manifest text. `path` is only used for error messages.
    pub fn parse(path: &str, text: &str) -> RegistryResult<Self> {
        let mut manifest: Manifest =
            serde_json::from_str(text).map_err(|source| RegistryError::Manifest {
                path: path.to_string(),
                source,
            })?;

        for (name, component) in manifest.components.iter_mut() {
            if component.name.is_empty() {
                component.name = name.clone();
            }
            if component.namespace.is_none() {
                component.namespace = manifest.namespace.clone();
            }
        }
        for (name, filter) in manifest.filters.iter_mut() {
            if filter.name.is_empty() {
                filter.name = name.clone();
            }
        }
        Ok(manifest)
    }

    pub fn info(&self, path: &str) -> ManifestInfo {
        ManifestInfo {
            path: path.to_string(),
            name: self.name.clone(),
            schema_version: self.schema_version.clone(),
            components: self.components.keys().cloned().collect(),
            filters: self.filters.keys().cloned().collect(),
        }
    }
}

/// Manifest text together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSource {
    pub path: String,
    pub text: String,
}

impl ManifestSource {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Path under which a built-in manifest is reported.
pub fn builtin_path(name: &str) -> String {
    format!("manifests/{}.json", name)
}

fn builtin_source(name: &str) -> RegistryResult<ManifestSource> {
    BUILTIN_MANIFESTS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, text)| ManifestSource::new(builtin_path(name), *text))
        .ok_or_else(|| RegistryError::MissingManifest(name.to_string()))
}

/// Selects the manifests merged for a (profile, CMS) pair.
///
/// Merge order is the profile's built-in manifests, then extra sources in the
/// order they were added, then the CMS manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestCatalog {
    extra: Vec<ManifestSource>,
}

impl ManifestCatalog {
    /// Catalog with only the built-in manifests.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Add an extra manifest source.
    pub fn with_source(mut self, source: ManifestSource) -> Self {
        self.extra.push(source);
        self
    }

    pub fn add_source(&mut self, source: ManifestSource) {
        self.extra.push(source);
    }

    pub fn extra_sources(&self) -> &[ManifestSource] {
        &self.extra
    }

    /// Sources for a profile and CMS, in merge order.
    pub fn sources_for(&self, profile: Profile, cms: CmsType) -> RegistryResult<Vec<ManifestSource>> {
        let mut sources = profile
            .manifests()
            .iter()
            .map(|name| builtin_source(name))
            .collect::<RegistryResult<Vec<_>>>()?;
        sources.extend(self.extra.iter().cloned());
        sources.push(builtin_source(cms.as_str())?);
        Ok(sources)
    }

    /// Parse and merge the manifests for a profile and CMS.
    pub fn load(&self, profile: Profile, cms: CmsType) -> RegistryResult<Registry> {
        let sources = self.sources_for(profile, cms)?;
        let manifests = sources
            .iter()
            .map(|source| -> RegistryResult<(String, Manifest)> {
                Ok((source.path.clone(), Manifest::parse(&source.path, &source.text)?))
            })
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(Registry::from_manifests(profile, cms, manifests))
    }
}
