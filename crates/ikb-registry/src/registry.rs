//! The merged, immutable registry.

use indexmap::IndexMap;
use serde_json::Value;

use crate::dispatch::TagDispatch;
use crate::error::RegistryResult;
use crate::filters::{FilterArg, builtin_filter};
use crate::manifest::{Manifest, ManifestCatalog};
use crate::types::{
    CmsType, ComponentSpec, FilterSpec, ManifestInfo, PlatformCategory, PlatformSpec, Profile,
};

/// Components, filters and platforms for one (profile, CMS) pair.
///
/// A registry never changes after it is built. To pick up different
/// manifests, build a new one (see [`crate::RegistryStore::reload`]).
#[derive(Debug, Clone)]
pub struct Registry {
    profile: Profile,
    cms: CmsType,
    schema_version: String,
    components: IndexMap<String, ComponentSpec>,
    filters: IndexMap<String, FilterSpec>,
    platforms: IndexMap<String, PlatformSpec>,
    namespaces: IndexMap<String, String>,
    manifests: Vec<ManifestInfo>,
    dispatch: TagDispatch,
}

impl Registry {
    /// Load the built-in manifests for a profile and CMS.
    ///
    /// # Example
    ///
    /// ```
    /// use ikb_registry::{CmsType, Profile, Registry};
    ///
    /// let registry = Registry::load(Profile::Full, CmsType::Native).unwrap();
    /// assert_eq!(registry.get_component("core:text").unwrap().name, "ikb_text");
    /// ```
    pub fn load(profile: Profile, cms: CmsType) -> RegistryResult<Self> {
        ManifestCatalog::builtin().load(profile, cms)
    }

    /// Merge parsed manifests in order; later entries win per name.
    pub fn from_manifests(
        profile: Profile,
        cms: CmsType,
        manifests: Vec<(String, Manifest)>,
    ) -> Self {
        let mut registry = Registry {
            profile,
            cms,
            schema_version: String::new(),
            components: IndexMap::new(),
            filters: IndexMap::new(),
            platforms: IndexMap::new(),
            namespaces: IndexMap::new(),
            manifests: Vec::new(),
            dispatch: TagDispatch::default(),
        };

        for (path, manifest) in manifests {
            registry.merge(&path, manifest);
        }
        registry.dispatch = TagDispatch::from_components(registry.components.values());

        tracing::info!(
            profile = %profile,
            cms = %cms,
            manifests = registry.manifests.len(),
            components = registry.components.len(),
            filters = registry.filters.len(),
            "loaded registry"
        );
        registry
    }

    fn merge(&mut self, path: &str, manifest: Manifest) {
        if self.schema_version.is_empty() {
            self.schema_version = manifest.schema_version.clone();
        }
        self.manifests.push(manifest.info(path));

        for (ns, prefix) in manifest.namespaces {
            self.namespaces.insert(ns, prefix);
        }
        for platform in manifest.platforms {
            self.platforms.insert(platform.id.clone(), platform);
        }
        for (name, component) in manifest.components {
            if self.components.contains_key(&name) {
                tracing::debug!(component = %name, manifest = %path, "component overridden");
            }
            self.components.insert(name, component);
        }
        for (name, filter) in manifest.filters {
            if self.filters.contains_key(&name) {
                tracing::debug!(filter = %name, manifest = %path, "filter overridden");
            }
            self.filters.insert(name, filter);
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn cms(&self) -> CmsType {
        self.cms
    }

    /// Schema version of the base manifest.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    // ---- components ---------------------------------------------------

    /// Canonical name for a tag, resolving `ns:name` through the namespace table.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if let Some((key, _)) = self.components.get_key_value(name) {
            return Some(key.as_str());
        }
        let (ns, local) = name.split_once(':')?;
        let prefix = self.namespaces.get(ns)?;
        let canonical = format!("{}{}", prefix, local);
        self.components
            .get_key_value(&canonical)
            .map(|(key, _)| key.as_str())
    }

    /// Look up a component by canonical or namespaced name.
    pub fn get_component(&self, name: &str) -> Option<&ComponentSpec> {
        self.resolve_name(name)
            .and_then(|canonical| self.components.get(canonical))
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.get_component(name).is_some()
    }

    /// All components, sorted by name.
    pub fn list_components(&self) -> Vec<&ComponentSpec> {
        let mut components: Vec<_> = self.components.values().collect();
        components.sort_by(|a, b| a.name.cmp(&b.name));
        components
    }

    /// Components declared under a namespace, sorted by name.
    pub fn components_by_namespace(&self, namespace: &str) -> Vec<&ComponentSpec> {
        self.list_components()
            .into_iter()
            .filter(|c| c.namespace.as_deref() == Some(namespace))
            .collect()
    }

    /// Components of a category, sorted by name.
    pub fn components_by_category(&self, category: &str) -> Vec<&ComponentSpec> {
        self.list_components()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Namespace alias table.
    pub fn namespaces(&self) -> &IndexMap<String, String> {
        &self.namespaces
    }

    // ---- filters ------------------------------------------------------

    pub fn get_filter(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.get(name)
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// All filters, sorted by name.
    pub fn list_filters(&self) -> Vec<&FilterSpec> {
        let mut filters: Vec<_> = self.filters.values().collect();
        filters.sort_by(|a, b| a.name.cmp(&b.name));
        filters
    }

    /// Whether the named filter produces HTML-safe output.
    pub fn is_escaping_filter(&self, name: &str) -> bool {
        self.filters.get(name).is_some_and(|f| f.escaping)
    }

    /// Run a filter. Unknown filters, and filters without a built-in
    /// implementation, return the value unchanged.
    pub fn apply_filter(&self, name: &str, value: &Value, args: &[FilterArg]) -> Value {
        let Some(spec) = self.filters.get(name) else {
            tracing::trace!(filter = %name, "unknown filter passed through");
            return value.clone();
        };
        match builtin_filter(spec.implementation_name()) {
            Some(filter) => filter(value, args),
            None => value.clone(),
        }
    }

    // ---- platforms ----------------------------------------------------

    pub fn get_platform(&self, id: &str) -> Option<&PlatformSpec> {
        self.platforms.get(id)
    }

    pub fn has_platform(&self, id: &str) -> bool {
        self.platforms.contains_key(id)
    }

    /// All platforms in declaration order.
    pub fn list_platforms(&self) -> Vec<&PlatformSpec> {
        self.platforms.values().collect()
    }

    pub fn platforms_by_category(&self, category: PlatformCategory) -> Vec<&PlatformSpec> {
        self.platforms
            .values()
            .filter(|p| p.category == category)
            .collect()
    }

    // ---- manifests and dispatch ---------------------------------------

    /// Merged manifest sources, in merge order.
    pub fn loaded_manifests(&self) -> &[ManifestInfo] {
        &self.manifests
    }

    pub fn manifest_info(&self, path: &str) -> Option<&ManifestInfo> {
        self.manifests.iter().find(|m| m.path == path)
    }

    pub fn dispatch(&self) -> &TagDispatch {
        &self.dispatch
    }

    /// Render handler for a tag, accepting namespaced names.
    pub fn handler_for(&self, tag: &str) -> &str {
        let canonical = self.resolve_name(tag).unwrap_or(tag);
        self.dispatch.handler_for(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DEFAULT_HANDLER;
    use crate::manifest::ManifestSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full() -> Registry {
        Registry::load(Profile::Full, CmsType::Native).unwrap()
    }

    // =========================================================================
    // Loading and merging
    // =========================================================================

    #[test]
    fn test_profiles_select_manifests() {
        let minimal = Registry::load(Profile::Minimal, CmsType::Native).unwrap();
        assert!(minimal.has_component("ikb_text"));
        assert!(!minimal.has_component("ikb_section"));

        let headless = Registry::load(Profile::Headless, CmsType::Native).unwrap();
        assert!(headless.has_component("ikb_api_field"));
        assert!(!headless.has_component("ikb_image"));

        let full = full();
        assert!(full.has_component("ikb_section"));
        assert!(full.has_component("ikb_form"));
        assert!(!full.has_component("ikb_api_field"));
    }

    #[test]
    fn test_cms_manifest_merged_last() {
        let wp = Registry::load(Profile::Full, CmsType::WordPress).unwrap();
        let image = wp.get_component("ikb_image").unwrap();
        assert_eq!(image.handler.as_deref(), Some("wp_image"));
        assert!(image.props.contains_key("attachment_id"));
        assert_eq!(wp.handler_for("ikb_image"), "wp_image");

        let names: Vec<_> = wp.loaded_manifests().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["core", "layout", "content", "media", "forms", "wordpress"]);
    }

    #[test]
    fn test_extra_manifest_is_merged_before_cms() {
        let catalog = ManifestCatalog::builtin().with_source(ManifestSource::new(
            "themes/acme.json",
            r#"{"name": "acme", "namespace": "acme", "namespaces": {"acme": "acme_"},
                "components": {"acme_banner": {"category": "marketing", "leaf": true}},
                "filters": {"shout": {"implementation": "upper", "returnType": "string"}}}"#,
        ));
        let registry = catalog.load(Profile::Minimal, CmsType::Drupal).unwrap();

        assert!(registry.has_component("acme:banner"));
        assert_eq!(registry.components_by_namespace("acme").len(), 1);
        assert_eq!(
            registry.apply_filter("shout", &json!("hey"), &[]),
            json!("HEY")
        );

        let info = registry.manifest_info("themes/acme.json").unwrap();
        assert_eq!(info.components, vec!["acme_banner"]);
        assert_eq!(info.filters, vec!["shout"]);
        assert_eq!(
            registry.loaded_manifests().last().unwrap().path,
            "manifests/drupal.json"
        );
    }

    #[test]
    fn test_invalid_extra_manifest_fails_load() {
        let catalog = ManifestCatalog::builtin()
            .with_source(ManifestSource::new("bad.json", r#"{"components": 3}"#));
        assert!(catalog.load(Profile::Minimal, CmsType::Native).is_err());
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    #[test]
    fn test_namespaced_lookup() {
        let registry = full();
        assert_eq!(registry.get_component("core:text").unwrap().name, "ikb_text");
        assert_eq!(registry.get_component("layout:section").unwrap().name, "ikb_section");
        assert_eq!(registry.resolve_name("core:text"), Some("ikb_text"));
        assert!(registry.get_component("nope:text").is_none());
        assert!(registry.get_component("core:nope").is_none());
    }

    #[test]
    fn test_list_components_sorted() {
        let registry = full();
        let names: Vec<_> = registry.list_components().iter().map(|c| c.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.len() > 10);
    }

    #[test]
    fn test_by_namespace_and_category() {
        let registry = full();
        let media: Vec<_> = registry
            .components_by_category("media")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(media, vec!["ikb_gallery", "ikb_image", "ikb_map", "ikb_video"]);

        let core: Vec<_> = registry
            .components_by_namespace("core")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(core, vec!["ikb_container", "ikb_icon", "ikb_link", "ikb_text"]);
    }

    #[test]
    fn test_platforms() {
        let registry = full();
        assert!(registry.has_platform("web"));
        assert_eq!(
            registry.get_platform("ios").unwrap().category,
            PlatformCategory::Mobile
        );
        assert_eq!(registry.platforms_by_category(PlatformCategory::Desktop).len(), 1);
    }

    #[test]
    fn test_section_schema() {
        let registry = full();
        let section = registry.get_component("ikb_section").unwrap();
        assert_eq!(section.props["bg"].default, Some(json!("transparent")));
        assert_eq!(section.namespace.as_deref(), Some("layout"));
    }

    // =========================================================================
    // Filters and dispatch
    // =========================================================================

    #[test]
    fn test_apply_filter_dispatch() {
        let registry = full();
        assert_eq!(registry.apply_filter("e", &json!("<b>"), &[]), json!("&lt;b&gt;"));
        assert_eq!(
            registry.apply_filter("truncate", &json!("abcdef"), &[FilterArg::positional(json!(2))]),
            json!("ab...")
        );
    }

    #[test]
    fn test_apply_unknown_filter_returns_value() {
        let registry = full();
        assert_eq!(registry.apply_filter("shout", &json!("hi"), &[]), json!("hi"));
        let headless = Registry::load(Profile::Headless, CmsType::Native).unwrap();
        assert_eq!(headless.apply_filter("pluck", &json!([1]), &[]), json!([1]));
    }

    #[test]
    fn test_escaping_filters() {
        let registry = full();
        assert!(registry.is_escaping_filter("esc_html"));
        assert!(registry.is_escaping_filter("e"));
        assert!(!registry.is_escaping_filter("upper"));
        assert!(!registry.is_escaping_filter("missing"));
    }

    #[test]
    fn test_handler_for_falls_back() {
        let registry = full();
        assert_eq!(registry.handler_for("ikb_container"), "container");
        assert_eq!(registry.handler_for("core:text"), "ikb_text");
        assert_eq!(registry.handler_for("made_up_tag"), DEFAULT_HANDLER);
    }
}
