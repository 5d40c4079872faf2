//! Registry entity types.
//!
//! These are plain data deserialized from manifest files. Validation of
//! values against a [`PropSchema`] lives in the grammar crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

fn default_type() -> String {
    "any".to_string()
}

/// Schema of one component prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropSchema {
    /// Type expression: a primitive, an extended type or a union (`"string|number"`)
    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for PropSchema {
    fn default() -> Self {
        Self::of_type("any")
    }
}

impl PropSchema {
    /// An optional prop of the given type with no other constraints.
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            required: false,
            min_length: None,
            max_length: None,
            enum_values: None,
            pattern: None,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_enum(mut self, values: Vec<serde_json::Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }
}

/// Schema of one filter parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    pub name: String,

    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Platforms an entity is available on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "PlatformSetRepr", into = "PlatformSetRepr")]
pub enum PlatformSet {
    #[default]
    All,
    Only(Vec<String>),
}

impl PlatformSet {
    pub fn allows(&self, platform: &str) -> bool {
        match self {
            PlatformSet::All => true,
            PlatformSet::Only(ids) => ids.iter().any(|id| id == platform),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, PlatformSet::All)
    }
}

/// Manifest spelling: `"all"`, a single id, or a list of ids.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PlatformSetRepr {
    One(String),
    Many(Vec<String>),
}

impl From<PlatformSetRepr> for PlatformSet {
    fn from(repr: PlatformSetRepr) -> Self {
        match repr {
            PlatformSetRepr::One(id) if id == "all" => PlatformSet::All,
            PlatformSetRepr::One(id) => PlatformSet::Only(vec![id]),
            PlatformSetRepr::Many(ids) => PlatformSet::Only(ids),
        }
    }
}

impl From<PlatformSet> for PlatformSetRepr {
    fn from(set: PlatformSet) -> Self {
        match set {
            PlatformSet::All => PlatformSetRepr::One("all".to_string()),
            PlatformSet::Only(ids) => PlatformSetRepr::Many(ids),
        }
    }
}

/// A component the template language knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Canonical tag name; filled from the manifest key when omitted
    #[serde(default)]
    pub name: String,

    /// Filled from the manifest's default namespace when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub category: String,

    /// Leaf components cannot contain children
    #[serde(default, rename = "leaf", alias = "is_leaf")]
    pub is_leaf: bool,

    #[serde(default)]
    pub props: IndexMap<String, PropSchema>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "PlatformSet::is_all")]
    pub platforms: PlatformSet,

    /// Render handler name; the tag name itself when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            category: category.into(),
            is_leaf: false,
            props: IndexMap::new(),
            tags: Vec::new(),
            description: String::new(),
            platforms: PlatformSet::All,
            handler: None,
        }
    }

    pub fn leaf(mut self) -> Self {
        self.is_leaf = true;
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, schema: PropSchema) -> Self {
        self.props.insert(name.into(), schema);
        self
    }

    pub fn with_platforms(mut self, platforms: PlatformSet) -> Self {
        self.platforms = platforms;
        self
    }

    /// Names of required props, in declaration order.
    pub fn required_props(&self) -> impl Iterator<Item = &str> {
        self.props
            .iter()
            .filter(|(_, schema)| schema.required)
            .map(|(name, _)| name.as_str())
    }
}

/// A filter usable in interpolation pipes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub params: Vec<ParamSchema>,

    #[serde(default, skip_serializing_if = "PlatformSet::is_all")]
    pub platforms: PlatformSet,

    #[serde(default = "default_type")]
    pub return_type: String,

    /// Output is safe to embed in HTML
    #[serde(default)]
    pub escaping: bool,

    /// Built-in implementation to run; the filter name itself when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,

    #[serde(default)]
    pub description: String,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            platforms: PlatformSet::All,
            return_type: default_type(),
            escaping: false,
            implementation: None,
            description: String::new(),
        }
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSchema> {
        self.params.iter().filter(|p| p.required)
    }

    /// Name of the built-in implementation this filter dispatches to.
    pub fn implementation_name(&self) -> &str {
        self.implementation.as_deref().unwrap_or(&self.name)
    }
}

/// Broad class of a delivery platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformCategory {
    Web,
    Mobile,
    Desktop,
}

impl PlatformCategory {
    pub const ALL: [PlatformCategory; 3] = [
        PlatformCategory::Web,
        PlatformCategory::Mobile,
        PlatformCategory::Desktop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformCategory::Web => "web",
            PlatformCategory::Mobile => "mobile",
            PlatformCategory::Desktop => "desktop",
        }
    }
}

impl fmt::Display for PlatformCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown platform category: {}", s))
    }
}

/// A delivery platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub id: String,
    pub category: PlatformCategory,
}

/// Summary of one merged manifest source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestInfo {
    pub path: String,
    pub name: String,
    pub schema_version: String,
    /// Component names the manifest declares, in file order
    pub components: Vec<String>,
    /// Filter names the manifest declares, in file order
    pub filters: Vec<String>,
}

/// Named set of manifests loaded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Minimal,
    #[default]
    Full,
    Headless,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Minimal, Profile::Full, Profile::Headless];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Minimal => "minimal",
            Profile::Full => "full",
            Profile::Headless => "headless",
        }
    }

    /// Built-in manifest names merged for this profile, in merge order.
    pub fn manifests(&self) -> &'static [&'static str] {
        match self {
            Profile::Minimal => &["core"],
            Profile::Full => &["core", "layout", "content", "media", "forms"],
            Profile::Headless => &["core", "content", "headless"],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownProfile(s.to_string()))
    }
}

/// CMS a theme is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmsType {
    WordPress,
    Drupal,
    Joomla,
    #[default]
    Native,
}

impl CmsType {
    pub const ALL: [CmsType; 4] = [
        CmsType::WordPress,
        CmsType::Drupal,
        CmsType::Joomla,
        CmsType::Native,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CmsType::WordPress => "wordpress",
            CmsType::Drupal => "drupal",
            CmsType::Joomla => "joomla",
            CmsType::Native => "native",
        }
    }
}

impl fmt::Display for CmsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CmsType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CmsType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownCms(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_prop_schema_from_manifest_json() {
        let schema: PropSchema = serde_json::from_value(json!({
            "type": "string",
            "required": true,
            "minLength": 2,
            "enum": ["a", "b"],
            "default": "a"
        }))
        .unwrap();
        assert_eq!(schema.type_name, "string");
        assert!(schema.required);
        assert_eq!(schema.min_length, Some(2));
        assert_eq!(schema.enum_values, Some(vec![json!("a"), json!("b")]));
        assert_eq!(schema.default, Some(json!("a")));
    }

    #[test]
    fn test_prop_schema_defaults_to_any() {
        let schema: PropSchema = serde_json::from_value(json!({})).unwrap();
        assert_eq!(schema, PropSchema::default());
        assert_eq!(schema.type_name, "any");
    }

    #[test]
    fn test_platform_set_spellings() {
        let all: PlatformSet = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(all, PlatformSet::All);
        let one: PlatformSet = serde_json::from_value(json!("web")).unwrap();
        assert_eq!(one, PlatformSet::Only(vec!["web".to_string()]));
        let many: PlatformSet = serde_json::from_value(json!(["web", "ios"])).unwrap();
        assert!(many.allows("ios"));
        assert!(!many.allows("android"));
        assert!(all.allows("anything"));
    }

    #[test]
    fn test_component_leaf_spelling() {
        let spec: ComponentSpec =
            serde_json::from_value(json!({"category": "basic", "leaf": true})).unwrap();
        assert!(spec.is_leaf);
        assert_eq!(spec.platforms, PlatformSet::All);
        let spec: ComponentSpec = serde_json::from_value(json!({"is_leaf": true})).unwrap();
        assert!(spec.is_leaf);
    }

    #[test]
    fn test_required_props_in_order() {
        let spec = ComponentSpec::new("x", "basic")
            .with_prop("b", PropSchema::of_type("string").required())
            .with_prop("a", PropSchema::of_type("string"))
            .with_prop("c", PropSchema::of_type("url").required());
        assert_eq!(spec.required_props().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_profiles_and_cms_parse() {
        assert_eq!("headless".parse::<Profile>().unwrap(), Profile::Headless);
        assert!(matches!(
            "huge".parse::<Profile>(),
            Err(RegistryError::UnknownProfile(name)) if name == "huge"
        ));
        assert_eq!("wordpress".parse::<CmsType>().unwrap(), CmsType::WordPress);
        assert!("typo3".parse::<CmsType>().is_err());
        assert_eq!(Profile::Full.manifests().len(), 5);
    }

    #[test]
    fn test_filter_implementation_name() {
        let mut filter = FilterSpec::new("e");
        assert_eq!(filter.implementation_name(), "e");
        filter.implementation = Some("escape".to_string());
        assert_eq!(filter.implementation_name(), "escape");
    }
}
