// Component checks: existence, required props, leaf content, prop values, platform

use ikb_error_reporting::{ValidationResult, codes};
use ikb_registry::Registry;
use ikb_template::{AttrValue, Tag};

use crate::locate;
use crate::schema::check_value;

/// Check one tag against its component definition. Children are not visited.
///
/// Unknown components are a warning, so templates may carry tags a renderer
/// handles on its own. Attributes the component does not declare are allowed.
pub fn check_component(
    registry: &Registry,
    tag: &Tag,
    platform: Option<&str>,
    result: &mut ValidationResult,
) {
    let start = result.len();
    check_component_inner(registry, tag, platform, result);
    for diagnostic in result.errors.iter_mut().skip(start) {
        if diagnostic.node_kind.is_none() {
            diagnostic.node_kind = Some("tag".to_string());
            diagnostic.node_name = Some(tag.name.clone());
        }
    }
    locate(result, start, tag.loc);
}

fn check_component_inner(
    registry: &Registry,
    tag: &Tag,
    platform: Option<&str>,
    result: &mut ValidationResult,
) {
    let Some(spec) = registry.get_component(&tag.name) else {
        result.warning(
            codes::UNKNOWN_COMPONENT,
            format!("Unknown component: {}", tag.name),
        );
        return;
    };

    if let Some(platform) = platform
        && !spec.platforms.allows(platform)
    {
        result.error(
            codes::COMPONENT_PLATFORM_INCOMPATIBLE,
            format!(
                "Component '{}' is not available on platform '{}'",
                tag.name, platform
            ),
        );
    }

    for (name, schema) in &spec.props {
        let given = tag.attr(name).filter(|v| !matches!(v, AttrValue::Null));
        if schema.required && given.is_none() {
            result.error(
                codes::MISSING_REQUIRED_PROP,
                format!("Component '{}' is missing required prop '{}'", tag.name, name),
            );
        }
    }

    if spec.is_leaf && !tag.children.is_empty() {
        result.error(
            codes::LEAF_COMPONENT_CHILDREN,
            format!(
                "Component '{}' is a leaf component and cannot have children",
                tag.name
            ),
        );
    }

    for (name, value) in &tag.attrs {
        let (Some(schema), Some(json)) = (spec.props.get(name), value.to_json()) else {
            // Undeclared attribute, or an expression only known at render time
            continue;
        };
        let mut findings = ValidationResult::new();
        let subject = format!("attribute '{}' of '{}'", name, tag.name);
        check_value(Some(&json), schema, &subject, &mut findings);
        for mut diagnostic in findings {
            if diagnostic.code == codes::REQUIRED_VALUE_MISSING {
                continue;
            }
            if diagnostic.code == codes::TYPE_MISMATCH {
                diagnostic.code = codes::INVALID_PROP_TYPE.to_string();
            }
            result.push(diagnostic.with_node("attribute", name.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikb_registry::{CmsType, ManifestCatalog, ManifestSource, Profile};
    use ikb_template::parse_template;
    use pretty_assertions::assert_eq;

    fn check(source: &str, platform: Option<&str>) -> ValidationResult {
        let registry = Registry::load(Profile::Full, CmsType::Native).unwrap();
        let doc = parse_template(source).unwrap();
        let tag = doc.children[0].as_tag().unwrap();
        let mut result = ValidationResult::new();
        check_component(&registry, tag, platform, &mut result);
        result
    }

    fn codes_of(result: &ValidationResult) -> Vec<&str> {
        result.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_valid_section() {
        let result = check(r#"{ikb_section type="hero" title="Welcome"}Hi{/ikb_section}"#, None);
        assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn test_unknown_component_is_a_warning() {
        let result = check("{made_up_thing}", None);
        assert!(!result.has_errors());
        assert_eq!(codes_of(&result), vec![codes::UNKNOWN_COMPONENT]);
        assert_eq!(result.iter().next().unwrap().message, "Unknown component: made_up_thing");
    }

    #[test]
    fn test_missing_required_prop() {
        let result = check("{ikb_image alt=\"x\" /}", None);
        assert_eq!(codes_of(&result), vec![codes::MISSING_REQUIRED_PROP]);
        let err = result.first_error().unwrap();
        assert!(err.message.contains("'src'"));
        assert_eq!(err.line, Some(1));
        assert_eq!(err.node_name.as_deref(), Some("ikb_image"));
    }

    #[test]
    fn test_required_prop_with_default_is_still_required() {
        let manifest = ManifestSource::new(
            "theme.json",
            r#"{
              "name": "theme",
              "components": {
                "theme_badge": {
                  "category": "content",
                  "props": { "label": { "type": "string", "required": true, "default": "New" } }
                }
              }
            }"#,
        );
        let registry = ManifestCatalog::builtin()
            .with_source(manifest)
            .load(Profile::Full, CmsType::Native)
            .unwrap();
        let doc = parse_template("{theme_badge /}{theme_badge label=\"Sale\" /}").unwrap();

        let mut result = ValidationResult::new();
        check_component(&registry, doc.children[0].as_tag().unwrap(), None, &mut result);
        assert_eq!(codes_of(&result), vec![codes::MISSING_REQUIRED_PROP]);
        assert!(result.first_error().unwrap().message.contains("'label'"));

        let mut result = ValidationResult::new();
        check_component(&registry, doc.children[1].as_tag().unwrap(), None, &mut result);
        assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn test_leaf_with_children() {
        let result = check(r#"{ikb_image src="/a.png"}caption{/ikb_image}"#, None);
        assert_eq!(codes_of(&result), vec![codes::LEAF_COMPONENT_CHILDREN]);
        assert!(result.first_error().unwrap().message.contains("leaf component"));

        assert!(check(r#"{ikb_image src="/a.png" /}"#, None).is_empty());
    }

    #[test]
    fn test_enum_error_names_attribute() {
        let result = check(r#"{ikb_section type="banner"}{/ikb_section}"#, None);
        assert_eq!(codes_of(&result), vec![codes::INVALID_ENUM_VALUE]);
        let err = result.first_error().unwrap();
        assert!(err.message.contains("'type'"));
        assert!(err.message.contains("hero"));
        assert_eq!(err.node_kind.as_deref(), Some("attribute"));
        assert_eq!(err.node_name.as_deref(), Some("type"));
    }

    #[test]
    fn test_prop_type() {
        let result = check(r#"{ikb_section full_width="sometimes"}{/ikb_section}"#, None);
        assert_eq!(codes_of(&result), vec![codes::INVALID_PROP_TYPE]);

        // Bare attribute and quoted boolean both satisfy a boolean prop
        assert!(check("{ikb_section full_width}{/ikb_section}", None).is_empty());
        assert!(check(r#"{ikb_section full_width="true"}{/ikb_section}"#, None).is_empty());
    }

    #[test]
    fn test_expression_attributes_are_not_checked() {
        let result = check("{ikb_image src={post.image} /}", None);
        assert!(result.is_empty(), "{:?}", result);
    }

    #[test]
    fn test_undeclared_attributes_allowed() {
        assert!(check(r#"{ikb_section data_track="hero-cta"}{/ikb_section}"#, None).is_empty());
    }

    #[test]
    fn test_platform_restriction() {
        let result = check(r#"{ikb_map lat=1 lng=2 /}"#, Some("ios"));
        assert!(codes_of(&result).contains(&codes::COMPONENT_PLATFORM_INCOMPATIBLE));
        assert!(check(r#"{ikb_map lat=1 lng=2 /}"#, Some("web")).is_empty());
    }

    #[test]
    fn test_namespaced_name_resolves() {
        let result = check(r#"{core:link href="/about"}About{/core:link}"#, None);
        assert!(result.is_empty(), "{:?}", result);
    }
}
