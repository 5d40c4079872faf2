// Queries for editors and visual builders

use ikb_registry::{ComponentSpec, FilterSpec, Registry};
use serde_json::{Value, json};

use crate::types::{EXTENDED_TYPES, PRIMITIVE_TYPES};

/// Components usable on `platform` (all when `None`), optionally limited to
/// one category. Sorted by name.
pub fn available_components<'a>(
    registry: &'a Registry,
    platform: Option<&str>,
    category: Option<&str>,
) -> Vec<&'a ComponentSpec> {
    registry
        .list_components()
        .into_iter()
        .filter(|c| platform.is_none_or(|p| c.platforms.allows(p)))
        .filter(|c| category.is_none_or(|cat| c.category == cat))
        .collect()
}

/// Filters usable on `platform` (all when `None`). Sorted by name.
pub fn available_filters<'a>(registry: &'a Registry, platform: Option<&str>) -> Vec<&'a FilterSpec> {
    registry
        .list_filters()
        .into_iter()
        .filter(|f| platform.is_none_or(|p| f.platforms.allows(p)))
        .collect()
}

/// Describe everything a template may use as one JSON document.
pub fn export_json_schema(registry: &Registry) -> Value {
    let components: Vec<Value> = registry
        .list_components()
        .into_iter()
        .map(|c| {
            json!({
                "name": c.name,
                "namespace": c.namespace,
                "category": c.category,
                "leaf": c.is_leaf,
                "description": c.description,
                "platforms": c.platforms,
                "props": c.props,
            })
        })
        .collect();

    let filters: Vec<Value> = registry
        .list_filters()
        .into_iter()
        .map(|f| {
            json!({
                "name": f.name,
                "params": f.params,
                "returnType": f.return_type,
                "escaping": f.escaping,
                "description": f.description,
                "platforms": f.platforms,
            })
        })
        .collect();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "version": registry.schema_version(),
        "profile": registry.profile().as_str(),
        "cms": registry.cms().as_str(),
        "components": components,
        "filters": filters,
        "platforms": registry.list_platforms(),
        "namespaces": registry.namespaces(),
        "types": {
            "primitive": PRIMITIVE_TYPES,
            "extended": EXTENDED_TYPES,
        },
    })
}
