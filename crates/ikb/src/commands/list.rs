//! Registry listing commands: components, filters and manifests.

use std::process::ExitCode;

use anyhow::Result;

use ikb_grammar::introspection::{available_components, available_filters};
use ikb_registry::{ComponentSpec, FilterSpec, ManifestInfo};

use crate::config::{self, GlobalArgs};

/// List components usable on the selected platform
pub fn components(global: &GlobalArgs, category: Option<&str>) -> Result<ExitCode> {
    let options = config::load_options(global)?;
    let registry = config::load_registry(&options)?;
    for component in available_components(&registry, options.platform.as_deref(), category) {
        println!("{}", component_line(component));
    }
    Ok(ExitCode::SUCCESS)
}

/// List filters usable on the selected platform
pub fn filters(global: &GlobalArgs) -> Result<ExitCode> {
    let options = config::load_options(global)?;
    let registry = config::load_registry(&options)?;
    for filter in available_filters(&registry, options.platform.as_deref()) {
        println!("{}", filter_line(filter));
    }
    Ok(ExitCode::SUCCESS)
}

/// List manifest sources in merge order
pub fn manifests(global: &GlobalArgs) -> Result<ExitCode> {
    let options = config::load_options(global)?;
    let registry = config::load_registry(&options)?;
    for info in registry.loaded_manifests() {
        println!("{}", manifest_line(info));
    }
    Ok(ExitCode::SUCCESS)
}

fn component_line(component: &ComponentSpec) -> String {
    let props: Vec<String> = component
        .props
        .iter()
        .map(|(name, schema)| {
            if schema.required {
                format!("{}*: {}", name, schema.type_name)
            } else {
                format!("{}: {}", name, schema.type_name)
            }
        })
        .collect();
    let leaf = if component.is_leaf { " (leaf)" } else { "" };
    format!(
        "{:<20} {:<10} {}{}  [{}]",
        component.name,
        component.category,
        component.description,
        leaf,
        props.join(", ")
    )
}

fn filter_line(filter: &FilterSpec) -> String {
    let params: Vec<&str> = filter.params.iter().map(|p| p.name.as_str()).collect();
    let escaping = if filter.escaping { " (escaping)" } else { "" };
    format!(
        "{:<14} ({}) -> {}{}",
        filter.name,
        params.join(", "),
        filter.return_type,
        escaping
    )
}

fn manifest_line(info: &ManifestInfo) -> String {
    format!(
        "{} ({}, schema {}): {} components, {} filters",
        info.path,
        info.name,
        info.schema_version,
        info.components.len(),
        info.filters.len()
    )
}
