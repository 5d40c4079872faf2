// Header declaration checks: {ikb_cms ... /} and {ikb_platform ... /}

use ikb_error_reporting::{ValidationError, ValidationResult, codes};
use ikb_registry::{CmsType, PlatformCategory, Registry};
use ikb_template::{CmsHeader, PlatformHeader};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

use crate::locate;

/// Capabilities a template may request from its CMS with `set="..."`.
pub const CMS_CAPABILITIES: &[&str] = &[
    "menus",
    "widgets",
    "blocks",
    "views",
    "regions",
    "modules",
    "positions",
    "shortcodes",
    "taxonomies",
    "users",
    "media",
    "forms",
    "comments",
    "search",
    "i18n",
    "rest",
];

static SEMVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$").expect("valid semver regex")
});

pub fn is_semver(version: &str) -> bool {
    SEMVER_RE.is_match(version)
}

pub fn check_cms_header(header: &CmsHeader, result: &mut ValidationResult) {
    let start = result.len();
    match header.cms_type.as_deref() {
        None => {
            result.error(
                codes::MISSING_HEADER_TYPE,
                "CMS declaration is missing its 'type' attribute",
            );
        }
        Some(cms) if CmsType::from_str(cms).is_err() => {
            let known: Vec<&str> = CmsType::ALL.iter().map(|c| c.as_str()).collect();
            result.push(
                ValidationError::error(
                    codes::UNKNOWN_CMS,
                    format!("Unknown CMS '{}' (expected one of: {})", cms, known.join(", ")),
                )
                .with_node("attribute", "type"),
            );
        }
        Some(_) => {}
    }

    for capability in &header.set {
        if !CMS_CAPABILITIES.contains(&capability.as_str()) {
            result.push(
                ValidationError::error(
                    codes::INVALID_CMS_SET,
                    format!("Unknown CMS capability '{}' in 'set'", capability),
                )
                .with_node("attribute", "set"),
            );
        }
    }
    mark_header(result, start, "ikb_cms");
    locate(result, start, header.loc);
}

pub fn check_platform_header(
    registry: &Registry,
    header: &PlatformHeader,
    result: &mut ValidationResult,
) {
    let start = result.len();
    match header.platform_type.as_deref() {
        None => {
            result.error(
                codes::MISSING_HEADER_TYPE,
                "Platform declaration is missing its 'type' attribute",
            );
        }
        Some(kind) if PlatformCategory::from_str(kind).is_err() => {
            let known: Vec<&str> = PlatformCategory::ALL.iter().map(|c| c.as_str()).collect();
            result.push(
                ValidationError::error(
                    codes::UNKNOWN_PLATFORM_TYPE,
                    format!(
                        "Unknown platform type '{}' (expected one of: {})",
                        kind,
                        known.join(", ")
                    ),
                )
                .with_node("attribute", "type"),
            );
        }
        Some(_) => {}
    }

    for target in &header.targets {
        if !registry.has_platform(target) {
            let known: Vec<&str> = registry
                .list_platforms()
                .iter()
                .map(|p| p.id.as_str())
                .collect();
            result.push(
                ValidationError::error(
                    codes::UNKNOWN_PLATFORM_TARGET,
                    format!(
                        "Unknown platform target '{}' (expected one of: {})",
                        target,
                        known.join(", ")
                    ),
                )
                .with_node("attribute", "targets"),
            );
        }
    }

    if let Some(version) = &header.version
        && !is_semver(version)
    {
        result.push(
            ValidationError::error(
                codes::INVALID_VERSION,
                format!("Version '{}' is not a semantic version (x.y.z)", version),
            )
            .with_node("attribute", "version"),
        );
    }
    mark_header(result, start, "ikb_platform");
    locate(result, start, header.loc);
}

fn mark_header(result: &mut ValidationResult, from: usize, name: &str) {
    for diagnostic in result.errors.iter_mut().skip(from) {
        if diagnostic.node_kind.is_none() {
            diagnostic.node_kind = Some("header".to_string());
            diagnostic.node_name = Some(name.to_string());
        }
    }
}
