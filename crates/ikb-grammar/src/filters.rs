// Filter chain checks

use ikb_error_reporting::{ValidationResult, codes};
use ikb_registry::{FilterSpec, Registry};

use crate::expression::{CallArg, FilterCall};
use crate::schema::json_type_name;
use crate::types::validate_type;

/// Check every filter in a chain against the registry.
///
/// Unknown filters, platform gating, missing required parameters and
/// ill-typed literal arguments are errors. Surplus positional arguments and
/// unknown named arguments are warnings. Arguments that reference variables
/// are not type-checked since their value is only known at render time.
pub fn check_filter_chain(
    registry: &Registry,
    filters: &[FilterCall],
    platform: Option<&str>,
    result: &mut ValidationResult,
) {
    for call in filters {
        let Some(spec) = registry.get_filter(&call.name) else {
            result
                .error(codes::UNKNOWN_FILTER, format!("Unknown filter: {}", call.name))
                .node_name = Some(call.name.clone());
            continue;
        };

        if let Some(platform) = platform
            && !spec.platforms.allows(platform)
        {
            result
                .error(
                    codes::FILTER_PLATFORM_INCOMPATIBLE,
                    format!(
                        "Filter '{}' is not available on platform '{}'",
                        call.name, platform
                    ),
                )
                .node_name = Some(call.name.clone());
        }

        check_arguments(spec, call, result);
    }
}

fn check_arguments(spec: &FilterSpec, call: &FilterCall, result: &mut ValidationResult) {
    let positional: Vec<&CallArg> = call.args.iter().filter(|a| a.name.is_none()).collect();

    for (index, param) in spec.params.iter().enumerate() {
        let supplied = call
            .args
            .iter()
            .find(|a| a.name.as_deref() == Some(param.name.as_str()))
            .or_else(|| positional.get(index).copied());

        match supplied {
            None if param.required => {
                result.error(
                    codes::MISSING_FILTER_PARAMETER,
                    format!("Filter '{}' requires parameter '{}'", spec.name, param.name),
                );
            }
            Some(arg) if !arg.reference && !validate_type(&arg.value, &param.type_name) => {
                result.error(
                    codes::INVALID_FILTER_ARGUMENT,
                    format!(
                        "Parameter '{}' of filter '{}' must be of type {}, got {}",
                        param.name,
                        spec.name,
                        param.type_name,
                        json_type_name(&arg.value)
                    ),
                );
            }
            _ => {}
        }
    }

    if positional.len() > spec.params.len() {
        result.warning(
            codes::TOO_MANY_FILTER_ARGUMENTS,
            format!(
                "Filter '{}' takes {} argument(s), {} given",
                spec.name,
                spec.params.len(),
                positional.len()
            ),
        );
    }

    for arg in &call.args {
        if let Some(name) = &arg.name
            && !spec.params.iter().any(|p| &p.name == name)
        {
            result.warning(
                codes::INVALID_FILTER_ARGUMENT,
                format!("Filter '{}' has no parameter '{}'", spec.name, name),
            );
        }
    }
}
