//! Stable diagnostic codes.
//!
//! Codes never change once published, so downstream tooling can filter on
//! them. Every constant here has an entry in `error_catalog.json`.

pub const LEX_ERROR: &str = "LEX_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";

// Types and schemas
pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
pub const UNKNOWN_TYPE: &str = "UNKNOWN_TYPE";
pub const REQUIRED_VALUE_MISSING: &str = "REQUIRED_VALUE_MISSING";
pub const STRING_TOO_SHORT: &str = "STRING_TOO_SHORT";
pub const STRING_TOO_LONG: &str = "STRING_TOO_LONG";
pub const INVALID_ENUM_VALUE: &str = "INVALID_ENUM_VALUE";
pub const PATTERN_MISMATCH: &str = "PATTERN_MISMATCH";
pub const INVALID_PATTERN: &str = "INVALID_PATTERN";

// Expressions and filters
pub const EXPRESSION_SYNTAX: &str = "EXPRESSION_SYNTAX";
pub const INVALID_VARIABLE_PATH: &str = "INVALID_VARIABLE_PATH";
pub const UNKNOWN_FILTER: &str = "UNKNOWN_FILTER";
pub const FILTER_PLATFORM_INCOMPATIBLE: &str = "FILTER_PLATFORM_INCOMPATIBLE";
pub const MISSING_FILTER_PARAMETER: &str = "MISSING_FILTER_PARAMETER";
pub const INVALID_FILTER_ARGUMENT: &str = "INVALID_FILTER_ARGUMENT";
pub const TOO_MANY_FILTER_ARGUMENTS: &str = "TOO_MANY_FILTER_ARGUMENTS";

// Components
pub const UNKNOWN_COMPONENT: &str = "UNKNOWN_COMPONENT";
pub const MISSING_REQUIRED_PROP: &str = "MISSING_REQUIRED_PROP";
pub const INVALID_PROP_TYPE: &str = "INVALID_PROP_TYPE";
pub const LEAF_COMPONENT_CHILDREN: &str = "LEAF_COMPONENT_CHILDREN";
pub const COMPONENT_PLATFORM_INCOMPATIBLE: &str = "COMPONENT_PLATFORM_INCOMPATIBLE";

// Structure
pub const INVALID_ROOT: &str = "INVALID_ROOT";
pub const INVALID_TAG_NAME: &str = "INVALID_TAG_NAME";
pub const INVALID_ATTRIBUTE_NAME: &str = "INVALID_ATTRIBUTE_NAME";
pub const RESERVED_WORD: &str = "RESERVED_WORD";

// Header declarations
pub const MISSING_HEADER_TYPE: &str = "MISSING_HEADER_TYPE";
pub const UNKNOWN_CMS: &str = "UNKNOWN_CMS";
pub const INVALID_CMS_SET: &str = "INVALID_CMS_SET";
pub const UNKNOWN_PLATFORM_TYPE: &str = "UNKNOWN_PLATFORM_TYPE";
pub const UNKNOWN_PLATFORM_TARGET: &str = "UNKNOWN_PLATFORM_TARGET";
pub const INVALID_VERSION: &str = "INVALID_VERSION";

// Security
pub const MISSING_ESCAPING: &str = "MISSING_ESCAPING";

/// Every code, in catalog order.
pub const ALL: &[&str] = &[
    LEX_ERROR,
    PARSE_ERROR,
    TYPE_MISMATCH,
    UNKNOWN_TYPE,
    REQUIRED_VALUE_MISSING,
    STRING_TOO_SHORT,
    STRING_TOO_LONG,
    INVALID_ENUM_VALUE,
    PATTERN_MISMATCH,
    INVALID_PATTERN,
    EXPRESSION_SYNTAX,
    INVALID_VARIABLE_PATH,
    UNKNOWN_FILTER,
    FILTER_PLATFORM_INCOMPATIBLE,
    MISSING_FILTER_PARAMETER,
    INVALID_FILTER_ARGUMENT,
    TOO_MANY_FILTER_ARGUMENTS,
    UNKNOWN_COMPONENT,
    MISSING_REQUIRED_PROP,
    INVALID_PROP_TYPE,
    LEAF_COMPONENT_CHILDREN,
    COMPONENT_PLATFORM_INCOMPATIBLE,
    INVALID_ROOT,
    INVALID_TAG_NAME,
    INVALID_ATTRIBUTE_NAME,
    RESERVED_WORD,
    MISSING_HEADER_TYPE,
    UNKNOWN_CMS,
    INVALID_CMS_SET,
    UNKNOWN_PLATFORM_TYPE,
    UNKNOWN_PLATFORM_TARGET,
    INVALID_VERSION,
    MISSING_ESCAPING,
];
