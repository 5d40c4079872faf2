//! Validation rules for IKB templates.
//!
//! The [`Grammar`] checks a parsed document against a component and filter
//! [`Registry`](ikb_registry::Registry): prop types and enums, required props,
//! leaf components, filter chains, header declarations, name rules and
//! output escaping. Findings are [`ValidationError`](ikb_error_reporting::ValidationError)s
//! with stable codes; nothing in this crate fails hard on a bad template.
//!
//! ```
//! use std::sync::Arc;
//! use ikb_grammar::{Grammar, SecurityMode};
//! use ikb_registry::{CmsType, Profile, Registry};
//! use ikb_template::parse_template;
//!
//! let registry = Arc::new(Registry::load(Profile::Full, CmsType::Native).unwrap());
//! let grammar = Grammar::new(registry).with_mode(SecurityMode::Strict);
//!
//! let doc = parse_template("{ikb_section type=\"hero\"}{post.title}{/ikb_section}").unwrap();
//! let result = grammar.validate_document_rich(&doc);
//! assert_eq!(result.error_count(), 1); // missing escaping filter
//! ```

pub mod components;
pub mod declarations;
pub mod expression;
pub mod filters;
pub mod grammar;
pub mod introspection;
pub mod schema;
pub mod security;
pub mod structure;
pub mod types;

pub use declarations::CMS_CAPABILITIES;
pub use expression::{
    CallArg, ExpressionError, FilterCall, ParsedExpression, PathSegment, parse_expression_with,
    parse_variable_path,
};
pub use grammar::Grammar;
pub use security::SecurityMode;
pub use structure::RESERVED_WORDS;
pub use types::{EXTENDED_TYPES, PRIMITIVE_TYPES, coerce_value, validate_type};

use ikb_error_reporting::ValidationResult;
use ikb_template::Location;

/// Give diagnostics pushed since `from` the location `loc`, unless they
/// already have one.
pub(crate) fn locate(result: &mut ValidationResult, from: usize, loc: Location) {
    for diagnostic in result.errors.iter_mut().skip(from) {
        if diagnostic.line.is_none() {
            diagnostic.line = Some(loc.line);
            diagnostic.column = Some(loc.column);
            diagnostic.offset = Some(loc.offset);
        }
    }
}
