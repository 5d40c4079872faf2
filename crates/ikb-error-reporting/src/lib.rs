//! Diagnostics for the IKB template pipeline.
//!
//! The pipeline has two error tiers. Lexer and parser failures are fatal and
//! travel as typed `Result` errors in their own crates. Everything the grammar
//! and compiler find is a *diagnostic*: a [`ValidationError`] collected into a
//! [`ValidationResult`] instead of aborting.
//!
//! This crate owns the diagnostic side:
//!
//! - [`Severity`]: `error` (blocking) or `warning` (non-blocking)
//! - [`ValidationError`]: one finding with a stable [`codes`] string and an
//!   optional source position
//! - [`ValidationResult`]: a mergeable, serializable accumulator
//! - [`catalog`]: metadata for every code, embedded at compile time
//!
//! # Example
//!
//! ```
//! use ikb_error_reporting::{codes, ValidationError, ValidationResult};
//!
//! let mut result = ValidationResult::new();
//! result.push(
//!     ValidationError::warning(codes::UNKNOWN_COMPONENT, "Unknown component: hero_banner")
//!         .with_node("tag", "hero_banner")
//!         .at(1, 1, 0),
//! );
//!
//! assert!(result.is_valid());
//! assert!(result.has_warnings());
//! ```

pub mod catalog;
pub mod codes;
pub mod diagnostic;
pub mod result;

pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{Severity, ValidationError};
pub use result::ValidationResult;
