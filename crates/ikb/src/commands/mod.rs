//! Command implementations for the IKB CLI
//!
//! Each command reads what it needs from disk and delegates to the
//! library crates; none of them hold state between runs.

pub mod compile;
pub mod list;
pub mod schema;
pub mod tokens;
