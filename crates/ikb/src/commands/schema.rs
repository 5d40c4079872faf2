//! Schema command implementation.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;

use ikb_grammar::Grammar;

use crate::config::{self, GlobalArgs};

/// Print the registry as a JSON schema for editors and visual builders
pub fn execute(global: &GlobalArgs) -> Result<ExitCode> {
    let options = config::load_options(global)?;
    let registry = config::load_registry(&options)?;
    let grammar = Grammar::new(Arc::new(registry));
    println!("{}", serde_json::to_string_pretty(&grammar.export_json_schema())?);
    Ok(ExitCode::SUCCESS)
}
