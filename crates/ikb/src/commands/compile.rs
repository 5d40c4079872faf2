//! Compile command implementation.
//!
//! Diagnostics go to stderr as source-annotated reports. With `--json` the
//! compiled document (or the fatal error) is written to stdout instead. The
//! exit status is non-zero when compilation failed or produced errors.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use ikb_compiler::Compiler;

use crate::config::{self, GlobalArgs};

/// Arguments for the compile command
#[derive(Debug)]
pub struct CompileArgs {
    /// Template file
    pub file: PathBuf,
    /// Print the compiled document as JSON
    pub json: bool,
}

/// What the command writes, kept apart from the writing for tests.
#[derive(Debug, Default)]
struct Outcome {
    stdout: String,
    stderr: String,
    success: bool,
}

/// Execute the compile command
pub fn execute(args: CompileArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let options = config::load_options(global)?;
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read template: {}", args.file.display()))?;
    let registry = config::load_registry(&options)?;
    let compiler = Compiler::with_registry(Arc::new(registry), options);

    let outcome = run(&compiler, &source, args.json)?;
    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);

    info!(
        file = %args.file.display(),
        success = outcome.success,
        "compile finished"
    );
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(compiler: &Compiler, source: &str, json: bool) -> Result<Outcome> {
    let compiled = match compiler.compile(source) {
        Ok(compiled) => compiled,
        Err(err) => {
            let mut outcome = Outcome::default();
            if json {
                let fatal = serde_json::json!({ "fatal": err.to_diagnostic() });
                outcome.stdout = format!("{}\n", serde_json::to_string_pretty(&fatal)?);
            } else {
                outcome.stderr = err.to_text(Some(source));
            }
            return Ok(outcome);
        }
    };

    let mut outcome = Outcome {
        success: compiled.is_renderable(),
        ..Default::default()
    };
    if json {
        outcome.stdout = format!("{}\n", serde_json::to_string_pretty(&compiled.to_json())?);
    } else {
        for diagnostic in compiled.metadata.diagnostics() {
            outcome.stderr.push_str(&diagnostic.to_text(Some(source)));
        }
        outcome.stderr.push_str(&format!(
            "{} error(s), {} warning(s) in {:.2} ms\n",
            compiled.metadata.errors.len(),
            compiled.metadata.warnings.len(),
            compiled.metadata.compilation_time_ms
        ));
    }
    Ok(outcome)
}
