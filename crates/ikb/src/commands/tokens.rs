//! Tokens command implementation.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use ikb_template::{TemplateError, Token, TokenKind, tokenize};

/// Execute the tokens command
pub fn execute(file: &Path, json: bool) -> Result<ExitCode> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read template: {}", file.display()))?;

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            let err = TemplateError::from(err);
            eprint!("{}", err.to_diagnostic().to_text(Some(&source)));
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", format_token(token));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// `line:column  KIND  payload`, with text payloads shown escaped.
fn format_token(token: &Token) -> String {
    let payload = match token.kind {
        TokenKind::Text | TokenKind::Comment => format!("{:?}", token.text()),
        _ => token.describe(),
    };
    format!(
        "{:>4}:{:<4} {:<14} {}",
        token.line,
        token.column,
        token.kind.describe(),
        payload
    )
}
