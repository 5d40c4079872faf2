//! IKB CLI - Main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::GlobalArgs;

#[derive(Parser)]
#[command(name = "ikb")]
#[command(version)]
#[command(about = "IKB template compiler", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a template and report diagnostics
    Compile {
        /// Template file
        file: PathBuf,

        /// Print the compiled document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the token stream of a template
    Tokens {
        /// Template file
        file: PathBuf,

        /// Print tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON schema of the loaded registry
    Schema,

    /// List components (restricted to --platform when given)
    Components {
        /// Only components in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// List filters (restricted to --platform when given)
    Filters,

    /// List the manifest sources merged into the registry
    Manifests,
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ikb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, json } => {
            commands::compile::execute(commands::compile::CompileArgs { file, json }, &cli.global)
        }
        Commands::Tokens { file, json } => commands::tokens::execute(&file, json),
        Commands::Schema => commands::schema::execute(&cli.global),
        Commands::Components { category } => {
            commands::list::components(&cli.global, category.as_deref())
        }
        Commands::Filters => commands::list::filters(&cli.global),
        Commands::Manifests => commands::list::manifests(&cli.global),
    }
}
