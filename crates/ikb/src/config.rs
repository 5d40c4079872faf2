//! Option loading: `ikb.toml`, then command-line overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use ikb_compiler::CompilerOptions;
use ikb_grammar::SecurityMode;
use ikb_registry::{CmsType, ManifestCatalog, ManifestSource, Profile, Registry};

/// Config file read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ikb.toml";

/// Flags shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Manifest profile (minimal, full, headless)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Target CMS (wordpress, drupal, joomla, native)
    #[arg(long, global = true)]
    pub cms: Option<String>,

    /// Delivery platform id used to gate components and filters
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Security mode (strict, lenient)
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Extra manifest file, merged after the profile manifests (repeatable)
    #[arg(long = "manifest", value_name = "PATH", global = true)]
    pub manifests: Vec<PathBuf>,

    /// Config file (defaults to ./ikb.toml when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

/// Resolve compiler options from the config file and flags.
///
/// Manifest paths in the config file are relative to the file's directory.
/// Manifests named on the command line are appended after them.
pub fn load_options(args: &GlobalArgs) -> Result<CompilerOptions> {
    let mut options = match &args.config {
        Some(path) => read_config(path)?,
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                read_config(path)?
            } else {
                CompilerOptions::default()
            }
        }
    };

    if let Some(profile) = &args.profile {
        options.profile = Profile::from_str(profile)?;
    }
    if let Some(cms) = &args.cms {
        options.cms = CmsType::from_str(cms)?;
    }
    if let Some(platform) = &args.platform {
        options.platform = Some(platform.clone());
    }
    if let Some(mode) = &args.mode {
        options.mode = SecurityMode::from_str(mode).map_err(anyhow::Error::msg)?;
    }
    options.manifests.extend(args.manifests.iter().cloned());

    debug!(
        profile = %options.profile,
        cms = %options.cms,
        mode = %options.mode,
        manifests = options.manifests.len(),
        "resolved options"
    );
    Ok(options)
}

fn read_config(path: &Path) -> Result<CompilerOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut options: CompilerOptions = toml::from_str(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    if let Some(dir) = path.parent() {
        for manifest in &mut options.manifests {
            if manifest.is_relative() {
                *manifest = dir.join(&*manifest);
            }
        }
    }
    Ok(options)
}

/// Build the registry for `options`, reading any extra manifest files.
pub fn load_registry(options: &CompilerOptions) -> Result<Registry> {
    let mut catalog = ManifestCatalog::builtin();
    for path in &options.manifests {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        catalog.add_source(ManifestSource::new(path.display().to_string(), text));
    }
    catalog
        .load(options.profile, options.cms)
        .context("Failed to load component registry")
}
