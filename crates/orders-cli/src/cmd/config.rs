use crate::output::print_json;
use anyhow::{bail, Result};
use clap::Subcommand;
use orders_core::config::Config;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (file values plus overrides)
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, upstream: Option<&str>, subcmd: ConfigSubcommand, json: bool) -> Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(&crate::load_config(path, upstream)?, json),
        ConfigSubcommand::Init { force } => init(path, upstream, force),
        ConfigSubcommand::Validate => validate(&crate::load_config(path, upstream)?, json),
    }
}

fn show(config: &Config, json: bool) -> Result<()> {
    if json {
        return print_json(config);
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

fn init(path: &Path, upstream: Option<&str>, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    let mut config = Config::default();
    if let Some(url) = upstream {
        config.upstream.base_url = url.to_string();
    }
    config.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn validate(config: &Config, json: bool) -> Result<()> {
    let outcome = config.validate();
    if json {
        print_json(&serde_json::json!({
            "valid": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        }))?;
    } else if outcome.is_ok() {
        println!("Config OK");
    }
    outcome?;
    Ok(())
}
