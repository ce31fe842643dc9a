mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use orders_core::config::Config;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "orderfeed",
    about = "Live order status feed: polls the content backend and pushes snapshots over SSE",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest orderfeed.yaml walking up from the cwd)
    #[arg(long, global = true, env = "ORDERFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Content backend base URL (overrides upstream.base_url)
    #[arg(long, global = true, env = "ORDERFEED_UPSTREAM")]
    upstream: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the backend and serve the live order feed
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, env = "ORDERFEED_PORT")]
        port: Option<u16>,

        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Fetch and reconcile one snapshot, then print it
    Snapshot,

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Load the config file (defaults if absent) and apply CLI overrides.
pub(crate) fn load_config(path: &Path, upstream: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?;
    if let Some(url) = upstream {
        config.upstream.base_url = url.to_string();
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config_path = root::resolve_config_path(cli.config.as_deref());
    let upstream = cli.upstream.as_deref();

    let result = match cli.command {
        Commands::Serve { port, interval_ms } => load_config(&config_path, upstream)
            .and_then(|config| cmd::serve::run(config, port, interval_ms)),
        Commands::Snapshot => load_config(&config_path, upstream)
            .and_then(|config| cmd::snapshot::run(&config, cli.json)),
        Commands::Config { subcommand } => {
            cmd::config::run(&config_path, upstream, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
