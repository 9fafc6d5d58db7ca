use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use texpulse::config::{CliOverrides, MonitorOptions};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "texpulse")]
#[command(version, about = "Structured progress for multi-stage document builds")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit progress signals as JSON lines instead of a status line
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable progress tracking (commands still run; signals are suppressed)
    #[arg(long, global = true)]
    pub disabled: bool,

    /// Progress bar style: none, block-width, block-shade, block-quadrant
    #[arg(long, global = true)]
    pub bar_style: Option<String>,

    /// Progress bar width in glyphs
    #[arg(long, global = true)]
    pub bar_width: Option<usize>,

    /// Stage icon set: digits, letters, none
    #[arg(long, global = true)]
    pub icon_set: Option<String>,

    /// Path to the config file (default: ./texpulse.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a build command and track its progress
    Run {
        /// The build command and its arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
    /// Track build output piped to stdin
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "texpulse=debug"
    } else {
        "texpulse=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let overrides = CliOverrides {
        disabled: cli.disabled,
        bar_style: cli.bar_style.clone(),
        bar_width: cli.bar_width,
        icon_set: cli.icon_set.clone(),
    };
    let options = MonitorOptions::resolve(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Commands::Run { command } => {
            let code = cmd::run(&options, &command, cli.json).await?;
            std::process::exit(code);
        }
        Commands::Watch => cmd::watch(&options, cli.json).await,
    }
}
