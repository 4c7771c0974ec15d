//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::update::DEFAULT_REVISION;

/// SRComp competition information API.
#[derive(Debug, Parser)]
#[command(name = "srcomp-http")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SR Competition info API HTTP server", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (YAML or TOML) layered over the defaults.
    #[arg(long, global = true, env = "SRCOMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve a compstate over HTTP
    Serve(ServeArgs),

    /// Check out a new compstate revision under the update lock
    Update(UpdateArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Competition state git repository path
    pub compstate: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Load the compstate once and never reload it
    #[arg(long)]
    pub no_reload: bool,

    /// Seconds between checks of the update sentinel
    #[arg(long)]
    pub staleness_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Competition state git repository path
    pub compstate: PathBuf,

    /// Target revision to update to
    #[arg(default_value = DEFAULT_REVISION)]
    pub revision: String,
}

/// How log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// The name used in settings files and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}
