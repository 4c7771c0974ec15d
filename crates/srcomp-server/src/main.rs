//! `srcomp-http`: the SRComp competition information API.
//!
//! # Commands
//!
//! - `serve [COMPSTATE]` -- serve the compstate over HTTP, reloading it
//!   whenever an update signals a change
//! - `update COMPSTATE [REVISION]` -- check out a new revision under the
//!   update lock and signal running servers
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Layer settings: defaults, settings file, environment, flags
//! 3. Initialize structured logging (tracing)
//! 4. Run the command

mod cli;
mod error;
mod settings;
mod update;

use std::sync::Arc;

use clap::Parser;
use srcomp_core::StateManager;
use srcomp_http::{AppState, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogFormat};
use crate::error::AppError;
use crate::settings::Settings;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if settings are invalid or the command fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1-2. Command line and settings.
    let cli = Cli::parse();
    let settings = Settings::load(&cli).map_err(AppError::from)?;

    // 3. Initialize structured logging.
    init_logging(settings.log_format);
    info!(
        compstate = %settings.compstate.display(),
        log_format = settings.log_format.as_str(),
        "srcomp-http starting"
    );

    // 4. Run the command.
    match cli.command {
        Command::Serve(_) => serve(&settings).await?,
        Command::Update(args) => {
            let compstate = settings.compstate.clone();
            tokio::task::spawn_blocking(move || update::run(&compstate, &args.revision))
                .await
                .map_err(|e| AppError::Task(e.to_string()))?
                .map_err(AppError::from)?;
        }
    }

    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn serve(settings: &Settings) -> Result<(), AppError> {
    let options = settings.manager_options();
    info!(
        reload = settings.reload,
        staleness_secs = settings.staleness_secs,
        "State manager configured"
    );
    let manager = Arc::new(StateManager::new(&settings.compstate, options));

    // A broken compstate is only logged; requests answer 503 until it loads.
    let preload = Arc::clone(&manager);
    match tokio::task::spawn_blocking(move || preload.get_state()).await {
        Ok(Ok(state)) => info!(
            teams = state.teams.len(),
            matches = state.schedule.matches.len(),
            "Initial compstate loaded"
        ),
        Ok(Err(e)) => warn!(error = %e, "Initial compstate load failed"),
        Err(e) => return Err(AppError::Task(e.to_string())),
    }

    let state = Arc::new(AppState::new(manager));
    start_server(&settings.server_config(), state).await?;
    Ok(())
}
