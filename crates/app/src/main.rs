mod cli;
mod config;
mod memory_store;
mod render;
mod search;
mod session;
mod state;
mod wiring;

use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::wiring::WiringError;
use cinefind_infra::db::run_migrations;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("db error: {0}")]
    Db(#[from] cinefind_infra::db::DbPoolError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dotenv = config::load_dotenv()?;
    let mut config = config::AppConfig::from_env(&dotenv)?;
    if let Some(ms) = cli.debounce_ms {
        config.debounce = Duration::from_millis(ms);
    }
    let debounce = config.debounce;
    let state = wiring::build_state(config)?;
    if let Some(pool) = state.db.as_ref() {
        run_migrations(pool).await?;
    }

    let with_trending = !cli.skip_trending;
    let session = async {
        match cli.term.as_deref() {
            Some(term) => session::run_once(&state, term, with_trending).await,
            None => session::run_interactive(&state, debounce, with_trending).await,
        }
    };

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
        res = session => {
            res?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
