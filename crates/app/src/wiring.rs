use std::sync::Arc;

use cinefind_infra::appwrite::AppwriteClient;
use cinefind_infra::catalog::TmdbClient;
use cinefind_infra::db::{connect_lazy, DbPoolError};
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::memory_store::MemoryTrendingStore;
use crate::search::ports::{PgTrendingStore, TrendingStore};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("db error: {0}")]
    Db(#[from] DbPoolError),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let client = Client::builder().timeout(config.request_timeout).build()?;
    let catalog = TmdbClient::new(
        client.clone(),
        &config.tmdb_base_url,
        config.tmdb_api_token.clone(),
    );

    let mut db = None;
    let trending: Arc<dyn TrendingStore> = if let Some(url) = config.database_url.as_deref() {
        let pool = connect_lazy(url, config.request_timeout)?;
        db = Some(pool.clone());
        info!(backend = "postgres", "trending store configured");
        Arc::new(PgTrendingStore::new(pool))
    } else if let Some(appwrite) = config.appwrite.clone() {
        info!(backend = "appwrite", endpoint = %appwrite.endpoint, "trending store configured");
        Arc::new(AppwriteClient::new(client, appwrite))
    } else {
        warn!("no trending backend configured; trending searches are kept in memory");
        Arc::new(MemoryTrendingStore::default())
    };

    Ok(AppState {
        config: Arc::new(config),
        catalog: Arc::new(catalog),
        trending,
        db,
    })
}
