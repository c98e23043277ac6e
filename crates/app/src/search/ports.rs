use async_trait::async_trait;
use cinefind_core::domain::movie::{CatalogPage, CatalogQuery, MovieSummary};
use cinefind_core::domain::trending::{TrendingEntry, TrendingRecord};
use cinefind_core::types::search_key::SearchKey;
use cinefind_core::CoreError;
use cinefind_infra::appwrite::{AppwriteClient, AppwriteError};
use cinefind_infra::catalog::{CatalogError, TmdbClient};
use cinefind_infra::db::{self, DbPool, TrendingRepoError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("trending db error: {0}")]
    TrendingDb(#[from] TrendingRepoError),
    #[error("appwrite error: {0}")]
    Appwrite(#[from] AppwriteError),
    #[error("invalid search term: {0}")]
    Term(#[from] CoreError),
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, PortError>;
}

#[async_trait]
pub trait TrendingStore: Send + Sync {
    /// Counts one more search for `term`, creating the entry from `movie`
    /// when the term has not been seen before.
    async fn record_search(&self, term: &str, movie: &MovieSummary) -> Result<(), PortError>;

    /// Entries ordered by descending search count, at most `limit` long.
    async fn list_top_entries(&self, limit: usize) -> Result<Vec<TrendingEntry>, PortError>;
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, PortError> {
        Ok(TmdbClient::query(self, query).await?)
    }
}

#[derive(Debug, Clone)]
pub struct PgTrendingStore {
    pool: DbPool,
}

impl PgTrendingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrendingStore for PgTrendingStore {
    async fn record_search(&self, term: &str, movie: &MovieSummary) -> Result<(), PortError> {
        let record = TrendingRecord::new(SearchKey::try_from(term)?, movie);
        db::record_search(&self.pool, &record).await?;
        Ok(())
    }

    async fn list_top_entries(&self, limit: usize) -> Result<Vec<TrendingEntry>, PortError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(db::list_top_entries(&self.pool, limit).await?)
    }
}

#[async_trait]
impl TrendingStore for AppwriteClient {
    async fn record_search(&self, term: &str, movie: &MovieSummary) -> Result<(), PortError> {
        let record = TrendingRecord::new(SearchKey::try_from(term)?, movie);
        AppwriteClient::record_search(self, &record).await?;
        Ok(())
    }

    async fn list_top_entries(&self, limit: usize) -> Result<Vec<TrendingEntry>, PortError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(AppwriteClient::list_top_entries(self, limit).await?)
    }
}
