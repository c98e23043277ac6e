use std::sync::Arc;

use cinefind_infra::db::DbPool;

use crate::config::AppConfig;
use crate::search::ports::{CatalogSource, TrendingStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn CatalogSource>,
    pub trending: Arc<dyn TrendingStore>,
    pub db: Option<DbPool>,
}
