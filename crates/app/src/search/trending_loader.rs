use std::sync::Arc;

use cinefind_core::domain::state::{ListState, TrendingState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::search::ports::TrendingStore;

pub const TRENDING_ERROR: &str = "Unable to load trending movies. Please try again later.";
pub const DEFAULT_TRENDING_LIMIT: usize = 5;

/// One-shot load of the trending list, started when the session starts.
pub struct TrendingLoader {
    state: watch::Receiver<TrendingState>,
    task: JoinHandle<()>,
}

impl TrendingLoader {
    pub fn spawn(store: Arc<dyn TrendingStore>, limit: usize) -> Self {
        let (tx, state) = watch::channel(TrendingState::default());
        let task = tokio::spawn(async move { load(store.as_ref(), limit, &tx).await });
        Self { state, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrendingState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> TrendingState {
        self.state.borrow().clone()
    }
}

impl Drop for TrendingLoader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn load(store: &dyn TrendingStore, limit: usize, state: &watch::Sender<TrendingState>) {
    state.send_modify(ListState::begin_loading);
    match store.list_top_entries(limit).await {
        Ok(entries) => {
            info!(count = entries.len(), limit, "trending entries loaded");
            state.send_modify(|current| current.succeed(entries));
        }
        Err(err) => {
            error!(error = %err, "trending entries load failed");
            state.send_modify(|current| current.fail(TRENDING_ERROR));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use cinefind_core::domain::movie::MovieSummary;
    use cinefind_core::domain::state::{LoadStatus, TrendingState};
    use cinefind_core::domain::trending::TrendingEntry;
    use cinefind_infra::appwrite::AppwriteError;
    use reqwest::StatusCode;
    use tokio::sync::watch;

    use super::{load, TrendingLoader, TRENDING_ERROR};
    use crate::search::ports::{PortError, TrendingStore};

    struct FixedStore {
        entries: Option<Vec<TrendingEntry>>,
    }

    #[async_trait]
    impl TrendingStore for FixedStore {
        async fn record_search(&self, _term: &str, _movie: &MovieSummary) -> Result<(), PortError> {
            Ok(())
        }

        async fn list_top_entries(&self, limit: usize) -> Result<Vec<TrendingEntry>, PortError> {
            match &self.entries {
                Some(entries) => Ok(entries.iter().take(limit).cloned().collect()),
                None => Err(AppwriteError::Status {
                    status: StatusCode::BAD_GATEWAY,
                    body: String::new(),
                }
                .into()),
            }
        }
    }

    fn entry(id: &str, count: i64) -> TrendingEntry {
        TrendingEntry {
            id: id.to_string(),
            search_term: id.to_string(),
            title: id.to_uppercase(),
            poster_url: format!("/{id}.jpg"),
            movie_id: 1,
            search_count: count,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn load_publishes_store_order() {
        let store = FixedStore {
            entries: Some(vec![entry("batman", 9), entry("alien", 4), entry("up", 1)]),
        };
        let (tx, rx) = watch::channel(TrendingState::default());
        load(&store, 2, &tx).await;

        let state = rx.borrow().clone();
        assert_eq!(state.status, LoadStatus::Ready);
        let ids: Vec<_> = state.items.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["batman", "alien"]);
    }

    #[tokio::test]
    async fn load_failure_sets_generic_message() {
        let store = FixedStore { entries: None };
        let (tx, rx) = watch::channel(TrendingState::default());
        load(&store, 5, &tx).await;

        let state = rx.borrow().clone();
        assert_eq!(state.status, LoadStatus::Error);
        assert_eq!(state.error_message.as_deref(), Some(TRENDING_ERROR));
        assert!(state.items.is_empty());
    }

    #[tokio::test]
    async fn spawned_loader_settles() {
        let store = Arc::new(FixedStore {
            entries: Some(vec![entry("batman", 1)]),
        });
        let loader = TrendingLoader::spawn(store, 5);
        let mut rx = loader.subscribe();
        let state = rx.wait_for(|state| state.is_settled()).await.unwrap().clone();
        assert_eq!(state.items.len(), 1);
        assert_eq!(loader.snapshot().status, LoadStatus::Ready);
    }
}
