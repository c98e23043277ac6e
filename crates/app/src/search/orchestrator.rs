//! Search flow: debounced term in, catalog fetch, published result state.
//!
//! A single loop task owns the state. Every term starts a new generation and
//! aborts the previous fetch; a completed fetch is committed only if it still
//! carries the current generation, so the visible state always belongs to the
//! most recently started term.

use std::sync::Arc;
use std::time::Duration;

use cinefind_core::domain::movie::{CatalogPage, CatalogQuery, MovieSummary};
use cinefind_core::domain::state::{ListState, SearchResultState};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::search::ports::{CatalogSource, PortError, TrendingStore};

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again later.";
pub const SERVICE_FALLBACK_ERROR: &str = "Failed to fetch movies";
const RECORD_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SearchOrchestrator {
    terms: Option<UnboundedSender<String>>,
    state: watch::Receiver<SearchResultState>,
    task: Option<JoinHandle<()>>,
}

struct InFlight {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Completed {
    generation: u64,
    term: String,
    outcome: Result<CatalogPage, PortError>,
}

impl SearchOrchestrator {
    pub fn spawn(catalog: Arc<dyn CatalogSource>, trending: Arc<dyn TrendingStore>) -> Self {
        let (terms, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SearchResultState::default());
        let task = tokio::spawn(run(catalog, trending, rx, state_tx));
        Self {
            terms: Some(terms),
            state,
            task: Some(task),
        }
    }

    /// Starts a fetch for `term`, superseding whatever is in flight.
    pub fn on_debounced_term_change(&self, term: impl Into<String>) -> bool {
        self.terms
            .as_ref()
            .is_some_and(|terms| terms.send(term.into()).is_ok())
    }

    /// Channel a [`Debouncer`](crate::search::Debouncer) can emit into.
    pub fn term_sink(&self) -> Option<UnboundedSender<String>> {
        self.terms.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchResultState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SearchResultState {
        self.state.borrow().clone()
    }

    /// Stops accepting terms and waits for the loop to finish outstanding
    /// trending writes. Other holders of [`term_sink`](Self::term_sink) must be
    /// dropped first.
    pub async fn shutdown(mut self) {
        self.terms.take();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "search loop ended abnormally");
            }
        }
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    catalog: Arc<dyn CatalogSource>,
    trending: Arc<dyn TrendingStore>,
    mut terms: UnboundedReceiver<String>,
    state: watch::Sender<SearchResultState>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completed>();
    let mut records = JoinSet::new();
    let mut generation: u64 = 0;
    let mut in_flight: Option<InFlight> = None;

    loop {
        tokio::select! {
            term = terms.recv() => {
                let Some(term) = term else { break };
                if let Some(previous) = in_flight.take() {
                    debug!(generation = previous.generation, "superseding in-flight fetch");
                }
                generation += 1;
                state.send_modify(|current| current.begin(&term));
                debug!(generation, term = %term, "catalog fetch started");
                in_flight = Some(start_fetch(generation, term, catalog.clone(), done_tx.clone()));
            }
            Some(done) = done_rx.recv() => {
                if done.generation != generation {
                    debug!(stale = done.generation, current = generation, "dropping stale catalog response");
                    continue;
                }
                in_flight.take();
                let Completed { term, outcome, .. } = done;
                let mut candidate = None;
                state.send_modify(|current| {
                    candidate = apply_outcome(&mut current.list, &term, outcome);
                });
                if let Some(movie) = candidate {
                    let trending = trending.clone();
                    records.spawn(record_search(trending, term, movie));
                }
            }
            Some(joined) = records.join_next(), if !records.is_empty() => {
                if let Err(err) = joined {
                    warn!(error = %err, "trending record task failed");
                }
            }
        }
    }

    if let Some(previous) = in_flight.take() {
        debug!(generation = previous.generation, "abandoning in-flight fetch");
    }
    if !records.is_empty() {
        let drain = async { while records.join_next().await.is_some() {} };
        if timeout(RECORD_DRAIN_TIMEOUT, drain).await.is_err() {
            warn!(pending = records.len(), "trending writes still pending at shutdown");
        }
    }
}

fn start_fetch(
    generation: u64,
    term: String,
    catalog: Arc<dyn CatalogSource>,
    done: UnboundedSender<Completed>,
) -> InFlight {
    let handle = tokio::spawn(async move {
        let query = CatalogQuery::from_term(&term);
        let outcome = catalog.query(&query).await;
        // The loop may already have moved on; a closed channel is fine.
        let _ = done.send(Completed {
            generation,
            term,
            outcome,
        });
    });
    InFlight { generation, handle }
}

/// Commits one fetch outcome and returns the movie to record as trending,
/// if any.
pub(crate) fn apply_outcome(
    list: &mut ListState<MovieSummary>,
    term: &str,
    outcome: Result<CatalogPage, PortError>,
) -> Option<MovieSummary> {
    match outcome {
        Err(err) => {
            error!(term = %term, error = %err, "catalog fetch failed");
            list.fail(GENERIC_ERROR);
            None
        }
        Ok(page) if !page.response_ok => {
            let message = page
                .message
                .unwrap_or_else(|| SERVICE_FALLBACK_ERROR.to_string());
            warn!(term = %term, message = %message, "catalog rejected query");
            list.fail(message);
            None
        }
        Ok(page) => {
            let candidate = if term.is_empty() {
                None
            } else {
                page.results.first().cloned()
            };
            debug!(term = %term, results = page.results.len(), "catalog fetch succeeded");
            list.succeed(page.results);
            candidate
        }
    }
}

async fn record_search(trending: Arc<dyn TrendingStore>, term: String, movie: MovieSummary) {
    match trending.record_search(&term, &movie).await {
        Ok(()) => debug!(term = %term, movie_id = movie.id, "trending search recorded"),
        Err(err) => warn!(term = %term, error = %err, "trending search record failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use cinefind_core::domain::movie::{CatalogPage, CatalogQuery, MovieSummary};
    use cinefind_core::domain::state::{ListState, LoadStatus, SearchResultState};
    use cinefind_core::domain::trending::TrendingEntry;
    use cinefind_infra::appwrite::AppwriteError;
    use cinefind_infra::catalog::CatalogError;
    use reqwest::StatusCode;
    use tokio::sync::watch;
    use tokio::time::sleep;

    use super::{apply_outcome, SearchOrchestrator, GENERIC_ERROR, SERVICE_FALLBACK_ERROR};
    use crate::search::ports::{CatalogSource, PortError, TrendingStore};

    #[derive(Clone)]
    enum Reply {
        Page(CatalogPage),
        Status(StatusCode),
    }

    #[derive(Default)]
    struct FakeCatalog {
        replies: HashMap<String, (Duration, Reply)>,
        queries: Mutex<Vec<CatalogQuery>>,
    }

    impl FakeCatalog {
        fn reply(mut self, term: &str, delay_ms: u64, reply: Reply) -> Self {
            self.replies
                .insert(term.to_string(), (Duration::from_millis(delay_ms), reply));
            self
        }

        fn queries(&self) -> Vec<CatalogQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, PortError> {
            self.queries.lock().unwrap().push(query.clone());
            let key = query.term().unwrap_or_default();
            let (delay, reply) = self
                .replies
                .get(key)
                .cloned()
                .unwrap_or((Duration::ZERO, Reply::Page(CatalogPage::ok(Vec::new()))));
            sleep(delay).await;
            match reply {
                Reply::Page(page) => Ok(page),
                Reply::Status(status) => Err(CatalogError::Status {
                    status,
                    body: String::new(),
                }
                .into()),
            }
        }
    }

    #[derive(Default)]
    struct FakeTrending {
        fail: bool,
        recorded: Mutex<Vec<(String, MovieSummary)>>,
    }

    impl FakeTrending {
        fn recorded(&self) -> Vec<(String, MovieSummary)> {
            self.recorded.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TrendingStore for FakeTrending {
        async fn record_search(&self, term: &str, movie: &MovieSummary) -> Result<(), PortError> {
            self.recorded
                .lock()
                .unwrap()
                .push((term.to_string(), movie.clone()));
            if self.fail {
                return Err(AppwriteError::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: String::new(),
                }
                .into());
            }
            Ok(())
        }

        async fn list_top_entries(&self, _limit: usize) -> Result<Vec<TrendingEntry>, PortError> {
            Ok(Vec::new())
        }
    }

    fn movies(ids: &[i64]) -> Vec<MovieSummary> {
        ids.iter()
            .map(|id| MovieSummary::new(*id, format!("Movie {id}")))
            .collect()
    }

    async fn settled(
        rx: &mut watch::Receiver<SearchResultState>,
        term: &str,
    ) -> SearchResultState {
        rx.wait_for(|state| state.term == term && state.list.is_settled())
            .await
            .unwrap()
            .clone()
    }

    fn spawn(
        catalog: FakeCatalog,
        trending: FakeTrending,
    ) -> (SearchOrchestrator, Arc<FakeCatalog>, Arc<FakeTrending>) {
        let catalog = Arc::new(catalog);
        let trending = Arc::new(trending);
        let orchestrator = SearchOrchestrator::spawn(catalog.clone(), trending.clone());
        (orchestrator, catalog, trending)
    }

    #[tokio::test(start_paused = true)]
    async fn search_success_records_first_result() {
        let catalog = FakeCatalog::default().reply(
            "batman",
            10,
            Reply::Page(CatalogPage::ok(vec![MovieSummary::new(1, "Batman")])),
        );
        let (orchestrator, catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("batman");
        let state = settled(&mut rx, "batman").await;
        assert_eq!(state.list.status, LoadStatus::Ready);
        assert_eq!(state.list.items, vec![MovieSummary::new(1, "Batman")]);
        assert!(state.list.error_message.is_none());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            trending.recorded(),
            vec![("batman".to_string(), MovieSummary::new(1, "Batman"))]
        );
        assert_eq!(
            catalog.queries(),
            vec![CatalogQuery::Search {
                term: "batman".to_string()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_term_queries_popular_without_recording() {
        let catalog = FakeCatalog::default().reply(
            "",
            10,
            Reply::Page(CatalogPage::ok(movies(&(1..=20).collect::<Vec<_>>()))),
        );
        let (orchestrator, catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("");
        let state = settled(&mut rx, "").await;
        assert_eq!(state.list.status, LoadStatus::Ready);
        assert_eq!(state.list.items.len(), 20);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(catalog.queries(), vec![CatalogQuery::Popular]);
        assert!(trending.recorded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_results_is_ready_and_not_recorded() {
        let catalog =
            FakeCatalog::default().reply("zzzz", 10, Reply::Page(CatalogPage::ok(Vec::new())));
        let (orchestrator, _catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("zzzz");
        let state = settled(&mut rx, "zzzz").await;
        assert_eq!(state.list.status, LoadStatus::Ready);
        assert!(state.list.items.is_empty());

        sleep(Duration::from_millis(10)).await;
        assert!(trending.recorded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn http_failure_shows_generic_message() {
        let catalog = FakeCatalog::default()
            .reply(
                "batman",
                10,
                Reply::Page(CatalogPage::ok(vec![MovieSummary::new(1, "Batman")])),
            )
            .reply("broken", 10, Reply::Status(StatusCode::INTERNAL_SERVER_ERROR));
        let (orchestrator, _catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("batman");
        settled(&mut rx, "batman").await;
        orchestrator.on_debounced_term_change("broken");
        let state = settled(&mut rx, "broken").await;
        assert_eq!(state.list.status, LoadStatus::Error);
        assert_eq!(state.list.error_message.as_deref(), Some(GENERIC_ERROR));
        assert!(state.list.items.is_empty());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(trending.recorded().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn service_rejection_uses_service_message() {
        let catalog = FakeCatalog::default().reply(
            "x",
            10,
            Reply::Page(CatalogPage::rejected(Some("X".to_string()))),
        );
        let (orchestrator, _catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("x");
        let state = settled(&mut rx, "x").await;
        assert_eq!(state.list.status, LoadStatus::Error);
        assert_eq!(state.list.error_message.as_deref(), Some("X"));
        assert!(state.list.items.is_empty());
        assert!(trending.recorded().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_term() {
        let catalog = FakeCatalog::default()
            .reply(
                "bat",
                500,
                Reply::Page(CatalogPage::ok(movies(&[1, 2]))),
            )
            .reply(
                "batman",
                20,
                Reply::Page(CatalogPage::ok(movies(&[3]))),
            );
        let (orchestrator, _catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("bat");
        sleep(Duration::from_millis(5)).await;
        orchestrator.on_debounced_term_change("batman");

        let state = settled(&mut rx, "batman").await;
        assert_eq!(state.list.items, movies(&[3]));

        sleep(Duration::from_millis(1_000)).await;
        let state = orchestrator.snapshot();
        assert_eq!(state.term, "batman");
        assert_eq!(state.list.items, movies(&[3]));
        assert_eq!(
            trending.recorded(),
            vec![("batman".to_string(), MovieSummary::new(3, "Movie 3"))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn trending_failure_keeps_ready_state() {
        let catalog = FakeCatalog::default().reply(
            "batman",
            10,
            Reply::Page(CatalogPage::ok(vec![MovieSummary::new(1, "Batman")])),
        );
        let trending = FakeTrending {
            fail: true,
            ..FakeTrending::default()
        };
        let (orchestrator, _catalog, trending) = spawn(catalog, trending);
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("batman");
        settled(&mut rx, "batman").await;
        sleep(Duration::from_millis(50)).await;

        assert_eq!(trending.recorded().len(), 1);
        let state = orchestrator.snapshot();
        assert_eq!(state.list.status, LoadStatus::Ready);
        assert_eq!(state.list.items.len(), 1);
        assert!(state.list.error_message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_trending_write() {
        let catalog = FakeCatalog::default().reply(
            "batman",
            10,
            Reply::Page(CatalogPage::ok(vec![MovieSummary::new(1, "Batman")])),
        );
        let (orchestrator, _catalog, trending) = spawn(catalog, FakeTrending::default());
        let mut rx = orchestrator.subscribe();

        orchestrator.on_debounced_term_change("batman");
        settled(&mut rx, "batman").await;
        orchestrator.shutdown().await;
        assert_eq!(trending.recorded().len(), 1);
    }

    #[test]
    fn apply_outcome_falls_back_to_generic_service_message() {
        let mut list = ListState::default();
        let candidate = apply_outcome(&mut list, "x", Ok(CatalogPage::rejected(None)));
        assert!(candidate.is_none());
        assert_eq!(list.status, LoadStatus::Error);
        assert_eq!(list.error_message.as_deref(), Some(SERVICE_FALLBACK_ERROR));
    }

    #[test]
    fn apply_outcome_preserves_result_order() {
        let mut list = ListState::default();
        let candidate = apply_outcome(&mut list, "movie", Ok(CatalogPage::ok(movies(&[9, 4, 7]))));
        assert_eq!(list.items, movies(&[9, 4, 7]));
        assert_eq!(candidate, Some(MovieSummary::new(9, "Movie 9")));
    }
}
