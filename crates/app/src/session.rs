use std::time::Duration;

use cinefind_core::domain::state::{SearchResultState, TrendingState};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::render::{render_search, render_trending};
use crate::search::{Debouncer, SearchOrchestrator, TrendingLoader};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} flow stopped before settling")]
    Closed(&'static str),
}

/// Searches `term` once, prints both lists and returns.
pub async fn run_once(state: &AppState, term: &str, with_trending: bool) -> Result<(), SessionError> {
    let orchestrator = SearchOrchestrator::spawn(state.catalog.clone(), state.trending.clone());
    let trending = with_trending
        .then(|| TrendingLoader::spawn(state.trending.clone(), state.config.trending_limit));

    if let Some(loader) = trending.as_ref() {
        let mut rx = loader.subscribe();
        rx.wait_for(TrendingState::is_settled)
            .await
            .map_err(|_| SessionError::Closed("trending"))?;
        if let Some(text) = render_trending(&loader.snapshot()) {
            println!("{text}");
        }
    }

    let mut results = orchestrator.subscribe();
    orchestrator.on_debounced_term_change(term);
    results
        .wait_for(|current| current.term == term && current.list.is_settled())
        .await
        .map_err(|_| SessionError::Closed("search"))?;
    print!("{}", render_search(&orchestrator.snapshot()));

    orchestrator.shutdown().await;
    Ok(())
}

/// Reads search terms from stdin, one per line, until EOF.
pub async fn run_interactive(
    state: &AppState,
    debounce: Duration,
    with_trending: bool,
) -> Result<(), SessionError> {
    let orchestrator = SearchOrchestrator::spawn(state.catalog.clone(), state.trending.clone());
    let trending = with_trending
        .then(|| TrendingLoader::spawn(state.trending.clone(), state.config.trending_limit));
    let Some(sink) = orchestrator.term_sink() else {
        return Err(SessionError::Closed("search"));
    };
    let debouncer = Debouncer::spawn(debounce, sink);

    let renderer = tokio::spawn(render_loop(
        orchestrator.subscribe(),
        trending.as_ref().map(TrendingLoader::subscribe),
    ));
    orchestrator.on_debounced_term_change("");
    let debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
    info!(debounce_ms, "type a title and press enter; ctrl-d to quit");

    let mut last_term = String::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                debouncer.shutdown();
                renderer.abort();
                return Err(err.into());
            }
        };
        let term = line.trim_end_matches('\r');
        debug!(term = %term, "search term updated");
        if !debouncer.push(term) {
            break;
        }
        last_term.clear();
        last_term.push_str(term);
    }

    // End of input: the last typed term is searched before exiting.
    debouncer.finish().await;
    let mut results = orchestrator.subscribe();
    results
        .wait_for(|current| current.term == last_term && current.list.is_settled())
        .await
        .map_err(|_| SessionError::Closed("search"))?;
    orchestrator.shutdown().await;
    if let Err(err) = renderer.await {
        warn!(error = %err, "render task ended abnormally");
    }
    Ok(())
}

async fn render_loop(
    mut search: watch::Receiver<SearchResultState>,
    mut trending: Option<watch::Receiver<TrendingState>>,
) {
    loop {
        tokio::select! {
            changed = search.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = render_search(&search.borrow_and_update());
                println!("{text}");
            }
            latest = next_trending(&mut trending) => {
                if let Some(text) = render_trending(&latest) {
                    println!("{text}");
                }
            }
        }
    }
}

async fn next_trending(slot: &mut Option<watch::Receiver<TrendingState>>) -> TrendingState {
    loop {
        let Some(rx) = slot.as_mut() else {
            return std::future::pending().await;
        };
        if rx.changed().await.is_ok() {
            return rx.borrow_and_update().clone();
        }
        *slot = None;
    }
}
