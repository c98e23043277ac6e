//! Plain-text views of the two list states for the terminal session.

use std::fmt::Write;

use cinefind_core::domain::state::{LoadStatus, SearchResultState, TrendingState};

pub fn render_search(state: &SearchResultState) -> String {
    let mut out = String::new();
    let heading = if state.term.is_empty() {
        "All Movies".to_string()
    } else {
        format!("All Movies: \"{}\"", state.term)
    };
    let _ = writeln!(out, "{heading}");
    match state.list.status {
        LoadStatus::Idle => {}
        LoadStatus::Loading => out.push_str("  loading...\n"),
        LoadStatus::Error => {
            let message = state.list.error_message.as_deref().unwrap_or_default();
            let _ = writeln!(out, "  ! {message}");
        }
        LoadStatus::Ready if state.list.items.is_empty() => out.push_str("  no movies found\n"),
        LoadStatus::Ready => {
            for movie in &state.list.items {
                let language = movie.original_language.as_deref().unwrap_or("??");
                let year = movie
                    .release_year()
                    .map(|year| year.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                let _ = writeln!(
                    out,
                    "  {} | {} | {} | {}",
                    movie.title,
                    movie.rating_label(),
                    language,
                    year
                );
            }
        }
    }
    out
}

/// `None` while there is nothing worth showing for trending.
pub fn render_trending(state: &TrendingState) -> Option<String> {
    if state.items.is_empty() && state.status != LoadStatus::Error {
        return None;
    }
    let mut out = String::from("Trending Movies\n");
    if let Some(message) = state.error_message.as_deref() {
        let _ = writeln!(out, "  ! {message}");
        return Some(out);
    }
    for (index, entry) in state.items.iter().enumerate() {
        let title = if entry.title.is_empty() {
            entry.search_term.as_str()
        } else {
            entry.title.as_str()
        };
        let _ = writeln!(
            out,
            "  {}. {} ({} searches)",
            index + 1,
            title,
            entry.search_count
        );
    }
    Some(out)
}
