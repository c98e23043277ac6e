use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const POSTER_PLACEHOLDER: &str = "/no-movie.png";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
}

impl MovieSummary {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            popularity: 0.0,
            release_date: None,
            vote_average: None,
            original_language: None,
        }
    }

    /// Absolute poster URL, or the placeholder image when the catalog has none.
    pub fn poster_url(&self) -> String {
        match self.poster_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => format!("{POSTER_BASE_URL}{path}"),
            _ => POSTER_PLACEHOLDER.to_string(),
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        let raw = self.release_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.year());
        }
        raw.split('-').next()?.parse().ok()
    }

    pub fn rating_label(&self) -> String {
        match self.vote_average {
            Some(value) if value > 0.0 => format!("{value:.1}"),
            _ => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// Popular titles ordered by popularity, descending.
    Popular,
    Search { term: String },
}

impl CatalogQuery {
    pub fn from_term(term: &str) -> Self {
        if term.is_empty() {
            CatalogQuery::Popular
        } else {
            CatalogQuery::Search {
                term: term.to_string(),
            }
        }
    }

    pub fn term(&self) -> Option<&str> {
        match self {
            CatalogQuery::Popular => None,
            CatalogQuery::Search { term } => Some(term),
        }
    }
}

/// One catalog response after envelope decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub results: Vec<MovieSummary>,
    pub response_ok: bool,
    pub message: Option<String>,
}

impl CatalogPage {
    pub fn ok(results: Vec<MovieSummary>) -> Self {
        Self {
            results,
            response_ok: true,
            message: None,
        }
    }

    pub fn rejected(message: Option<String>) -> Self {
        Self {
            results: Vec::new(),
            response_ok: false,
            message,
        }
    }
}
