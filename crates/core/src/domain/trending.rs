use chrono::{DateTime, Utc};

use crate::domain::movie::MovieSummary;
use crate::types::search_key::SearchKey;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingEntry {
    pub id: String,
    pub search_term: String,
    pub title: String,
    pub poster_url: String,
    pub movie_id: i64,
    pub search_count: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Denormalized write for a recorded search: the key plus the top hit's
/// display fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingRecord {
    pub key: SearchKey,
    pub movie_id: i64,
    pub title: String,
    pub poster_url: String,
}

impl TrendingRecord {
    pub fn new(key: SearchKey, movie: &MovieSummary) -> Self {
        Self {
            key,
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: movie.poster_url(),
        }
    }
}
