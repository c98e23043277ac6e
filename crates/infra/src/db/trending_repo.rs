use chrono::{DateTime, Utc};
use cinefind_core::domain::trending::{TrendingEntry, TrendingRecord};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendingRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TrendingRow {
    id: i64,
    search_term: String,
    title: String,
    poster_url: String,
    movie_id: i64,
    count: i64,
    updated_at: DateTime<Utc>,
}

impl From<TrendingRow> for TrendingEntry {
    fn from(row: TrendingRow) -> Self {
        TrendingEntry {
            id: row.id.to_string(),
            search_term: row.search_term,
            title: row.title,
            poster_url: row.poster_url,
            movie_id: row.movie_id,
            search_count: row.count,
            updated_at: Some(row.updated_at),
        }
    }
}

/// Inserts the term with a count of one, or bumps the count of an existing
/// row. The denormalized movie fields are only written on first insert.
pub async fn record_search(
    pool: &PgPool,
    record: &TrendingRecord,
) -> Result<(), TrendingRepoError> {
    sqlx::query(
        r#"
        INSERT INTO trending_searches (search_term, count, movie_id, title, poster_url)
        VALUES ($1, 1, $2, $3, $4)
        ON CONFLICT (search_term) DO UPDATE
        SET count = trending_searches.count + 1,
            updated_at = NOW()
        "#,
    )
    .bind(record.key.as_str())
    .bind(record.movie_id)
    .bind(&record.title)
    .bind(&record.poster_url)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_top_entries(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<TrendingEntry>, TrendingRepoError> {
    let rows = sqlx::query_as::<_, TrendingRow>(
        r#"
        SELECT id, search_term, title, poster_url, movie_id, count, updated_at
        FROM trending_searches
        ORDER BY count DESC, updated_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(TrendingEntry::from).collect())
}
