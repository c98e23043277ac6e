//! Trending store backed by an Appwrite documents collection.
//!
//! One document per normalized search term with the attributes
//! `searchTerm`, `count`, `movie_id`, `title` and `poster_url`.

use chrono::{DateTime, Utc};
use cinefind_core::domain::trending::{TrendingEntry, TrendingRecord};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const UNIQUE_ID: &str = "unique()";

#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("appwrite returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid appwrite payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppwriteClient {
    http: reqwest::Client,
    config: AppwriteConfig,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<TrendingDocument>,
}

#[derive(Debug, Deserialize)]
struct TrendingDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "searchTerm", default)]
    search_term: String,
    #[serde(default)]
    count: i64,
    #[serde(default)]
    movie_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    poster_url: String,
    #[serde(rename = "$updatedAt", default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<TrendingDocument> for TrendingEntry {
    fn from(doc: TrendingDocument) -> Self {
        TrendingEntry {
            id: doc.id,
            search_term: doc.search_term,
            title: doc.title,
            poster_url: doc.poster_url,
            movie_id: doc.movie_id,
            search_count: doc.count,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct Query<'a> {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<serde_json::Value>,
}

fn equal(attribute: &str, value: &str) -> Result<String, AppwriteError> {
    let query = Query {
        method: "equal",
        attribute: Some(attribute),
        values: vec![json!(value)],
    };
    Ok(serde_json::to_string(&query)?)
}

fn order_desc(attribute: &str) -> Result<String, AppwriteError> {
    let query = Query {
        method: "orderDesc",
        attribute: Some(attribute),
        values: Vec::new(),
    };
    Ok(serde_json::to_string(&query)?)
}

fn limit(value: i64) -> Result<String, AppwriteError> {
    let query = Query {
        method: "limit",
        attribute: None,
        values: vec![json!(value)],
    };
    Ok(serde_json::to_string(&query)?)
}

impl AppwriteClient {
    pub fn new(http: reqwest::Client, mut config: AppwriteConfig) -> Self {
        config.endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        Self { http, config }
    }

    /// Looks the term up, then patches or creates its document. The read and
    /// the write are separate requests, so two overlapping calls for the same
    /// term can create duplicates or lose an increment.
    pub async fn record_search(&self, record: &TrendingRecord) -> Result<(), AppwriteError> {
        let queries = vec![equal("searchTerm", record.key.as_str())?, limit(1)?];
        let existing = self.list_documents(&queries).await?;
        match existing.documents.into_iter().next() {
            Some(doc) => {
                let body = json!({ "data": { "count": doc.count + 1 } });
                let url = format!("{}/{}", self.documents_url(), doc.id);
                self.send(self.http.patch(url).json(&body)).await?;
            }
            None => {
                let body = json!({
                    "documentId": UNIQUE_ID,
                    "data": {
                        "searchTerm": record.key.as_str(),
                        "count": 1,
                        "movie_id": record.movie_id,
                        "title": record.title,
                        "poster_url": record.poster_url,
                    }
                });
                self.send(self.http.post(self.documents_url()).json(&body))
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn list_top_entries(&self, max: i64) -> Result<Vec<TrendingEntry>, AppwriteError> {
        let queries = vec![order_desc("count")?, limit(max)?];
        let list = self.list_documents(&queries).await?;
        Ok(list.documents.into_iter().map(TrendingEntry::from).collect())
    }

    async fn list_documents(&self, queries: &[String]) -> Result<DocumentList, AppwriteError> {
        let params: Vec<(&str, &str)> = queries
            .iter()
            .map(|query| ("queries[]", query.as_str()))
            .collect();
        let request = self.http.get(self.documents_url()).query(&params);
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, AppwriteError> {
        let mut request = request
            .header(PROJECT_HEADER, self.config.project_id.as_str())
            .header("Accept", "application/json");
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.header(KEY_HEADER, key);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppwriteError::Status { status, body });
        }
        Ok(body)
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint, self.config.database_id, self.config.collection_id
        )
    }
}
