use cinefind_core::domain::movie::{CatalogPage, CatalogQuery, MovieSummary};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const BODY_LOG_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid catalog payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Option<Vec<MovieSummary>>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

impl TmdbClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn endpoint(&self, query: &CatalogQuery) -> Result<Url, CatalogError> {
        let (path, params) = match query {
            CatalogQuery::Popular => ("discover/movie", [("sort_by", "popularity.desc")]),
            CatalogQuery::Search { term } => ("search/movie", [("query", term.as_str())]),
        };
        Url::parse_with_params(&format!("{}/{path}", self.base_url), params)
            .map_err(|err| CatalogError::InvalidUrl(err.to_string()))
    }

    pub async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let url = self.endpoint(query)?;
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status,
                body: truncate_body(body),
            });
        }
        decode_page(&body)
    }
}

/// Decodes a 2xx catalog body, honouring the `response: "False"` envelope.
pub fn decode_page(body: &str) -> Result<CatalogPage, CatalogError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.response.as_ref().is_some_and(is_false_flag) || envelope.success == Some(false) {
        let message = envelope
            .error
            .or(envelope.status_message)
            .filter(|message| !message.trim().is_empty());
        return Ok(CatalogPage::rejected(message));
    }
    Ok(CatalogPage::ok(envelope.results.unwrap_or_default()))
}

fn is_false_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => !flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("false"),
        _ => false,
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > BODY_LOG_LIMIT {
        let mut cut = BODY_LOG_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
