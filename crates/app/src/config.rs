use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use cinefind_infra::appwrite::AppwriteConfig;
use cinefind_infra::catalog::DEFAULT_BASE_URL;
use thiserror::Error;

use crate::search::debouncer::DEFAULT_DEBOUNCE;
use crate::search::trending_loader::DEFAULT_TRENDING_LIMIT;

const TOKEN_KEY: &str = "CINEFIND_TMDB_API_TOKEN";

#[derive(Clone)]
pub struct AppConfig {
    pub tmdb_base_url: String,
    pub tmdb_api_token: String,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub trending_limit: usize,
    pub database_url: Option<String>,
    pub appwrite: Option<AppwriteConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("tmdb_base_url", &self.tmdb_base_url)
            .field("tmdb_api_token", &"<redacted>")
            .field("debounce", &self.debounce)
            .field("request_timeout", &self.request_timeout)
            .field("trending_limit", &self.trending_limit)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field(
                "appwrite_endpoint",
                &self.appwrite.as_ref().map(|appwrite| appwrite.endpoint.as_str()),
            )
            .finish()
    }
}

/// Process environment first, then values from the `.env` file.
struct Settings<'a> {
    dotenv: &'a HashMap<String, String>,
}

impl Settings<'_> {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.dotenv.get(key).cloned())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn optional(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn number<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber(key, raw)),
            None => Ok(default),
        }
    }
}

impl AppConfig {
    pub fn from_env(dotenv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let settings = Settings { dotenv };

        let tmdb_base_url = settings.string("CINEFIND_TMDB_BASE_URL", DEFAULT_BASE_URL);
        if !tmdb_base_url.starts_with("http://") && !tmdb_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "CINEFIND_TMDB_BASE_URL",
                tmdb_base_url,
            ));
        }
        let tmdb_api_token = settings.required(TOKEN_KEY)?;
        let default_debounce_ms = u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(700);
        let debounce_ms = settings.number("CINEFIND_DEBOUNCE_MS", default_debounce_ms)?;
        let request_timeout_secs = settings.number("CINEFIND_REQUEST_TIMEOUT_SECS", 15u64)?;
        let trending_limit = settings.number("CINEFIND_TRENDING_LIMIT", DEFAULT_TRENDING_LIMIT)?;
        if trending_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "CINEFIND_TRENDING_LIMIT",
                trending_limit.to_string(),
            ));
        }
        let database_url = settings.optional("CINEFIND_DATABASE_URL");
        let appwrite = match settings.optional("CINEFIND_APPWRITE_ENDPOINT") {
            Some(endpoint) => Some(AppwriteConfig {
                endpoint,
                project_id: settings.required("CINEFIND_APPWRITE_PROJECT_ID")?,
                database_id: settings.required("CINEFIND_APPWRITE_DATABASE_ID")?,
                collection_id: settings.required("CINEFIND_APPWRITE_COLLECTION_ID")?,
                api_key: settings.optional("CINEFIND_APPWRITE_API_KEY"),
            }),
            None => None,
        };

        Ok(Self {
            tmdb_base_url,
            tmdb_api_token,
            debounce: Duration::from_millis(debounce_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            trending_limit,
            database_url,
            appwrite,
        })
    }
}

/// Reads `.env` from the working directory. Missing file is not an error.
pub fn load_dotenv() -> Result<HashMap<String, String>, std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_dotenv(&contents))
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents.lines().filter_map(parse_dotenv_line).collect()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), parse_dotenv_value(raw.trim())))
}

fn parse_dotenv_value(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        return unescape(inner);
    }
    if let Some(inner) = raw.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return inner.to_string();
    }
    // Unquoted values may carry a trailing ` # comment`.
    match raw.find(" #") {
        Some(index) => raw[..index].trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn unescape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('r') => output.push('\r'),
            Some('t') => output.push('\t'),
            Some(other @ ('\\' | '"')) => output.push(other),
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }
    output
}
