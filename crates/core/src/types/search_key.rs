use std::fmt;

use crate::error::CoreError;

pub const MAX_SEARCH_KEY_LEN: usize = 256;

/// Normalized search term used as the trending-store key.
///
/// Surrounding whitespace is trimmed, inner runs collapse to one space and
/// the result is lowercased, so "  The  Batman " and "the batman" share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey(String);

impl SearchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SearchKey {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::EmptySearchTerm);
        }
        if normalized.chars().count() > MAX_SEARCH_KEY_LEN {
            return Err(CoreError::SearchTermTooLong(MAX_SEARCH_KEY_LEN));
        }
        Ok(SearchKey(normalized))
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
