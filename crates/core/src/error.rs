use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("empty search term")]
    EmptySearchTerm,
    #[error("search term too long (max {0} chars)")]
    SearchTermTooLong(usize),
}
