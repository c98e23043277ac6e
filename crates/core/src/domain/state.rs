use crate::domain::movie::MovieSummary;
use crate::domain::trending::TrendingEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Observable state of one asynchronously loaded list.
///
/// `items` is always empty while `status` is `Error`. Items from the previous
/// load stay visible while a new load is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub status: LoadStatus,
    pub items: Vec<T>,
    pub error_message: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            items: Vec::new(),
            error_message: None,
        }
    }
}

impl<T> ListState<T> {
    pub fn begin_loading(&mut self) {
        self.status = LoadStatus::Loading;
        self.error_message = None;
    }

    pub fn succeed(&mut self, items: Vec<T>) {
        self.status = LoadStatus::Ready;
        self.items = items;
        self.error_message = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = LoadStatus::Error;
        self.items.clear();
        self.error_message = Some(message.into());
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status, LoadStatus::Ready | LoadStatus::Error)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResultState {
    /// Debounced term the current status belongs to.
    pub term: String,
    pub list: ListState<MovieSummary>,
}

impl SearchResultState {
    pub fn begin(&mut self, term: &str) {
        self.term.clear();
        self.term.push_str(term);
        self.list.begin_loading();
    }
}

pub type TrendingState = ListState<TrendingEntry>;
