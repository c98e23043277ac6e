use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use cinefind_core::domain::movie::MovieSummary;
use cinefind_core::domain::trending::{TrendingEntry, TrendingRecord};
use cinefind_core::types::search_key::SearchKey;
use tokio::sync::RwLock;
use tracing::debug;

use crate::search::ports::{PortError, TrendingStore};

/// Process-local trending store, used when no remote backend is configured.
#[derive(Debug, Default)]
pub struct MemoryTrendingStore {
    inner: RwLock<MemoryEntries>,
}

#[derive(Debug, Default)]
struct MemoryEntries {
    entries: HashMap<SearchKey, Slot>,
    next_seq: u64,
}

#[derive(Debug)]
struct Slot {
    seq: u64,
    entry: TrendingEntry,
}

impl MemoryEntries {
    fn record(&mut self, record: TrendingRecord) -> i64 {
        if let Some(slot) = self.entries.get_mut(&record.key) {
            slot.entry.search_count += 1;
            slot.entry.updated_at = Some(Utc::now());
            return slot.entry.search_count;
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        let entry = TrendingEntry {
            id: seq.to_string(),
            search_term: record.key.as_str().to_string(),
            title: record.title,
            poster_url: record.poster_url,
            movie_id: record.movie_id,
            search_count: 1,
            updated_at: Some(Utc::now()),
        };
        self.entries.insert(record.key, Slot { seq, entry });
        1
    }

    fn top(&self, limit: usize) -> Vec<TrendingEntry> {
        let mut slots: Vec<&Slot> = self.entries.values().collect();
        slots.sort_by(|a, b| {
            b.entry
                .search_count
                .cmp(&a.entry.search_count)
                .then(a.seq.cmp(&b.seq))
        });
        slots
            .into_iter()
            .take(limit)
            .map(|slot| slot.entry.clone())
            .collect()
    }
}

#[async_trait]
impl TrendingStore for MemoryTrendingStore {
    async fn record_search(&self, term: &str, movie: &MovieSummary) -> Result<(), PortError> {
        let record = TrendingRecord::new(SearchKey::try_from(term)?, movie);
        let count = self.inner.write().await.record(record);
        debug!(term = %term, count, "trending search recorded in memory");
        Ok(())
    }

    async fn list_top_entries(&self, limit: usize) -> Result<Vec<TrendingEntry>, PortError> {
        Ok(self.inner.read().await.top(limit))
    }
}
