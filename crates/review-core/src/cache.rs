use chrono::{DateTime, Utc};
use review_models::ReviewRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// One merged, ordered page of reviews as served to callers and as
/// stored in the cache.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewRecord>,
    pub has_next: bool,
    /// Merged record count across all pages, not just this one.
    pub total: usize,
    /// Per-provider success flags for the fetch that built this page.
    pub sources_used: HashMap<String, bool>,
    pub fetched_at: DateTime<Utc>,
}

/// In-process TTL cache keyed by `(page, per_page)`. Entries are only
/// ever replaced whole; there is no partial mutation, so concurrent
/// readers never observe a half-written page.
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<(u32, u32), (Instant, ReviewPage)>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, page: u32, per_page: u32) -> Option<ReviewPage> {
        let mut entries = self.entries.lock().expect("page cache poisoned");
        match entries.get(&(page, per_page)) {
            Some((stored_at, cached)) if stored_at.elapsed() < self.ttl => {
                debug!(page, per_page, "Page cache hit");
                Some(cached.clone())
            }
            Some(_) => {
                debug!(page, per_page, "Page cache entry expired");
                entries.remove(&(page, per_page));
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, page: u32, per_page: u32, value: ReviewPage) {
        let mut entries = self.entries.lock().expect("page cache poisoned");
        entries.insert((page, per_page), (Instant::now(), value));
    }

    /// Drop every cached page. The next `get_reviews` is forced to hit
    /// the providers.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("page cache poisoned");
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Page cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("page cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
