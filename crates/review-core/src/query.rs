use review_models::ReviewRecord;

use crate::store::{ReviewStore, StoreError};

/// Read-only boundary for the rendering layer. Always answers from the
/// durable store, so page rendering is decoupled from live-fetch
/// latency and provider failures.
pub struct QueryFacade {
    store: ReviewStore,
}

impl QueryFacade {
    pub fn new(store: ReviewStore) -> Self {
        Self { store }
    }

    pub async fn list_active(&self, page: u32, per_page: u32) -> Result<Vec<ReviewRecord>, StoreError> {
        self.store.list_active(page, per_page).await
    }

    pub async fn count_active(&self) -> Result<i64, StoreError> {
        self.store.count_active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use review_models::ReviewSource;

    #[tokio::test]
    async fn test_lists_only_active_reviews_in_order() {
        let store = ReviewStore::open_in_memory().await.unwrap();
        for (id, days_ago, active) in [("a", 5, true), ("b", 1, true), ("c", 2, false)] {
            let mut r = ReviewRecord::new(id.to_string(), ReviewSource::Google);
            r.author_name = "A".to_string();
            r.text = "t".to_string();
            r.review_date = Utc::now() - Duration::days(days_ago);
            r.is_active = active;
            store.insert_review(&r).await.unwrap();
        }

        let facade = QueryFacade::new(store);
        let listed = facade.list_active(1, 10).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(facade.count_active().await.unwrap(), 2);
    }
}
