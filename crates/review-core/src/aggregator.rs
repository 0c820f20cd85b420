use chrono::Utc;
use futures::future::join_all;
use review_models::ReviewRecord;
use review_sources::{fallback_reviews, ReviewProvider, SourceError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{PageCache, ReviewPage};

/// Orchestrates the provider fan-out, merge and page cache.
///
/// Providers are injected at construction; the aggregator neither
/// builds nor owns any global client instances, so tests drive it with
/// fakes.
pub struct ReviewAggregator {
    providers: Vec<Arc<dyn ReviewProvider>>,
    cache: PageCache,
    max_results: usize,
    call_timeout: Duration,
}

impl ReviewAggregator {
    pub fn new(
        providers: Vec<Arc<dyn ReviewProvider>>,
        cache_ttl: Duration,
        max_results: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            cache: PageCache::new(cache_ttl),
            // Quota protection: never ask a provider for more than 50
            max_results: max_results.min(50),
            call_timeout,
        }
    }

    /// Cache-first page lookup. On a miss every configured provider is
    /// called concurrently; whatever subset succeeds is merged. Partial
    /// source failure is not a request failure, and when every source
    /// fails the caller still gets a structurally valid fallback page.
    pub async fn get_reviews(&self, page: u32, per_page: u32) -> anyhow::Result<ReviewPage> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        if let Some(hit) = self.cache.get(page, per_page) {
            return Ok(hit);
        }

        let (mut merged, sources_used) = self.fetch_all().await;

        if merged.is_empty() {
            warn!("All review sources failed or returned nothing; serving fallback data");
            merged = fallback_reviews();
        }

        // Featured reviews first, then newest
        merged.sort_by(|a, b| {
            b.is_featured
                .cmp(&a.is_featured)
                .then(b.review_date.cmp(&a.review_date))
        });

        let total = merged.len();
        let has_next = total > (page as usize) * (per_page as usize);
        let start = ((page - 1) as usize) * (per_page as usize);
        let reviews: Vec<ReviewRecord> = merged
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        let result = ReviewPage {
            reviews,
            has_next,
            total,
            sources_used,
            fetched_at: Utc::now(),
        };
        self.cache.insert(page, per_page, result.clone());
        Ok(result)
    }

    /// Concurrent fan-out to all providers with a per-call timeout.
    /// Failures are logged and absorbed; the per-source flags record
    /// who actually delivered.
    async fn fetch_all(&self) -> (Vec<ReviewRecord>, HashMap<String, bool>) {
        let calls = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let max_results = self.max_results;
            let timeout = self.call_timeout;
            async move {
                let name = provider.name().to_string();
                let outcome = match tokio::time::timeout(timeout, provider.fetch_reviews(max_results)).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::new(
                        name.clone(),
                        format!("timed out after {:?}", timeout),
                    )),
                };
                (name, outcome)
            }
        });

        let mut merged = Vec::new();
        let mut sources_used = HashMap::new();
        for (name, outcome) in join_all(calls).await {
            match outcome {
                Ok(records) => {
                    debug!(provider = %name, count = records.len(), "Provider delivered");
                    sources_used.insert(name, !records.is_empty());
                    merged.extend(records);
                }
                Err(err) => {
                    warn!(provider = %name, error = %err, "Provider failed; continuing without it");
                    sources_used.insert(name, false);
                }
            }
        }
        (merged, sources_used)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Review page cache cleared");
    }

    /// Per-provider readiness (credentials/config present). Operational
    /// visibility only; the merge logic never consults this.
    pub fn sources_status(&self) -> HashMap<String, bool> {
        self.providers
            .iter()
            .map(|p| (p.name().to_string(), p.is_configured()))
            .collect()
    }
}
