use async_trait::async_trait;
use review_models::{ReviewRecord, ReviewSource};
use crate::error::SourceError;

/// One external review API. Implementations own nothing beyond the
/// call in flight: no caching, no persistence, no shared state.
///
/// The aggregator takes these by injection, so tests swap in fakes
/// without touching any provider code.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    fn source(&self) -> ReviewSource;

    fn name(&self) -> &'static str {
        self.source().as_str()
    }

    /// Whether the provider has everything it needs (API key, business
    /// id) to make a live call. Used by operational status reporting,
    /// not by the merge logic.
    fn is_configured(&self) -> bool;

    /// Fetch up to `max_results` reviews, already normalized into
    /// `ReviewRecord`. Transport errors, HTTP >= 400 and malformed
    /// payloads come back as `SourceError`; this never panics and the
    /// caller never gets a partially-parsed batch mixed with garbage.
    async fn fetch_reviews(&self, max_results: usize) -> Result<Vec<ReviewRecord>, SourceError>;
}
