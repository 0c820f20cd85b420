use async_trait::async_trait;
use review_models::{ReviewRecord, ReviewSource};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::traits::ReviewProvider;
use crate::tripadvisor::parser::{self, LocationSearchResponse};

const API_BASE: &str = "https://api.content.tripadvisor.com/api/v1";
const PROVIDER: &str = "tripadvisor";

/// TripAdvisor Content API provider. If only a search query is
/// configured, the location id is resolved once through the location
/// search endpoint and reused for the life of the client.
pub struct TripadvisorClient {
    client: Client,
    api_key: String,
    language: String,
    search_query: Option<String>,
    resolved_location: Mutex<Option<String>>,
}

impl TripadvisorClient {
    pub fn new(
        api_key: String,
        location_id: Option<String>,
        search_query: Option<String>,
        language: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            language,
            search_query,
            resolved_location: Mutex::new(location_id.filter(|id| !id.trim().is_empty())),
        }
    }

    async fn location_id(&self) -> Result<String, SourceError> {
        let mut cached = self.resolved_location.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let query = self
            .search_query
            .as_deref()
            .ok_or_else(|| SourceError::new(PROVIDER, "No location_id or search_query configured"))?;

        let url = format!("{}/location/search", API_BASE);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("searchQuery", query),
                ("category", "attractions"),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::from_http(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(SourceError::new(
                PROVIDER,
                format!("Location search returned HTTP {}", response.status()),
            ));
        }

        let search: LocationSearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::new(PROVIDER, format!("Malformed search payload: {}", e)))?;

        let first = search
            .data
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::new(PROVIDER, format!("No locations found for {:?}", query)))?;

        info!(
            provider = PROVIDER,
            location_id = %first.location_id,
            name = first.name.as_deref().unwrap_or("?"),
            "Resolved TripAdvisor location"
        );
        *cached = Some(first.location_id.clone());
        Ok(first.location_id)
    }
}

#[async_trait]
impl ReviewProvider for TripadvisorClient {
    fn source(&self) -> ReviewSource {
        ReviewSource::Tripadvisor
    }

    fn is_configured(&self) -> bool {
        // The lock is uncontended outside an in-flight fetch
        let has_location = self
            .resolved_location
            .try_lock()
            .map(|guard| guard.is_some())
            .unwrap_or(true);
        !self.api_key.is_empty() && (has_location || self.search_query.is_some())
    }

    async fn fetch_reviews(&self, max_results: usize) -> Result<Vec<ReviewRecord>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::new(PROVIDER, "API key not configured"));
        }

        let location_id = self.location_id().await?;
        let url = format!("{}/location/{}/reviews", API_BASE, location_id);
        let limit = max_results.min(50).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("language", self.language.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::from_http(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(SourceError::new(
                PROVIDER,
                format!("Reviews endpoint returned HTTP {}", response.status()),
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::new(PROVIDER, format!("Malformed payload: {}", e)))?;

        let raw_reviews = payload
            .get("data")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        debug!(provider = PROVIDER, raw_count = raw_reviews.len(), "Fetched raw reviews");

        let mut records = Vec::new();
        for raw in raw_reviews.into_iter().take(max_results) {
            let review: parser::TripadvisorReview = match serde_json::from_value(raw.clone()) {
                Ok(review) => review,
                Err(e) => {
                    warn!(provider = PROVIDER, error = %e, "Skipping unparseable review entry");
                    continue;
                }
            };
            match parser::normalize(review, raw) {
                Some(record) => records.push(record),
                None => warn!(provider = PROVIDER, "Dropped review failing normalization"),
            }
        }

        debug!(provider = PROVIDER, count = records.len(), "Normalized reviews");
        Ok(records)
    }
}
