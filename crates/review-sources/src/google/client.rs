use async_trait::async_trait;
use review_models::{ReviewRecord, ReviewSource};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::google::parser::{self, PlaceDetailsResponse};
use crate::traits::ReviewProvider;

const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const PROVIDER: &str = "google";

/// Google Places provider. Reviews arrive embedded in the Place
/// Details payload; the API caps them at five per call regardless of
/// what we ask for, so `max_results` only trims further.
pub struct GoogleClient {
    client: Client,
    api_key: String,
    place_id: String,
    language: String,
}

impl GoogleClient {
    pub fn new(api_key: String, place_id: String, language: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            place_id,
            language,
        }
    }
}

#[async_trait]
impl ReviewProvider for GoogleClient {
    fn source(&self) -> ReviewSource {
        ReviewSource::Google
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.place_id.is_empty()
    }

    async fn fetch_reviews(&self, max_results: usize) -> Result<Vec<ReviewRecord>, SourceError> {
        if !self.is_configured() {
            return Err(SourceError::new(PROVIDER, "API key or place_id not configured"));
        }

        let response = self
            .client
            .get(DETAILS_URL)
            .query(&[
                ("place_id", self.place_id.as_str()),
                ("fields", "reviews"),
                ("reviews_sort", "newest"),
                ("language", self.language.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::from_http(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(SourceError::new(
                PROVIDER,
                format!("Place Details returned HTTP {}", response.status()),
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::new(PROVIDER, format!("Malformed payload: {}", e)))?;
        let details: PlaceDetailsResponse = serde_json::from_value(payload.clone())
            .map_err(|e| SourceError::new(PROVIDER, format!("Unexpected payload shape: {}", e)))?;

        if details.status != "OK" {
            return Err(SourceError::new(
                PROVIDER,
                format!(
                    "Place Details status {}: {}",
                    details.status,
                    details.error_message.unwrap_or_default()
                ),
            ));
        }

        // Keep the untouched per-review JSON alongside the typed view so
        // raw_data stores exactly what the API sent.
        let raw_reviews = payload
            .pointer("/result/reviews")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        debug!(provider = PROVIDER, raw_count = raw_reviews.len(), "Fetched raw reviews");

        let mut records = Vec::new();
        for raw in raw_reviews.into_iter().take(max_results) {
            let review: parser::GoogleReview = match serde_json::from_value(raw.clone()) {
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
