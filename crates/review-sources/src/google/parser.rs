use chrono::{DateTime, TimeZone, Utc};
use review_models::{ReviewRecord, ReviewSource};
use serde::Deserialize;
use tracing::debug;
use crate::normalize::{clean_author_name, truncate_chars};

/// Place Details response, trimmed to the fields we read.
#[derive(Debug, Deserialize)]
pub struct PlaceDetailsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub reviews: Vec<GoogleReview>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleReview {
    pub author_name: String,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    pub rating: i64,
    #[serde(default)]
    pub text: String,
    /// Unix seconds of authorship.
    pub time: i64,
}

/// Google does not expose a review id, so identity is derived from the
/// authorship timestamp plus author name. Both are stable for a given
/// review, which keeps the upsert key stable across refreshes.
pub fn external_id(review: &GoogleReview) -> String {
    let author_slug: String = review
        .author_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("google_{}_{}", review.time, truncate_chars(&author_slug, 40))
}

/// Map one raw Google review into the canonical record. Returns None
/// for out-of-range ratings (the record is skipped, not clamped).
pub fn normalize(review: GoogleReview, raw: serde_json::Value) -> Option<ReviewRecord> {
    let rating = crate::normalize::rating_in_range(review.rating)?;
    let review_date = parse_unix_time(review.time)?;

    let mut record = ReviewRecord::new(external_id(&review), ReviewSource::Google);
    record.author_name = clean_author_name(&review.author_name);
    record.author_photo_url = review.profile_photo_url.filter(|url| !url.is_empty());
    record.rating = rating;
    record.text = review.text;
    record.review_date = review_date;
    record.refresh_relative_time(Utc::now());
    record.raw_data = Some(raw);

    if record.author_name.is_empty() {
        debug!("Skipping Google review with empty author name");
        return None;
    }
    Some(record)
}

fn parse_unix_time(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_review(rating: i64) -> (GoogleReview, serde_json::Value) {
        let raw = serde_json::json!({
            "author_name": "Jane Doe",
            "profile_photo_url": "https://lh3.googleusercontent.com/a/photo",
            "rating": rating,
            "text": "Fantastic day trip, would book again.",
            "time": 1_700_000_000,
        });
        let review: GoogleReview = serde_json::from_value(raw.clone()).unwrap();
        (review, raw)
    }

    #[test]
    fn test_normalize_maps_all_fields() {
        let (review, raw) = sample_review(5);
        let record = normalize(review, raw).unwrap();
        assert_eq!(record.source, ReviewSource::Google);
        assert_eq!(record.author_name, "Jane Doe");
        assert_eq!(record.rating, 5);
        assert!(record.author_photo_url.is_some());
        assert!(record.raw_data.is_some());
        assert_eq!(record.review_date.timestamp(), 1_700_000_000);
        assert!(record.is_active);
        assert!(!record.is_featured);
    }

    #[test]
    fn test_out_of_range_rating_is_rejected() {
        for bad in [0, 6] {
            let (review, raw) = sample_review(bad);
            assert!(normalize(review, raw).is_none());
        }
    }

    #[test]
    fn test_external_id_is_deterministic() {
        let (a, raw_a) = sample_review(4);
        let (b, _) = sample_review(4);
        assert_eq!(external_id(&a), external_id(&b));
        let record = normalize(a, raw_a).unwrap();
        assert!(record.external_id.starts_with("google_1700000000_jane_doe"));
    }

    #[test]
    fn test_parses_place_details_payload() {
        let payload = serde_json::json!({
            "status": "OK",
            "result": {
                "reviews": [
                    {"author_name": "A", "rating": 5, "text": "ok", "time": 1_700_000_000},
                    {"author_name": "B", "rating": 3, "text": "meh", "time": 1_700_000_100},
                ]
            }
        });
        let parsed: PlaceDetailsResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.status, "OK");
        assert_eq!(parsed.result.unwrap().reviews.len(), 2);
    }

    #[test]
    fn test_missing_result_parses_as_empty() {
        let payload = serde_json::json!({"status": "REQUEST_DENIED", "error_message": "bad key"});
        let parsed: PlaceDetailsResponse = serde_json::from_value(payload).unwrap();
        assert!(parsed.result.is_none());
        assert_eq!(parsed.error_message.as_deref(), Some("bad key"));
    }
}
