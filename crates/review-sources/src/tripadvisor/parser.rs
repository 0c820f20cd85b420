use chrono::Utc;
use review_models::{ReviewRecord, ReviewSource};
use serde::Deserialize;
use tracing::debug;
use crate::normalize::{clean_author_name, clean_short_description, parse_review_date_or_now, rating_in_range};

#[derive(Debug, Deserialize)]
pub struct ReviewsResponse {
    #[serde(default)]
    pub data: Vec<TripadvisorReview>,
}

#[derive(Debug, Deserialize)]
pub struct TripadvisorReview {
    pub id: i64,
    pub rating: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    /// ISO 8601 with offset, e.g. "2024-01-15T10:30:00-04:00".
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub user: Option<TripadvisorUser>,
}

#[derive(Debug, Deserialize)]
pub struct TripadvisorUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar: Option<TripadvisorAvatar>,
}

#[derive(Debug, Deserialize)]
pub struct TripadvisorAvatar {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationSearchResponse {
    #[serde(default)]
    pub data: Vec<LocationSearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct LocationSearchResult {
    pub location_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub fn external_id(review: &TripadvisorReview) -> String {
    format!("tripadvisor_{}", review.id)
}

/// Map one raw TripAdvisor review into the canonical record. Ratings
/// outside [1,5] reject the record; a missing published_date degrades
/// to "now" rather than dropping the review.
pub fn normalize(review: TripadvisorReview, raw: serde_json::Value) -> Option<ReviewRecord> {
    let rating = rating_in_range(review.rating)?;

    let author = review
        .user
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("TripAdvisor user");
    let photo = review.user.as_ref().and_then(|u| {
        let avatar = u.avatar.as_ref()?;
        avatar.large.clone().or_else(|| avatar.small.clone())
    });

    let mut record = ReviewRecord::new(external_id(&review), ReviewSource::Tripadvisor);
    record.author_name = clean_author_name(author);
    record.author_photo_url = photo.filter(|url| !url.is_empty());
    record.rating = rating;
    record.short_description = review.title.as_deref().and_then(clean_short_description);
    record.text = review.text;
    record.review_date = parse_review_date_or_now(review.published_date.as_deref().unwrap_or(""));
    record.refresh_relative_time(Utc::now());
    record.raw_data = Some(raw);

    if record.text.is_empty() && record.short_description.is_none() {
        debug!("Skipping TripAdvisor review with no content");
        return None;
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> serde_json::Value {
        serde_json::json!({
            "data": [
                {
                    "id": 987654321,
                    "rating": 5,
                    "title": "Take this tour! Its fantastic!",
                    "text": "Our guide was knowledgeable and friendly.",
                    "published_date": "2024-01-15T10:30:00-04:00",
                    "user": {
                        "username": "traveler42",
                        "avatar": {"small": "https://media.ta.com/s.jpg", "large": "https://media.ta.com/l.jpg"}
                    }
                },
                {
                    "id": 987654322,
                    "rating": 9,
                    "text": "rating out of range",
                    "published_date": "2024-01-16T08:00:00-04:00"
                }
            ]
        })
    }

    #[test]
    fn test_parses_reviews_payload() {
        let parsed: ReviewsResponse = serde_json::from_value(sample_payload()).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].id, 987654321);
    }

    #[test]
    fn test_normalize_maps_all_fields() {
        let parsed: ReviewsResponse = serde_json::from_value(sample_payload()).unwrap();
        let raw = serde_json::json!({"id": 987654321});
        let record = normalize(parsed.data.into_iter().next().unwrap(), raw).unwrap();

        assert_eq!(record.external_id, "tripadvisor_987654321");
        assert_eq!(record.source, ReviewSource::Tripadvisor);
        assert_eq!(record.author_name, "traveler42");
        assert_eq!(record.author_photo_url.as_deref(), Some("https://media.ta.com/l.jpg"));
        assert_eq!(record.rating, 5);
        assert_eq!(record.short_description.as_deref(), Some("Take this tour! Its fantastic!"));
        assert_eq!(record.review_date.to_rfc3339(), "2024-01-15T14:30:00+00:00");
    }

    #[test]
    fn test_out_of_range_rating_is_rejected() {
        let parsed: ReviewsResponse = serde_json::from_value(sample_payload()).unwrap();
        let bad = parsed.data.into_iter().nth(1).unwrap();
        assert!(normalize(bad, serde_json::Value::Null).is_none());
    }

    #[test]
    fn test_missing_user_falls_back_to_placeholder_author() {
        let review = TripadvisorReview {
            id: 1,
            rating: 4,
            title: None,
            text: "Anonymous but valid".to_string(),
            published_date: None,
            user: None,
        };
        let record = normalize(review, serde_json::Value::Null).unwrap();
        assert_eq!(record.author_name, "TripAdvisor user");
        assert!(record.author_photo_url.is_none());
    }

    #[test]
    fn test_long_title_truncated_to_limit() {
        let review = TripadvisorReview {
            id: 2,
            rating: 5,
            title: Some("x".repeat(300)),
            text: "body".to_string(),
            published_date: None,
            user: None,
        };
        let record = normalize(review, serde_json::Value::Null).unwrap();
        assert_eq!(record.short_description.unwrap().chars().count(), 200);
    }

    #[test]
    fn test_location_search_response() {
        let payload = serde_json::json!({
            "data": [{"location_id": "123456", "name": "Abroads Tours"}]
        });
        let parsed: LocationSearchResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.data[0].location_id, "123456");
    }
}
