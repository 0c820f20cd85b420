use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::source::ReviewSource;

pub const SHORT_DESCRIPTION_MAX: usize = 200;
pub const AUTHOR_NAME_MAX: usize = 255;

/// Canonical review shape shared by every layer. Providers map their
/// payloads into this at the normalizer boundary; nothing downstream
/// touches provider-specific JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    /// Provider-assigned identifier, unique within the source. This is
    /// the dedup/upsert key system-wide: never regenerated, never
    /// reused across sources.
    pub external_id: String,
    pub source: ReviewSource,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_photo_url: Option<String>,
    /// 1-5 stars. Records outside this range are rejected at the
    /// normalizer boundary, so stored values are always valid.
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub text: String,
    /// Provider-reported authorship time.
    pub review_date: DateTime<Utc>,
    /// Derived from `review_date` at save time ("3 weeks ago"). Never
    /// trusted from input.
    pub relative_time_description: String,
    pub is_active: bool,
    pub is_featured: bool,
    /// Original provider payload, kept for audit/debug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
}

impl ReviewRecord {
    pub fn new(external_id: String, source: ReviewSource) -> Self {
        Self {
            external_id,
            source,
            author_name: String::new(),
            author_photo_url: None,
            rating: 5,
            short_description: None,
            text: String::new(),
            review_date: Utc::now(),
            relative_time_description: String::new(),
            is_active: true,
            is_featured: false,
            raw_data: None,
        }
    }

    pub fn rating_is_valid(&self) -> bool {
        (1..=5).contains(&self.rating)
    }

    /// Recompute `relative_time_description` against the given "now".
    pub fn refresh_relative_time(&mut self, now: DateTime<Utc>) {
        self.relative_time_description = relative_time(self.review_date, now);
    }
}

/// Fixed-bucket humanization of a review date. Integer division by
/// 7/30/365, pluralized only when the count isn't 1.
pub fn relative_time(review_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - review_date).num_days();

    if days < 1 {
        "Today".to_string()
    } else if days < 7 {
        format!("{} days ago", days)
    } else if days < 30 {
        let weeks = days / 7;
        format!("{} week{} ago", weeks, plural(weeks))
    } else if days < 365 {
        let months = days / 30;
        format!("{} month{} ago", months, plural(months))
    } else {
        let years = days / 365;
        format!("{} year{} ago", years, plural(years))
    }
}

fn plural(n: i64) -> &'static str {
    if n != 1 {
        "s"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dated(days_ago: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days_ago)
    }

    #[test]
    fn test_same_day_is_today() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "Today");
        assert_eq!(relative_time(now - Duration::hours(20), now), "Today");
    }

    #[test]
    fn test_days_bucket() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::days(3), now), "3 days ago");
        assert_eq!(relative_time(now - Duration::days(6), now), "6 days ago");
    }

    #[test]
    fn test_weeks_bucket_uses_integer_division() {
        let now = Utc::now();
        // 10 // 7 == 1 and 13 // 7 == 1, both land in the same bucket
        assert_eq!(relative_time(now - Duration::days(10), now), "1 week ago");
        assert_eq!(relative_time(now - Duration::days(13), now), "1 week ago");
        assert_eq!(relative_time(now - Duration::days(14), now), "2 weeks ago");
    }

    #[test]
    fn test_months_bucket() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::days(30), now), "1 month ago");
        assert_eq!(relative_time(now - Duration::days(75), now), "2 months ago");
    }

    #[test]
    fn test_years_bucket() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::days(370), now), "1 year ago");
        assert_eq!(relative_time(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_rating_validation() {
        let mut record = ReviewRecord::new("r1".to_string(), ReviewSource::Google);
        for rating in [0u8, 6, 200] {
            record.rating = rating;
            assert!(!record.rating_is_valid(), "rating {} should be invalid", rating);
        }
        for rating in [1u8, 3, 5] {
            record.rating = rating;
            assert!(record.rating_is_valid(), "rating {} should be valid", rating);
        }
    }

    #[test]
    fn test_refresh_relative_time_overwrites_input_value() {
        let mut record = ReviewRecord::new("r2".to_string(), ReviewSource::Tripadvisor);
        record.review_date = dated(10);
        record.relative_time_description = "bogus value from provider".to_string();
        record.refresh_relative_time(Utc::now());
        assert_eq!(record.relative_time_description, "1 week ago");
    }
}
