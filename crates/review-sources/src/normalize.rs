use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use review_models::{AUTHOR_NAME_MAX, SHORT_DESCRIPTION_MAX};

/// Date formats seen in provider payloads and CSV exports, tried in
/// order before giving up.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a provider/CSV date string. RFC 3339 first (TripAdvisor's
/// `published_date` carries an offset), then the known naive formats
/// interpreted as UTC.
pub fn parse_review_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for fmt in DAY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

/// Lossy compatibility behavior: an unparseable date becomes "now"
/// rather than losing the review. Callers that care (CSV import)
/// record a warning for the row.
pub fn parse_review_date_or_now(raw: &str) -> DateTime<Utc> {
    parse_review_date(raw).unwrap_or_else(Utc::now)
}

/// Truncate on a char boundary; provider payloads are arbitrary UTF-8.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

pub fn clean_author_name(raw: &str) -> String {
    truncate_chars(raw.trim(), AUTHOR_NAME_MAX)
}

pub fn clean_short_description(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(truncate_chars(trimmed, SHORT_DESCRIPTION_MAX))
    }
}

/// Ratings outside [1,5] mean the record is dropped, not clamped.
pub fn rating_in_range(rating: i64) -> Option<u8> {
    if (1..=5).contains(&rating) {
        Some(rating as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parses_rfc3339_with_offset() {
        let parsed = parse_review_date("2024-01-15T10:30:00-04:00").unwrap();
        assert_eq!(parsed.date_naive().day(), 15);
    }

    #[test]
    fn test_parses_known_naive_formats() {
        for raw in [
            "2024-01-15 10:30:00",
            "2024-01-15",
            "15.01.2024 10:30:00",
            "15.01.2024",
            "15/01/2024 10:30:00",
            "15/01/2024",
        ] {
            let parsed = parse_review_date(raw)
                .unwrap_or_else(|| panic!("failed to parse {:?}", raw));
            assert_eq!(parsed.date_naive().year(), 2024);
            assert_eq!(parsed.date_naive().month(), 1);
            assert_eq!(parsed.date_naive().day(), 15);
        }
    }

    #[test]
    fn test_garbage_dates_fall_back_to_now() {
        assert!(parse_review_date("last tuesday").is_none());
        assert!(parse_review_date("").is_none());
        let now = chrono::Utc::now();
        let fallback = parse_review_date_or_now("last tuesday");
        assert!((fallback - now).num_seconds().abs() < 5);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let s = "ééééé";
        assert_eq!(truncate_chars(s, 3), "ééé");
    }

    #[test]
    fn test_short_description_empty_becomes_none() {
        assert_eq!(clean_short_description("   "), None);
        assert_eq!(clean_short_description("Great tour!"), Some("Great tour!".to_string()));
    }

    #[test]
    fn test_rating_range() {
        assert_eq!(rating_in_range(0), None);
        assert_eq!(rating_in_range(6), None);
        assert_eq!(rating_in_range(-1), None);
        assert_eq!(rating_in_range(1), Some(1));
        assert_eq!(rating_in_range(5), Some(5));
    }
}
