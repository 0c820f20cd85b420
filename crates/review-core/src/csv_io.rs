use review_models::{ReviewRecord, ReviewSource};
use std::io::{Read, Write};
use std::str::FromStr;
use tracing::debug;

const REQUIRED_HEADERS: &[&str] = &["external_id", "author_name", "text", "rating"];

const EXPORT_HEADERS: &[&str] = &[
    "external_id",
    "source",
    "author_name",
    "author_photo_url",
    "rating",
    "short_description",
    "text",
    "review_date",
    "relative_time_description",
    "is_active",
    "is_featured",
];

/// Outcome of parsing a CSV batch. Structurally bad rows land in
/// `errors` and never abort the parse; the import service counts them
/// as skips.
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub records: Vec<ReviewRecord>,
    pub errors: Vec<String>,
    pub total_rows: i64,
}

/// Parse a CSV export into review records. Columns are addressed by
/// header name, so column order doesn't matter; unknown columns are
/// ignored.
pub fn parse_reviews_csv<R: Read>(reader: R) -> anyhow::Result<ParsedCsv> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "CSV is missing required columns: {}",
            missing.join(", ")
        ));
    }

    let field = |record: &csv::StringRecord, name: &str| -> Option<String> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| record.get(i))
            .map(|s| s.to_string())
    };

    let mut parsed = ParsedCsv::default();
    for (index, row) in csv_reader.records().enumerate() {
        let line = index + 1;
        parsed.total_rows += 1;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                parsed.errors.push(format!("Row {}: unreadable ({})", line, e));
                continue;
            }
        };

        match row_to_record(&row, &field) {
            Ok(record) => parsed.records.push(record),
            Err(reason) => parsed.errors.push(format!("Row {}: {}", line, reason)),
        }
    }

    debug!(
        total = parsed.total_rows,
        parsed = parsed.records.len(),
        errors = parsed.errors.len(),
        "Parsed CSV batch"
    );
    Ok(parsed)
}

fn row_to_record(
    row: &csv::StringRecord,
    field: &dyn Fn(&csv::StringRecord, &str) -> Option<String>,
) -> Result<ReviewRecord, String> {
    let external_id = field(row, "external_id").unwrap_or_default();
    let author_name = field(row, "author_name").unwrap_or_default();
    let text = field(row, "text").unwrap_or_default();
    if external_id.is_empty() || author_name.is_empty() || text.is_empty() {
        return Err("empty required fields".to_string());
    }

    let rating: i64 = field(row, "rating")
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "5".to_string())
        .parse()
        .map_err(|_| "unparseable rating".to_string())?;
    let rating =
        review_sources::normalize::rating_in_range(rating).ok_or("rating outside 1-5")?;

    // Manual exports default to tripadvisor, matching historic batches
    let source = field(row, "source")
        .filter(|v| !v.is_empty())
        .map(|v| ReviewSource::from_str(&v))
        .transpose()?
        .unwrap_or(ReviewSource::Tripadvisor);

    let mut record = ReviewRecord::new(external_id, source);
    record.author_name = review_sources::normalize::clean_author_name(&author_name);
    record.author_photo_url = field(row, "author_photo_url").filter(|v| !v.is_empty());
    record.rating = rating;
    record.short_description = field(row, "short_description")
        .as_deref()
        .and_then(review_sources::normalize::clean_short_description);
    record.text = text;
    record.review_date = review_sources::normalize::parse_review_date_or_now(
        field(row, "review_date").as_deref().unwrap_or(""),
    );
    record.is_active = parse_bool(field(row, "is_active").as_deref(), true);
    record.is_featured = parse_bool(field(row, "is_featured").as_deref(), false);
    record.raw_data = field(row, "raw_data")
        .filter(|v| !v.is_empty())
        .map(|v| parse_raw_data(&v));

    Ok(record)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw {
        None | Some("") => default,
        Some(v) => v.eq_ignore_ascii_case("true") || v == "1",
    }
}

/// Best effort: valid JSON comes through as-is, anything else is
/// wrapped so the original text is never lost.
fn parse_raw_data(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "original": raw }))
}

/// Write stored reviews as CSV (the mirror of `parse_reviews_csv`).
/// Returns the number of rows written.
pub fn export_reviews_csv<W: Write>(writer: W, records: &[ReviewRecord]) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADERS)?;

    for record in records {
        csv_writer.write_record(&[
            record.external_id.as_str(),
            record.source.as_str(),
            record.author_name.as_str(),
            record.author_photo_url.as_deref().unwrap_or(""),
            &record.rating.to_string(),
            record.short_description.as_deref().unwrap_or(""),
            record.text.as_str(),
            &record.review_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.relative_time_description.as_str(),
            if record.is_active { "True" } else { "False" },
            if record.is_featured { "True" } else { "False" },
        ])?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}
