use chrono::{DateTime, Utc};
use review_models::{ImportLog, ImportStatus, ReviewRecord, ReviewSource};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id TEXT NOT NULL UNIQUE,
        source TEXT NOT NULL,
        author_name TEXT NOT NULL,
        author_photo_url TEXT,
        rating INTEGER NOT NULL,
        short_description TEXT,
        text TEXT NOT NULL,
        review_date TEXT NOT NULL,
        relative_time_description TEXT NOT NULL DEFAULT '',
        is_active INTEGER NOT NULL DEFAULT 1,
        is_featured INTEGER NOT NULL DEFAULT 0,
        raw_data TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reviews_source_active ON reviews(source, is_active)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_featured_active ON reviews(is_featured, is_active)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_review_date ON reviews(review_date)",
    r#"
    CREATE TABLE IF NOT EXISTS import_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        started_at TEXT NOT NULL,
        finished_at TEXT,
        status TEXT NOT NULL DEFAULT 'running',
        imported INTEGER NOT NULL DEFAULT 0,
        updated INTEGER NOT NULL DEFAULT 0,
        skipped INTEGER NOT NULL DEFAULT 0,
        total_rows INTEGER NOT NULL DEFAULT 0,
        file_name TEXT,
        error_message TEXT,
        warnings TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_import_logs_source_status ON import_logs(source, status)",
];

/// Aggregate numbers for `reviewhub status`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub total: i64,
    pub active: i64,
    pub featured: i64,
    pub avg_rating: Option<f64>,
    pub by_source: HashMap<String, i64>,
    pub by_rating: HashMap<u8, i64>,
}

/// SQLite-backed durable store. The unique index on `external_id` is
/// the single correctness backstop for concurrent importers.
#[derive(Clone)]
pub struct ReviewStore {
    pool: SqlitePool,
}

impl ReviewStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "Review store opened");
        Ok(store)
    }

    /// In-memory store, used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        debug!("Running store migrations");
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---- reviews ----

    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        find_by_external_id_tx(&mut conn, external_id).await
    }

    pub async fn insert_review(&self, record: &ReviewRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_review_tx(&mut conn, record).await
    }

    pub async fn update_review(&self, record: &ReviewRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        update_review_tx(&mut conn, record).await
    }

    /// Operator-only mutation of the moderation flags. The import
    /// pipeline never calls this.
    pub async fn set_moderation_flags(
        &self,
        external_id: &str,
        is_active: bool,
        is_featured: bool,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE reviews SET is_active = ?1, is_featured = ?2, updated_at = ?3 WHERE external_id = ?4",
        )
        .bind(is_active)
        .bind(is_featured)
        .bind(Utc::now().to_rfc3339())
        .bind(external_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_active(&self, page: u32, per_page: u32) -> Result<Vec<ReviewRecord>, StoreError> {
        let page = page.max(1);
        let offset = ((page - 1) as i64) * (per_page as i64);
        let rows = sqlx::query(
            r#"
            SELECT * FROM reviews
            WHERE is_active = 1
            ORDER BY is_featured DESC, review_date DESC, created_at DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    pub async fn list_all(&self) -> Result<Vec<ReviewRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM reviews ORDER BY is_featured DESC, review_date DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    pub async fn count_active(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete inactive reviews older than the given horizon. Idempotent;
    /// returns the number of rows removed.
    pub async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM reviews WHERE is_active = 0 AND review_date < ?1",
        )
        .bind(older_than.to_rfc3339())
        .execute(&self.pool)
        .await?;
        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, "Cleaned up old inactive reviews");
        }
        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(is_active), 0) AS active,
                COALESCE(SUM(is_featured), 0) AS featured,
                AVG(rating) AS avg_rating
            FROM reviews
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let mut stats = StoreStats {
            total: row.try_get("total")?,
            active: row.try_get("active")?,
            featured: row.try_get("featured")?,
            avg_rating: row.try_get("avg_rating")?,
            by_source: HashMap::new(),
            by_rating: HashMap::new(),
        };

        let source_rows = sqlx::query("SELECT source, COUNT(*) AS count FROM reviews GROUP BY source")
            .fetch_all(&self.pool)
            .await?;
        for row in source_rows {
            let source: String = row.try_get("source")?;
            stats.by_source.insert(source, row.try_get("count")?);
        }

        let rating_rows = sqlx::query("SELECT rating, COUNT(*) AS count FROM reviews GROUP BY rating")
            .fetch_all(&self.pool)
            .await?;
        for row in rating_rows {
            let rating: i64 = row.try_get("rating")?;
            stats.by_rating.insert(rating as u8, row.try_get("count")?);
        }

        Ok(stats)
    }

    // ---- import logs ----

    pub async fn create_import_log(&self, log: &ImportLog) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO import_logs (source, started_at, status, file_name)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(log.source.as_str())
        .bind(log.started_at.to_rfc3339())
        .bind(log.status.as_str())
        .bind(&log.file_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Stamp the terminal state of a run. Called exactly once per log.
    pub async fn finalize_import_log(&self, log: &ImportLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE import_logs
            SET finished_at = ?1, status = ?2, imported = ?3, updated = ?4,
                skipped = ?5, total_rows = ?6, error_message = ?7, warnings = ?8
            WHERE id = ?9 AND status = 'running'
            "#,
        )
        .bind(log.finished_at.map(|t| t.to_rfc3339()))
        .bind(log.status.as_str())
        .bind(log.imported)
        .bind(log.updated)
        .bind(log.skipped)
        .bind(log.total_rows)
        .bind(&log.error_message)
        .bind(&log.warnings)
        .bind(log.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_import_logs(&self, limit: u32) -> Result<Vec<ImportLog>, StoreError> {
        let rows = sqlx::query("SELECT * FROM import_logs ORDER BY started_at DESC LIMIT ?1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_import_log).collect()
    }
}

// Connection-level operations so the import service can run a whole
// batch inside one transaction.

pub(crate) async fn find_by_external_id_tx(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<ReviewRecord>, StoreError> {
    let row = sqlx::query("SELECT * FROM reviews WHERE external_id = ?1")
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(row_to_record).transpose()
}

pub(crate) async fn insert_review_tx(
    conn: &mut SqliteConnection,
    record: &ReviewRecord,
) -> Result<(), StoreError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO reviews (
            external_id, source, author_name, author_photo_url, rating,
            short_description, text, review_date, relative_time_description,
            is_active, is_featured, raw_data, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&record.external_id)
    .bind(record.source.as_str())
    .bind(&record.author_name)
    .bind(&record.author_photo_url)
    .bind(record.rating as i64)
    .bind(&record.short_description)
    .bind(&record.text)
    .bind(record.review_date.to_rfc3339())
    .bind(&record.relative_time_description)
    .bind(record.is_active)
    .bind(record.is_featured)
    .bind(record.raw_data.as_ref().map(|v| v.to_string()))
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Overwrite the mutable fields of an existing review. The moderation
/// flags `is_active`/`is_featured` are deliberately left untouched so
/// a re-import never undoes operator decisions.
pub(crate) async fn update_review_tx(
    conn: &mut SqliteConnection,
    record: &ReviewRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE reviews SET
            source = ?1, author_name = ?2, author_photo_url = ?3, rating = ?4,
            short_description = ?5, text = ?6, review_date = ?7,
            relative_time_description = ?8, raw_data = ?9, updated_at = ?10
        WHERE external_id = ?11
        "#,
    )
    .bind(record.source.as_str())
    .bind(&record.author_name)
    .bind(&record.author_photo_url)
    .bind(record.rating as i64)
    .bind(&record.short_description)
    .bind(&record.text)
    .bind(record.review_date.to_rfc3339())
    .bind(&record.relative_time_description)
    .bind(record.raw_data.as_ref().map(|v| v.to_string()))
    .bind(Utc::now().to_rfc3339())
    .bind(&record.external_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_record(row: &SqliteRow) -> Result<ReviewRecord, StoreError> {
    let source_raw: String = row.try_get("source")?;
    let source = ReviewSource::from_str(&source_raw).map_err(StoreError::CorruptRow)?;
    let review_date_raw: String = row.try_get("review_date")?;
    let review_date = DateTime::parse_from_rfc3339(&review_date_raw)
        .map_err(|e| StoreError::CorruptRow(format!("review_date {:?}: {}", review_date_raw, e)))?
        .with_timezone(&Utc);
    let raw_data: Option<String> = row.try_get("raw_data")?;
    let raw_data = raw_data.and_then(|s| serde_json::from_str(&s).ok());

    Ok(ReviewRecord {
        external_id: row.try_get("external_id")?,
        source,
        author_name: row.try_get("author_name")?,
        author_photo_url: row.try_get("author_photo_url")?,
        rating: row.try_get::<i64, _>("rating")? as u8,
        short_description: row.try_get("short_description")?,
        text: row.try_get("text")?,
        review_date,
        relative_time_description: row.try_get("relative_time_description")?,
        is_active: row.try_get("is_active")?,
        is_featured: row.try_get("is_featured")?,
        raw_data,
    })
}

fn row_to_import_log(row: &SqliteRow) -> Result<ImportLog, StoreError> {
    let source_raw: String = row.try_get("source")?;
    let status_raw: String = row.try_get("status")?;
    let started_raw: String = row.try_get("started_at")?;
    let finished_raw: Option<String> = row.try_get("finished_at")?;

    let parse_ts = |raw: &str| {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StoreError::CorruptRow(format!("timestamp {:?}: {}", raw, e)))
    };

    Ok(ImportLog {
        id: row.try_get("id")?,
        source: ReviewSource::from_str(&source_raw).map_err(StoreError::CorruptRow)?,
        started_at: parse_ts(&started_raw)?,
        finished_at: finished_raw.as_deref().map(parse_ts).transpose()?,
        status: ImportStatus::from_str(&status_raw).map_err(StoreError::CorruptRow)?,
        imported: row.try_get("imported")?,
        updated: row.try_get("updated")?,
        skipped: row.try_get("skipped")?,
        total_rows: row.try_get("total_rows")?,
        file_name: row.try_get("file_name")?,
        error_message: row.try_get("error_message")?,
        warnings: row.try_get("warnings")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str) -> ReviewRecord {
        let mut r = ReviewRecord::new(id.to_string(), ReviewSource::Tripadvisor);
        r.author_name = "Test Author".to_string();
        r.rating = 4;
        r.text = "Solid experience".to_string();
        r.review_date = Utc::now() - Duration::days(30);
        r.relative_time_description = "1 month ago".to_string();
        r.raw_data = Some(serde_json::json!({"id": id}));
        r
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let store = ReviewStore::open_in_memory().await.unwrap();
        store.insert_review(&record("ta_1")).await.unwrap();

        let loaded = store.find_by_external_id("ta_1").await.unwrap().unwrap();
        assert_eq!(loaded.author_name, "Test Author");
        assert_eq!(loaded.rating, 4);
        assert_eq!(loaded.source, ReviewSource::Tripadvisor);
        assert_eq!(loaded.raw_data, Some(serde_json::json!({"id": "ta_1"})));
    }

    #[tokio::test]
    async fn test_unique_external_id_rejects_duplicates() {
        let store = ReviewStore::open_in_memory().await.unwrap();
        store.insert_review(&record("dup")).await.unwrap();
        let err = store.insert_review(&record("dup")).await;
        assert!(err.is_err(), "second insert with same external_id must fail");
    }

    #[tokio::test]
    async fn test_update_preserves_moderation_flags() {
        let store = ReviewStore::open_in_memory().await.unwrap();
        store.insert_review(&record("flagged")).await.unwrap();
        assert!(store.set_moderation_flags("flagged", false, true).await.unwrap());

        let mut fresh = record("flagged");
        fresh.text = "updated text".to_string();
        fresh.rating = 5;
        // Incoming data claims defaults for the flags
        fresh.is_active = true;
        fresh.is_featured = false;
        store.update_review(&fresh).await.unwrap();

        let loaded = store.find_by_external_id("flagged").await.unwrap().unwrap();
        assert_eq!(loaded.text, "updated text");
        assert_eq!(loaded.rating, 5);
        assert!(!loaded.is_active, "operator deactivation must survive re-import");
        assert!(loaded.is_featured, "operator featuring must survive re-import");
    }

    #[tokio::test]
    async fn test_list_active_orders_and_filters() {
        let store = ReviewStore::open_in_memory().await.unwrap();

        let mut featured = record("featured");
        featured.is_featured = true;
        featured.review_date = Utc::now() - Duration::days(300);
        store.insert_review(&featured).await.unwrap();

        let mut newest = record("newest");
        newest.review_date = Utc::now() - Duration::days(1);
        store.insert_review(&newest).await.unwrap();

        let mut hidden = record("hidden");
        hidden.is_active = false;
        store.insert_review(&hidden).await.unwrap();

        let listed = store.list_active(1, 10).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["featured", "newest"]);
        assert_eq!(store.count_active().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_only_touches_old_inactive_rows() {
        let store = ReviewStore::open_in_memory().await.unwrap();

        let mut old_inactive = record("old_inactive");
        old_inactive.is_active = false;
        old_inactive.review_date = Utc::now() - Duration::days(400);
        store.insert_review(&old_inactive).await.unwrap();

        let mut old_active = record("old_active");
        old_active.review_date = Utc::now() - Duration::days(400);
        store.insert_review(&old_active).await.unwrap();

        let mut recent_inactive = record("recent_inactive");
        recent_inactive.is_active = false;
        recent_inactive.review_date = Utc::now() - Duration::days(10);
        store.insert_review(&recent_inactive).await.unwrap();

        let cutoff = Utc::now() - Duration::days(365);
        assert_eq!(store.cleanup(cutoff).await.unwrap(), 1);
        // Idempotent
        assert_eq!(store.cleanup(cutoff).await.unwrap(), 0);
        assert!(store.find_by_external_id("old_inactive").await.unwrap().is_none());
        assert!(store.find_by_external_id("old_active").await.unwrap().is_some());
        assert!(store.find_by_external_id("recent_inactive").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_import_log_lifecycle() {
        let store = ReviewStore::open_in_memory().await.unwrap();

        let mut log = ImportLog::new(ReviewSource::CsvImport);
        log.file_name = Some("reviews.csv".to_string());
        log.id = store.create_import_log(&log).await.unwrap();
        assert!(log.id > 0);

        log.imported = 10;
        log.skipped = 2;
        log.total_rows = 12;
        log.status = ImportStatus::Success;
        log.finished_at = Some(Utc::now());
        store.finalize_import_log(&log).await.unwrap();

        let recent = store.recent_import_logs(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        let stored = &recent[0];
        assert_eq!(stored.status, ImportStatus::Success);
        assert_eq!(stored.imported, 10);
        assert_eq!(stored.file_name.as_deref(), Some("reviews.csv"));
        assert!(stored.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_finalize_is_one_shot() {
        let store = ReviewStore::open_in_memory().await.unwrap();

        let mut log = ImportLog::new(ReviewSource::Google);
        log.id = store.create_import_log(&log).await.unwrap();

        log.status = ImportStatus::Success;
        log.imported = 5;
        log.finished_at = Some(Utc::now());
        store.finalize_import_log(&log).await.unwrap();

        // A second finalize (e.g. a buggy retry) must not reopen or
        // overwrite the terminal row.
        log.status = ImportStatus::Failed;
        log.imported = 0;
        store.finalize_import_log(&log).await.unwrap();

        let stored = store.recent_import_logs(1).await.unwrap().remove(0);
        assert_eq!(stored.status, ImportStatus::Success);
        assert_eq!(stored.imported, 5);
    }

    #[tokio::test]
    async fn test_stats_breakdowns() {
        let store = ReviewStore::open_in_memory().await.unwrap();

        let mut google = record("g_1");
        google.source = ReviewSource::Google;
        google.rating = 5;
        store.insert_review(&google).await.unwrap();
        store.insert_review(&record("ta_1")).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.by_source.get("google"), Some(&1));
        assert_eq!(stats.by_source.get("tripadvisor"), Some(&1));
        assert_eq!(stats.by_rating.get(&4), Some(&1));
        assert_eq!(stats.by_rating.get(&5), Some(&1));
        assert!(stats.avg_rating.unwrap() > 4.4 && stats.avg_rating.unwrap() < 4.6);
    }
}
