use chrono::{DateTime, Utc};
use review_models::{ImportLog, ImportStatus, ReviewRecord, ReviewSource};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::store::{self, ReviewStore};

/// Cap on error strings retained in the Import Log; the summary still
/// reports the full count.
const MAX_LOGGED_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportPolicy {
    /// Overwrite mutable fields of already-stored reviews (moderation
    /// flags are always preserved).
    pub update_existing: bool,
    /// Classify rows without writing anything to the reviews table.
    pub dry_run: bool,
}

/// Extra context carried into one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    pub file_name: Option<String>,
    /// Structural errors found before the records reached the service
    /// (e.g. unparseable CSV rows). Counted as skips.
    pub preflight_errors: Vec<String>,
    /// Total upstream rows, when known (CSV row count).
    pub total_rows: Option<i64>,
}

/// Per-row classification. Business-level problems are values, not
/// errors; only infrastructure failures abort a batch. `Skipped` is
/// routine (duplicate rows), `Failed` means the row itself was bad and
/// goes into the Import Log.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Imported,
    Updated,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: Vec<String>,
    pub dry_run: bool,
    pub log_id: i64,
}

/// Idempotent upsert of normalized records into the durable store,
/// with an Import Log row per invocation.
pub struct ImportService {
    store: ReviewStore,
}

impl ImportService {
    pub fn new(store: ReviewStore) -> Self {
        Self { store }
    }

    /// Import a batch. Row-level problems are counted and recorded but
    /// never abort the run; an unexpected store failure rolls back all
    /// row writes and marks the log `failed` before propagating.
    pub async fn import(
        &self,
        records: Vec<ReviewRecord>,
        source: ReviewSource,
        policy: ImportPolicy,
        context: ImportContext,
    ) -> anyhow::Result<ImportSummary> {
        let mut log = ImportLog::new(source);
        log.file_name = context.file_name.clone();
        log.id = self.store.create_import_log(&log).await?;

        let mut summary = ImportSummary {
            dry_run: policy.dry_run,
            log_id: log.id,
            ..Default::default()
        };
        summary.skipped += context.preflight_errors.len() as u64;
        summary.errors.extend(context.preflight_errors);

        let total_rows = context
            .total_rows
            .unwrap_or(records.len() as i64 + summary.skipped as i64);

        match self.run_batch(&records, policy, &mut summary).await {
            Ok(()) => {
                log.imported = summary.imported as i64;
                log.updated = summary.updated as i64;
                log.skipped = summary.skipped as i64;
                log.total_rows = total_rows;
                log.status = ImportStatus::Success;
                log.finished_at = Some(Utc::now());
                if !summary.errors.is_empty() {
                    log.error_message = Some(
                        summary
                            .errors
                            .iter()
                            .take(MAX_LOGGED_ERRORS)
                            .cloned()
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                }
                self.store.finalize_import_log(&log).await?;
                info!(
                    source = %source,
                    imported = summary.imported,
                    updated = summary.updated,
                    skipped = summary.skipped,
                    dry_run = policy.dry_run,
                    "Import finished"
                );
                Ok(summary)
            }
            Err(err) => {
                log.imported = summary.imported as i64;
                log.updated = summary.updated as i64;
                log.skipped = summary.skipped as i64;
                log.total_rows = total_rows;
                log.status = ImportStatus::Failed;
                log.finished_at = Some(Utc::now());
                log.error_message = Some(err.to_string());
                // Best effort; the original failure is what the caller
                // needs to see.
                if let Err(log_err) = self.store.finalize_import_log(&log).await {
                    warn!(error = %log_err, "Failed to finalize import log after batch failure");
                }
                Err(err)
            }
        }
    }

    /// All row writes share one transaction: either every accepted row
    /// commits or, on an unexpected store error, none do.
    async fn run_batch(
        &self,
        records: &[ReviewRecord],
        policy: ImportPolicy,
        summary: &mut ImportSummary,
    ) -> anyhow::Result<()> {
        let mut tx = self.store.pool().begin().await?;

        for (index, record) in records.iter().enumerate() {
            let outcome = self.classify_row(&mut tx, record, policy).await?;
            match outcome {
                RowOutcome::Imported => summary.imported += 1,
                RowOutcome::Updated => summary.updated += 1,
                RowOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    debug!(row = index + 1, reason = %reason, "Row skipped");
                }
                RowOutcome::Failed(reason) => {
                    summary.skipped += 1;
                    debug!(row = index + 1, reason = %reason, "Row rejected");
                    summary.errors.push(format!("Row {}: {}", index + 1, reason));
                }
            }
        }

        if policy.dry_run {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn classify_row(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        record: &ReviewRecord,
        policy: ImportPolicy,
    ) -> anyhow::Result<RowOutcome> {
        if record.external_id.trim().is_empty()
            || record.author_name.trim().is_empty()
            || record.text.trim().is_empty()
        {
            return Ok(RowOutcome::Failed("missing required field".to_string()));
        }
        if !record.rating_is_valid() {
            return Ok(RowOutcome::Failed(format!(
                "rating {} outside 1-5",
                record.rating
            )));
        }

        // The stored description is recomputed, never trusted from input
        let mut record = record.clone();
        record.refresh_relative_time(Utc::now());

        let existing = store::find_by_external_id_tx(&mut *tx, &record.external_id).await?;
        match existing {
            None => {
                store::insert_review_tx(&mut *tx, &record).await?;
                Ok(RowOutcome::Imported)
            }
            Some(_) if policy.update_existing => {
                store::update_review_tx(&mut *tx, &record).await?;
                Ok(RowOutcome::Updated)
            }
            Some(_) => Ok(RowOutcome::Skipped(format!(
                "{} already exists",
                record.external_id
            ))),
        }
    }

    /// Delete inactive reviews past the retention horizon.
    pub async fn cleanup(&self, older_than: DateTime<Utc>) -> anyhow::Result<u64> {
        Ok(self.store.cleanup(older_than).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, rating: u8) -> ReviewRecord {
        let mut r = ReviewRecord::new(id.to_string(), ReviewSource::Tripadvisor);
        r.author_name = "Author".to_string();
        r.rating = rating;
        r.text = format!("review {}", id);
        r.review_date = Utc::now() - Duration::days(40);
        r
    }

    async fn service() -> (ImportService, ReviewStore) {
        let store = ReviewStore::open_in_memory().await.unwrap();
        (ImportService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_idempotent_upsert_without_update_existing() {
        let (service, store) = service().await;
        let batch = vec![record("ta_1", 5)];

        let first = service
            .import(batch.clone(), ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();
        assert_eq!(first.imported, 1);

        let second = service
            .import(batch, ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 1);

        assert_eq!(store.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_existing_preserves_moderation_flags() {
        let (service, store) = service().await;
        service
            .import(vec![record("ta_1", 3)], ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();
        store.set_moderation_flags("ta_1", true, true).await.unwrap();

        let mut updated = record("ta_1", 5);
        updated.text = "revised text".to_string();
        let summary = service
            .import(
                vec![updated],
                ReviewSource::Tripadvisor,
                ImportPolicy { update_existing: true, dry_run: false },
                ImportContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary.updated, 1);

        let stored = store.find_by_external_id("ta_1").await.unwrap().unwrap();
        assert_eq!(stored.rating, 5);
        assert_eq!(stored.text, "revised text");
        assert!(stored.is_featured, "featured flag set by operator must survive");
    }

    #[tokio::test]
    async fn test_rating_boundaries() {
        let (service, store) = service().await;
        let batch = vec![
            record("ok_low", 1),
            record("ok_high", 5),
            record("bad_zero", 0),
            record("bad_six", 6),
        ];
        let summary = service
            .import(batch, ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.errors.len(), 2);
        assert!(store.find_by_external_id("bad_zero").await.unwrap().is_none());
        assert!(store.find_by_external_id("ok_low").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicates_skip_silently_but_bad_rows_are_errors() {
        let (service, _store) = service().await;
        service
            .import(vec![record("dup", 4)], ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();

        let summary = service
            .import(
                vec![record("dup", 4), record("bad", 9)],
                ReviewSource::Tripadvisor,
                ImportPolicy::default(),
                ImportContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.errors.len(), 1, "duplicate rows are routine, not errors");
        assert!(summary.errors[0].contains("outside 1-5"));
    }

    #[tokio::test]
    async fn test_malformed_row_does_not_abort_batch() {
        let (service, store) = service().await;
        let mut missing_author = record("no_author", 4);
        missing_author.author_name = "  ".to_string();

        let summary = service
            .import(
                vec![missing_author, record("fine", 4)],
                ReviewSource::Tripadvisor,
                ImportPolicy::default(),
                ImportContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);
        assert!(store.find_by_external_id("fine").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dry_run_classifies_without_writing() {
        let (service, store) = service().await;
        service
            .import(vec![record("existing", 4)], ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();

        let summary = service
            .import(
                vec![record("existing", 4), record("new", 4)],
                ReviewSource::Tripadvisor,
                ImportPolicy { update_existing: true, dry_run: true },
                ImportContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.imported, 1);
        assert!(summary.dry_run);

        // Nothing persisted
        assert!(store.find_by_external_id("new").await.unwrap().is_none());
        assert_eq!(store.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_every_run_gets_one_finalized_log() {
        let (service, store) = service().await;
        service
            .import(
                vec![record("a", 4), record("bad", 0)],
                ReviewSource::CsvImport,
                ImportPolicy::default(),
                ImportContext {
                    file_name: Some("batch.csv".to_string()),
                    preflight_errors: vec!["Row 7: empty required fields".to_string()],
                    total_rows: Some(3),
                },
            )
            .await
            .unwrap();

        let logs = store.recent_import_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        let log = &logs[0];
        assert_eq!(log.status, ImportStatus::Success);
        assert_eq!(log.imported, 1);
        assert_eq!(log.skipped, 2);
        assert_eq!(log.total_rows, 3);
        assert_eq!(log.file_name.as_deref(), Some("batch.csv"));
        let errors = log.error_message.as_deref().unwrap();
        assert!(errors.contains("Row 7"));
        assert!(errors.contains("outside 1-5"));
    }

    #[tokio::test]
    async fn test_relative_time_recomputed_on_import() {
        let (service, store) = service().await;
        let mut r = record("ta_time", 4);
        r.relative_time_description = "provider supplied nonsense".to_string();
        service
            .import(vec![r], ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();

        let stored = store.find_by_external_id("ta_time").await.unwrap().unwrap();
        assert_eq!(stored.relative_time_description, "1 month ago");
    }

    #[tokio::test]
    async fn test_cleanup_round_trip() {
        let (service, store) = service().await;
        let mut old = record("old", 4);
        old.is_active = false;
        old.review_date = Utc::now() - Duration::days(500);
        service
            .import(vec![old], ReviewSource::Tripadvisor, ImportPolicy::default(), ImportContext::default())
            .await
            .unwrap();
        // Imports persist incoming is_active as given at creation time
        assert_eq!(store.count_active().await.unwrap(), 0);

        let deleted = service.cleanup(Utc::now() - Duration::days(365)).await.unwrap();
        assert_eq!(deleted, 1);
    }
}
