use crate::context::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::Context;
use color_eyre::Result;
use review_core::{parse_reviews_csv, ImportContext, ImportPolicy, ImportSummary};
use review_models::ReviewSource;
use review_core::ImportService;
use review_sources::{ProviderRegistry, ReviewProvider};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run_import(
    file: Option<PathBuf>,
    source: Option<String>,
    max_reviews: u32,
    update_existing: bool,
    dry_run: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Import command started");

    let ctx = AppContext::load().await?;
    let import_service = ctx.import_service();
    let policy = ImportPolicy { update_existing, dry_run };

    match (file, source) {
        (Some(path), None) => {
            let reader = File::open(&path)
                .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
            let parsed = parse_reviews_csv(reader)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to parse {}: {}", path.display(), e))?;

            for err in &parsed.errors {
                output.warn(err);
            }

            let context = ImportContext {
                file_name: path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.to_string()),
                preflight_errors: parsed.errors.clone(),
                total_rows: Some(parsed.total_rows),
            };

            let summary = import_service
                .import(parsed.records, ReviewSource::CsvImport, policy, context)
                .await
                .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
            report(&summary, "csv", output);
        }
        (None, Some(selector)) => {
            let providers = ProviderRegistry::create_all(&ctx.config, &ctx.credentials);
            let selector = selector.to_lowercase();
            let selected: Vec<_> = providers
                .into_iter()
                .filter(|p| selector == "all" || p.name() == selector)
                .collect();
            if selected.is_empty() {
                return Err(color_eyre::eyre::eyre!(
                    "No configured provider matches '{}' (use google, tripadvisor or all)",
                    selector
                ));
            }

            let fetched =
                import_from_providers(selected, max_reviews as usize, &import_service, policy, output)
                    .await?;
            if fetched == 0 {
                return Err(color_eyre::eyre::eyre!(
                    "No reviews obtained from any selected source"
                ));
            }
        }
        (Some(_), Some(_)) => unreachable!("clap rejects --file together with --source"),
        (None, None) => {
            return Err(color_eyre::eyre::eyre!("Specify either --file or --source"));
        }
    }

    Ok(())
}

/// Fetch from each provider and import what came back, absorbing
/// per-provider failures. Returns the total record count obtained so
/// the caller can fail the run when every source came up empty.
async fn import_from_providers(
    providers: Vec<Arc<dyn ReviewProvider>>,
    max_reviews: usize,
    import_service: &ImportService,
    policy: ImportPolicy,
    output: &Output,
) -> Result<u64> {
    let mut total_fetched = 0u64;
    for provider in providers {
        let records = match provider.fetch_reviews(max_reviews).await {
            Ok(records) => records,
            Err(e) => {
                output.error(format!("{} fetch failed: {}", provider.name(), e));
                continue;
            }
        };
        total_fetched += records.len() as u64;
        output.println(format!(
            "Fetched {} reviews from {}",
            records.len(),
            provider.name()
        ));

        let summary = import_service
            .import(records, provider.source(), policy, ImportContext::default())
            .await
            .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;
        report(&summary, provider.name(), output);
    }
    Ok(total_fetched)
}

fn report(summary: &ImportSummary, label: &str, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            let mode = if summary.dry_run { " (dry run)" } else { "" };
            output.success(format!(
                "{}{}: {} imported, {} updated, {} skipped (log #{})",
                label, mode, summary.imported, summary.updated, summary.skipped, summary.log_id
            ));
            for err in &summary.errors {
                output.warn(err);
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            if let Ok(value) = serde_json::to_value(summary) {
                output.json(&value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use review_core::ReviewStore;
    use review_models::{ReviewRecord, ReviewSource};
    use review_sources::SourceError;

    struct FakeProvider {
        source: ReviewSource,
        records: Vec<ReviewRecord>,
        fail: bool,
    }

    #[async_trait]
    impl ReviewProvider for FakeProvider {
        fn source(&self) -> ReviewSource {
            self.source
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn fetch_reviews(&self, _max_results: usize) -> Result<Vec<ReviewRecord>, SourceError> {
            if self.fail {
                Err(SourceError::new(self.name(), "simulated outage"))
            } else {
                Ok(self.records.clone())
            }
        }
    }

    fn record(id: &str) -> ReviewRecord {
        let mut r = ReviewRecord::new(id.to_string(), ReviewSource::Google);
        r.author_name = "Author".to_string();
        r.rating = 4;
        r.text = format!("review {}", id);
        r.review_date = Utc::now();
        r
    }

    async fn service() -> (ImportService, ReviewStore) {
        let store = ReviewStore::open_in_memory().await.unwrap();
        (ImportService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_all_sources_empty_reports_zero_fetched() {
        let (service, _store) = service().await;
        let providers: Vec<Arc<dyn ReviewProvider>> = vec![
            Arc::new(FakeProvider {
                source: ReviewSource::Google,
                records: Vec::new(),
                fail: true,
            }),
            Arc::new(FakeProvider {
                source: ReviewSource::Tripadvisor,
                records: Vec::new(),
                fail: false,
            }),
        ];
        let output = Output::new(OutputFormat::Json, true);

        let fetched = import_from_providers(providers, 10, &service, ImportPolicy::default(), &output)
            .await
            .unwrap();
        assert_eq!(fetched, 0, "outage plus empty source must surface as zero");
    }

    #[tokio::test]
    async fn test_provider_failure_does_not_lose_other_sources() {
        let (service, store) = service().await;
        let providers: Vec<Arc<dyn ReviewProvider>> = vec![
            Arc::new(FakeProvider {
                source: ReviewSource::Tripadvisor,
                records: Vec::new(),
                fail: true,
            }),
            Arc::new(FakeProvider {
                source: ReviewSource::Google,
                records: vec![record("g_1"), record("g_2")],
                fail: false,
            }),
        ];
        let output = Output::new(OutputFormat::Json, true);

        let fetched = import_from_providers(providers, 10, &service, ImportPolicy::default(), &output)
            .await
            .unwrap();
        assert_eq!(fetched, 2);
        assert_eq!(store.count_active().await.unwrap(), 2);
    }
}
