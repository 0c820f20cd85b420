use review_models::{ReviewRecord, ReviewSource};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, warn};

use crate::aggregator::ReviewAggregator;
use crate::import::{ImportContext, ImportPolicy, ImportService};

#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    /// Pages to preload into the cache.
    pub pages: u32,
    pub per_page: u32,
    /// Drop all cached pages first, forcing live fetches.
    pub clear_cache: bool,
}

/// Structured outcome of one refresh run, for operators and exit-code
/// decisions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshSummary {
    pub pages_loaded: u32,
    pub total_fetched: usize,
    pub by_source: HashMap<String, usize>,
    pub sources_used: HashMap<String, bool>,
    pub imported: u64,
    pub updated: u64,
    pub skipped: u64,
    pub duration_ms: u128,
    /// False when every live source came back empty; the fallback page
    /// keeps rendering alive but operators need to know.
    pub success: bool,
}

/// The periodic refresh: warm the page cache through the aggregator,
/// then hand every live record to the import service so the durable
/// store keeps trailing the providers.
pub async fn run_refresh(
    aggregator: &ReviewAggregator,
    import_service: &ImportService,
    options: RefreshOptions,
) -> anyhow::Result<RefreshSummary> {
    let started = Instant::now();
    let mut summary = RefreshSummary::default();

    if options.clear_cache {
        aggregator.clear_cache();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<ReviewRecord> = Vec::new();

    for page in 1..=options.pages.max(1) {
        let result = aggregator.get_reviews(page, options.per_page).await?;
        if result.reviews.is_empty() {
            info!(page, "No reviews returned; stopping page preload");
            break;
        }

        summary.pages_loaded += 1;
        for (source, used) in &result.sources_used {
            *summary.sources_used.entry(source.clone()).or_insert(false) |= used;
        }
        for record in result.reviews {
            *summary.by_source.entry(record.source.to_string()).or_insert(0) += 1;
            if seen.insert(record.external_id.clone()) {
                collected.push(record);
            }
        }

        if !result.has_next {
            info!(page, "No more pages available");
            break;
        }
    }

    summary.total_fetched = collected.len();

    // Fallback placeholders are never persisted; they only pad a page
    // when everything is down.
    let live: Vec<ReviewRecord> = collected
        .into_iter()
        .filter(|r| r.source != ReviewSource::Fallback)
        .collect();
    summary.success = !live.is_empty();

    let mut by_source: HashMap<ReviewSource, Vec<ReviewRecord>> = HashMap::new();
    for record in live {
        by_source.entry(record.source).or_default().push(record);
    }

    for (source, records) in by_source {
        let import = import_service
            .import(
                records,
                source,
                ImportPolicy { update_existing: true, dry_run: false },
                ImportContext::default(),
            )
            .await?;
        summary.imported += import.imported;
        summary.updated += import.updated;
        summary.skipped += import.skipped;
    }

    summary.duration_ms = started.elapsed().as_millis();
    if summary.success {
        info!(
            pages = summary.pages_loaded,
            fetched = summary.total_fetched,
            imported = summary.imported,
            updated = summary.updated,
            "Refresh complete"
        );
    } else {
        warn!("Refresh obtained zero reviews from every live source");
    }
    Ok(summary)
}
