use crate::context::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use review_core::refresh::{run_refresh as run_refresh_core, RefreshOptions};
use std::time::Duration;

pub async fn run_refresh(
    pages: Option<u32>,
    per_page: Option<u32>,
    clear_cache: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Refresh command started");

    let ctx = AppContext::load().await?;
    let aggregator = ctx.aggregator();
    let import_service = ctx.import_service();

    if aggregator.sources_status().is_empty() {
        output.warn("No providers configured; only fallback reviews will be served");
    }

    let options = RefreshOptions {
        pages: pages.unwrap_or(ctx.config.cache.refresh_pages),
        per_page: per_page.unwrap_or(ctx.config.cache.per_page),
        clear_cache,
    };

    let spinner = if output.format() == OutputFormat::Human {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "Refreshing reviews ({} pages of {})...",
            options.pages, options.per_page
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let summary = run_refresh_core(&aggregator, &import_service, options).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let summary = summary.map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    match output.format() {
        OutputFormat::Human => {
            if summary.success {
                output.success(format!(
                    "Fetched {} reviews across {} pages in {}ms",
                    summary.total_fetched, summary.pages_loaded, summary.duration_ms
                ));
            }
            for (source, count) in &summary.by_source {
                output.println(format!("  {}: {} reviews", source, count));
            }
            for (source, used) in &summary.sources_used {
                if !used {
                    output.warn(format!("Source '{}' returned nothing", source));
                }
            }
            output.println(format!(
                "Store: {} imported, {} updated, {} skipped",
                summary.imported, summary.updated, summary.skipped
            ));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&serde_json::to_value(&summary)?);
        }
    }

    if !summary.success {
        output.error("No live source returned any reviews; fallback content is being served");
        std::process::exit(1);
    }

    Ok(())
}
