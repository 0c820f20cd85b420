use crate::context::AppContext;
use crate::output::Output;
use color_eyre::Result;
use review_core::refresh::{run_refresh, RefreshOptions};
use review_core::{ImportService, ReviewAggregator};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Foreground daemon. Containers keep the process as PID 1 with logs
/// on stderr; outside a container logs go to the rolling daemon log
/// file (wired up in main before dispatch).
pub async fn run_daemon(
    schedule_override: Option<String>,
    no_startup_refresh: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::load().await?;

    let default_scheduler = review_config::default_scheduler_config();
    let scheduler_config = ctx.config.scheduler.as_ref().unwrap_or(&default_scheduler);
    let schedule = schedule_override.unwrap_or_else(|| scheduler_config.schedule.clone());
    let run_on_startup = !no_startup_refresh && scheduler_config.run_on_startup;

    let options = RefreshOptions {
        pages: ctx.config.cache.refresh_pages,
        per_page: ctx.config.cache.per_page,
        clear_cache: false,
    };

    let aggregator = Arc::new(ctx.aggregator());
    let import_service = Arc::new(ctx.import_service());

    if run_on_startup {
        info!(operation = "daemon_startup", "Running initial refresh on startup");
        refresh_once(&aggregator, &import_service, options).await;
    }

    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create scheduler: {}", e))?;

    let job_aggregator = Arc::clone(&aggregator);
    let job_import = Arc::clone(&import_service);
    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let aggregator = Arc::clone(&job_aggregator);
        let import_service = Arc::clone(&job_import);
        Box::pin(async move {
            info!(operation = "scheduled_refresh_start", "Starting scheduled refresh");
            refresh_once(&aggregator, &import_service, options).await;
        })
    })
    .map_err(|e| color_eyre::eyre::eyre!("Invalid cron schedule '{}': {}", schedule, e))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to schedule refresh job: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to start scheduler: {}", e))?;

    info!(
        operation = "daemon_started",
        schedule = %schedule,
        "Review refresh daemon running"
    );
    output.println(format!("Daemon running; refresh schedule '{}'", schedule));

    // The scheduler runs on background tasks; keep the process alive
    // until the runtime is torn down.
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
    }
}

async fn refresh_once(
    aggregator: &ReviewAggregator,
    import_service: &ImportService,
    options: RefreshOptions,
) {
    match run_refresh(aggregator, import_service, options).await {
        Ok(summary) => {
            if summary.success {
                info!(
                    operation = "scheduled_refresh_complete",
                    total_fetched = summary.total_fetched,
                    imported = summary.imported,
                    updated = summary.updated,
                    duration_ms = summary.duration_ms as u64,
                    "Scheduled refresh completed"
                );
            } else {
                error!(
                    operation = "scheduled_refresh_empty",
                    "Every live source came back empty; fallback reviews remain in service"
                );
            }
        }
        Err(e) => {
            error!(operation = "scheduled_refresh_error", error = %e, "Scheduled refresh failed");
        }
    }
}
