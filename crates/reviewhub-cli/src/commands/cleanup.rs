use crate::context::AppContext;
use crate::output::{Output, OutputFormat};
use chrono::{Duration, Utc};
use color_eyre::Result;
use serde_json::json;

pub async fn run_cleanup(older_than_days: u32, output: &Output) -> Result<()> {
    tracing::debug!(older_than_days, "Cleanup command started");

    let ctx = AppContext::load().await?;
    let cutoff = Utc::now() - Duration::days(older_than_days as i64);
    let deleted = ctx
        .import_service()
        .cleanup(cutoff)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    match output.format() {
        OutputFormat::Human => {
            output.success(format!(
                "Deleted {} inactive reviews older than {} days",
                deleted, older_than_days
            ));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "deleted": deleted,
                "older_than_days": older_than_days,
            }));
        }
    }
    Ok(())
}
