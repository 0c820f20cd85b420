use crate::context::AppContext;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use review_core::export_reviews_csv;
use std::fs::File;
use std::path::PathBuf;

pub async fn run_export(file: Option<PathBuf>, output: &Output) -> Result<()> {
    tracing::debug!("Export command started");

    let ctx = AppContext::load().await?;
    let records = ctx.store.list_all().await?;

    let written = match &file {
        Some(path) => {
            let writer = File::create(path)
                .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
            export_reviews_csv(writer, &records)
                .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?
        }
        None => export_reviews_csv(std::io::stdout().lock(), &records)
            .map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?,
    };

    if let Some(path) = file {
        output.success(format!("Exported {} reviews to {}", written, path.display()));
    }
    Ok(())
}
