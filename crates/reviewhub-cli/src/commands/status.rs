use crate::context::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use review_sources::ProviderRegistry;
use serde_json::json;

pub async fn run_status(output: &Output) -> Result<()> {
    tracing::debug!("Status command started");

    let ctx = AppContext::load().await?;
    let sources = ProviderRegistry::status(&ctx.config, &ctx.credentials);
    let stats = ctx.store.stats().await?;
    let logs = ctx.store.recent_import_logs(5).await?;

    if output.format() != OutputFormat::Human {
        output.json(&json!({
            "sources": sources,
            "store": {
                "total": stats.total,
                "active": stats.active,
                "featured": stats.featured,
                "avg_rating": stats.avg_rating,
                "by_source": stats.by_source,
                "by_rating": stats.by_rating,
            },
            "recent_imports": logs,
        }));
        return Ok(());
    }

    let mut source_table = Table::new();
    source_table.set_header(vec![
        Cell::new("Source").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Enabled").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("API Key").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Ready").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for source in &sources {
        source_table.add_row(vec![
            Cell::new(source.name),
            Cell::new(check(source.enabled)),
            Cell::new(check(source.has_credentials)),
            Cell::new(check(source.configured)),
        ]);
    }
    source_table.load_preset(comfy_table::presets::UTF8_FULL);
    source_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", source_table);
    println!();

    let mut store_table = Table::new();
    store_table.set_header(vec![Cell::new("Stored Reviews")
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    store_table.add_row(vec![Cell::new("Total"), Cell::new(stats.total.to_string())]);
    store_table.add_row(vec![Cell::new("Active"), Cell::new(stats.active.to_string())]);
    store_table.add_row(vec![Cell::new("Featured"), Cell::new(stats.featured.to_string())]);
    store_table.add_row(vec![
        Cell::new("Average rating"),
        Cell::new(
            stats
                .avg_rating
                .map(|r| format!("{:.2}", r))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]);
    let mut by_source: Vec<_> = stats.by_source.iter().collect();
    by_source.sort();
    for (source, count) in by_source {
        store_table.add_row(vec![
            Cell::new(format!("  {}", source)),
            Cell::new(count.to_string()),
        ]);
    }
    store_table.load_preset(comfy_table::presets::UTF8_FULL);
    store_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", store_table);
    println!();

    if logs.is_empty() {
        println!("{}", "No import runs recorded yet".bright_black());
    } else {
        let mut log_table = Table::new();
        log_table.set_header(vec![
            Cell::new("Started").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Source").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Status").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Imported").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Updated").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Skipped").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("File").add_attribute(comfy_table::Attribute::Bold),
        ]);
        for log in &logs {
            log_table.add_row(vec![
                Cell::new(log.started_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(log.source.to_string()),
                Cell::new(log.status.to_string()),
                Cell::new(log.imported.to_string()),
                Cell::new(log.updated.to_string()),
                Cell::new(log.skipped.to_string()),
                Cell::new(log.file_name.as_deref().unwrap_or("-")),
            ]);
        }
        log_table.load_preset(comfy_table::presets::UTF8_FULL);
        log_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", log_table);
    }

    Ok(())
}

fn check(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
