use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use review_config::{Config, CredentialStore, PathManager};
use serde_json::json;

pub fn run_show(output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    let config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config: {}", e))?
    } else {
        Config::default()
    };

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials.load().ok();

    if output.format() != OutputFormat::Human {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "database_file": crate::context::database_path(&config, &paths).display().to_string(),
            "google": config.google.as_ref().map(|g| json!({
                "enabled": g.enabled,
                "place_id": g.place_id,
                "language": g.language,
                "api_key": credentials.get_google_api_key().map(|k| mask_string(k)),
            })),
            "tripadvisor": config.tripadvisor.as_ref().map(|t| json!({
                "enabled": t.enabled,
                "location_id": t.location_id,
                "search_query": t.search_query,
                "language": t.language,
                "api_key": credentials.get_tripadvisor_api_key().map(|k| mask_string(k)),
            })),
            "cache": {
                "ttl_seconds": config.cache.ttl_seconds,
                "refresh_pages": config.cache.refresh_pages,
                "per_page": config.cache.per_page,
            },
            "fetch": {
                "max_results": config.fetch.max_results,
                "timeout_seconds": config.fetch.timeout_seconds,
            },
        }));
        return Ok(());
    }

    let mut info_table = Table::new();
    info_table.add_row(vec![
        Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(config_file.display().to_string()),
    ]);
    info_table.add_row(vec![
        Cell::new("Database").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(crate::context::database_path(&config, &paths).display().to_string()),
    ]);
    info_table.load_preset(comfy_table::presets::UTF8_FULL);
    info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", info_table);
    println!();

    if let Some(google) = &config.google {
        let mut table = Table::new();
        table.set_header(vec![Cell::new("Google Places")
            .fg(comfy_table::Color::Cyan)
            .add_attribute(comfy_table::Attribute::Bold)]);
        table.add_row(vec![Cell::new("Enabled"), Cell::new(check(google.enabled))]);
        table.add_row(vec![Cell::new("Place ID"), Cell::new(google.place_id.clone())]);
        table.add_row(vec![Cell::new("Language"), Cell::new(google.language.clone())]);
        table.add_row(vec![
            Cell::new("API Key"),
            Cell::new(
                credentials
                    .get_google_api_key()
                    .map(|k| mask_string(k))
                    .unwrap_or_else(|| "<not set>".to_string()),
            ),
        ]);
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", table);
        println!();
    } else {
        println!("{}", "Google Places: Not configured".bright_black());
        println!();
    }

    if let Some(tripadvisor) = &config.tripadvisor {
        let mut table = Table::new();
        table.set_header(vec![Cell::new("TripAdvisor")
            .fg(comfy_table::Color::Cyan)
            .add_attribute(comfy_table::Attribute::Bold)]);
        table.add_row(vec![Cell::new("Enabled"), Cell::new(check(tripadvisor.enabled))]);
        table.add_row(vec![
            Cell::new("Location ID"),
            Cell::new(tripadvisor.location_id.as_deref().unwrap_or("<resolved from search>")),
        ]);
        table.add_row(vec![
            Cell::new("Search Query"),
            Cell::new(tripadvisor.search_query.as_deref().unwrap_or("-")),
        ]);
        table.add_row(vec![Cell::new("Language"), Cell::new(tripadvisor.language.clone())]);
        table.add_row(vec![
            Cell::new("API Key"),
            Cell::new(
                credentials
                    .get_tripadvisor_api_key()
                    .map(|k| mask_string(k))
                    .unwrap_or_else(|| "<not set>".to_string()),
            ),
        ]);
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", table);
        println!();
    } else {
        println!("{}", "TripAdvisor: Not configured".bright_black());
        println!();
    }

    let mut cache_table = Table::new();
    cache_table.set_header(vec![Cell::new("Cache & Fetch")
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)]);
    cache_table.add_row(vec![
        Cell::new("Cache TTL"),
        Cell::new(format!("{}s", config.cache.ttl_seconds)),
    ]);
    cache_table.add_row(vec![
        Cell::new("Refresh pages"),
        Cell::new(config.cache.refresh_pages.to_string()),
    ]);
    cache_table.add_row(vec![
        Cell::new("Per page"),
        Cell::new(config.cache.per_page.to_string()),
    ]);
    cache_table.add_row(vec![
        Cell::new("Max results per call"),
        Cell::new(config.fetch.max_results.to_string()),
    ]);
    cache_table.add_row(vec![
        Cell::new("Call timeout"),
        Cell::new(format!("{}s", config.fetch.timeout_seconds)),
    ]);
    cache_table.load_preset(comfy_table::presets::UTF8_FULL);
    cache_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", cache_table);

    Ok(())
}

pub fn run_set_key(provider: &str, key: Option<String>, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials.load().ok();

    let provider = provider.to_lowercase();
    if provider != "google" && provider != "tripadvisor" {
        return Err(color_eyre::eyre::eyre!(
            "Unknown provider '{}' (use google or tripadvisor)",
            provider
        ));
    }

    let key = match key {
        Some(key) => key,
        None => rpassword::prompt_password(format!("API key for {}: ", provider))
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read key: {}", e))?,
    };
    if key.trim().is_empty() {
        return Err(color_eyre::eyre::eyre!("API key must not be empty"));
    }

    match provider.as_str() {
        "google" => credentials.set_google_api_key(key.trim().to_string()),
        _ => credentials.set_tripadvisor_api_key(key.trim().to_string()),
    }
    credentials
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;

    output.success(format!("Stored API key for {}", provider));
    Ok(())
}

fn check(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    // Indexed by char, not byte, so multi-byte keys never split mid-character
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
