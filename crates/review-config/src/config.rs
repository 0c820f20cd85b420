use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub tripadvisor: Option<TripadvisorConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleConfig {
    pub enabled: bool,
    /// Google Places place_id of the business whose reviews we pull.
    pub place_id: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TripadvisorConfig {
    pub enabled: bool,
    /// TripAdvisor location id. When empty, the client resolves it via
    /// the location search endpoint using `search_query`.
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// How long a cached page stays fresh.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Pages preloaded by a refresh run.
    #[serde(default = "default_refresh_pages")]
    pub refresh_pages: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            refresh_pages: default_refresh_pages(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Cap on reviews requested per provider call (quota protection).
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Per-provider call timeout during a fan-out.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// SQLite file path. Empty means the PathManager default.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Cron expression for the daemon's periodic refresh.
    pub schedule: String,
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        // Daily at 04:00, after the providers' own nightly refreshes
        schedule: "0 0 4 * * *".to_string(),
        run_on_startup: default_run_on_startup(),
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_ttl_seconds() -> u64 {
    6 * 60 * 60
}

fn default_refresh_pages() -> u32 {
    3
}

fn default_per_page() -> u32 {
    7
}

fn default_max_results() -> u32 {
    50
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_run_on_startup() -> bool {
    true
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fetch.max_results == 0 || self.fetch.max_results > 50 {
            return Err(anyhow::anyhow!(
                "fetch.max_results must be between 1 and 50 (got {})",
                self.fetch.max_results
            ));
        }
        if self.cache.per_page == 0 {
            return Err(anyhow::anyhow!("cache.per_page must be at least 1"));
        }
        if let Some(google) = &self.google {
            if google.enabled && google.place_id.trim().is_empty() {
                return Err(anyhow::anyhow!("google.place_id is required when google is enabled"));
            }
        }
        if let Some(tripadvisor) = &self.tripadvisor {
            let has_location = tripadvisor
                .location_id
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            let has_query = tripadvisor
                .search_query
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if tripadvisor.enabled && !has_location && !has_query {
                return Err(anyhow::anyhow!(
                    "tripadvisor needs either location_id or search_query when enabled"
                ));
            }
        }
        Ok(())
    }
}
