use color_eyre::Result;
use review_config::{Config, CredentialStore, PathManager};
use review_core::{ImportService, ReviewAggregator, ReviewStore};
use review_sources::ProviderRegistry;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a command needs, wired once per invocation.
pub struct AppContext {
    pub config: Config,
    pub credentials: CredentialStore,
    pub paths: PathManager,
    pub store: ReviewStore,
}

impl AppContext {
    pub async fn load() -> Result<Self> {
        let paths = PathManager::default();

        let config_file = paths.config_file();
        let config = if config_file.exists() {
            Config::load_from_file(&config_file).map_err(|e| {
                color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
            })?
        } else {
            tracing::debug!(path = %config_file.display(), "No config file, using defaults");
            Config::default()
        };
        config
            .validate()
            .map_err(|e| color_eyre::eyre::eyre!("Configuration invalid: {}", e))?;

        let credentials_file = paths.credentials_file();
        let mut credentials = CredentialStore::new(credentials_file.clone());
        credentials.load().map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to load credentials from {}: {}",
                credentials_file.display(),
                e
            )
        })?;

        let database_file = database_path(&config, &paths);
        let store = ReviewStore::open(&database_file).await.map_err(|e| {
            color_eyre::eyre::eyre!("Failed to open database {}: {}", database_file.display(), e)
        })?;

        Ok(Self { config, credentials, paths, store })
    }

    pub fn aggregator(&self) -> ReviewAggregator {
        let providers = ProviderRegistry::create_all(&self.config, &self.credentials);
        ReviewAggregator::new(
            providers,
            Duration::from_secs(self.config.cache.ttl_seconds),
            self.config.fetch.max_results as usize,
            Duration::from_secs(self.config.fetch.timeout_seconds),
        )
    }

    pub fn import_service(&self) -> ImportService {
        ImportService::new(self.store.clone())
    }
}

pub fn database_path(config: &Config, paths: &PathManager) -> PathBuf {
    config
        .database
        .path
        .clone()
        .unwrap_or_else(|| paths.database_file())
}
