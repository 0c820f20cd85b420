use review_config::{Config, CredentialStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::google::GoogleClient;
use crate::traits::ReviewProvider;
use crate::tripadvisor::TripadvisorClient;

/// Per-provider operational status, for `reviewhub status` and the
/// refresh summary. Never consulted by the merge logic.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub has_credentials: bool,
    pub configured: bool,
}

/// Builds live providers from configuration + credentials. Providers
/// are handed to the aggregator by injection; nothing here is global.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create every enabled, credentialed provider. A source that is
    /// enabled but missing its API key is skipped with a warning (it
    /// still shows up in `status()` for the operator).
    pub fn create_all(config: &Config, credentials: &CredentialStore) -> Vec<Arc<dyn ReviewProvider>> {
        let mut providers: Vec<Arc<dyn ReviewProvider>> = Vec::new();

        if let Some(google) = config.google.as_ref().filter(|g| g.enabled) {
            match credentials.get_google_api_key() {
                Some(key) if !key.is_empty() => {
                    providers.push(Arc::new(GoogleClient::new(
                        key.clone(),
                        google.place_id.clone(),
                        google.language.clone(),
                    )));
                    debug!("Google provider enabled");
                }
                _ => warn!("Google enabled but google_api_key is missing; skipping"),
            }
        }

        if let Some(tripadvisor) = config.tripadvisor.as_ref().filter(|t| t.enabled) {
            match credentials.get_tripadvisor_api_key() {
                Some(key) if !key.is_empty() => {
                    providers.push(Arc::new(TripadvisorClient::new(
                        key.clone(),
                        tripadvisor.location_id.clone(),
                        tripadvisor.search_query.clone(),
                        tripadvisor.language.clone(),
                    )));
                    debug!("TripAdvisor provider enabled");
                }
                _ => warn!("TripAdvisor enabled but tripadvisor_api_key is missing; skipping"),
            }
        }

        providers
    }

    /// Report config/credential presence for every known provider,
    /// including disabled ones.
    pub fn status(config: &Config, credentials: &CredentialStore) -> Vec<SourceStatus> {
        let google_enabled = config.google.as_ref().map(|g| g.enabled).unwrap_or(false);
        let google_key = credentials
            .get_google_api_key()
            .map(|k| !k.is_empty())
            .unwrap_or(false);
        let google_place = config
            .google
            .as_ref()
            .map(|g| !g.place_id.trim().is_empty())
            .unwrap_or(false);

        let ta_enabled = config.tripadvisor.as_ref().map(|t| t.enabled).unwrap_or(false);
        let ta_key = credentials
            .get_tripadvisor_api_key()
            .map(|k| !k.is_empty())
            .unwrap_or(false);
        let ta_target = config
            .tripadvisor
            .as_ref()
            .map(|t| {
                t.location_id.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
                    || t.search_query.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
            })
            .unwrap_or(false);

        vec![
            SourceStatus {
                name: "google",
                enabled: google_enabled,
                has_credentials: google_key,
                configured: google_enabled && google_key && google_place,
            },
            SourceStatus {
                name: "tripadvisor",
                enabled: ta_enabled,
                has_credentials: ta_key,
                configured: ta_enabled && ta_key && ta_target,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_config::{GoogleConfig, TripadvisorConfig};
    use std::path::PathBuf;

    fn config_with_both_enabled() -> Config {
        let mut config = Config::default();
        config.google = Some(GoogleConfig {
            enabled: true,
            place_id: "ChIJexample".to_string(),
            language: "en".to_string(),
        });
        config.tripadvisor = Some(TripadvisorConfig {
            enabled: true,
            location_id: Some("123456".to_string()),
            search_query: None,
            language: "en".to_string(),
        });
        config
    }

    #[test]
    fn test_missing_keys_produce_no_providers() {
        let config = config_with_both_enabled();
        let credentials = CredentialStore::new(PathBuf::from("/nonexistent"));
        let providers = ProviderRegistry::create_all(&config, &credentials);
        assert!(providers.is_empty());

        let status = ProviderRegistry::status(&config, &credentials);
        assert!(status.iter().all(|s| s.enabled && !s.has_credentials && !s.configured));
    }

    #[test]
    fn test_credentialed_providers_are_created() {
        let config = config_with_both_enabled();
        let mut credentials = CredentialStore::new(PathBuf::from("/nonexistent"));
        credentials.set_google_api_key("AIza-test".to_string());
        credentials.set_tripadvisor_api_key("ta-test".to_string());

        let providers = ProviderRegistry::create_all(&config, &credentials);
        assert_eq!(providers.len(), 2);
        assert!(providers.iter().all(|p| p.is_configured()));

        let status = ProviderRegistry::status(&config, &credentials);
        assert!(status.iter().all(|s| s.configured));
    }

    #[test]
    fn test_disabled_sources_are_reported_but_not_created() {
        let config = Config::default();
        let mut credentials = CredentialStore::new(PathBuf::from("/nonexistent"));
        credentials.set_google_api_key("AIza-test".to_string());

        assert!(ProviderRegistry::create_all(&config, &credentials).is_empty());
        let status = ProviderRegistry::status(&config, &credentials);
        assert_eq!(status.len(), 2);
        assert!(status.iter().all(|s| !s.enabled && !s.configured));
    }
}
