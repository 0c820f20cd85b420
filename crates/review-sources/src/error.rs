use thiserror::Error;

/// Non-fatal provider failure, tagged with the provider name so the
/// aggregator can log and absorb it without losing attribution.
#[derive(Debug, Error)]
#[error("{provider}: {message}")]
pub struct SourceError {
    pub provider: String,
    pub message: String,
}

impl SourceError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn from_http(provider: impl Into<String>, err: reqwest::Error) -> Self {
        Self::new(provider, err.to_string())
    }
}
