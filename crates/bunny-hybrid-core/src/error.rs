//! Configuration error types
//!
//! Raised while options are parsed at initialization time, before any network activity.

/// Errors raised while resolving provider options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{provider} provider: {option} is required")]
    MissingOption {
        provider: &'static str,
        option: &'static str,
    },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl ConfigError {
    pub fn missing(provider: &'static str, option: &'static str) -> Self {
        ConfigError::MissingOption { provider, option }
    }
}
