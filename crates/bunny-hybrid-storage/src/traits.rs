//! Upload provider abstraction trait
//!
//! This module defines the UploadProvider trait that the Bunny backends and the
//! hybrid router implement, together with the shared error type.

use async_trait::async_trait;
use bunny_hybrid_core::{ConfigError, UploadFile, UploadOutcome};
use thiserror::Error;

/// Upload provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{provider} provider does not support required operation: {capability}")]
    MissingCapability {
        provider: String,
        capability: &'static str,
    },

    #[error("Unable to resolve {role} provider '{name}' (registered providers: {registered})")]
    UnknownProvider {
        role: &'static str,
        name: String,
        registered: String,
    },

    #[error("Hybrid provider: no provider available for {operation}")]
    NoProvider { operation: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{operation} failed: {status} {status_text} {body}")]
    Remote {
        operation: &'static str,
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Operations a provider actually implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub upload: bool,
    pub upload_stream: bool,
    pub delete: bool,
}

impl ProviderCapabilities {
    /// Upload and delete, no dedicated streaming upload
    pub fn basic() -> Self {
        Self {
            upload: true,
            upload_stream: false,
            delete: true,
        }
    }

    pub fn with_upload_stream(mut self) -> Self {
        self.upload_stream = true;
        self
    }

    /// Name of the first required operation that is missing
    pub fn missing_required(&self) -> Option<&'static str> {
        if !self.upload {
            Some("upload")
        } else if !self.delete {
            Some("delete")
        } else {
            None
        }
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self::basic()
    }
}

/// Upload provider trait
///
/// Providers never mutate `url` or `provider_metadata` on the file themselves; they
/// return an [`UploadOutcome`] and the caller merges it back. `upload` takes the file
/// mutably only so a byte stream can be drained.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &str;

    /// Operations this provider implements
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::basic()
    }

    /// Upload a file and return its public URL and metadata
    async fn upload(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome>;

    /// Upload a file supplied as a stream
    ///
    /// Providers without a dedicated streaming path inherit this fallback to `upload`.
    async fn upload_stream(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        self.upload(file).await
    }

    /// Delete a previously uploaded file
    async fn delete(&self, file: &UploadFile) -> ProviderResult<()>;
}
