//! Provider resolution and hybrid provider assembly
//!
//! Providers are looked up by name only here. The router itself receives
//! initialized children and never resolves anything.

use bunny_hybrid_core::HybridOptions;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "storage-bunny")]
use crate::BunnyStorage;
#[cfg(feature = "storage-bunny-stream")]
use crate::BunnyStream;
use crate::{HybridProvider, ProviderError, ProviderResult, UploadProvider};

/// Creates a provider from its options map
///
/// Implemented by factory types and, through the blanket impl, by plain functions
/// and closures taking `&Value`.
pub trait ProviderFactory: Send + Sync {
    fn init(&self, options: &Value) -> ProviderResult<Arc<dyn UploadProvider>>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&Value) -> ProviderResult<Arc<dyn UploadProvider>> + Send + Sync,
{
    fn init(&self, options: &Value) -> ProviderResult<Arc<dyn UploadProvider>> {
        self(options)
    }
}

/// Factory for [`BunnyStorage`]
#[cfg(feature = "storage-bunny")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BunnyStorageFactory;

#[cfg(feature = "storage-bunny")]
impl ProviderFactory for BunnyStorageFactory {
    fn init(&self, options: &Value) -> ProviderResult<Arc<dyn UploadProvider>> {
        Ok(Arc::new(BunnyStorage::from_value(options)?))
    }
}

/// Factory for [`BunnyStream`]
#[cfg(feature = "storage-bunny-stream")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BunnyStreamFactory;

#[cfg(feature = "storage-bunny-stream")]
impl ProviderFactory for BunnyStreamFactory {
    fn init(&self, options: &Value) -> ProviderResult<Arc<dyn UploadProvider>> {
        Ok(Arc::new(BunnyStream::from_value(options)?))
    }
}

/// Named provider factories
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Bunny providers under their default names
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "storage-bunny")]
        registry.register(
            bunny_hybrid_core::constants::STORAGE_PROVIDER_NAME,
            BunnyStorageFactory,
        );
        #[cfg(feature = "storage-bunny-stream")]
        registry.register(
            bunny_hybrid_core::constants::STREAM_PROVIDER_NAME,
            BunnyStreamFactory,
        );
        registry
    }

    /// Register a factory, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: ProviderFactory + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up the factory for a provider role
    pub fn resolve(
        &self,
        role: &'static str,
        name: &str,
    ) -> ProviderResult<Arc<dyn ProviderFactory>> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider {
                role,
                name: name.to_string(),
                registered: self.names().join(", "),
            })
    }
}

/// Create the hybrid provider from the host options map
///
/// All configuration problems surface here rather than on the first upload. The
/// stream provider is neither resolved nor initialized while the flag is off, so its
/// credentials are only required when it is used.
pub fn create_hybrid_provider(
    options: &Value,
    registry: &ProviderRegistry,
) -> ProviderResult<HybridProvider> {
    let options = HybridOptions::from_value(options)?;

    let storage = registry
        .resolve("storage", &options.storage_provider)?
        .init(&options.storage)?;

    let stream = if options.stream_enabled {
        let stream = registry
            .resolve("stream", &options.stream_provider)?
            .init(&options.stream)?;
        Some(stream)
    } else {
        tracing::debug!("Bunny Stream disabled, videos will be stored as regular files");
        None
    };

    HybridProvider::new(storage, stream, options.stream_enabled)
}

impl HybridProvider {
    /// Create the hybrid provider using the built-in providers
    pub fn init(options: &Value) -> ProviderResult<Self> {
        create_hybrid_provider(options, &ProviderRegistry::with_defaults())
    }
}
