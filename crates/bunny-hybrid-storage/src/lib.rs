//! Bunny Hybrid Storage Library
//!
//! Upload provider that sends videos to Bunny Stream and every other file to Bunny
//! Storage. It includes the UploadProvider trait, the two Bunny backends and the
//! hybrid router that dispatches between them.
//!
//! # Routing
//!
//! - **Uploads**: a `video/*` MIME type goes to the stream provider while streaming is
//!   enabled, everything else goes to storage.
//! - **Deletes**: a file whose provider metadata carries a `videoId` goes to the stream
//!   provider while streaming is enabled, everything else goes to storage.
//!
//! # Object path format
//!
//! Storage objects live at `{baseDir}/{path}/{hash}{ext}` with backslashes turned into
//! forward slashes and empty segments removed. Path generation is centralized in the
//! `keys` module.

mod body;
pub mod factory;
mod http;
pub mod hybrid;
pub(crate) mod keys;
pub mod traits;

#[cfg(feature = "storage-bunny")]
pub mod bunny;
#[cfg(feature = "storage-bunny-stream")]
pub mod stream;

// Re-export commonly used types
#[cfg(feature = "storage-bunny")]
pub use bunny::BunnyStorage;
#[cfg(feature = "storage-bunny")]
pub use factory::BunnyStorageFactory;
#[cfg(feature = "storage-bunny-stream")]
pub use factory::BunnyStreamFactory;
pub use factory::{create_hybrid_provider, ProviderFactory, ProviderRegistry};
pub use hybrid::{route_delete, route_upload, HybridProvider, Route};
#[cfg(feature = "storage-bunny-stream")]
pub use stream::BunnyStream;
pub use traits::{ProviderCapabilities, ProviderError, ProviderResult, UploadProvider};

pub use bunny_hybrid_core::{HybridOptions, UploadFile, UploadOutcome};
