//! Bunny Hybrid Core Library
//!
//! This crate provides the domain types, option parsing and configuration errors
//! shared by the upload providers and the hybrid router.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    options_from_env, options_from_lookup, parse_flag, HybridOptions, StorageOptions,
    StreamOptions,
};
pub use error::ConfigError;
pub use models::{is_video, video_id, ByteReader, UploadFile, UploadOutcome};
