//! Domain models
//!
//! The file descriptor handed over by the host and the result each provider returns.

pub mod file;

pub use file::{is_video, video_id, ByteReader, UploadFile, UploadOutcome};
