use bytes::Bytes;
use serde_json::{Map, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::pin::Pin;
use tokio::io::AsyncRead;

use crate::constants::VIDEO_ID_KEY;

/// Readable byte source supplied by the host instead of an in-memory buffer
///
/// `Sync` keeps `&UploadFile` sendable across await points in provider futures.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Sync + Unpin>>;

/// File descriptor for a single upload or delete request
///
/// Built by the host for one call and borrowed by the providers for its duration.
/// `url` and `provider_metadata` are output fields: they are filled from the
/// [`UploadOutcome`] of a successful upload and read back on delete.
#[derive(Default)]
pub struct UploadFile {
    /// Display name
    pub name: String,
    /// Content hash, used as the object name
    pub hash: String,
    /// Extension including the leading dot (e.g. ".png")
    pub ext: String,
    /// Declared MIME type
    pub mime: Option<String>,
    /// In-memory content
    pub buffer: Option<Bytes>,
    /// Streamed content, drained when no buffer is present
    pub stream: Option<ByteReader>,
    /// Optional folder path relative to the storage root
    pub path: Option<String>,
    /// Public URL, written after upload
    pub url: Option<String>,
    /// Provider-specific metadata, written after upload and read back on delete
    pub provider_metadata: Map<String, Value>,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        hash: impl Into<String>,
        ext: impl Into<String>,
        mime: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            ext: ext.into(),
            mime: mime.map(String::from),
            ..Default::default()
        }
    }

    pub fn with_buffer(mut self, buffer: impl Into<Bytes>) -> Self {
        self.buffer = Some(buffer.into());
        self
    }

    pub fn with_stream(mut self, stream: ByteReader) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.provider_metadata = metadata;
        self
    }

    /// `{hash}{ext}`, the object name used by storage and as a video title fallback
    pub fn file_name(&self) -> String {
        format!("{}{}", self.hash, self.ext)
    }

    pub fn is_video(&self) -> bool {
        is_video(self.mime.as_deref())
    }

    /// Merge a provider result back into the descriptor
    ///
    /// The URL is always replaced. Metadata is replaced (not merged) only when the
    /// outcome carries some.
    pub fn apply(&mut self, outcome: UploadOutcome) {
        self.url = Some(outcome.url);
        if let Some(metadata) = outcome.provider_metadata {
            self.provider_metadata = metadata;
        }
    }
}

impl Debug for UploadFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .field("ext", &self.ext)
            .field("mime", &self.mime)
            .field("buffer_len", &self.buffer.as_ref().map(Bytes::len))
            .field("has_stream", &self.stream.is_some())
            .field("path", &self.path)
            .field("url", &self.url)
            .field("provider_metadata", &self.provider_metadata)
            .finish()
    }
}

/// What a provider produced for a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Public URL of the stored file
    pub url: String,
    /// Replacement provider metadata, if the provider tracks any
    pub provider_metadata: Option<Map<String, Value>>,
}

impl UploadOutcome {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            provider_metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.provider_metadata = Some(metadata);
        self
    }
}

/// True when the MIME type is present and starts with `video/`
pub fn is_video(mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.starts_with("video/"))
}

/// Bunny Stream video id stored in provider metadata, if any
///
/// Accepts string and numeric ids; empty strings count as absent.
pub fn video_id(metadata: &Map<String, Value>) -> Option<String> {
    match metadata.get(VIDEO_ID_KEY)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
