//! Hybrid provider routing between Bunny Storage and Bunny Stream
//!
//! Uploads of `video/*` files go to the stream provider when the feature flag is on.
//! Deletes go to the stream provider when the file carries a stream video id, whatever
//! its current MIME type, so a re-typed video still deletes from the right place.

use async_trait::async_trait;
use bunny_hybrid_core::{is_video, video_id, UploadFile, UploadOutcome};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::traits::{ProviderCapabilities, ProviderError, ProviderResult, UploadProvider};

const HYBRID_PROVIDER_NAME: &str = "bunny-hybrid";

/// Child provider selected for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Storage,
    Stream,
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Route::Storage => write!(f, "storage"),
            Route::Stream => write!(f, "stream"),
        }
    }
}

/// Route an upload: stream for video files when enabled, storage otherwise
pub fn route_upload(stream_enabled: bool, mime: Option<&str>) -> Route {
    if stream_enabled && is_video(mime) {
        Route::Stream
    } else {
        Route::Storage
    }
}

/// Route a delete: stream when enabled and the metadata holds a video id
pub fn route_delete(stream_enabled: bool, metadata: &Map<String, Value>) -> Route {
    if stream_enabled && video_id(metadata).is_some() {
        Route::Stream
    } else {
        Route::Storage
    }
}

/// Upload provider delegating to a storage and an optional stream provider
///
/// Built once at startup and never mutated afterwards; concurrent calls only share
/// the read-only children.
#[derive(Clone)]
pub struct HybridProvider {
    storage: Arc<dyn UploadProvider>,
    stream: Option<Arc<dyn UploadProvider>>,
    stream_enabled: bool,
}

impl HybridProvider {
    /// Create a hybrid provider from already-initialized children
    ///
    /// Every child must declare `upload` and `delete`; otherwise construction fails
    /// naming the missing operation.
    pub fn new(
        storage: Arc<dyn UploadProvider>,
        stream: Option<Arc<dyn UploadProvider>>,
        stream_enabled: bool,
    ) -> ProviderResult<Self> {
        validate_provider(storage.as_ref())?;
        if let Some(stream) = &stream {
            validate_provider(stream.as_ref())?;
        }

        tracing::info!(
            storage = storage.name(),
            stream = stream.as_ref().map(|s| s.name()).unwrap_or("none"),
            stream_enabled,
            "Hybrid provider initialized"
        );

        Ok(Self {
            storage,
            stream,
            stream_enabled,
        })
    }

    pub fn stream_enabled(&self) -> bool {
        self.stream_enabled
    }

    fn provider(
        &self,
        route: Route,
        operation: &'static str,
    ) -> ProviderResult<&Arc<dyn UploadProvider>> {
        match route {
            Route::Storage => Ok(&self.storage),
            Route::Stream => self
                .stream
                .as_ref()
                .ok_or(ProviderError::NoProvider { operation }),
        }
    }

    fn provider_for_upload(
        &self,
        file: &UploadFile,
        operation: &'static str,
    ) -> ProviderResult<&Arc<dyn UploadProvider>> {
        let route = route_upload(self.stream_enabled, file.mime.as_deref());
        tracing::debug!(
            operation = operation,
            route = %route,
            mime = file.mime.as_deref().unwrap_or(""),
            "Hybrid provider routing"
        );
        self.provider(route, operation)
    }

    /// Upload and write the URL and metadata back onto the file
    pub async fn upload_file(&self, file: &mut UploadFile) -> ProviderResult<()> {
        let outcome = self.upload(file).await?;
        file.apply(outcome);
        Ok(())
    }

    /// Stream upload and write the URL and metadata back onto the file
    pub async fn upload_file_stream(&self, file: &mut UploadFile) -> ProviderResult<()> {
        let outcome = self.upload_stream(file).await?;
        file.apply(outcome);
        Ok(())
    }

    /// Delete the file from whichever provider stored it
    pub async fn delete_file(&self, file: &UploadFile) -> ProviderResult<()> {
        self.delete(file).await
    }
}

fn validate_provider(provider: &dyn UploadProvider) -> ProviderResult<()> {
    match provider.capabilities().missing_required() {
        Some(capability) => Err(ProviderError::MissingCapability {
            provider: provider.name().to_string(),
            capability,
        }),
        None => Ok(()),
    }
}

#[async_trait]
impl UploadProvider for HybridProvider {
    fn name(&self) -> &str {
        HYBRID_PROVIDER_NAME
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::basic().with_upload_stream()
    }

    async fn upload(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        let provider = self.provider_for_upload(file, "upload")?;
        provider.upload(file).await
    }

    async fn upload_stream(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        let provider = self.provider_for_upload(file, "uploadStream")?;
        if provider.capabilities().upload_stream {
            provider.upload_stream(file).await
        } else {
            provider.upload(file).await
        }
    }

    async fn delete(&self, file: &UploadFile) -> ProviderResult<()> {
        let route = match route_delete(self.stream_enabled, &file.provider_metadata) {
            Route::Stream if self.stream.is_none() => Route::Storage,
            route => route,
        };
        tracing::debug!(
            operation = "delete",
            route = %route,
            mime = file.mime.as_deref().unwrap_or(""),
            "Hybrid provider routing"
        );

        // Storage always exists, so a delete never lacks a provider.
        let provider = self.provider(route, "delete")?;
        provider.delete(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::Mutex;

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct MockProvider {
        name: String,
        capabilities: ProviderCapabilities,
        calls: CallLog,
    }

    impl MockProvider {
        fn new(name: &str, calls: &CallLog) -> Self {
            Self {
                name: name.to_string(),
                capabilities: ProviderCapabilities::basic(),
                calls: calls.clone(),
            }
        }

        fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
            self.capabilities = capabilities;
            self
        }

        fn record(&self, operation: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, operation));
        }
    }

    #[async_trait]
    impl UploadProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn capabilities(&self) -> ProviderCapabilities {
            self.capabilities
        }

        async fn upload(&self, _file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
            self.record("upload");
            let mut metadata = Map::new();
            metadata.insert("videoId".to_string(), json!(format!("{}-id", self.name)));
            Ok(UploadOutcome::new(format!("https://{}.example.com/file", self.name))
                .with_metadata(metadata))
        }

        async fn upload_stream(&self, _file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
            self.record("upload_stream");
            Ok(UploadOutcome::new(format!("https://{}.example.com/stream", self.name)))
        }

        async fn delete(&self, _file: &UploadFile) -> ProviderResult<()> {
            self.record("delete");
            Ok(())
        }
    }

    fn hybrid(stream_enabled: bool, calls: &CallLog) -> HybridProvider {
        let storage = Arc::new(MockProvider::new("storage", calls).with_capabilities(
            ProviderCapabilities::basic().with_upload_stream(),
        ));
        let stream = stream_enabled
            .then(|| Arc::new(MockProvider::new("stream", calls)) as Arc<dyn UploadProvider>);
        HybridProvider::new(storage, stream, stream_enabled).unwrap()
    }

    fn file(mime: &str) -> UploadFile {
        UploadFile::new("name", "hash", ".ext", Some(mime)).with_buffer(Bytes::from_static(b"x"))
    }

    fn metadata(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_route_upload() {
        assert_eq!(route_upload(true, Some("video/mp4")), Route::Stream);
        assert_eq!(route_upload(true, Some("image/png")), Route::Storage);
        assert_eq!(route_upload(true, None), Route::Storage);
        assert_eq!(route_upload(false, Some("video/mp4")), Route::Storage);
    }

    #[test]
    fn test_route_delete_uses_metadata_not_mime() {
        assert_eq!(
            route_delete(true, &metadata(json!({"videoId": "abc"}))),
            Route::Stream
        );
        assert_eq!(route_delete(true, &metadata(json!({}))), Route::Storage);
        assert_eq!(
            route_delete(false, &metadata(json!({"videoId": "abc"}))),
            Route::Storage
        );
    }

    #[tokio::test]
    async fn test_upload_routes_video_to_stream() {
        let log = CallLog::default();
        let provider = hybrid(true, &log);

        let mut video = file("video/mp4");
        provider.upload_file(&mut video).await.unwrap();
        let mut image = file("image/png");
        provider.upload_file(&mut image).await.unwrap();

        assert_eq!(calls(&log), vec!["stream:upload", "storage:upload"]);
        assert_eq!(video.url.as_deref(), Some("https://stream.example.com/file"));
        assert_eq!(
            video.provider_metadata,
            metadata(json!({"videoId": "stream-id"}))
        );
        assert_eq!(image.url.as_deref(), Some("https://storage.example.com/file"));
    }

    #[tokio::test]
    async fn test_disabled_stream_routes_everything_to_storage() {
        let log = CallLog::default();
        let provider = hybrid(false, &log);

        provider.upload_file(&mut file("video/mp4")).await.unwrap();
        provider.upload_file(&mut file("image/png")).await.unwrap();
        provider
            .delete_file(&file("video/mp4").with_metadata(metadata(json!({"videoId": "abc"}))))
            .await
            .unwrap();

        assert_eq!(
            calls(&log),
            vec!["storage:upload", "storage:upload", "storage:delete"]
        );
    }

    #[tokio::test]
    async fn test_upload_stream_prefers_dedicated_streaming_operation() {
        let log = CallLog::default();
        let provider = hybrid(true, &log);

        let mut image = file("image/png");
        provider.upload_file_stream(&mut image).await.unwrap();
        provider
            .upload_file_stream(&mut file("video/mp4"))
            .await
            .unwrap();

        // Storage declares a streaming upload, the stream mock does not.
        assert_eq!(calls(&log), vec!["storage:upload_stream", "stream:upload"]);
        assert_eq!(
            image.url.as_deref(),
            Some("https://storage.example.com/stream")
        );
    }

    #[tokio::test]
    async fn test_delete_routes_by_video_id_even_for_non_video_mime() {
        let log = CallLog::default();
        let provider = hybrid(true, &log);

        let retyped = file("application/octet-stream")
            .with_metadata(metadata(json!({"videoId": "abc"})));
        provider.delete_file(&retyped).await.unwrap();

        let plain = file("video/mp4").with_metadata(metadata(json!({})));
        provider.delete_file(&plain).await.unwrap();

        assert_eq!(calls(&log), vec!["stream:delete", "storage:delete"]);
    }

    #[tokio::test]
    async fn test_enabled_without_stream_provider() {
        let log = CallLog::default();
        let storage = Arc::new(MockProvider::new("storage", &log));
        let provider = HybridProvider::new(storage, None, true).unwrap();

        let err = provider.upload(&mut file("video/mp4")).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::NoProvider {
                operation: "upload"
            }
        ));

        provider
            .delete_file(&file("video/mp4").with_metadata(metadata(json!({"videoId": "abc"}))))
            .await
            .unwrap();
        assert_eq!(calls(&log), vec!["storage:delete"]);
    }

    #[test]
    fn test_new_rejects_provider_without_delete() {
        let log = CallLog::default();
        let storage = Arc::new(MockProvider::new("read-only", &log).with_capabilities(
            ProviderCapabilities {
                upload: true,
                upload_stream: false,
                delete: false,
            },
        ));

        let err = HybridProvider::new(storage, None, false).err().unwrap();
        assert!(matches!(
            err,
            ProviderError::MissingCapability {
                capability: "delete",
                ..
            }
        ));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_new_rejects_stream_without_upload() {
        let log = CallLog::default();
        let storage = Arc::new(MockProvider::new("storage", &log));
        let stream = Arc::new(MockProvider::new("stream", &log).with_capabilities(
            ProviderCapabilities {
                upload: false,
                upload_stream: false,
                delete: true,
            },
        ));

        let err = HybridProvider::new(storage, Some(stream), true).err().unwrap();
        assert!(matches!(
            err,
            ProviderError::MissingCapability {
                capability: "upload",
                ..
            }
        ));
    }
}
