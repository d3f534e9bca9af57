//! Bunny Stream video provider
//!
//! Uploads are a two-step protocol: create a video object to obtain its id, then
//! PUT the bytes to that video. The second step depends on the id from the first,
//! so a failed upload has to be retried from the create step.

use async_trait::async_trait;
use bunny_hybrid_core::constants::{
    DEFAULT_CONTENT_TYPE, FALLBACK_VIDEO_TITLE, STREAM_PROVIDER_NAME, VIDEO_ID_KEY,
};
use bunny_hybrid_core::{StreamOptions, UploadFile, UploadOutcome};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::body::resolve_bytes;
use crate::http::{build_client, check_response, ACCESS_KEY_HEADER};
use crate::traits::{ProviderError, ProviderResult, UploadProvider};

/// Response fields that may carry the created video id, in lookup order
const VIDEO_ID_FIELDS: [&str; 3] = ["guid", "id", "videoId"];

#[derive(Debug, Serialize)]
struct CreateVideoRequest<'a> {
    title: &'a str,
    #[serde(rename = "collectionId", skip_serializing_if = "Option::is_none")]
    collection_id: Option<&'a str>,
}

/// Extract the video id from a create-video response
pub fn extract_video_id(response: &Value) -> Option<String> {
    VIDEO_ID_FIELDS
        .iter()
        .filter_map(|field| response.get(*field))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Title for a created video: file name, then `{hash}{ext}`, then "video"
pub fn video_title(file: &UploadFile) -> String {
    if !file.name.is_empty() {
        return file.name.clone();
    }
    let file_name = file.file_name();
    if !file_name.is_empty() {
        return file_name;
    }
    FALLBACK_VIDEO_TITLE.to_string()
}

/// Bunny Stream implementation
#[derive(Clone)]
pub struct BunnyStream {
    client: reqwest::Client,
    options: StreamOptions,
}

impl BunnyStream {
    pub fn new(options: StreamOptions) -> ProviderResult<Self> {
        Ok(BunnyStream {
            client: build_client()?,
            options,
        })
    }

    /// Parse options from the host options map and create the provider
    pub fn from_value(options: &Value) -> ProviderResult<Self> {
        Self::new(StreamOptions::from_value(options)?)
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    fn videos_url(&self) -> String {
        format!(
            "{}/library/{}/videos",
            self.options.api_base,
            urlencoding::encode(&self.options.library_id)
        )
    }

    fn video_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.videos_url(), urlencoding::encode(video_id))
    }

    /// Player embed URL of a video
    pub fn embed_url(&self, video_id: &str) -> String {
        format!(
            "{}/embed/{}/{}",
            self.options.embed_base, self.options.library_id, video_id
        )
    }

    async fn create_video(&self, title: &str) -> ProviderResult<String> {
        let body = CreateVideoRequest {
            title,
            collection_id: self.options.collection_id.as_deref(),
        };

        let response = self
            .client
            .post(self.videos_url())
            .header(ACCESS_KEY_HEADER, &self.options.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_response(response, "Bunny Stream create video", false).await?;
        let json: Value = response.json().await?;

        extract_video_id(&json).ok_or_else(|| {
            ProviderError::InvalidResponse(
                "Bunny Stream: could not resolve created video id".to_string(),
            )
        })
    }

    async fn upload_video_bytes(
        &self,
        video_id: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> ProviderResult<()> {
        let response = self
            .client
            .put(self.video_url(video_id))
            .header(ACCESS_KEY_HEADER, &self.options.api_key)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        check_response(response, "Bunny Stream upload bytes", false).await?;
        Ok(())
    }
}

#[async_trait]
impl UploadProvider for BunnyStream {
    fn name(&self) -> &str {
        STREAM_PROVIDER_NAME
    }

    async fn upload(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        if !file.is_video() {
            return Err(ProviderError::InvalidInput(
                "Bunny Stream provider: only video/* mime types are supported".to_string(),
            ));
        }

        let bytes = resolve_bytes(file, "Bunny Stream").await?;
        let size = bytes.len() as u64;
        let content_type = file
            .mime
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let title = video_title(file);

        let start = std::time::Instant::now();

        let video_id = self.create_video(&title).await.map_err(|e| {
            tracing::error!(
                error = %e,
                library_id = %self.options.library_id,
                size_bytes = size,
                "Bunny Stream video creation failed"
            );
            e
        })?;
        tracing::debug!(
            library_id = %self.options.library_id,
            video_id = %video_id,
            "Bunny Stream video created"
        );

        self.upload_video_bytes(&video_id, &content_type, bytes)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    library_id = %self.options.library_id,
                    video_id = %video_id,
                    size_bytes = size,
                    "Bunny Stream upload failed after video was created"
                );
                e
            })?;

        tracing::info!(
            library_id = %self.options.library_id,
            video_id = %video_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bunny Stream upload successful"
        );

        let mut metadata = Map::new();
        metadata.insert(VIDEO_ID_KEY.to_string(), Value::String(video_id.clone()));

        Ok(UploadOutcome::new(self.embed_url(&video_id)).with_metadata(metadata))
    }

    async fn delete(&self, file: &UploadFile) -> ProviderResult<()> {
        let Some(video_id) = bunny_hybrid_core::video_id(&file.provider_metadata) else {
            tracing::warn!(
                library_id = %self.options.library_id,
                hash = %file.hash,
                "Bunny Stream delete skipped, no video id in provider metadata"
            );
            return Ok(());
        };

        let start = std::time::Instant::now();

        let response = self
            .client
            .delete(self.video_url(&video_id))
            .header(ACCESS_KEY_HEADER, &self.options.api_key)
            .send()
            .await?;

        let response = check_response(response, "Bunny Stream delete", true)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    library_id = %self.options.library_id,
                    video_id = %video_id,
                    "Bunny Stream delete failed"
                );
                e
            })?;

        tracing::info!(
            library_id = %self.options.library_id,
            video_id = %video_id,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bunny Stream delete successful"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunny_hybrid_core::ConfigError;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Cursor;

    fn stream_for(server: &mockito::Server, collection_id: Option<&str>) -> BunnyStream {
        let mut options = json!({
            "apiKey": "stream-key",
            "libraryId": 42,
            "apiBase": server.url(),
            "embedBase": "https://player.example.com/",
        });
        if let Some(collection_id) = collection_id {
            options["collectionId"] = json!(collection_id);
        }
        BunnyStream::from_value(&options).unwrap()
    }

    fn metadata(video_id: &str) -> Map<String, Value> {
        json!({ "videoId": video_id }).as_object().cloned().unwrap()
    }

    fn video_file() -> UploadFile {
        UploadFile::new("clip.mp4", "h1", ".mp4", Some("video/mp4"))
            .with_buffer(Bytes::from_static(b"video-bytes"))
    }

    #[test]
    fn test_extract_video_id_field_order() {
        assert_eq!(
            extract_video_id(&json!({"guid": "g", "id": "i", "videoId": "v"})),
            Some("g".to_string())
        );
        assert_eq!(
            extract_video_id(&json!({"id": "i", "videoId": "v"})),
            Some("i".to_string())
        );
        assert_eq!(
            extract_video_id(&json!({"videoId": 7})),
            Some("7".to_string())
        );
        assert_eq!(
            extract_video_id(&json!({"guid": "", "videoId": "v"})),
            Some("v".to_string())
        );
        assert_eq!(extract_video_id(&json!({"title": "x"})), None);
    }

    #[test]
    fn test_video_title_fallbacks() {
        let named = UploadFile::new("My clip", "h1", ".mp4", Some("video/mp4"));
        assert_eq!(video_title(&named), "My clip");

        let unnamed = UploadFile::new("", "h1", ".mp4", Some("video/mp4"));
        assert_eq!(video_title(&unnamed), "h1.mp4");

        let bare = UploadFile::new("", "", "", Some("video/mp4"));
        assert_eq!(video_title(&bare), "video");
    }

    #[test]
    fn test_new_requires_api_key_and_library() {
        let err = BunnyStream::from_value(&json!({"libraryId": "1"}))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ProviderError::Config(ConfigError::MissingOption {
                option: "apiKey",
                ..
            })
        ));

        let err = BunnyStream::from_value(&json!({"apiKey": "k"}))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ProviderError::Config(ConfigError::MissingOption {
                option: "libraryId",
                ..
            })
        ));
    }

    #[test]
    fn test_embed_url_uses_default_host() {
        let stream =
            BunnyStream::from_value(&json!({"apiKey": "k", "libraryId": "lib"})).unwrap();
        assert_eq!(
            stream.embed_url("abc"),
            "https://iframe.mediadelivery.net/embed/lib/abc"
        );
        assert_eq!(
            stream.video_url("abc"),
            "https://video.bunnycdn.com/library/lib/videos/abc"
        );
    }

    #[tokio::test]
    async fn test_upload_creates_then_puts_bytes() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/library/42/videos")
            .match_header("AccessKey", "stream-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"title": "clip.mp4"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"guid": "abc-123"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/library/42/videos/abc-123")
            .match_header("AccessKey", "stream-key")
            .match_header("content-type", "video/mp4")
            .match_body("video-bytes")
            .with_status(200)
            .create_async()
            .await;

        let stream = stream_for(&server, None);
        let mut file = video_file();
        let outcome = stream.upload(&mut file).await.unwrap();

        create.assert_async().await;
        put.assert_async().await;
        assert_eq!(outcome.url, "https://player.example.com/embed/42/abc-123");
        assert_eq!(
            outcome.provider_metadata,
            Some(metadata("abc-123"))
        );
    }

    #[tokio::test]
    async fn test_upload_sends_collection_id_and_drains_stream() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/library/42/videos")
            .match_body(Matcher::Json(
                json!({"title": "h2.webm", "collectionId": "col-1"}),
            ))
            .with_status(200)
            .with_body(r#"{"id": "vid"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/library/42/videos/vid")
            .match_body("streamed-video")
            .with_status(200)
            .create_async()
            .await;

        let stream = stream_for(&server, Some("col-1"));
        let mut file = UploadFile::new("", "h2", ".webm", Some("video/webm"))
            .with_stream(Box::pin(Cursor::new(b"streamed-video".to_vec())));
        let outcome = stream.upload_stream(&mut file).await.unwrap();

        create.assert_async().await;
        put.assert_async().await;
        assert!(outcome.url.ends_with("/embed/42/vid"));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_video_before_any_request() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let stream = stream_for(&server, None);
        let mut file = UploadFile::new("photo", "h1", ".png", Some("image/png"))
            .with_buffer(Bytes::from_static(b"png"));
        let err = stream.upload(&mut file).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));

        let mut no_mime =
            UploadFile::new("x", "h1", ".bin", None).with_buffer(Bytes::from_static(b"x"));
        assert!(stream.upload(&mut no_mime).await.is_err());

        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_failure_skips_byte_upload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/library/42/videos")
            .with_status(500)
            .with_body("library unavailable")
            .create_async()
            .await;
        let put = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let stream = stream_for(&server, None);
        let err = stream.upload(&mut video_file()).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("500"), "{}", message);
        assert!(message.contains("library unavailable"), "{}", message);
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_response_without_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/library/42/videos")
            .with_status(200)
            .with_body(r#"{"title": "clip.mp4"}"#)
            .create_async()
            .await;

        let stream = stream_for(&server, None);
        let err = stream.upload(&mut video_file()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_byte_upload_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/library/42/videos")
            .with_status(200)
            .with_body(r#"{"guid": "abc"}"#)
            .create_async()
            .await;
        server
            .mock("PUT", "/library/42/videos/abc")
            .with_status(400)
            .with_body("bad video")
            .create_async()
            .await;

        let stream = stream_for(&server, None);
        let err = stream.upload(&mut video_file()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Remote { status: 400, .. }));
        assert!(err.to_string().contains("upload bytes failed"));
    }

    #[tokio::test]
    async fn test_delete_without_video_id_is_noop() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let stream = stream_for(&server, None);
        stream.delete(&video_file()).await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_404_is_success_and_500_fails() {
        let mut server = mockito::Server::new_async().await;
        let gone = server
            .mock("DELETE", "/library/42/videos/gone")
            .match_header("AccessKey", "stream-key")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("DELETE", "/library/42/videos/broken")
            .with_status(500)
            .create_async()
            .await;

        let stream = stream_for(&server, None);

        let file = video_file().with_metadata(metadata("gone"));
        stream.delete(&file).await.unwrap();
        gone.assert_async().await;

        let file = video_file().with_metadata(metadata("broken"));
        let err = stream.delete(&file).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
