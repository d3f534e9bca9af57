use async_trait::async_trait;
use bunny_hybrid_core::constants::{DEFAULT_CONTENT_TYPE, STORAGE_PROVIDER_NAME};
use bunny_hybrid_core::{StorageOptions, UploadFile, UploadOutcome};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::body::resolve_bytes;
use crate::http::{build_client, check_response, endpoint_base, ACCESS_KEY_HEADER};
use crate::keys;
use crate::traits::{ProviderCapabilities, ProviderResult, UploadProvider};

/// Bunny Storage implementation
#[derive(Clone)]
pub struct BunnyStorage {
    client: reqwest::Client,
    options: StorageOptions,
    endpoint: String,
}

impl BunnyStorage {
    /// Create a new BunnyStorage instance
    ///
    /// # Arguments
    /// * `options` - Validated storage options (zone, access key, CDN base, host, base dir)
    pub fn new(options: StorageOptions) -> ProviderResult<Self> {
        let endpoint = endpoint_base(&options.storage_host);
        Ok(BunnyStorage {
            client: build_client()?,
            options,
            endpoint,
        })
    }

    /// Parse options from the host options map and create the provider
    ///
    /// Fails before any network activity when a required option is missing.
    pub fn from_value(options: &Value) -> ProviderResult<Self> {
        Self::new(StorageOptions::from_value(options)?)
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Object path for a file, relative to the storage zone
    pub fn object_path(&self, file: &UploadFile) -> String {
        keys::object_path(&self.options.base_dir, file)
    }

    /// API URL of an object: {endpoint}/{zone}/{path}
    fn object_url(&self, object_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            urlencoding::encode(&self.options.storage_zone),
            object_path
        )
    }

    /// Public CDN URL of an object
    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{}", self.options.cdn_base_url, object_path)
    }

    async fn put_object(
        &self,
        object_path: &str,
        body: Bytes,
        content_type: &str,
    ) -> ProviderResult<()> {
        let response = self
            .client
            .put(self.object_url(object_path))
            .header(ACCESS_KEY_HEADER, &self.options.access_key)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        check_response(response, "Bunny upload", false).await?;
        Ok(())
    }

    async fn store(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        let object_path = self.object_path(file);
        let bytes = resolve_bytes(file, "Bunny").await?;
        let size = bytes.len() as u64;
        let content_type = file
            .mime
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let start = std::time::Instant::now();

        self.put_object(&object_path, bytes, &content_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    zone = %self.options.storage_zone,
                    key = %object_path,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bunny storage upload failed"
                );
                e
            })?;

        let url = self.public_url(&object_path);

        tracing::info!(
            zone = %self.options.storage_zone,
            key = %object_path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bunny storage upload successful"
        );

        Ok(UploadOutcome::new(url))
    }
}

#[async_trait]
impl UploadProvider for BunnyStorage {
    fn name(&self) -> &str {
        STORAGE_PROVIDER_NAME
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::basic().with_upload_stream()
    }

    async fn upload(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        self.store(file).await
    }

    // Buffers the whole stream before a single PUT; there is no chunked transfer.
    async fn upload_stream(&self, file: &mut UploadFile) -> ProviderResult<UploadOutcome> {
        self.store(file).await
    }

    async fn delete(&self, file: &UploadFile) -> ProviderResult<()> {
        let object_path = self.object_path(file);
        let start = std::time::Instant::now();

        let response = self
            .client
            .delete(self.object_url(&object_path))
            .header(ACCESS_KEY_HEADER, &self.options.access_key)
            .send()
            .await?;

        let response = check_response(response, "Bunny delete", true)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    zone = %self.options.storage_zone,
                    key = %object_path,
                    "Bunny storage delete failed"
                );
                e
            })?;

        tracing::info!(
            zone = %self.options.storage_zone,
            key = %object_path,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bunny storage delete successful"
        );

        Ok(())
    }
}
