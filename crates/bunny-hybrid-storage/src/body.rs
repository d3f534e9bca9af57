//! Byte resolution shared by the upload providers

use bunny_hybrid_core::UploadFile;
use bytes::Bytes;
use tokio::io::AsyncReadExt;

use crate::traits::{ProviderError, ProviderResult};

/// Resolve the file content into a single buffer
///
/// Prefers the in-memory buffer. Otherwise the stream is drained completely and the
/// result is kept on the file, so a later call sees the same bytes.
pub async fn resolve_bytes(file: &mut UploadFile, provider: &str) -> ProviderResult<Bytes> {
    if let Some(buffer) = &file.buffer {
        return Ok(buffer.clone());
    }

    let Some(mut reader) = file.stream.take() else {
        return Err(ProviderError::InvalidInput(format!(
            "{} provider: file buffer/stream is required",
            provider
        )));
    };

    let mut data = Vec::new();
    reader.read_to_end(&mut data).await.map_err(|e| {
        ProviderError::InvalidInput(format!("Failed to read from stream: {}", e))
    })?;

    let bytes = Bytes::from(data);
    file.buffer = Some(bytes.clone());
    Ok(bytes)
}
