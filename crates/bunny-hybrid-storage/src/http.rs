//! HTTP helpers shared by the Bunny providers

use reqwest::{Response, StatusCode};

use crate::traits::{ProviderError, ProviderResult};

/// Header carrying the Bunny access key
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

pub fn build_client() -> ProviderResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("bunny-hybrid/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Base URL for a host option: bare hosts get `https://`, explicit bases are kept
pub fn endpoint_base(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Turn a non-success response into a [`ProviderError::Remote`]
///
/// With `allow_not_found`, a 404 counts as success. The body is read best-effort;
/// a failed read leaves it empty. Callers log the failure with their own context.
pub async fn check_response(
    response: Response,
    operation: &'static str,
    allow_not_found: bool,
) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() || (allow_not_found && status == StatusCode::NOT_FOUND) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    Err(ProviderError::Remote {
        operation,
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        body,
    })
}
