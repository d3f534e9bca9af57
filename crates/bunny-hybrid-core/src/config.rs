//! Configuration module
//!
//! Options arrive from the host as a JSON map, either at the top level or nested
//! under `providerOptions`. This module resolves the hybrid feature flag, splits the
//! per-provider option sets and validates each provider's required keys.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::constants::{
    DEFAULT_EMBED_BASE, DEFAULT_STORAGE_HOST, DEFAULT_STREAM_API_BASE, STORAGE_PROVIDER_NAME,
    STREAM_PROVIDER_NAME,
};
use crate::error::ConfigError;

const PROVIDER_OPTIONS_KEY: &str = "providerOptions";

/// Parse a boolean-ish flag
///
/// `true`, `1` and the strings "1", "true", "yes", "on" (any case) enable it.
/// Everything else, including an absent value, disables it.
pub fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

/// Unwrap `{ providerOptions: {...} }` when present, otherwise use the map itself
fn provider_options(options: &Value) -> Result<Map<String, Value>, ConfigError> {
    match options {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => match map.get(PROVIDER_OPTIONS_KEY) {
            Some(Value::Object(nested)) => Ok(nested.clone()),
            _ => Ok(map.clone()),
        },
        other => Err(ConfigError::InvalidOptions(format!(
            "expected an options object, got {}",
            other
        ))),
    }
}

/// First key that is present and not null
fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Identifier given as a string or number; numeric zero counts as unset
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Hybrid router options
#[derive(Debug, Clone, PartialEq)]
pub struct HybridOptions {
    /// Route `video/*` uploads to Bunny Stream
    pub stream_enabled: bool,
    /// Options passed to the storage provider (`storage` or `storageOptions`)
    pub storage: Value,
    /// Options passed to the stream provider (`stream` or `streamOptions`)
    pub stream: Value,
    /// Registry name of the storage provider
    pub storage_provider: String,
    /// Registry name of the stream provider
    pub stream_provider: String,
}

impl HybridOptions {
    pub fn from_value(options: &Value) -> Result<Self, ConfigError> {
        let options = provider_options(options)?;

        let stream_enabled = parse_flag(options.get("streamEnabled"));

        let storage = first_present(&options, &["storage", "storageOptions"])
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let stream = first_present(&options, &["stream", "streamOptions"])
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let storage_provider = first_present(&options, &["storageProvider", "storageProviderPath"])
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(STORAGE_PROVIDER_NAME)
            .to_string();
        let stream_provider = first_present(&options, &["streamProvider", "streamProviderPath"])
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(STREAM_PROVIDER_NAME)
            .to_string();

        Ok(Self {
            stream_enabled,
            storage,
            stream,
            storage_provider,
            stream_provider,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStorageOptions {
    #[serde(default)]
    storage_zone: Option<String>,
    #[serde(default)]
    access_key: Option<String>,
    #[serde(default)]
    cdn_base_url: Option<String>,
    #[serde(default)]
    storage_host: Option<String>,
    #[serde(default)]
    base_dir: Option<String>,
}

/// Bunny Storage provider options
#[derive(Clone, PartialEq)]
pub struct StorageOptions {
    pub storage_zone: String,
    pub access_key: String,
    /// Public pull-zone base, without trailing slash
    pub cdn_base_url: String,
    /// Bare host (https implied) or full `http(s)://` base
    pub storage_host: String,
    /// Prefix prepended to every object path
    pub base_dir: String,
}

impl StorageOptions {
    pub fn from_value(options: &Value) -> Result<Self, ConfigError> {
        let map = provider_options(options)?;
        let raw: RawStorageOptions = serde_json::from_value(Value::Object(map))
            .map_err(|e| ConfigError::InvalidOptions(format!("storage options: {}", e)))?;

        let storage_zone = non_empty(raw.storage_zone)
            .ok_or_else(|| ConfigError::missing("Bunny", "storageZone"))?;
        let access_key =
            non_empty(raw.access_key).ok_or_else(|| ConfigError::missing("Bunny", "accessKey"))?;
        let cdn_base_url = non_empty(raw.cdn_base_url)
            .ok_or_else(|| ConfigError::missing("Bunny", "cdnBaseUrl"))?;

        Ok(Self {
            storage_zone,
            access_key,
            cdn_base_url: cdn_base_url.trim_end_matches('/').to_string(),
            storage_host: non_empty(raw.storage_host)
                .unwrap_or_else(|| DEFAULT_STORAGE_HOST.to_string()),
            base_dir: raw.base_dir.unwrap_or_default(),
        })
    }
}

impl Debug for StorageOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StorageOptions")
            .field("storage_zone", &self.storage_zone)
            .field("access_key", &"<redacted>")
            .field("cdn_base_url", &self.cdn_base_url)
            .field("storage_host", &self.storage_host)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStreamOptions {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    library_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    collection_id: Option<String>,
    #[serde(default)]
    embed_base: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
}

/// Bunny Stream provider options
#[derive(Clone, PartialEq)]
pub struct StreamOptions {
    pub api_key: String,
    pub library_id: String,
    pub collection_id: Option<String>,
    /// Player embed host, without trailing slash
    pub embed_base: String,
    /// Stream API base, without trailing slash
    pub api_base: String,
}

impl StreamOptions {
    pub fn from_value(options: &Value) -> Result<Self, ConfigError> {
        let map = provider_options(options)?;
        let raw: RawStreamOptions = serde_json::from_value(Value::Object(map))
            .map_err(|e| ConfigError::InvalidOptions(format!("stream options: {}", e)))?;

        let api_key =
            non_empty(raw.api_key).ok_or_else(|| ConfigError::missing("Bunny Stream", "apiKey"))?;
        let library_id = non_empty(raw.library_id)
            .ok_or_else(|| ConfigError::missing("Bunny Stream", "libraryId"))?;

        Ok(Self {
            api_key,
            library_id,
            collection_id: non_empty(raw.collection_id),
            embed_base: non_empty(raw.embed_base)
                .unwrap_or_else(|| DEFAULT_EMBED_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_base: non_empty(raw.api_base)
                .unwrap_or_else(|| DEFAULT_STREAM_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl Debug for StreamOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StreamOptions")
            .field("api_key", &"<redacted>")
            .field("library_id", &self.library_id)
            .field("collection_id", &self.collection_id)
            .field("embed_base", &self.embed_base)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Build an options map from a variable lookup
///
/// Unset variables are left out so provider defaults and required-option checks apply.
pub fn options_from_lookup<F>(lookup: F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    fn insert<F: Fn(&str) -> Option<String>>(
        map: &mut Map<String, Value>,
        lookup: &F,
        key: &str,
        var: &str,
    ) {
        if let Some(value) = lookup(var) {
            map.insert(key.to_string(), Value::String(value));
        }
    }

    let mut storage = Map::new();
    insert(&mut storage, &lookup, "storageZone", "BUNNY_STORAGE_ZONE");
    insert(&mut storage, &lookup, "accessKey", "BUNNY_STORAGE_ACCESS_KEY");
    insert(&mut storage, &lookup, "storageHost", "BUNNY_STORAGE_HOST");
    insert(&mut storage, &lookup, "baseDir", "BUNNY_STORAGE_BASE_DIR");
    insert(&mut storage, &lookup, "cdnBaseUrl", "BUNNY_CDN_BASE_URL");

    let mut stream = Map::new();
    insert(&mut stream, &lookup, "apiKey", "BUNNY_STREAM_API_KEY");
    insert(&mut stream, &lookup, "libraryId", "BUNNY_STREAM_LIBRARY_ID");
    insert(&mut stream, &lookup, "collectionId", "BUNNY_STREAM_COLLECTION_ID");
    insert(&mut stream, &lookup, "embedBase", "BUNNY_STREAM_EMBED_BASE");
    insert(&mut stream, &lookup, "apiBase", "BUNNY_STREAM_API_BASE");

    let mut options = json!({
        "storage": storage,
        "stream": stream,
    });
    if let (Some(flag), Some(map)) = (lookup("BUNNY_STREAM_ENABLED"), options.as_object_mut()) {
        map.insert("streamEnabled".to_string(), Value::String(flag));
    }
    options
}

/// Build an options map from the process environment, loading `.env` first
pub fn options_from_env() -> Value {
    dotenvy::dotenv().ok();
    options_from_lookup(|var| env::var(var).ok())
}
