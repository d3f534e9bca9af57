//! Constants shared by the providers and the router

/// Default Bunny Storage endpoint
pub const DEFAULT_STORAGE_HOST: &str = "storage.bunnycdn.com";

/// Default Bunny Stream API base
pub const DEFAULT_STREAM_API_BASE: &str = "https://video.bunnycdn.com";

/// Default host for player embed URLs
pub const DEFAULT_EMBED_BASE: &str = "https://iframe.mediadelivery.net";

/// Content type used when a file carries no MIME type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Provider metadata key holding the Bunny Stream video identifier
pub const VIDEO_ID_KEY: &str = "videoId";

/// Registry name of the object storage provider
pub const STORAGE_PROVIDER_NAME: &str = "bunny";

/// Registry name of the video provider
pub const STREAM_PROVIDER_NAME: &str = "bunny-stream";

/// Title used for a created video when the file has neither a name nor a hash
pub const FALLBACK_VIDEO_TITLE: &str = "video";
