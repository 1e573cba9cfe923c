/// SDK identity sent with every platform request
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SDK_NAME: &str = "kadoa-rust-sdk";
pub const SDK_LANGUAGE: &str = "rust";

/// Default missed-heartbeat check interval (milliseconds)
pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 10_000;

/// Default fixed delay before a reconnect attempt (milliseconds)
pub const DEFAULT_RECONNECT_DELAY: u64 = 5_000;

/// Default silence tolerated before the socket is considered dead (milliseconds)
pub const DEFAULT_MISSED_HEARTBEAT_LIMIT: u64 = 30_000;

/// Polling defaults (milliseconds). The interval is never allowed below the floor.
pub const DEFAULT_POLL_INTERVAL: u64 = 10_000;
pub const MIN_POLL_INTERVAL: u64 = 10_000;
pub const DEFAULT_POLL_TIMEOUT: u64 = 5 * 60 * 1000;

/// Reason reported to connection listeners whenever a socket goes away
pub const CONNECTION_CLOSED_REASON: &str = "Connection closed";

/// Environment variables overriding the platform endpoints
pub mod env_vars {
    pub const PUBLIC_API_URI: &str = "KADOA_PUBLIC_API_URI";
    pub const WSS_API_URI: &str = "KADOA_WSS_API_URI";
    pub const WSS_NEO_API_URI: &str = "KADOA_WSS_NEO_API_URI";
    pub const REALTIME_API_URI: &str = "KADOA_REALTIME_API_URI";
}

/// Production endpoints used when no override is configured
pub mod default_endpoints {
    pub const PUBLIC_API_URI: &str = "https://api.kadoa.com";
    pub const WSS_API_URI: &str = "wss://realtime.kadoa.com";
    pub const WSS_NEO_API_URI: &str = "wss://events.kadoa.com/events/ws";
    pub const REALTIME_API_URI: &str = "https://realtime.kadoa.com";
}

/// HTTP paths (magic strings layer)
pub mod paths {
    pub const TOKEN: &str = "/v4/oauth2/token";
    pub const EVENT_ACK: &str = "/api/v1/events/ack";
}

/// HTTP headers understood by the platform
pub mod headers {
    pub const API_KEY: &str = "x-api-key";
    pub const SDK_VERSION: &str = "x-sdk-version";
    pub const SDK_LANGUAGE: &str = "x-sdk-language";
}

/// Realtime wire vocabulary
pub mod wire {
    pub const SUBSCRIBE_ACTION: &str = "subscribe";
    pub const HEARTBEAT_TYPE: &str = "heartbeat";
    pub const STREAM_SOURCE: &str = "stream";
    pub const ACCESS_TOKEN_PARAM: &str = "access_token";
    pub const STREAM_TOKEN_PARAM: &str = "token";
}
