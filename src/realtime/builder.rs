use super::RealtimeConnection;
use crate::infrastructure::RealtimeHttp;
use crate::types::{
    DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_MISSED_HEARTBEAT_LIMIT, DEFAULT_RECONNECT_DELAY,
    Endpoints, RealtimeError, Result, StreamMode,
};
use crate::websocket::{SocketFactory, TungsteniteSocketFactory};
use std::sync::Arc;
use std::time::Duration;

/// Options for a realtime connection. Durations are in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct RealtimeOptions {
    pub api_key: String,
    /// How often the missed-heartbeat check runs (default 10000)
    pub heartbeat_interval: Option<u64>,
    /// Fixed wait before every reconnect attempt (default 5000)
    pub reconnect_delay: Option<u64>,
    /// Silence after which the socket is considered dead (default 30000)
    pub missed_heartbeats_limit: Option<u64>,
    pub stream_mode: StreamMode,
}

/// Validated options
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub api_key: String,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
    pub missed_heartbeat_limit: Duration,
    pub stream_mode: StreamMode,
}

impl ResolvedConfig {
    fn resolve(options: RealtimeOptions) -> Result<Self> {
        if options.api_key.is_empty() {
            return Err(RealtimeError::Auth("API key is required".to_string()));
        }

        Ok(Self {
            heartbeat_interval: positive(
                "heartbeat_interval",
                options.heartbeat_interval,
                DEFAULT_HEARTBEAT_INTERVAL,
            )?,
            reconnect_delay: positive(
                "reconnect_delay",
                options.reconnect_delay,
                DEFAULT_RECONNECT_DELAY,
            )?,
            missed_heartbeat_limit: positive(
                "missed_heartbeats_limit",
                options.missed_heartbeats_limit,
                DEFAULT_MISSED_HEARTBEAT_LIMIT,
            )?,
            api_key: options.api_key,
            stream_mode: options.stream_mode,
        })
    }
}

fn positive(name: &str, value: Option<u64>, default_ms: u64) -> Result<Duration> {
    match value.unwrap_or(default_ms) {
        0 => Err(RealtimeError::Config(format!("{} must be greater than zero", name))),
        ms => Ok(Duration::from_millis(ms)),
    }
}

/// Builder for RealtimeConnection with overridable endpoints and transports
pub struct RealtimeConnectionBuilder {
    config: ResolvedConfig,
    endpoints: Option<Endpoints>,
    socket_factory: Option<Arc<dyn SocketFactory>>,
    http_client: Option<reqwest::Client>,
}

impl RealtimeConnectionBuilder {
    /// Create a new builder, validating the options
    pub fn new(options: RealtimeOptions) -> Result<Self> {
        Ok(Self {
            config: ResolvedConfig::resolve(options)?,
            endpoints: None,
            socket_factory: None,
            http_client: None,
        })
    }

    /// Use these endpoints instead of the environment-derived ones
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn socket_factory(mut self, factory: Arc<dyn SocketFactory>) -> Self {
        self.socket_factory = Some(factory);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the connection. Nothing is spawned until `connect()`.
    pub fn build(self) -> RealtimeConnection {
        let endpoints = self.endpoints.unwrap_or_else(Endpoints::from_env);
        let http = RealtimeHttp::new(self.http_client.unwrap_or_default(), endpoints);
        let socket_factory = self
            .socket_factory
            .unwrap_or_else(|| Arc::new(TungsteniteSocketFactory));

        RealtimeConnection::from_parts(self.config, http, socket_factory)
    }
}
