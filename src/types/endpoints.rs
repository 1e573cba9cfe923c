use super::constants::{default_endpoints, env_vars, paths};
use super::error::Result;
use super::message::StreamMode;
use url::Url;

/// Process-wide platform endpoints.
///
/// Defaults point at production; every entry can be overridden through the
/// matching `KADOA_*` environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub public_api: String,
    pub wss: String,
    pub wss_stream: String,
    pub realtime_api: String,
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self {
            public_api: env_or(env_vars::PUBLIC_API_URI, default_endpoints::PUBLIC_API_URI),
            wss: env_or(env_vars::WSS_API_URI, default_endpoints::WSS_API_URI),
            wss_stream: env_or(env_vars::WSS_NEO_API_URI, default_endpoints::WSS_NEO_API_URI),
            realtime_api: env_or(env_vars::REALTIME_API_URI, default_endpoints::REALTIME_API_URI),
        }
    }

    pub fn token_url(&self) -> String {
        join(&self.public_api, paths::TOKEN)
    }

    pub fn ack_url(&self) -> String {
        join(&self.realtime_api, paths::EVENT_ACK)
    }

    /// Build the subscription socket URI for the given mode and access token
    pub fn socket_url(&self, mode: StreamMode, access_token: &str) -> Result<String> {
        let base = match mode {
            StreamMode::Default => &self.wss,
            StreamMode::Stream => &self.wss_stream,
        };

        let mut url = Url::parse(base)?;
        url.query_pairs_mut()
            .append_pair(mode.token_param(), access_token);

        Ok(url.to_string())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
