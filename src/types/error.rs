use thiserror::Error;

/// Errors that can occur when using the Kadoa SDK.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication or authorization error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid client or connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error (token exchange, acknowledgments)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A polling operation timed out or was aborted
    #[error(transparent)]
    Polling(#[from] PollingError),
}

impl RealtimeError {
    /// Classifies the error the same way across every SDK surface.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Auth(_) => ErrorCode::AuthError,
            Self::Config(_) | Self::UrlParse(_) => ErrorCode::ValidationError,
            Self::HttpStatus { status, .. } => ErrorCode::from_status(*status),
            Self::Http(e) if e.is_timeout() => ErrorCode::Timeout,
            Self::Http(e) => match e.status() {
                Some(status) => ErrorCode::from_status(status.as_u16()),
                None => ErrorCode::NetworkError,
            },
            Self::WebSocket(_) | Self::Connection(_) => ErrorCode::NetworkError,
            Self::Polling(PollingError::Timeout { .. }) => ErrorCode::Timeout,
            Self::Polling(PollingError::Aborted) => ErrorCode::Aborted,
            Self::Serialization(_) => ErrorCode::Unknown,
        }
    }
}

/// Coarse error classification shared with the other platform SDKs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AuthError,
    NotFound,
    Timeout,
    RateLimited,
    ValidationError,
    HttpError,
    NetworkError,
    Aborted,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::AuthError,
            404 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimited,
            400..=499 => Self::ValidationError,
            500..=u16::MAX => Self::HttpError,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthError => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Aborted => "ABORTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failures of [`poll_until`](crate::polling::poll_until).
///
/// Probe errors never appear here: they reach the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollingError {
    #[error("Polling operation timed out after {timeout_ms}ms")]
    Timeout {
        timeout_ms: u64,
        attempts: u32,
        duration_ms: u64,
    },

    #[error("Polling operation was aborted")]
    Aborted,
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
