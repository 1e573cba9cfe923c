//! # Kadoa SDK
//!
//! Rust client core for the Kadoa platform: a self-healing realtime event
//! subscription and a polling helper for long-running operations.
//!
//! ## Example
//!
//! ```no_run
//! use kadoa_sdk::{RealtimeConnection, RealtimeOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let realtime = RealtimeConnection::new(RealtimeOptions {
//!         api_key: "your-api-key".to_string(),
//!         ..Default::default()
//!     })?;
//!
//!     let _events = realtime.on_event(|event| println!("{}", event));
//!     realtime.connect().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod polling;
pub mod realtime;
pub mod types;
pub mod websocket;

pub use client::KadoaClient;
pub use messaging::{ConnectionListener, ErrorListener, EventListener, Subscription};
pub use polling::{PollOptions, PollOutcome, poll_until};
pub use realtime::{ConnectionPhase, RealtimeConnection, RealtimeConnectionBuilder, RealtimeOptions};
pub use types::{
    Endpoints, ErrorCode, PollingError, RealtimeError, Result, SDK_LANGUAGE, SDK_NAME, SDK_VERSION,
    StreamMode,
};
pub use websocket::{Socket, SocketFactory, SocketFrame, TungsteniteSocketFactory};
