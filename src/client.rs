use crate::realtime::{RealtimeConnection, RealtimeOptions};
use crate::types::{Endpoints, RealtimeError, Result};
use crate::websocket::SocketFactory;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Entry point to the Kadoa platform.
///
/// Owns the API key, the platform endpoints and a shared HTTP client, and
/// manages at most one realtime connection at a time.
///
/// # Example
///
/// ```no_run
/// use kadoa_sdk::{KadoaClient, RealtimeOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = KadoaClient::new("your-api-key")?;
///
/// let realtime = client.connect_realtime(RealtimeOptions::default()).await?;
/// let _events = realtime.on_event(|event| println!("{}", event));
///
/// // ...
/// client.dispose();
/// # Ok(())
/// # }
/// ```
pub struct KadoaClient {
    api_key: String,
    endpoints: Endpoints,
    http: reqwest::Client,
    socket_factory: Option<Arc<dyn SocketFactory>>,
    realtime: Mutex<Option<RealtimeConnection>>,
}

impl KadoaClient {
    /// Creates a client using endpoints from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Auth`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RealtimeError::Auth("API key is required".to_string()));
        }

        Ok(Self {
            api_key,
            endpoints: Endpoints::from_env(),
            http: reqwest::Client::new(),
            socket_factory: None,
            realtime: Mutex::new(None),
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Transport used by realtime connections created from now on
    pub fn with_socket_factory(mut self, factory: Arc<dyn SocketFactory>) -> Self {
        self.socket_factory = Some(factory);
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Connects to the realtime event stream.
    ///
    /// The first call creates the connection and connects it; later calls
    /// return the same connection untouched until
    /// [`disconnect_realtime()`](Self::disconnect_realtime). The client's API
    /// key always replaces `options.api_key`.
    pub async fn connect_realtime(&self, options: RealtimeOptions) -> Result<RealtimeConnection> {
        let (connection, created) = {
            let mut slot = self.realtime_slot();
            match slot.clone() {
                Some(existing) => (existing, false),
                None => {
                    let connection = self.build_realtime(options)?;
                    *slot = Some(connection.clone());
                    (connection, true)
                }
            }
        };

        if created {
            connection.connect().await;
        }
        Ok(connection)
    }

    /// The current realtime connection, if any
    pub fn realtime(&self) -> Option<RealtimeConnection> {
        self.realtime_slot().clone()
    }

    /// Closes and forgets the realtime connection
    pub fn disconnect_realtime(&self) {
        if let Some(connection) = self.realtime_slot().take() {
            tracing::info!("Disconnecting realtime");
            connection.close();
        }
    }

    pub fn is_realtime_connected(&self) -> bool {
        self.realtime_slot()
            .as_ref()
            .is_some_and(RealtimeConnection::is_connected)
    }

    /// Releases every resource held by the client
    pub fn dispose(&self) {
        self.disconnect_realtime();
    }

    /// Alias for [`dispose()`](Self::dispose)
    pub fn close(&self) {
        self.dispose();
    }

    fn build_realtime(&self, options: RealtimeOptions) -> Result<RealtimeConnection> {
        let mut builder = RealtimeConnection::builder(RealtimeOptions {
            api_key: self.api_key.clone(),
            ..options
        })?
        .endpoints(self.endpoints.clone())
        .http_client(self.http.clone());

        if let Some(factory) = &self.socket_factory {
            builder = builder.socket_factory(Arc::clone(factory));
        }
        Ok(builder.build())
    }

    fn realtime_slot(&self) -> MutexGuard<'_, Option<RealtimeConnection>> {
        self.realtime.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for KadoaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KadoaClient")
            .field("endpoints", &self.endpoints)
            .field("realtime", &*self.realtime_slot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectionPhase;
    use crate::websocket::memory::{MemoryPeer, MemorySocketFactory};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        client: KadoaClient,
        factory: Arc<MemorySocketFactory>,
        _peers: tokio::sync::mpsc::UnboundedReceiver<MemoryPeer>,
    }

    async fn client_for(server: &MockServer) -> Fixture {
        Mock::given(method("POST"))
            .and(path("/v4/oauth2/token"))
            .and(header("x-api-key", "client-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "team_id": "team-9"
            })))
            .mount(server)
            .await;

        let (factory, peers) = MemorySocketFactory::new();
        let factory = Arc::new(factory);
        let client = KadoaClient::new("client-key")
            .unwrap()
            .with_endpoints(Endpoints {
                public_api: server.uri(),
                wss: "wss://realtime.test".to_string(),
                wss_stream: "wss://events.test/events/ws".to_string(),
                realtime_api: server.uri(),
            })
            .with_socket_factory(Arc::clone(&factory) as Arc<dyn SocketFactory>);
        Fixture {
            client,
            factory,
            _peers: peers,
        }
    }

    fn options() -> RealtimeOptions {
        RealtimeOptions {
            reconnect_delay: Some(50),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(KadoaClient::new(""), Err(RealtimeError::Auth(_))));
    }

    #[tokio::test]
    async fn test_connect_realtime_reuses_connection() {
        let server = MockServer::start().await;
        let Fixture { client, factory, _peers } = client_for(&server).await;

        assert!(client.realtime().is_none());
        assert!(!client.is_realtime_connected());

        let first = client.connect_realtime(options()).await.unwrap();
        let second = client.connect_realtime(options()).await.unwrap();

        assert!(client.is_realtime_connected());
        assert_eq!(first.state(), ConnectionPhase::Open);
        assert_eq!(second.state(), ConnectionPhase::Open);
        assert_eq!(factory.open_count(), 1);
    }

    #[tokio::test]
    async fn test_dispose_closes_and_forgets_connection() {
        let server = MockServer::start().await;
        let Fixture { client, factory, _peers } = client_for(&server).await;

        let realtime = client.connect_realtime(options()).await.unwrap();
        client.dispose();
        client.close();

        assert!(client.realtime().is_none());
        assert!(!client.is_realtime_connected());
        assert_eq!(realtime.state(), ConnectionPhase::Disposed);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(factory.open_count(), 1);

        let fresh = client.connect_realtime(options()).await.unwrap();
        assert_eq!(fresh.state(), ConnectionPhase::Open);
        assert_eq!(factory.open_count(), 2);
    }
}
