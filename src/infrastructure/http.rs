use crate::types::message::AckRequest;
use crate::types::{
    Endpoints, RealtimeError, Result, SDK_LANGUAGE, SDK_NAME, SDK_VERSION, TokenGrant, headers,
};
use reqwest::RequestBuilder;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde_json::Value;

/// HTTP side of the realtime protocol: token exchange and event acknowledgment.
///
/// Cheap to clone; every clone shares the same `reqwest::Client` pool, so
/// acknowledgments may run concurrently with a reconnect's token exchange.
#[derive(Debug, Clone)]
pub struct RealtimeHttp {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl RealtimeHttp {
    pub fn new(client: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Exchanges the API key for a short-lived access token and the team channel
    pub async fn exchange_token(&self, api_key: &str) -> Result<TokenGrant> {
        let url = self.endpoints.token_url();

        let response = with_sdk_headers(self.client.post(&url))
            .header(CONTENT_TYPE, "application/json")
            .header(headers::API_KEY, api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RealtimeError::HttpStatus {
                status: status.as_u16(),
                endpoint: url,
                body,
            });
        }

        let grant = response.json::<TokenGrant>().await?;
        tracing::debug!("Obtained realtime token for team {}", grant.team_id);
        Ok(grant)
    }

    /// Acknowledges receipt of an event
    pub async fn acknowledge(&self, id: &Value) -> Result<()> {
        let url = self.endpoints.ack_url();

        let response = with_sdk_headers(self.client.post(&url))
            .json(&AckRequest { id })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RealtimeError::HttpStatus {
                status: response.status().as_u16(),
                endpoint: url,
                body: String::new(),
            });
        }

        tracing::debug!("Acknowledged event {}", id);
        Ok(())
    }
}

/// SDK identity headers sent with every platform request
fn with_sdk_headers(request: RequestBuilder) -> RequestBuilder {
    request
        .header(USER_AGENT, format!("{}/{}", SDK_NAME, SDK_VERSION))
        .header(headers::SDK_VERSION, SDK_VERSION)
        .header(headers::SDK_LANGUAGE, SDK_LANGUAGE)
}
