//! Connects authenticated upstream sockets to the Deepgram Agent API.

use super::connection::{MessageConnection, TungsteniteConnection, UpstreamConnector};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_tungstenite::{connect_async, tungstenite::client::IntoClientRequest};
use tracing::info;

pub const DEEPGRAM_AGENT_URL: &str = "wss://agent.deepgram.com/v1/agent/converse";

/// Opens WebSocket connections to the Deepgram voice-agent endpoint, using
/// token auth with the server-held key.
pub struct DeepgramConnector {
    url: String,
    api_key: String,
}

impl DeepgramConnector {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEEPGRAM_AGENT_URL.to_string())
    }

    pub fn with_url(api_key: String, url: String) -> Self {
        Self { url, api_key }
    }
}

#[async_trait]
impl UpstreamConnector for DeepgramConnector {
    async fn connect(&self) -> Result<Box<dyn MessageConnection>> {
        let mut request = self.url.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert("Authorization", format!("Token {}", self.api_key).parse()?);

        let (stream, _) = connect_async(request)
            .await
            .context("Failed to connect to Deepgram Agent WebSocket")?;
        info!("Connected to Deepgram Agent");
        Ok(Box::new(TungsteniteConnection::new(stream)))
    }
}
