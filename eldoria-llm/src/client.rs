//! HTTP transport: POSTs a turn to the dialogue server and streams the body.

use std::time::Duration;

use eldoria_core::config::EndpointConfig;
use futures::TryStreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::transport::{ByteStream, DialogueTransport};
use crate::types::ConversationRequest;

/// Streams turns from a dialogue server's conversation route.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    url: String,
    timeout_ms: u64,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint.
    #[must_use]
    pub fn new(config: &EndpointConfig) -> Self {
        Self {
            http: Client::new(),
            url: config.url(),
            timeout_ms: config.request_timeout_ms,
        }
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DialogueTransport for HttpTransport {
    async fn open(&self, request: &ConversationRequest) -> Result<ByteStream, LlmError> {
        debug!(url = %self.url, npc = %request.npc_name, "sending turn");

        let response = self
            .http
            .post(&self.url)
            .json(request)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| LlmError::with_timeout(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "dialogue endpoint rejected turn");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // The request timeout also bounds the body.
        let timeout_ms = self.timeout_ms;
        Ok(Box::pin(
            response
                .bytes_stream()
                .map_err(move |e| LlmError::with_timeout(e, timeout_ms)),
        ))
    }
}
