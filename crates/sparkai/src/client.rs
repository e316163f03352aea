//! Spark chat client: one signed WebSocket session per call.

use async_trait::async_trait;
use tracing::debug;

use crate::accumulator::CallbackSink;
use crate::auth::AuthUrlSigner;
use crate::config::SparkConfig;
use crate::protocol::RequestFrame;
use crate::transport::SessionTransport;
use crate::{ChatClient, ChatRequest, ChatResponse, Result};

/// Spark API client.
///
/// Holds only validated configuration. Each call dials a fresh session, so a
/// client can be shared across tasks and used concurrently.
pub struct SparkClient {
    config: SparkConfig,
    signer: AuthUrlSigner,
}

impl SparkClient {
    pub fn new(config: SparkConfig) -> Result<Self> {
        config.validate()?;
        let signer = AuthUrlSigner::new(config.api_key.clone(), config.api_secret.clone());
        Ok(Self { config, signer })
    }

    /// Build a client from the `SPARKAI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SparkConfig::from_env()?)
    }

    pub fn config(&self) -> &SparkConfig {
        &self.config
    }

    async fn send(
        &self,
        request: ChatRequest,
        sink: Option<&dyn CallbackSink>,
    ) -> Result<ChatResponse> {
        let frame = RequestFrame::build(&self.config, request);
        debug!(
            domain = %frame.parameter.chat.domain,
            messages = frame.payload.message.text.len(),
            streaming = sink.is_some(),
            "Sending chat request"
        );

        SessionTransport::new(
            self.config.url.clone(),
            self.signer.clone(),
            self.config.handshake_timeout,
        )
        .run(&frame, sink)
        .await
    }
}

#[async_trait]
impl ChatClient for SparkClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.send(request, None).await
    }

    async fn chat_streaming(
        &self,
        request: ChatRequest,
        sink: &dyn CallbackSink,
    ) -> Result<ChatResponse> {
        self.send(request, Some(sink)).await
    }

    fn default_domain(&self) -> Option<&str> {
        Some(self.config.domain.as_str())
    }
}
