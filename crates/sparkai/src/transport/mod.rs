//! One duplex session per chat call.
//!
//! A `SessionTransport` signs the endpoint URL, performs the WebSocket
//! handshake, writes the single request frame from a spawned task, and reads
//! frames on the calling task until the final one. Transports are consumed by
//! [`SessionTransport::run`]; a connection is never reused.

mod receive;


use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::accumulator::CallbackSink;
use crate::auth::AuthUrlSigner;
use crate::protocol::RequestFrame;
use crate::{ChatResponse, Result, SparkError};

pub(crate) use receive::receive_loop;

const USER_AGENT_VALUE: &str = concat!("sparkai-rs/", env!("CARGO_PKG_VERSION"));

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Dialing,
    Open,
    Closed,
    /// Absorbing: no transition leaves this state.
    Failed,
}

pub struct SessionTransport {
    endpoint: String,
    signer: AuthUrlSigner,
    handshake_timeout: Duration,
    state: SessionState,
}

impl SessionTransport {
    pub fn new(
        endpoint: impl Into<String>,
        signer: AuthUrlSigner,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            signer,
            handshake_timeout,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == SessionState::Failed {
            return;
        }
        debug!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }

    /// Run one full session: dial, send `frame`, read until the final frame.
    ///
    /// Any failure discards the partial accumulation; the caller gets either
    /// the complete response or an error.
    pub async fn run(
        mut self,
        frame: &RequestFrame,
        sink: Option<&dyn CallbackSink>,
    ) -> Result<ChatResponse> {
        let result = self.run_inner(frame, sink).await;
        match &result {
            Ok(_) => self.transition(SessionState::Closed),
            Err(e) => {
                warn!(error = %e, "Chat session failed");
                self.transition(SessionState::Failed);
            }
        }
        result
    }

    async fn run_inner(
        &mut self,
        frame: &RequestFrame,
        sink: Option<&dyn CallbackSink>,
    ) -> Result<ChatResponse> {
        let encoded = frame.encode()?;
        let ws = self.dial().await?;
        self.transition(SessionState::Open);

        let (mut write, mut read) = ws.split();

        // The request goes out on its own task so the read path never waits
        // on the write.
        let writer = tokio::spawn(async move {
            let sent = write.send(WsMessage::Text(encoded.into())).await;
            (write, sent)
        });

        let result = receive_loop(&mut read, sink).await;

        let send_error = match writer.await {
            Ok((mut write, sent)) => {
                if let Err(e) = write.close().await {
                    debug!(error = %e, "Close after session");
                }
                sent.err().map(|e| e.to_string())
            }
            Err(e) => Some(format!("request writer task failed: {e}")),
        };

        settle(result, send_error)
    }

    async fn dial(&mut self) -> Result<WsStream> {
        self.transition(SessionState::Dialing);

        let url = self.signer.sign(&self.endpoint, Utc::now())?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| SparkError::Config(format!("invalid endpoint url: {e}")))?;
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        debug!(endpoint = %self.endpoint, "Dialing Spark");

        let connect = tokio_tungstenite::connect_async(request);
        match tokio::time::timeout(self.handshake_timeout, connect).await {
            Err(_) => Err(SparkError::HandshakeTimeout(self.handshake_timeout)),
            Ok(Err(WsError::Http(response))) => {
                let status = response.status().as_u16();
                let body = response
                    .body()
                    .as_deref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                Err(SparkError::Handshake { status, body })
            }
            Ok(Err(e)) => Err(SparkError::Transport(e.to_string())),
            Ok(Ok((ws, response))) => {
                debug!(status = %response.status(), "Handshake complete");
                Ok(ws)
            }
        }
    }
}

/// Combine the read outcome with the request write.
///
/// A transport failure on the read side is reported as the write failure
/// when the request never went out. Errors the service sent back, and
/// complete responses, take precedence over the write result.
fn settle(read: Result<ChatResponse>, send_error: Option<String>) -> Result<ChatResponse> {
    let Some(send_error) = send_error else {
        return read;
    };
    match read {
        Err(SparkError::Transport(read_error)) => {
            debug!(read_error = %read_error, "Read failed after a failed request write");
            Err(SparkError::Transport(format!(
                "failed to send chat request: {send_error}"
            )))
        }
        other => {
            warn!(error = %send_error, "Request write reported an error");
            other
        }
    }
}
