//! The receive loop: read, decode, surface, fold.

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info};

use crate::accumulator::{deliver, CallbackSink, ResponseAccumulator};
use crate::decoder::decode_frame;
use crate::{ChatResponse, Result, SparkError};

/// Read frames until the final one and return the accumulated response.
///
/// Stops at the first decode failure or non-zero frame code without reading
/// anything further. Frames are handled strictly in arrival order.
pub(crate) async fn receive_loop<S>(
    stream: &mut S,
    sink: Option<&dyn CallbackSink>,
) -> Result<ChatResponse>
where
    S: Stream<Item = std::result::Result<WsMessage, WsError>> + Unpin,
{
    let mut accumulator = ResponseAccumulator::new();

    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| SparkError::Transport(e.to_string()))?;
        let chunk = match message {
            WsMessage::Text(text) => decode_frame(text.as_bytes())?,
            WsMessage::Binary(data) => decode_frame(&data)?,
            WsMessage::Close(frame) => {
                debug!(?frame, "Peer closed the connection");
                return Err(SparkError::Transport(
                    "connection closed before the final frame".into(),
                ));
            }
            _ => continue,
        };

        deliver(sink, &chunk);

        let sid = chunk.is_final().then(|| chunk.sid.clone());
        if let Some(response) = accumulator.push(chunk)? {
            info!(
                sid = %sid.unwrap_or_default(),
                frames = accumulator.frames(),
                "Chat session finished"
            );
            return Ok(response);
        }
    }

    Err(SparkError::Transport(
        "connection closed before the final frame".into(),
    ))
}
