//! Folding decoded chunks into the final response.

use tracing::warn;

use crate::decoder::{Chunk, ChunkBody, FrameStatus};
use crate::{ChatResponse, Result, Role, SparkError};

pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every inbound chunk as it is decoded.
///
/// Delivery is best-effort: an error returned here is logged and the stream
/// keeps going.
pub trait CallbackSink: Send + Sync {
    fn on_chunk(&self, chunk: &Chunk) -> std::result::Result<(), CallbackError>;
}

impl<F> CallbackSink for F
where
    F: Fn(&Chunk) -> std::result::Result<(), CallbackError> + Send + Sync,
{
    fn on_chunk(&self, chunk: &Chunk) -> std::result::Result<(), CallbackError> {
        self(chunk)
    }
}

pub(crate) fn deliver(sink: Option<&dyn CallbackSink>, chunk: &Chunk) {
    if let Some(sink) = sink {
        if let Err(e) = sink.on_chunk(chunk) {
            warn!(error = %e, sid = %chunk.sid, seq = chunk.seq, "Stream callback failed");
        }
    }
}

/// Concatenates text deltas in arrival order until the final chunk.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    content: String,
    frames: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk. Returns the response once the final chunk arrives.
    pub fn push(&mut self, chunk: Chunk) -> Result<Option<ChatResponse>> {
        self.frames += 1;
        if let ChunkBody::Plain(delta) = &chunk.body {
            self.content.push_str(delta);
        }

        match chunk.status {
            FrameStatus::InProgress => Ok(None),
            FrameStatus::Final => self.finish(chunk.role, chunk.body, chunk.usage).map(Some),
        }
    }

    fn finish(
        &mut self,
        role: Role,
        body: ChunkBody,
        usage: Option<crate::Usage>,
    ) -> Result<ChatResponse> {
        let usage = usage.unwrap_or_default();
        match body {
            ChunkBody::FunctionCall(call) => Ok(ChatResponse::FunctionCall { call, usage }),
            ChunkBody::Plain(_) => {
                let content = std::mem::take(&mut self.content);
                if content.is_empty() {
                    return Err(SparkError::EmptyResponse);
                }
                Ok(ChatResponse::Message {
                    role,
                    content,
                    usage,
                })
            }
        }
    }

    /// Text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of chunks folded so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}
