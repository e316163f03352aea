//! Decoding of inbound frames into normalized chunks.

use crate::protocol::{ResponseFrame, STATUS_FINAL};
use crate::{FunctionCall, Result, Role, SparkError, Usage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    InProgress,
    Final,
}

/// What a single frame contributes: a text delta or a function call.
/// A function-call frame never carries text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBody {
    Plain(String),
    FunctionCall(FunctionCall),
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sid: String,
    pub seq: u32,
    pub status: FrameStatus,
    pub role: Role,
    pub body: ChunkBody,
    /// Present on the final frame only.
    pub usage: Option<Usage>,
}

impl Chunk {
    pub fn is_final(&self) -> bool {
        self.status == FrameStatus::Final
    }

    /// The text delta, or an empty string for function-call frames.
    pub fn delta(&self) -> &str {
        match &self.body {
            ChunkBody::Plain(delta) => delta,
            ChunkBody::FunctionCall(_) => "",
        }
    }
}

/// Decode one raw frame.
///
/// A non-zero header code is returned as [`SparkError::Protocol`]. Only the
/// first choice is read; further choices are ignored.
pub fn decode_frame(raw: &[u8]) -> Result<Chunk> {
    let frame: ResponseFrame =
        serde_json::from_slice(raw).map_err(|e| SparkError::MalformedFrame(e.to_string()))?;

    let header = frame.header;
    if header.code != 0 {
        return Err(SparkError::Protocol {
            code: header.code,
            message: header.message,
            sid: header.sid,
        });
    }

    let payload = frame.payload.ok_or_else(|| {
        SparkError::MalformedFrame(format!("frame {} has no payload", header.sid))
    })?;

    let status = if payload.choices.status == STATUS_FINAL {
        FrameStatus::Final
    } else {
        FrameStatus::InProgress
    };

    let first = payload.choices.text.into_iter().next();
    let (role, body) = match first {
        Some(choice) => {
            let role = choice.role.unwrap_or(Role::Assistant);
            let body = match choice.function_call {
                Some(call) => ChunkBody::FunctionCall(call),
                None => ChunkBody::Plain(choice.content),
            };
            (role, body)
        }
        None => (Role::Assistant, ChunkBody::Plain(String::new())),
    };

    let usage = match status {
        FrameStatus::Final => payload.usage.map(|u| u.into_usage()),
        FrameStatus::InProgress => None,
    };

    Ok(Chunk {
        sid: header.sid,
        seq: payload.choices.seq,
        status,
        role,
        body,
        usage,
    })
}
