//! Client for the iFlytek Spark conversational API.
//!
//! Provides:
//! - Time-bound signed WebSocket URLs (HMAC-SHA256 over host, date and request line)
//! - One duplex session per call with incremental frame decoding
//! - Accumulation of streamed deltas into a final message or function call
//! - Multi-turn conversations with optional JSON-lines history
//! - Token usage tracking

pub mod accumulator;
pub mod auth;
pub mod client;
pub mod config;
pub mod conversation;
pub mod decoder;
pub mod error;
pub mod history;
pub mod protocol;
pub mod token_tracker;
pub mod transport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use accumulator::{CallbackError, CallbackSink, ResponseAccumulator};
pub use auth::AuthUrlSigner;
pub use client::SparkClient;
pub use config::SparkConfig;
pub use conversation::Conversation;
pub use decoder::{decode_frame, Chunk, ChunkBody, FrameStatus};
pub use error::{Result, SparkError};
pub use history::HistoryStore;
pub use token_tracker::TokenTracker;
pub use transport::{SessionState, SessionTransport};

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Like [`ChatClient::chat`], surfacing every inbound frame through `sink`
    /// as it arrives.
    async fn chat_streaming(
        &self,
        request: ChatRequest,
        sink: &dyn CallbackSink,
    ) -> Result<ChatResponse>;

    /// Domain used when a request does not name one.
    fn default_domain(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// The result of a function the model asked to call.
    Function,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        }
    }

    /// Role named by an inbound frame. Matching ignores case; empty or
    /// unknown names are taken as the assistant.
    pub fn from_wire(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "function" => Role::Function,
            _ => Role::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Function name, on function-result messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The call the assistant made, on function-call turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant turn that asked for `call` instead of answering.
    pub fn assistant_function_call(call: FunctionCall) -> Self {
        Self {
            function_call: Some(call),
            ..Self::new(Role::Assistant, "")
        }
    }

    /// The output of function `name`, sent back to the model.
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Role::Function, content)
        }
    }
}

/// A function the model may choose to call instead of answering in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON-schema-like parameter description, passed through untouched.
    pub parameters: serde_json::Value,
}

/// A function call chosen by the model. `arguments` is the raw payload
/// exactly as the service sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, deserialize_with = "protocol::raw_arguments")]
    pub arguments: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One chat call. Sampling parameters left as `None` take the configured
/// defaults when the request is sent; explicit values, including zero, are
/// sent as given.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub domain: Option<String>,
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    pub functions: Vec<FunctionDefinition>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }
}

/// The result of one chat call.
///
/// A session that ends on a function-call frame yields only that call: text
/// deltas received earlier in the same session are not part of the result,
/// although a streaming caller has already seen them through its sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    Message {
        role: Role,
        content: String,
        usage: Usage,
    },
    FunctionCall {
        call: FunctionCall,
        usage: Usage,
    },
}

impl ChatResponse {
    /// Text content, if this is a plain message.
    pub fn text(&self) -> Option<&str> {
        match self {
            ChatResponse::Message { content, .. } => Some(content),
            ChatResponse::FunctionCall { .. } => None,
        }
    }

    pub fn function_call(&self) -> Option<&FunctionCall> {
        match self {
            ChatResponse::Message { .. } => None,
            ChatResponse::FunctionCall { call, .. } => Some(call),
        }
    }

    pub fn usage(&self) -> &Usage {
        match self {
            ChatResponse::Message { usage, .. } | ChatResponse::FunctionCall { usage, .. } => usage,
        }
    }
}
