//! Multi-turn conversations.
//!
//! A `Conversation` holds the message history, resends it on every call,
//! and optionally mirrors each new message into a [`HistoryStore`].

mod chat;


use tracing::debug;

use crate::history::HistoryStore;
use crate::token_tracker::TokenTracker;
use crate::{ChatClient, FunctionDefinition, Message, Result};

/// Tracker key used when neither the conversation nor the client names a
/// domain.
pub const DEFAULT_TRACKER_DOMAIN: &str = "default";

#[derive(Debug, Default)]
pub struct Conversation {
    /// History without the system prompt.
    messages: Vec<Message>,
    /// Sent first on every call, never stored in history.
    system_prompt: Option<String>,
    functions: Vec<FunctionDefinition>,
    /// Overrides the client's configured domain when set.
    domain: Option<String>,
    tracker: TokenTracker,
    history: Option<HistoryStore>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Load the stored messages and persist every new one to `store`.
    pub fn with_history(mut self, store: HistoryStore) -> Result<Self> {
        let stored = store.read()?;
        debug!(path = %store.path().display(), messages = stored.len(), "Loaded history");
        self.messages = stored;
        self.history = Some(store);
        Ok(self)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    /// Record the output of a function the model asked to call, without
    /// sending anything. The next call carries it.
    pub fn add_function_result(&mut self, name: impl Into<String>, content: impl Into<String>) {
        let message = Message::function(name, content);
        self.persist(Some(&message));
        self.messages.push(message);
    }

    /// Forget the in-memory history. The history file is left as is.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn build_messages(&self) -> Vec<Message> {
        let mut msgs = Vec::with_capacity(self.messages.len() + 1);
        if let Some(ref system) = self.system_prompt {
            msgs.push(Message::system(system.clone()));
        }
        msgs.extend(self.messages.iter().cloned());
        msgs
    }

    /// The domain a call was actually sent with.
    fn tracker_domain<'a>(&'a self, client: &'a dyn ChatClient) -> &'a str {
        self.domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| client.default_domain().filter(|d| !d.is_empty()))
            .unwrap_or(DEFAULT_TRACKER_DOMAIN)
    }
}
