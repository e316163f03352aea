//! Async ask methods for Conversation (plain + streaming).

use tracing::warn;

use crate::accumulator::CallbackSink;
use crate::{ChatClient, ChatRequest, ChatResponse, Message, Result};

use super::Conversation;

impl Conversation {
    /// Add a user message and get the reply.
    ///
    /// A plain reply is appended to the history. A function-call reply is
    /// recorded as an assistant turn carrying the call; answer it with
    /// [`Conversation::send_function_result`]. On error the user message is
    /// removed again.
    pub async fn ask(
        &mut self,
        client: &dyn ChatClient,
        text: impl Into<String>,
    ) -> Result<ChatResponse> {
        self.turn(client, Message::user(text), None).await
    }

    /// Same as [`Conversation::ask`], surfacing every frame through `sink`.
    pub async fn ask_streaming(
        &mut self,
        client: &dyn ChatClient,
        text: impl Into<String>,
        sink: &dyn CallbackSink,
    ) -> Result<ChatResponse> {
        self.turn(client, Message::user(text), Some(sink)).await
    }

    /// Send the output of function `name` and get the model's follow-up.
    /// On error the function message is removed again.
    pub async fn send_function_result(
        &mut self,
        client: &dyn ChatClient,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<ChatResponse> {
        self.turn(client, Message::function(name, content), None).await
    }

    /// Same as [`Conversation::send_function_result`], surfacing every frame
    /// through `sink`.
    pub async fn send_function_result_streaming(
        &mut self,
        client: &dyn ChatClient,
        name: impl Into<String>,
        content: impl Into<String>,
        sink: &dyn CallbackSink,
    ) -> Result<ChatResponse> {
        self.turn(client, Message::function(name, content), Some(sink)).await
    }

    async fn turn(
        &mut self,
        client: &dyn ChatClient,
        message: Message,
        sink: Option<&dyn CallbackSink>,
    ) -> Result<ChatResponse> {
        self.messages.push(message);

        let mut request =
            ChatRequest::new(self.build_messages()).with_functions(self.functions.clone());
        if let Some(ref domain) = self.domain {
            request = request.with_domain(domain.clone());
        }

        let result = match sink {
            Some(sink) => client.chat_streaming(request, sink).await,
            None => client.chat(request).await,
        };
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.messages.pop();
                return Err(e);
            }
        };

        let domain = self.tracker_domain(client).to_string();
        self.tracker.record(&domain, response.usage());

        let sent = self.messages.last().cloned();
        self.persist(sent.as_ref());

        let reply = match &response {
            ChatResponse::Message { content, .. } => Message::assistant(content.clone()),
            ChatResponse::FunctionCall { call, .. } => {
                Message::assistant_function_call(call.clone())
            }
        };
        self.persist(Some(&reply));
        self.messages.push(reply);

        Ok(response)
    }

    /// History write failures are logged; the turn itself already succeeded.
    pub(super) fn persist(&mut self, message: Option<&Message>) {
        let (Some(store), Some(message)) = (self.history.as_mut(), message) else {
            return;
        };
        if let Err(e) = store.append(message) {
            warn!(path = %store.path().display(), error = %e, "Failed to write history");
        }
    }
}
