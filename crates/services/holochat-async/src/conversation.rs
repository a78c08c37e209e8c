//! Turn-by-turn chat history on top of [`ChatSession`].

use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::config::{Config, HolochatConfig};
use crate::error::ChatError;
use crate::session::ChatSession;
use crate::types::chat::{ChatMessage, MessageParam};
use crate::types::chunk::{ChatCompletionChunk, ChunkPayload};

/// A running conversation
///
/// Holds the visible message list. Each [`submit`](Self::submit) appends the
/// user's turn, streams the assistant's reply through `on_text`, and appends the
/// reply once the stream ends.
#[derive(Debug, Clone)]
pub struct Conversation<C: Config = HolochatConfig> {
    session: ChatSession<C>,
    system: Option<String>,
    initial: Vec<ChatMessage>,
    messages: Vec<ChatMessage>,
}

impl<C: Config> Conversation<C> {
    /// Starts an empty conversation
    #[must_use]
    pub const fn new(session: ChatSession<C>) -> Self {
        Self {
            session,
            system: None,
            initial: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Seeds the conversation; [`reset`](Self::reset) returns to this history
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.messages.clone_from(&history);
        self.initial = history;
        self
    }

    /// Sends `prompt` as a system message ahead of every turn
    ///
    /// The prompt is not part of [`messages`](Self::messages) and survives
    /// [`reset`](Self::reset).
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system = Some(prompt.into());
        self
    }

    /// Messages in display order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The session used for every turn
    #[must_use]
    pub const fn session(&self) -> &ChatSession<C> {
        &self.session
    }

    /// Drops everything after the seeded history
    pub fn reset(&mut self) {
        self.messages.clone_from(&self.initial);
    }

    /// Sends `text` as the next user turn
    ///
    /// Blank input is ignored and yields `Ok(None)`. Otherwise `on_text` sees
    /// each piece of the reply as it arrives and the completed reply is
    /// returned.
    ///
    /// # Errors
    ///
    /// On any session error the user turn stays in the history and the partial
    /// reply is discarded.
    pub async fn submit<F>(
        &mut self,
        text: &str,
        on_text: F,
    ) -> Result<Option<ChatMessage>, ChatError>
    where
        F: FnMut(&str),
    {
        self.submit_with_cancel(text, on_text, CancellationToken::new())
            .await
    }

    /// Like [`submit`](Self::submit), stopping early when `cancel` fires
    ///
    /// A cancelled turn keeps whatever text had already arrived; nothing is
    /// appended if no text arrived.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub async fn submit_with_cancel<F>(
        &mut self,
        text: &str,
        mut on_text: F,
        cancel: CancellationToken,
    ) -> Result<Option<ChatMessage>, ChatError>
    where
        F: FnMut(&str),
    {
        if text.trim().is_empty() {
            return Ok(None);
        }

        self.messages.push(ChatMessage::user(text));
        let history: Vec<MessageParam> = self
            .system
            .iter()
            .map(MessageParam::system)
            .chain(self.messages.iter().map(MessageParam::from))
            .collect();

        let mut reply = String::new();
        let summary = self
            .session
            .ask_with_cancel(
                |data| match ChatCompletionChunk::parse(data) {
                    Ok(ChunkPayload::Chunk(chunk)) => {
                        let piece = chunk.text();
                        if !piece.is_empty() {
                            on_text(&piece);
                            reply.push_str(&piece);
                        }
                    }
                    Ok(ChunkPayload::Done) => trace!("end of reply"),
                    Err(e) => warn!(error = %e, "skipping unreadable chunk"),
                },
                &history,
                cancel,
            )
            .await?;

        if summary.is_cancelled() && reply.is_empty() {
            return Ok(None);
        }

        let message = ChatMessage::assistant(reply);
        self.messages.push(message.clone());
        Ok(Some(message))
    }
}
