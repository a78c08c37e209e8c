use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// The person chatting
    User,
    /// The model
    Assistant,
}

/// A message as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParam {
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl MessageParam {
    /// Creates a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Creates a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// One turn of a displayed conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Turn text
    pub text: String,
    /// `true` for turns typed by the user
    #[serde(rename = "isUserMessage", alias = "is_user")]
    pub is_user: bool,
}

impl ChatMessage {
    /// Creates a user turn
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    /// Creates an assistant turn
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }
}

impl From<&ChatMessage> for MessageParam {
    fn from(m: &ChatMessage) -> Self {
        if m.is_user {
            Self::user(m.text.clone())
        } else {
            Self::assistant(m.text.clone())
        }
    }
}

/// Request body for `POST /v1/chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder, Default)]
#[builder(setter(into, strip_option), default)]
pub struct ChatCompletionRequest {
    /// Model to use for generation
    pub model: String,
    /// Conversation so far, oldest first
    pub messages: Vec<MessageParam>,
    /// Ask for a server-sent event stream
    pub stream: bool,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Penalty for tokens already present in the text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Fixed generation settings applied to every request of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model to use for generation
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling parameter
    pub top_p: f32,
    /// Presence penalty
    pub presence_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_tokens: 1000,
            temperature: 0.8,
            top_p: 1.0,
            presence_penalty: 1.0,
        }
    }
}

impl GenerationParams {
    /// Checks the sampling parameters against the ranges the API accepts
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] naming the first out-of-range value.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::Config("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ChatError::Config(
                "max_tokens must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::Config(format!(
                "Invalid temperature {}: must be in [0.0, 2.0]",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) || self.top_p == 0.0 {
            return Err(ChatError::Config(format!(
                "Invalid top_p {}: must be in (0.0, 1.0]",
                self.top_p
            )));
        }
        if !(-2.0..=2.0).contains(&self.presence_penalty) {
            return Err(ChatError::Config(format!(
                "Invalid presence_penalty {}: must be in [-2.0, 2.0]",
                self.presence_penalty
            )));
        }
        Ok(())
    }

    /// Builds a streaming request carrying `messages` in order
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the builder rejects the request.
    pub fn request(&self, messages: Vec<MessageParam>) -> Result<ChatCompletionRequest, ChatError> {
        ChatCompletionRequestBuilder::default()
            .model(self.model.clone())
            .messages(messages)
            .stream(true)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .presence_penalty(self.presence_penalty)
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))
    }
}
