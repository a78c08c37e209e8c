use serde::{Deserialize, Serialize};

use super::chat::MessageRole;

/// Payload that marks the end of a completion stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// One `data` payload of a streamed chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Completion ID, shared by every chunk of one response
    #[serde(default)]
    pub id: Option<String>,
    /// Model that produced the chunk
    #[serde(default)]
    pub model: Option<String>,
    /// Choice deltas
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// Delta for one choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Incremental content
    #[serde(default)]
    pub delta: ChunkDelta,
    /// Set on the last chunk of a choice
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental message content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Present on the first chunk only
    #[serde(default)]
    pub role: Option<MessageRole>,
    /// Text to append
    #[serde(default)]
    pub content: Option<String>,
}

/// Parsed form of one streamed payload
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkPayload {
    /// A completion chunk
    Chunk(ChatCompletionChunk),
    /// The `[DONE]` sentinel
    Done,
}

impl ChatCompletionChunk {
    /// Parses a `data` payload
    ///
    /// # Errors
    ///
    /// Returns a serde error if the payload is neither `[DONE]` nor a chunk object.
    pub fn parse(data: &str) -> Result<ChunkPayload, serde_json::Error> {
        if data.trim() == DONE_SENTINEL {
            return Ok(ChunkPayload::Done);
        }
        serde_json::from_str(data).map(ChunkPayload::Chunk)
    }

    /// Concatenated delta text of all choices
    #[must_use]
    pub fn text(&self) -> String {
        self.choices
            .iter()
            .filter_map(|c| c.delta.content.as_deref())
            .collect()
    }

    /// Finish reason of the first finished choice
    #[must_use]
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.iter().find_map(|c| c.finish_reason.as_deref())
    }
}
