#![deny(clippy::all)]
#![deny(missing_docs)]

//! # `holochat-async`
//!
//! A streaming chat-completion client built around an incremental
//! server-sent-events decoder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use holochat_async::{ChatSession, Credential, types::MessageParam};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = ChatSession::new(Credential::validated(std::env::var("OPENAI_API_KEY")?)?);
//!
//! let history = vec![MessageParam::user("Hello!")];
//! session.ask(|data| println!("{data}"), &history).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding on its own
//!
//! [`sse::ChunkDecoder`] accepts arbitrary byte fragments and emits a
//! [`sse::DecodedUnit`] for every `data` or `retry` line once a block
//! boundary has arrived. [`sse::StreamDriver`] pumps a byte stream through a
//! decoder and honours a [`CancellationToken`](tokio_util::sync::CancellationToken).

/// HTTP client implementation
pub mod client;
/// Configuration types for the client
pub mod config;
/// Conversation history management
pub mod conversation;
/// API key handling
pub mod credential;
/// Error types
pub mod error;
/// API resource implementations
pub mod resources;
/// Streaming request entry point
pub mod session;
/// Incremental server-sent-events decoding
pub mod sse;
/// Test support utilities (for use in tests)
#[doc(hidden)]
pub mod test_support;
/// Request and response types
pub mod types;

pub use crate::client::Client;
pub use crate::config::{Config, HolochatConfig};
pub use crate::conversation::Conversation;
pub use crate::credential::Credential;
pub use crate::error::{ApiErrorObject, ChatError, DecodeError, TransportError};
pub use crate::session::ChatSession;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{Config, HolochatConfig};
    pub use crate::conversation::Conversation;
    pub use crate::credential::Credential;
    pub use crate::error::{ChatError, DecodeError, TransportError};
    pub use crate::session::ChatSession;
    pub use crate::sse::{BlockPolicy, ChunkDecoder, DecodedUnit, StreamDriver, StreamSummary};
    pub use crate::types::{ChatMessage, GenerationParams, MessageParam};
}
