//! Request, response and conversation types

/// Messages, requests and generation settings
pub mod chat;
/// Streamed completion chunks
pub mod chunk;

pub use chat::*;
pub use chunk::*;
