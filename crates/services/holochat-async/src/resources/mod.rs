//! API resource implementations for the chat client

/// Chat completions resource
pub mod chat;

pub use chat::Completions;
