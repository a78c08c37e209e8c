//! Seed history file loading.

use std::path::Path;

use anyhow::{Context, Result};
use holochat_async::types::ChatMessage;

/// Reads a JSON array of `{ "text", "isUserMessage" }` objects
pub fn load(path: &Path) -> Result<Vec<ChatMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading history file {}", path.display()))?;
    let messages: Vec<ChatMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing history file {}", path.display()))?;
    tracing::debug!(count = messages.len(), "loaded seed history");
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_message_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[{"text":"Hello, how can I help?","isUserMessage":false},{"text":"hi","isUserMessage":true}]"#,
        )
        .unwrap();

        let messages = load(&path).unwrap();
        assert_eq!(
            messages,
            vec![
                ChatMessage::assistant("Hello, how can I help?"),
                ChatMessage::user("hi")
            ]
        );
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing history file"));
    }
}
