use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while asking for a streamed completion
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request or the response stream failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response bytes could not be decoded as UTF-8 text
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Configuration error (e.g., missing credentials)
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failures of the network call or of the response body stream
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client error (connect, timeout, or a failed body read)
    #[error("HTTP error")]
    Reqwest(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error: {0:?}")]
    Api(ApiErrorObject),

    /// A byte stream not backed by reqwest reported a failure
    #[error("Stream error: {0}")]
    Stream(String),
}

/// Fragment bytes that are not valid UTF-8
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid UTF-8 sequence at stream byte offset {offset}")]
pub struct DecodeError {
    /// Offset of the first invalid byte, counted from the start of the stream
    pub offset: u64,
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(TransportError::Reqwest(e))
    }
}

impl ChatError {
    /// Returns the HTTP status of an API error, if this is one
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Api(obj)) => obj.status_code,
            _ => None,
        }
    }

    /// Whether this error came from the transport rather than from decoding or setup
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// API error object returned by the chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorObject {
    /// HTTP status code
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
    /// Error type string (e.g., `invalid_request_error`)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Machine-readable error code (e.g., `invalid_api_key`)
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorObject,
}

/// Deserializes an API error from a non-success response body
///
/// Accepts the `{"error": {...}}` envelope, falling back to plain text.
#[must_use]
pub fn deserialize_api_error(status: StatusCode, body: &[u8]) -> ChatError {
    let status_code = Some(status.as_u16());

    if let Ok(ApiErrorEnvelope { error: mut obj }) = serde_json::from_slice(body) {
        obj.status_code = status_code;
        return TransportError::Api(obj).into();
    }

    // Proxies and load balancers answer with HTML or plain text; cap what we keep
    TransportError::Api(ApiErrorObject {
        status_code,
        message: String::from_utf8_lossy(&body[..body.len().min(400)]).into_owned(),
        kind: None,
        code: Some(format!("http_{}", status.as_u16())),
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_envelope_parses() {
        let body = br#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#;
        let err = deserialize_api_error(StatusCode::UNAUTHORIZED, body);
        match err {
            ChatError::Transport(TransportError::Api(obj)) => {
                assert_eq!(obj.status_code, Some(401));
                assert_eq!(obj.message, "Incorrect API key provided");
                assert_eq!(obj.kind.as_deref(), Some("invalid_request_error"));
                assert_eq!(obj.code.as_deref(), Some("invalid_api_key"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_falls_back() {
        let err = deserialize_api_error(StatusCode::BAD_GATEWAY, b"Bad Gateway");
        assert_eq!(err.status_code(), Some(502));
        assert!(err.is_transport());
        match err {
            ChatError::Transport(TransportError::Api(obj)) => {
                assert_eq!(obj.message, "Bad Gateway");
                assert_eq!(obj.code.as_deref(), Some("http_502"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn long_bodies_are_capped() {
        let body = vec![b'x'; 2000];
        match deserialize_api_error(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ChatError::Transport(TransportError::Api(obj)) => assert_eq!(obj.message.len(), 400),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn http_error_chain_names_the_cause_once() {
        let err: ChatError = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into();

        let mut chain = vec![err.to_string()];
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        assert_eq!(chain[0], "HTTP error");
        let cause = chain[1].clone();
        assert_eq!(chain.join(": ").matches(cause.as_str()).count(), 1);
    }

    #[test]
    fn decode_error_is_not_transport() {
        let err: ChatError = DecodeError { offset: 7 }.into();
        assert!(!err.is_transport());
        assert!(err.to_string().contains("offset 7"));
    }
}
