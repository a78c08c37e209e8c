use secrecy::{ExposeSecret, SecretString};

use crate::error::ChatError;

const KEY_PREFIX: &str = "sk-";
const KEY_BODY_LEN: usize = 48;

/// API key sent as a bearer token
///
/// Debug output is redacted.
#[derive(Clone, Debug)]
pub struct Credential(SecretString);

impl Credential {
    /// Wraps a key without checking its shape
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the key is empty after trimming.
    pub fn new(key: impl AsRef<str>) -> Result<Self, ChatError> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            return Err(ChatError::Config("API key must not be empty".into()));
        }
        Ok(Self(SecretString::from(key.to_string())))
    }

    /// Wraps a key after checking it has the `sk-` + 48 alphanumerics shape
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the key does not have that shape.
    pub fn validated(key: impl AsRef<str>) -> Result<Self, ChatError> {
        let key = key.as_ref().trim();
        if !has_key_shape(key) {
            return Err(ChatError::Config(
                "Invalid OpenAI key. Please check your key and try again.".into(),
            ));
        }
        Self::new(key)
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Whether `key` looks like `sk-` followed by exactly 48 ASCII letters or digits
#[must_use]
pub fn has_key_shape(key: &str) -> bool {
    key.strip_prefix(KEY_PREFIX).is_some_and(|body| {
        body.len() == KEY_BODY_LEN && body.bytes().all(|b| b.is_ascii_alphanumeric())
    })
}
