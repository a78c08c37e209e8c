use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::credential::Credential;
use crate::error::ChatError;

/// Default API base URL
pub const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com";
/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the API base URL
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";

/// Configuration for the chat client
///
/// Debug output redacts the credential.
#[derive(Clone, Debug)]
pub struct HolochatConfig {
    api_base: String,
    credential: Option<Credential>,
}

/// Helper to read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for HolochatConfig {
    fn default() -> Self {
        let credential = env_trimmed(ENV_API_KEY).and_then(|k| Credential::new(k).ok());
        let api_base = env_trimmed(ENV_BASE_URL).unwrap_or_else(|| OPENAI_DEFAULT_BASE.into());

        Self {
            api_base,
            credential,
        }
    }
}

impl HolochatConfig {
    /// Creates a new configuration with default settings
    ///
    /// Attempts to read from environment variables:
    /// - `OPENAI_API_KEY` for the credential
    /// - `OPENAI_BASE_URL` for a custom API base URL (defaults to `https://api.openai.com`)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the credential
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Returns the configured API base URL
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

/// Configuration trait for the chat client
///
/// Implement this trait to provide custom authentication and API configuration.
pub trait Config: Send + Sync {
    /// Returns HTTP headers to include in requests
    ///
    /// # Errors
    ///
    /// Returns an error if header values contain invalid characters.
    fn headers(&self) -> Result<HeaderMap, ChatError>;

    /// Constructs the full URL for an API endpoint
    fn url(&self, path: &str) -> String;

    /// Validates that authentication credentials are present.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication is not properly configured.
    fn validate_auth(&self) -> Result<(), ChatError>;
}

impl Config for HolochatConfig {
    fn headers(&self) -> Result<HeaderMap, ChatError> {
        let mut h = HeaderMap::new();

        if let Some(credential) = &self.credential {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
                .map_err(|_| ChatError::Config("Invalid authorization header value".into()))?;
            value.set_sensitive(true);
            h.insert(AUTHORIZATION, value);
        }

        Ok(h)
    }

    fn url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn validate_auth(&self) -> Result<(), ChatError> {
        match &self.credential {
            Some(_) => Ok(()),
            None => Err(ChatError::Config(format!(
                "Missing OpenAI credentials: set {ENV_API_KEY} environment variable"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn config_reads_env_vars() {
        let _env = EnvGuard::isolated()
            .with(ENV_API_KEY, "test-key-123")
            .with(ENV_BASE_URL, "https://proxy.example.com");

        let cfg = HolochatConfig::new();
        assert_eq!(cfg.api_base(), "https://proxy.example.com");

        let h = cfg.headers().unwrap();
        assert_eq!(
            h.get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer test-key-123"
        );
    }

    #[test]
    #[serial(env)]
    fn config_defaults_base_url() {
        let _env = EnvGuard::isolated().with(ENV_API_KEY, "k");

        let cfg = HolochatConfig::new();
        assert_eq!(cfg.api_base(), OPENAI_DEFAULT_BASE);
    }

    #[test]
    #[serial(env)]
    fn validate_auth_missing_key() {
        let _env = EnvGuard::isolated();

        let cfg = HolochatConfig::new();
        assert!(cfg.validate_auth().is_err());
        assert!(cfg.headers().unwrap().get(AUTHORIZATION).is_none());
    }

    #[test]
    #[serial(env)]
    fn whitespace_only_env_key_is_unset() {
        let _env = EnvGuard::isolated().with(ENV_API_KEY, "   ");

        let cfg = HolochatConfig::new();
        assert!(cfg.validate_auth().is_err());
    }

    #[test]
    fn builder_methods() {
        let cfg = HolochatConfig::new()
            .with_api_base("http://localhost:8080/")
            .with_credential(Credential::new("my-key").unwrap());

        assert!(cfg.validate_auth().is_ok());
        assert_eq!(
            cfg.url("/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
        let h = cfg.headers().unwrap();
        assert_eq!(
            h.get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer my-key"
        );
    }

    #[test]
    fn debug_output_redacts_credential() {
        let cfg = HolochatConfig::new().with_credential(Credential::new("super-secret").unwrap());
        let debug_str = format!("{cfg:?}");
        assert!(!debug_str.contains("super-secret"));
    }
}
