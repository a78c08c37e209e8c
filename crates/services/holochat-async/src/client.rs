use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::{Config, HolochatConfig},
    error::ChatError,
};

/// Chat completions API client
///
/// The client is generic over a [`Config`] implementation that provides authentication
/// and API configuration.
#[derive(Debug, Clone)]
pub struct Client<C: Config> {
    http: reqwest::Client,
    config: C,
}

impl Client<HolochatConfig> {
    /// Creates a new client with default configuration
    ///
    /// Uses environment variables:
    /// - `OPENAI_API_KEY` for the credential
    /// - `OPENAI_BASE_URL` for a custom API base URL
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HolochatConfig::new())
    }
}

impl<C: Config + Default> Default for Client<C> {
    fn default() -> Self {
        Self::with_config(C::default())
    }
}

impl<C: Config> Client<C> {
    /// Creates a new client with the given configuration.
    ///
    /// Falls back to reqwest's defaults, without the connect and total
    /// timeouts, if the tuned client cannot be built.
    #[must_use]
    pub fn with_config(config: C) -> Self {
        let http = http_client_or_default(
            reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(600))
                .build(),
        );
        Self { http, config }
    }

    /// Replaces the HTTP client with a custom one
    ///
    /// Useful for setting custom timeouts, proxies, or other HTTP configuration.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Returns a reference to the client's configuration
    #[must_use]
    pub const fn config(&self) -> &C {
        &self.config
    }

    /// Sends a POST request and returns the raw response for streaming.
    ///
    /// Nothing is retried: a streamed response cannot be replayed.
    pub(crate) async fn post_stream<I: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: I,
    ) -> Result<reqwest::Response, ChatError> {
        // Validate auth before any request
        self.config.validate_auth()?;

        let headers = self.config.headers()?;
        let request = self
            .http
            .post(self.config.url(path))
            .headers(headers)
            .json(&body)
            .build()?;

        debug!(url = %request.url(), "opening stream");
        let response = self.http.execute(request).await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            // Error bodies are small; read them whole for the error object
            let bytes = response.bytes().await?;
            Err(crate::error::deserialize_api_error(status, &bytes))
        }
    }
}

fn http_client_or_default(built: Result<reqwest::Client, reqwest::Error>) -> reqwest::Client {
    built.unwrap_or_else(|e| {
        warn!(error = %e, "falling back to a default HTTP client without timeouts");
        reqwest::Client::new()
    })
}
