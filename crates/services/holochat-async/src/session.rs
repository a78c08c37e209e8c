//! One streamed completion per call.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::Client;
use crate::config::{Config, HolochatConfig};
use crate::credential::Credential;
use crate::error::ChatError;
use crate::sse::{
    BlockPolicy, ChunkDecoder, DecodedUnit, EventAccumulator, StreamDriver, StreamSummary,
};
use crate::types::chat::{GenerationParams, MessageParam};

/// Sends a conversation and streams the reply back fragment by fragment
///
/// Every call opens its own response stream with its own decoder state; nothing
/// carries over from one call to the next.
#[derive(Debug, Clone)]
pub struct ChatSession<C: Config = HolochatConfig> {
    client: Client<C>,
    params: GenerationParams,
    policy: BlockPolicy,
}

impl ChatSession<HolochatConfig> {
    /// Creates a session against the default endpoint using `credential`
    ///
    /// The base URL still honours `OPENAI_BASE_URL`.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self::with_client(Client::with_config(
            HolochatConfig::new().with_credential(credential),
        ))
    }
}

impl<C: Config> ChatSession<C> {
    /// Creates a session over an existing client with default generation settings
    #[must_use]
    pub fn with_client(client: Client<C>) -> Self {
        Self {
            client,
            params: GenerationParams::default(),
            policy: BlockPolicy::Carry,
        }
    }

    /// Replaces the generation settings
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if a value is out of range.
    pub fn with_params(mut self, params: GenerationParams) -> Result<Self, ChatError> {
        params.validate()?;
        self.params = params;
        Ok(self)
    }

    /// Sets whether `event`/`id` carry over between blocks of a response
    #[must_use]
    pub const fn with_block_policy(mut self, policy: BlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Generation settings sent with every request
    #[must_use]
    pub const fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Underlying HTTP client
    #[must_use]
    pub const fn client(&self) -> &Client<C> {
        &self.client
    }

    /// Sends `history` and calls `on_fragment` with every non-empty `data` payload
    ///
    /// Resolves once the response body ends. Retry hints from the server are
    /// accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns a transport error for a non-2xx status or a failed read, and a
    /// decode error for a body that is not UTF-8. Fragments delivered before the
    /// failure stay delivered.
    pub async fn ask<F>(
        &self,
        on_fragment: F,
        history: &[MessageParam],
    ) -> Result<StreamSummary, ChatError>
    where
        F: FnMut(&str),
    {
        self.ask_with_cancel(on_fragment, history, CancellationToken::new())
            .await
    }

    /// Like [`Self::ask`], stopping early when `cancel` fires
    ///
    /// After cancellation no further fragments are read or delivered and the
    /// response stream is dropped.
    ///
    /// # Errors
    ///
    /// See [`Self::ask`].
    pub async fn ask_with_cancel<F>(
        &self,
        mut on_fragment: F,
        history: &[MessageParam],
        cancel: CancellationToken,
    ) -> Result<StreamSummary, ChatError>
    where
        F: FnMut(&str),
    {
        let request = self.params.request(history.to_vec())?;
        let body = self.client.completions().create_stream(request).await?;

        let guard = cancel.clone();
        let observer = |unit: DecodedUnit| match unit {
            DecodedUnit::Event(event) => {
                if event.data.is_empty() || guard.is_cancelled() {
                    return;
                }
                on_fragment(&event.data);
            }
            DecodedUnit::Retry(hint) => {
                debug!(milliseconds = hint.milliseconds, "retry hint ignored");
            }
        };
        let decoder =
            ChunkDecoder::with_accumulator(EventAccumulator::with_policy(self.policy), observer);

        StreamDriver::with_decoder(body, decoder)
            .with_cancellation(cancel)
            .drive()
            .await
    }
}
