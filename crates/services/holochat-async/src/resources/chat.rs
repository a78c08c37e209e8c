use futures::StreamExt;

use crate::{
    client::Client,
    config::Config,
    error::ChatError,
    sse::ByteStream,
    types::chat::ChatCompletionRequest,
};

/// Path of the chat completions endpoint
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// API resource for the `/v1/chat/completions` endpoint
pub struct Completions<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Completions<'c, C> {
    /// Creates a new Completions resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Opens a streamed completion and returns the raw response body
    ///
    /// The request always has `stream: true` set. The body is handed back
    /// undecoded; drive it with [`StreamDriver`](crate::sse::StreamDriver).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No credential is configured or the message list is empty
    /// - The request fails to send
    /// - The API returns a non-2xx status
    pub async fn create_stream(
        &self,
        mut req: ChatCompletionRequest,
    ) -> Result<ByteStream, ChatError> {
        req.stream = true;

        if req.messages.is_empty() {
            return Err(ChatError::Config(
                "a completion needs at least one message".into(),
            ));
        }

        let response = self.client.post_stream(CHAT_COMPLETIONS_PATH, req).await?;
        Ok(byte_stream_from_response(response))
    }
}

/// Adapts a response body into a [`ByteStream`]
///
/// The stream owns the response and closes the connection when dropped.
#[must_use]
pub fn byte_stream_from_response(response: reqwest::Response) -> ByteStream {
    Box::pin(
        response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatError::from)),
    )
}

impl<C: Config> crate::Client<C> {
    /// Returns the chat Completions API resource
    #[must_use]
    pub const fn completions(&self) -> Completions<'_, C> {
        Completions::new(self)
    }
}
