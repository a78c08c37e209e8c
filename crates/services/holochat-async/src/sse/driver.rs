//! Read loop pulling fragments from a byte stream into a [`ChunkDecoder`].

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::accumulator::DecodedUnit;
use super::decoder::ChunkDecoder;
use crate::error::ChatError;

/// Type alias for a response body delivered as fragments
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send + 'static>>;

/// How a driven stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The transport reported the end of the body
    Completed,
    /// The cancellation token fired before the body ended
    Cancelled,
}

/// Counters reported once a stream stops without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Fragments read from the transport
    pub fragments: u64,
    /// Bytes read from the transport
    pub bytes: u64,
    /// Units handed to the observer
    pub units: u64,
    /// Why the stream stopped
    pub end: StreamEnd,
}

impl StreamSummary {
    const fn new() -> Self {
        Self {
            fragments: 0,
            bytes: 0,
            units: 0,
            end: StreamEnd::Completed,
        }
    }

    /// Whether the stream was aborted through its cancellation token
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.end == StreamEnd::Cancelled
    }
}

/// Feeds every fragment of a stream, in order, to a [`ChunkDecoder`]
///
/// The next fragment is only requested after the previous one has been fully
/// decoded. A stream error stops the loop and is returned as-is; nothing is
/// retried. Cancellation is observed between fragments and while waiting for one.
pub struct StreamDriver<S, F> {
    stream: S,
    decoder: ChunkDecoder<F>,
    cancel: CancellationToken,
}

impl<S, F> StreamDriver<S, F>
where
    S: Stream<Item = Result<Bytes, ChatError>> + Unpin,
    F: FnMut(DecodedUnit),
{
    /// Creates a driver with a fresh decoder around `observer`
    pub fn new(stream: S, observer: F) -> Self {
        Self::with_decoder(stream, ChunkDecoder::new(observer))
    }

    /// Creates a driver around an existing decoder
    pub fn with_decoder(stream: S, decoder: ChunkDecoder<F>) -> Self {
        Self {
            stream,
            decoder,
            cancel: CancellationToken::new(),
        }
    }

    /// Aborts the read loop when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Reads the stream to its end
    ///
    /// The stream handle is dropped before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the stream's own error if a read fails, or a
    /// [`DecodeError`](crate::error::DecodeError) if a fragment is not valid UTF-8.
    pub async fn drive(self) -> Result<StreamSummary, ChatError> {
        let Self {
            mut stream,
            mut decoder,
            cancel,
        } = self;
        let mut summary = StreamSummary::new();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(fragments = summary.fragments, "stream cancelled");
                    summary.end = StreamEnd::Cancelled;
                    return Ok(summary);
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    summary.fragments += 1;
                    summary.bytes += fragment.len() as u64;
                    trace!(len = fragment.len(), "fragment");
                    summary.units += decoder.feed(&fragment)? as u64;
                }
                Some(Err(e)) => {
                    warn!(error = %e, fragments = summary.fragments, "stream failed");
                    return Err(e);
                }
                None => break,
            }
        }

        decoder.finish()?;
        debug!(
            fragments = summary.fragments,
            bytes = summary.bytes,
            units = summary.units,
            "stream completed"
        );
        Ok(summary)
    }
}
