//! Fragment buffering and block detection.

use std::fmt;

use tracing::{debug, trace};

use super::accumulator::{DecodedUnit, EventAccumulator};
use crate::error::DecodeError;

const TERMINATOR: &str = "\n\n";

/// Incremental decoder fed with raw response-body fragments
///
/// Text accumulates until the buffer as a whole ends with `"\n\n"`; only then is
/// the buffer parsed as one block and cleared. A double newline in the middle of
/// the buffer does not trigger a parse on its own.
///
/// Units are handed to the observer synchronously, before [`ChunkDecoder::feed`]
/// returns.
pub struct ChunkDecoder<F> {
    buffer: String,
    // Leading bytes of a UTF-8 sequence cut off at a fragment boundary
    carry: Vec<u8>,
    decoded: u64,
    accumulator: EventAccumulator,
    observer: F,
}

impl<F> fmt::Debug for ChunkDecoder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkDecoder")
            .field("buffer", &self.buffer)
            .field("carry", &self.carry)
            .field("decoded", &self.decoded)
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}

impl<F> ChunkDecoder<F>
where
    F: FnMut(DecodedUnit),
{
    /// Creates a decoder with a fresh accumulator
    pub fn new(observer: F) -> Self {
        Self::with_accumulator(EventAccumulator::new(), observer)
    }

    /// Creates a decoder around an existing accumulator
    pub fn with_accumulator(accumulator: EventAccumulator, observer: F) -> Self {
        Self {
            buffer: String::new(),
            carry: Vec::new(),
            decoded: 0,
            accumulator,
            observer,
        }
    }

    /// Appends a fragment and parses the buffer if it now ends with a terminator
    ///
    /// Returns the number of units emitted by this call.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the fragment contains an invalid UTF-8 sequence.
    /// A sequence that is merely incomplete at the end of the fragment is held
    /// back and completed by the next fragment.
    pub fn feed(&mut self, fragment: &[u8]) -> Result<usize, DecodeError> {
        self.append(fragment)?;

        if !self.buffer.ends_with(TERMINATOR) {
            trace!(buffered = self.buffer.len(), "block incomplete");
            return Ok(0);
        }

        let mut block = std::mem::take(&mut self.buffer);
        let emitted = self.accumulator.apply_block(&block, &mut self.observer);
        trace!(bytes = block.len(), emitted, "parsed block");

        block.clear();
        self.buffer = block;
        Ok(emitted)
    }

    /// Ends the stream
    ///
    /// Text left without a terminator is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the stream stopped in the middle of a UTF-8 sequence.
    pub fn finish(self) -> Result<EventAccumulator, DecodeError> {
        if !self.carry.is_empty() {
            return Err(DecodeError {
                offset: self.decoded,
            });
        }
        if !self.buffer.is_empty() {
            debug!(
                buffered = self.buffer.len(),
                "stream ended with an unterminated block"
            );
        }
        Ok(self.accumulator)
    }

    /// Bytes of text currently waiting for a terminator
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// The accumulator and its pending event state
    #[must_use]
    pub const fn accumulator(&self) -> &EventAccumulator {
        &self.accumulator
    }

    fn append(&mut self, fragment: &[u8]) -> Result<(), DecodeError> {
        let mut joined = std::mem::take(&mut self.carry);
        let input: &[u8] = if joined.is_empty() {
            fragment
        } else {
            joined.extend_from_slice(fragment);
            &joined
        };

        match std::str::from_utf8(input) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.decoded += input.len() as u64;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if e.error_len().is_some() {
                    return Err(DecodeError {
                        offset: self.decoded + valid as u64,
                    });
                }
                // Truncated sequence at the end: keep the valid prefix, hold the rest
                let (head, tail) = input.split_at(valid);
                let text = std::str::from_utf8(head).map_err(|_| DecodeError {
                    offset: self.decoded,
                })?;
                self.buffer.push_str(text);
                self.decoded += valid as u64;
                self.carry = tail.to_vec();
            }
        }
        Ok(())
    }
}
