//! Server-Sent Events decoding.
//!
//! Layered leaves-first: [`line`] classifies a line, [`accumulator`] turns lines
//! into [`DecodedUnit`]s, [`decoder`] buffers raw fragments until a block is
//! complete, and [`driver`] pulls fragments from a byte stream.
//!
//! Wire format: lines end in `\n`, a block ends in `\n\n`, lines starting with
//! `:` are comments, and the fields `event`, `id`, `data` and `retry` are
//! recognized. Everything else is ignored.

/// Event accumulation
pub mod accumulator;
/// Fragment buffering
pub mod decoder;
/// Stream read loop
pub mod driver;
/// Line classification
pub mod line;

pub use accumulator::{
    BlockPolicy, DecodedUnit, EventAccumulator, EventData, PendingEvent, RetryHint,
};
pub use decoder::ChunkDecoder;
pub use driver::{ByteStream, StreamDriver, StreamEnd, StreamSummary};
pub use line::{Line, classify};
