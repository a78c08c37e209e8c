//! Turns classified lines into decoded units.

use serde::{Deserialize, Serialize};

use super::line::{Line, classify};

/// Event metadata seen so far and applied to subsequent `data` lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEvent {
    /// Last `event:` value
    pub event: Option<String>,
    /// Last `id:` value
    pub id: Option<String>,
}

/// Payload of one `data` line together with the event context it arrived in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// Pending `event:` name when the line was read
    pub event: Option<String>,
    /// Pending `id:` when the line was read
    pub id: Option<String>,
    /// The line's value
    pub data: String,
}

/// Reconnection delay advertised by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryHint {
    /// Delay in milliseconds
    pub milliseconds: u64,
}

/// A protocol-level unit extracted from a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodedUnit {
    /// One `data` line
    Event(EventData),
    /// A valid `retry` line
    Retry(RetryHint),
}

/// What happens to [`PendingEvent`] when a new block starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockPolicy {
    /// Keep `event`/`id` until a later line overwrites them
    #[default]
    Carry,
    /// Clear `event`/`id` before each block
    Reset,
}

/// Applies lines to a [`PendingEvent`] and emits one unit per `data` or valid `retry` line
///
/// Multi-line `data` is not concatenated: each line becomes its own [`EventData`]
/// sharing the same `event`/`id` context.
#[derive(Debug, Default)]
pub struct EventAccumulator {
    pending: PendingEvent,
    policy: BlockPolicy,
}

impl EventAccumulator {
    /// Creates an accumulator with empty state and [`BlockPolicy::Carry`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator with the given policy
    #[must_use]
    pub fn with_policy(policy: BlockPolicy) -> Self {
        Self {
            pending: PendingEvent::default(),
            policy,
        }
    }

    /// Replaces the pending state, e.g. to resume from a value saved with [`Self::into_pending`]
    #[must_use]
    pub fn with_pending(mut self, pending: PendingEvent) -> Self {
        self.pending = pending;
        self
    }

    /// Current pending state
    #[must_use]
    pub const fn pending(&self) -> &PendingEvent {
        &self.pending
    }

    /// Block policy in effect
    #[must_use]
    pub const fn policy(&self) -> BlockPolicy {
        self.policy
    }

    /// Consumes the accumulator, returning the pending state
    #[must_use]
    pub fn into_pending(self) -> PendingEvent {
        self.pending
    }

    /// Applies one classified line, returning the unit it produces, if any
    pub fn apply(&mut self, line: Line<'_>) -> Option<DecodedUnit> {
        let (name, value) = line.as_field()?;
        match name {
            "event" => {
                self.pending.event = Some(value.to_string());
                None
            }
            "id" => {
                self.pending.id = Some(value.to_string());
                None
            }
            "data" => Some(DecodedUnit::Event(EventData {
                event: self.pending.event.clone(),
                id: self.pending.id.clone(),
                data: value.to_string(),
            })),
            "retry" => value
                .parse::<u64>()
                .ok()
                .map(|milliseconds| DecodedUnit::Retry(RetryHint { milliseconds })),
            _ => None,
        }
    }

    /// Parses a whole block, handing every unit to `emit` in line order
    ///
    /// Returns the number of units emitted.
    pub fn apply_block<F>(&mut self, block: &str, mut emit: F) -> usize
    where
        F: FnMut(DecodedUnit),
    {
        if self.policy == BlockPolicy::Reset {
            self.pending = PendingEvent::default();
        }

        let mut emitted = 0;
        for raw in block.split('\n') {
            if let Some(unit) = self.apply(classify(raw)) {
                emit(unit);
                emitted += 1;
            }
        }
        emitted
    }
}
