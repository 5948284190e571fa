//! Hosted-script side of call correlation.
//!
//! The injected runtime keeps a `window._ipc` table from sequence number to
//! pending promise. `Correlator` is the same state machine in Rust, used by
//! the loopback control and by anything that needs to play the page:
//!
//! ```text
//! call()  -> Created -> Pending (table entry) -> settle() -> Settled (removed)
//! ```
//!
//! Settling is at most once. A Resolve for a sequence that is not pending
//! is a no-op. `reset` models a page reload: the table empties and the
//! counter restarts, leaving older calls unsettled forever.

use std::collections::HashMap;

use serde_json::Value;
use tether_common::{CallError, CodecError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::codec::{self, InvokePayload, MenuSelection, Scope, Sequence};

/// First sequence number handed out in a fresh script context.
pub const INITIAL_SEQUENCE: Sequence = 1;

/// Outcome delivered to a caller.
pub type Settlement = Result<Value, CallError>;

/// A call that was encoded and is waiting for its Resolve.
#[derive(Debug)]
pub struct OutboundCall {
    pub sequence: Sequence,
    /// The Invoke wire string to post to native code.
    pub wire: String,
    /// Completes exactly once, when the call settles.
    pub reply: oneshot::Receiver<Settlement>,
}

#[derive(Debug)]
pub struct Correlator {
    next_sequence: Sequence,
    pending: HashMap<Sequence, oneshot::Sender<Settlement>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            next_sequence: INITIAL_SEQUENCE,
            pending: HashMap::new(),
        }
    }

    /// Allocate a sequence, register the pending call, and encode the Invoke.
    ///
    /// If encoding fails the sequence stays consumed and nothing is pending.
    pub fn call(
        &mut self,
        name: &str,
        payload: InvokePayload,
    ) -> Result<OutboundCall, CodecError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let wire = codec::encode_invoke(sequence, name, &payload)?;
        let (tx, reply) = oneshot::channel();
        self.pending.insert(sequence, tx);

        debug!(seq = sequence, name, "call pending");
        Ok(OutboundCall {
            sequence,
            wire,
            reply,
        })
    }

    /// Apply a Resolve wire message.
    ///
    /// Returns `Ok(true)` if a pending call settled, `Ok(false)` if the
    /// sequence was unknown or already settled. A payload that fails to
    /// decode still settles the call, as a [`CallError::Decode`] rejection.
    /// Only an unreadable header is an error, since no call can be named.
    pub fn settle(&mut self, wire: &str) -> Result<bool, CodecError> {
        let frame = codec::split_resolve(wire)?;

        let Some(tx) = self.pending.remove(&frame.sequence) else {
            debug!(seq = frame.sequence, "resolve for unknown sequence ignored");
            return Ok(false);
        };

        let settlement = match frame.scope {
            Scope::Internal => Ok(Value::String(frame.payload.to_string())),
            Scope::External => {
                codec::decode_json(frame.payload).map_err(|e| CallError::Decode(e.to_string()))
            }
        };
        let settlement = match settlement {
            Ok(value) if frame.status == 0 => Ok(value),
            Ok(value) => Err(CallError::Rejected(value)),
            Err(e) => {
                warn!(seq = frame.sequence, error = %e, "rejecting call with undecodable result");
                Err(e)
            }
        };

        Self::complete(frame.sequence, tx, settlement);
        Ok(true)
    }

    /// Apply a menu selection. Settles the call if it carries a positive
    /// sequence; returns `false` for broadcasts and unknown sequences.
    pub fn settle_menu(&mut self, selection: &MenuSelection) -> bool {
        let Some(sequence) = selection.settles() else {
            return false;
        };
        let Some(tx) = self.pending.remove(&sequence) else {
            return false;
        };

        let detail = serde_json::json!({
            "title": selection.title,
            "parent": selection.parent,
            "state": selection.state,
        });
        Self::complete(sequence, tx, Ok(detail));
        true
    }

    /// Page reload: forget every pending call and restart the counter.
    pub fn reset(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                abandoned = self.pending.len(),
                "script context reset with calls in flight"
            );
        }
        self.pending.clear();
        self.next_sequence = INITIAL_SEQUENCE;
    }

    pub fn is_pending(&self, sequence: Sequence) -> bool {
        self.pending.contains_key(&sequence)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn next_sequence(&self) -> Sequence {
        self.next_sequence
    }

    fn complete(sequence: Sequence, tx: oneshot::Sender<Settlement>, settlement: Settlement) {
        // The caller may have stopped waiting; that is not an error here.
        if tx.send(settlement).is_err() {
            debug!(seq = sequence, "settled call had no listener");
        }
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
