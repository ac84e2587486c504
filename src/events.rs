//! Change notifications for the rule matrix.
//!
//! Presentation layers subscribe with [`Observers::subscribe`] and poll the
//! returned receiver (typically once per frame) to refresh their controls.
//! Dropping the receiver unsubscribes.

use std::sync::mpsc::{channel, Receiver, Sender};

/// A rule-matrix mutation that has been fully applied.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleEvent {
    /// Every affinity was redrawn.
    Randomized,
    /// Every unordered pair now shares the average of both directions.
    Symmetrized,
    /// The dense matrix was rebuilt from a name-keyed table.
    Flattened,
    /// One affinity was edited.
    RuleChanged { from: usize, to: usize, value: f64 },
    /// A species was appended at `index`.
    SpeciesAdded { index: usize, name: String },
    /// The last species was removed; `index` no longer exists.
    SpeciesRemoved { index: usize, name: String },
    /// A species changed name; its index is unchanged.
    SpeciesRenamed { index: usize, old: String, new: String },
    /// A species changed display color.
    SpeciesRecolored { index: usize },
}

/// Fan-out list of event subscribers.
#[derive(Debug, Default)]
pub struct Observers {
    senders: Vec<Sender<RuleEvent>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<RuleEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, forgetting disconnected ones.
    pub fn notify(&mut self, event: RuleEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of subscribers still connected as of the last notification.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

// Subscribers stay with the source; a clone starts unobserved.
impl Clone for Observers {
    fn clone(&self) -> Self {
        Self::new()
    }
}
