//! Push subscription surface for change events.
//!
//! The instrumented process (or whatever host plumbing fronts it) pushes
//! events through a [`ChangePublisher`]; the inspector drains the paired
//! [`ChangeFeed`] on its own thread, one event at a time.

use crate::types::ChangeEvent;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::time::Duration;

/// Default buffered events before the publisher starts dropping.
pub const DEFAULT_FEED_CAPACITY: usize = 1000;

/// Create a bounded feed, returning the producer and consumer halves.
pub fn change_feed(capacity: usize) -> (ChangePublisher, ChangeFeed) {
    let (sender, receiver) = bounded(capacity);
    (ChangePublisher { sender }, ChangeFeed { receiver })
}

/// Producer half of the feed. Cheap to clone; every publish source
/// (live connection, mirrored device responses) can hold its own.
#[derive(Clone)]
pub struct ChangePublisher {
    sender: Sender<ChangeEvent>,
}

impl ChangePublisher {
    /// Push an event without blocking.
    ///
    /// Returns false when the buffer is full or the consumer is gone; the
    /// event is dropped either way, matching the host's fire-and-forget
    /// push.
    pub fn publish(&self, event: ChangeEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half of the feed.
pub struct ChangeFeed {
    receiver: Receiver<ChangeEvent>,
}

impl ChangeFeed {
    /// Take the next buffered event, if any (non-blocking).
    pub fn try_next(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True when no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
