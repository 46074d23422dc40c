//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that lets the
//! supervisor's output-reader task, the stop protocol, and the update loop
//! publish [`Event`]s without blocking each other.
//!
//! The original design delivered server output through a callback invoked on
//! every line; routing lines through a bounded broadcast channel instead
//! decouples the I/O source from state observers and makes ordering explicit
//! (each event carries a monotonic `seq`).
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never awaits or blocks.
//! - **Bounded capacity**: one ring buffer of recent events, shared by all
//!   receivers; slow receivers observe `RecvError::Lagged(n)` and skip the
//!   `n` oldest items.
//! - **No persistence**: events published while nobody is subscribed are
//!   dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (the sender is `Arc`-backed); every component holding a
/// clone may publish concurrently.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing subsequent events.
    ///
    /// A receiver only sees events sent **after** it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
