//! # Runtime events emitted by the supervisor and the update loop.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Server events**: output lines, player joins/leaves, lifecycle
//!   transitions of the supervised process.
//! - **Sync events**: update detection, per-mod download progress, applied
//!   file changes.
//! - **Loop events**: cancellation observed by the update loop.
//!
//! The [`Event`] struct carries optional metadata (raw line, player name,
//! mod name, byte counters) depending on the kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. The bus may drop events for lagging receivers; `seq` makes
//! gaps and ordering explicit.
//!
//! ## Example
//! ```rust
//! use modvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::PlayerJoined).with_player("Alice");
//! assert_eq!(ev.kind, EventKind::PlayerJoined);
//! assert_eq!(ev.player.as_deref(), Some("Alice"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Server events ===
    /// A raw output line from the server process, forwarded verbatim.
    ///
    /// Sets: `line`.
    ServerOutput,

    /// The ready signal was observed while the server was starting.
    ServerReady,

    /// A player joined the game.
    ///
    /// Sets: `player`.
    PlayerJoined,

    /// A player left the game.
    ///
    /// Sets: `player`.
    PlayerLeft,

    /// The server process is being spawned.
    ServerStarting,

    /// The stop protocol began (countdown and/or stop command pending).
    ServerStopping,

    /// The server process exited and its handle was disposed.
    ServerStopped,

    /// The child ignored the stop command and was forcibly terminated.
    ServerKilled,

    // === Sync events ===
    /// The remote branch moved past the local checkout.
    ///
    /// Sets: `reason` (target modpack version).
    UpdateAvailable,

    /// A mod download started.
    ///
    /// Sets: `mod_name`.
    DownloadStarted,

    /// Byte-level progress of an in-flight mod download.
    ///
    /// Sets: `mod_name`, `received`, `total` (0 when unknown).
    DownloadProgress,

    /// A mod download finished and its file is staged.
    ///
    /// Sets: `mod_name`.
    DownloadFinished,

    /// A computed plan was applied to the mods directory.
    UpdateApplied,

    // === Loop events ===
    /// The update loop observed cancellation and is winding down.
    LoopCancelled,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - remaining fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Verbatim server output line, if applicable.
    pub line: Option<Arc<str>>,
    /// Player name, for join/leave events.
    pub player: Option<Arc<str>>,
    /// Mod name, for download events.
    pub mod_name: Option<Arc<str>>,
    /// Bytes received so far, for download progress.
    pub received: Option<u64>,
    /// Total bytes expected (0 when the remote did not say).
    pub total: Option<u64>,
    /// Human-readable detail (ref ids, failure notes).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and the
    /// next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            line: None,
            player: None,
            mod_name: None,
            received: None,
            total: None,
            reason: None,
        }
    }

    /// Attaches a verbatim output line.
    #[inline]
    pub fn with_line(mut self, line: impl Into<Arc<str>>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Attaches a player name.
    #[inline]
    pub fn with_player(mut self, player: impl Into<Arc<str>>) -> Self {
        self.player = Some(player.into());
        self
    }

    /// Attaches a mod name.
    #[inline]
    pub fn with_mod(mut self, name: impl Into<Arc<str>>) -> Self {
        self.mod_name = Some(name.into());
        self
    }

    /// Attaches download byte counters.
    #[inline]
    pub fn with_progress(mut self, received: u64, total: u64) -> Self {
        self.received = Some(received);
        self.total = Some(total);
        self
    }

    /// Attaches a human-readable detail string.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
