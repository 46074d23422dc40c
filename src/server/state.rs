//! # Server lifecycle states.
//!
//! [`ServerState`] is owned exclusively by the supervisor; it changes only
//! through `start()`/`stop()` or internally when the process exits or the
//! ready signal is observed.
//!
//! ```text
//! Stopped ──start()──► Starting ──ready──► Running ──stop()──► Stopping
//!    ▲                                                            │
//!    └──────────────────────── process exit ──────────────────────┘
//!            (re-enters Starting immediately when auto-restart is armed)
//! ```

/// Lifecycle state of the supervised server process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    /// No child process exists.
    Stopped,
    /// The child was spawned; the ready signal has not been observed yet.
    Starting,
    /// The ready signal was observed; the server accepts commands.
    Running,
    /// The stop protocol is underway; waiting for the process to exit.
    Stopping,
}

impl ServerState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServerState::Stopped => "stopped",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
        }
    }
}
