//! Error types used by the modvisor runtime.
//!
//! This module defines three error enums:
//!
//! - [`SupervisorError`] — lifecycle-contract violations and spawn failures
//!   raised by the server supervisor.
//! - [`SyncError`] — failures while talking to the remote side (manifest
//!   fetch, downloads, version control). Most of these are transient and the
//!   update loop simply retries on the next poll.
//! - [`ApplyError`] — failures while mutating the mods directory.
//!
//! All types provide `as_label()` for compact log/metric tags.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors raised by the server supervisor.
///
/// `AlreadyRunning` and `NotRunning` are programmer-contract violations:
/// lifecycle calls were made in the wrong state. They are not recoverable at
/// the call site.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// `start()` was called while the server was not in the `Stopped` state.
    #[error("server process already running")]
    AlreadyRunning,

    /// `stop()` or `input()` was called while the server was not `Running`.
    #[error("server process not running")]
    NotRunning,

    /// The child process could not be spawned.
    #[error("failed to spawn server process: {0}")]
    Spawn(#[source] io::Error),

    /// Writing a line to the child's stdin failed.
    #[error("failed to write to server stdin: {0}")]
    Stdin(#[source] io::Error),
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyRunning => "server_already_running",
            SupervisorError::NotRunning => "server_not_running",
            SupervisorError::Spawn(_) => "server_spawn_failed",
            SupervisorError::Stdin(_) => "server_stdin_failed",
        }
    }
}

/// # Errors raised while synchronizing with the remote repository.
///
/// `Network` and `Parse` are transient: the caller reports them and retries
/// on the next poll with prior in-memory state untouched.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SyncError {
    /// A manifest fetch or mod download failed at the transport level.
    #[error("network failure: {0}")]
    Network(String),

    /// The remote manifest payload was malformed.
    #[error("malformed manifest: {0}")]
    Parse(String),

    /// A version-control operation failed (clone, fetch, reset, ref lookup).
    #[error("version control failure: {0}")]
    Vcs(String),

    /// A local I/O step of a sync operation failed (staging, manifest read).
    #[error("i/o failure: {0}")]
    Io(String),

    /// The operation was cancelled before it completed.
    #[error("sync cancelled")]
    Canceled,
}

impl SyncError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SyncError::Network(_) => "sync_network",
            SyncError::Parse(_) => "sync_parse",
            SyncError::Vcs(_) => "sync_vcs",
            SyncError::Io(_) => "sync_io",
            SyncError::Canceled => "sync_canceled",
        }
    }

    /// Indicates whether retrying on the next poll is reasonable.
    ///
    /// Returns `true` for everything except [`SyncError::Canceled`]: a
    /// malformed manifest or an unreachable remote may well be fixed by the
    /// time of the next iteration.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SyncError::Canceled)
    }
}

/// # Errors raised while mutating the mods directory.
///
/// There is no transactional rollback: the first failure aborts the apply
/// pass and is reported to the caller, which must never treat the plan as
/// applied.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ApplyError {
    /// A filesystem operation on the given path failed.
    #[error("file operation on {path:?} failed: {source}")]
    Io {
        /// Path the failed operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A planned download has no staged file to move into place.
    #[error("mod '{name}' has no staged download")]
    MissingStagedFile {
        /// Name of the mod missing its staging file.
        name: String,
    },
}

impl ApplyError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ApplyError::Io { .. } => "apply_io",
            ApplyError::MissingStagedFile { .. } => "apply_missing_staged",
        }
    }
}

/// # Aggregate of everything one update-loop iteration can fail with.
///
/// The loop treats these uniformly: log with the label, keep the prior
/// in-memory state, retry on the next poll.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PollError {
    /// A remote interaction failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Mutating the mods directory failed.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// A lifecycle call on the supervisor failed.
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

impl PollError {
    /// Returns the label of the underlying error.
    pub fn as_label(&self) -> &'static str {
        match self {
            PollError::Sync(e) => e.as_label(),
            PollError::Apply(e) => e.as_label(),
            PollError::Supervisor(e) => e.as_label(),
        }
    }
}
