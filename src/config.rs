//! # Runtime configuration.
//!
//! [`SyncConfig`] describes the remote modpack repository and the pacing of
//! the update loop; [`ServerConfig`] describes how the supervised server
//! process is launched and how its graceful-stop protocol is timed.
//!
//! Persisted settings files are the embedding application's concern; these
//! structs are plain values with documented defaults.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use modvisor::{ServerConfig, SyncConfig};
//!
//! let mut sync = SyncConfig::new("copygirl", "SomeModpack", "master", "/srv/minecraft");
//! sync.poll_interval = Duration::from_secs(60);
//!
//! let server = ServerConfig::new("/srv/minecraft", "minecraft_server.jar");
//! assert_eq!(server.countdown, Duration::from_secs(64));
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Remote repository coordinates and update-loop pacing.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// GitHub repository owner (user or organisation).
    pub owner: String,
    /// GitHub repository name.
    pub repository: String,
    /// Branch the installation tracks.
    pub branch: String,
    /// Installation root: holds the checkout, `modpack.json`, and `mods/`.
    pub root: PathBuf,
    /// Delay between update-loop iterations.
    pub poll_interval: Duration,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl SyncConfig {
    /// Creates a config for the given repository with default pacing:
    /// - `poll_interval = 2min`
    /// - `bus_capacity = 1024`
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            branch: branch.into(),
            root: root.into(),
            poll_interval: Duration::from_secs(120),
            bus_capacity: 1024,
        }
    }

    /// `owner/repository` shorthand used by remote manifest sources.
    pub fn owner_repo(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// Link to the branch history shown to players in update notices.
    pub fn history_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/commits/{}",
            self.owner, self.repository, self.branch
        )
    }
}

/// Launch parameters and stop-protocol timing for the supervised server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Working directory for the child process.
    pub working_dir: PathBuf,
    /// Server jar passed to the JVM via the fixed `-jar <jar> nogui` tail.
    pub server_jar: String,
    /// Caller-supplied arguments placed before the fixed tail.
    pub jvm_args: Vec<String>,
    /// Explicit executable, bypassing `JAVA_HOME`/`PATH` detection.
    pub command: Option<PathBuf>,
    /// Ceiling of the pre-stop countdown, consumed while players are online.
    pub countdown: Duration,
    /// Cadence of countdown notices broadcast to players.
    pub notice_interval: Duration,
    /// How long to wait for a natural exit after `stop` before killing.
    pub stop_grace: Duration,
}

impl ServerConfig {
    /// Creates a config with the stock stop-protocol timing:
    /// - `countdown = 64s`
    /// - `notice_interval = 8s`
    /// - `stop_grace = 10s`
    pub fn new(working_dir: impl Into<PathBuf>, server_jar: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            server_jar: server_jar.into(),
            jvm_args: Vec::new(),
            command: None,
            countdown: Duration::from_secs(64),
            notice_interval: Duration::from_secs(8),
            stop_grace: Duration::from_secs(10),
        }
    }
}
