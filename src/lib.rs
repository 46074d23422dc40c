//! # modvisor
//!
//! **Modvisor** keeps a modded game-server installation in lockstep with a
//! remote modpack repository while supervising the server process itself.
//!
//! It watches a branch of a GitHub repository holding a `modpack.json`
//! manifest; when the branch moves, it plans the file changes, downloads new
//! mod versions ahead of time, takes the server down gracefully (warning
//! online players first), swaps the files, advances the local checkout, and
//! brings the server back up. Between updates it keeps the server alive,
//! restarting it whenever the process exits.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                        ┌──────────────────────────────┐
//!                        │   UpdateLoop (run until      │
//!                        │   cancelled, one poll per    │
//!                        │   interval)                  │
//!                        └──────┬───────────────┬───────┘
//!                               ▼               ▼
//!    ┌──────────────────────────────┐   ┌──────────────────────────────┐
//!    │ Updater                      │   │ ServerSupervisor             │
//!    │ - VersionControl (checkout)  │   │ - spawn / stop / input       │
//!    │ - ManifestSource (manifest,  │   │ - output reader (ready,      │
//!    │   branch head)               │   │   joins/leaves)              │
//!    │ - Downloader (mod files)     │   │ - exit monitor (restart)     │
//!    └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                   ▼                                  │
//!    ┌──────────────────────────────┐                  │
//!    │ manifest::{diff, plan}       │                  │
//!    │ sync::apply (mods directory) │                  │
//!    └──────────────┬───────────────┘                  │
//!                   ▼                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                       Bus (broadcast channel)                     │
//! │   ServerOutput / ServerReady / PlayerJoined / UpdateAvailable /   │
//! │   DownloadProgress / UpdateApplied / LoopCancelled / ...          │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### One update, end to end
//! ```text
//! poll_once()
//!   ├─► is_update_available()       (fetch; local ref vs branch head)
//!   ├─► latest_manifest()           (fetch + parse modpack.json)
//!   ├─► diff(current, latest)       (linear merge of sorted mod lists)
//!   ├─► plan(entries, Role, opt)    (downloads / optional / deletes)
//!   ├─► notify players              (/tellraw update notice)
//!   ├─► download_all(plan)          (staged under <root>/.staging)
//!   ├─► supervisor.stop()           (countdown → "stop" → grace → kill)
//!   ├─► sync_checkout()             (reset onto origin/<branch>, or clone)
//!   ├─► apply(plan)                 (renames into <root>/mods)
//!   └─► supervisor.start()
//! ```
//!
//! ## Quickstart
//! ```no_run
//! use std::sync::Arc;
//! use modvisor::{
//!     Bus, Downloader, ManifestSource, ServerConfig, ServerSupervisor,
//!     SyncConfig, UpdateLoop, Updater, VersionControl,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! async fn run(
//!     vcs: Arc<dyn VersionControl>,
//!     source: Arc<dyn ManifestSource>,
//!     downloader: Arc<dyn Downloader>,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let sync = SyncConfig::new("copygirl", "SomeModpack", "master", "/srv/minecraft");
//!     let server = ServerConfig::new("/srv/minecraft", "minecraft_server.jar");
//!
//!     let bus = Bus::new(sync.bus_capacity);
//!     let updater = Updater::new(sync.clone(), vcs, source, downloader, bus.clone());
//!     let supervisor = ServerSupervisor::new(server, bus.clone());
//!
//!     let token = CancellationToken::new();
//!     UpdateLoop::new(sync, updater, supervisor, bus)
//!         .run(token)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Design notes
//! - The remote side is reached through three seams ([`VersionControl`],
//!   [`ManifestSource`], [`Downloader`]); the embedding application picks
//!   the transports, and tests substitute in-memory fakes.
//! - All runtime observation goes over one bounded broadcast [`Bus`];
//!   events carry a monotonic `seq` so slow subscribers see gaps, never
//!   reordering.
//! - Whether a mod applies to an installation is a capability-flag check
//!   driven by [`Role`], not a type split between server and client.

mod config;
mod error;
mod events;
mod manifest;
mod remote;
pub mod server;
mod sync;

pub use config::{ServerConfig, SyncConfig};
pub use error::{ApplyError, PollError, SupervisorError, SyncError};
pub use events::{Bus, Event, EventKind};
pub use manifest::{
    diff, plan, DiffEntry, Manifest, Mod, PlannedDownload, Role, UpdatePlan, MANIFEST_FILE,
};
pub use remote::{Downloader, ManifestSource, ProgressFn, VersionControl};
pub use server::{OutputEvent, ServerState, ServerSupervisor};
pub use sync::{apply, UpdateLoop, Updater};
