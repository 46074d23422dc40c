//! # The top-level update loop.
//!
//! [`UpdateLoop`] ties the updater and the server supervisor together: it
//! polls the remote repository at a fixed interval, and whenever the branch
//! has moved it notifies online players, downloads ahead of the stop,
//! briefly takes the server down to swap files, and brings it back up.
//!
//! ```text
//! loop:
//!     poll_once()
//!        ├─ no update        → nothing
//!        └─ update available → notify players (when online)
//!                              download all mods (server still up)
//!                              stop server (countdown + grace)
//!                              advance checkout, apply plan
//!                              start server
//!     ensure server is running (auto-restart armed)
//!     sleep(poll_interval) ─ or cancellation
//! ```
//!
//! ## Rules
//! - A failed iteration is logged and retried on the next poll; in-memory
//!   state and the mods directory are left as the failure found them.
//! - Auto-restart is disarmed around a planned stop so the exit monitor does
//!   not race the loop's own restart.
//! - Cancellation winds down cleanly: the loop stops the server (countdown
//!   included) before returning.

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::PollError;
use crate::events::{Bus, Event, EventKind};
use crate::manifest::{diff, plan, Role, UpdatePlan};
use crate::server::console;
use crate::server::{ServerState, ServerSupervisor};

use super::apply::apply;
use super::updater::Updater;

/// Keeps the installation in sync with the remote branch and the server
/// process alive, until cancelled.
pub struct UpdateLoop {
    cfg: SyncConfig,
    updater: Updater,
    supervisor: ServerSupervisor,
    bus: Bus,
}

impl UpdateLoop {
    /// Creates the loop over an updater and a supervisor.
    ///
    /// All four collaborators should share the same [`Bus`] so subscribers
    /// see one interleaved event stream.
    pub fn new(
        cfg: SyncConfig,
        updater: Updater,
        supervisor: ServerSupervisor,
        bus: Bus,
    ) -> Self {
        Self {
            cfg,
            updater,
            supervisor,
            bus,
        }
    }

    /// Runs until the token is cancelled.
    ///
    /// Each iteration polls once, then makes sure the server is running with
    /// auto-restart armed, then sleeps for the poll interval. On
    /// cancellation the server is stopped gracefully before returning.
    pub async fn run(&self, token: CancellationToken) -> Result<(), PollError> {
        loop {
            match self.poll_once().await {
                Ok(true) => log::info!("update applied"),
                Ok(false) => log::debug!("no update pending"),
                Err(e) => log::warn!("poll failed ({}): {e}", e.as_label()),
            }
            self.ensure_server_running().await;

            tokio::select! {
                _ = token.cancelled() => break,
                _ = time::sleep(self.cfg.poll_interval) => {}
            }
        }

        self.bus.publish(Event::now(EventKind::LoopCancelled));
        self.supervisor.set_auto_restart(false);
        if self.supervisor.state() == ServerState::Running {
            self.supervisor.stop().await?;
        }
        Ok(())
    }

    /// One poll iteration. Returns whether an update was applied.
    ///
    /// When the remote branch moved, the full update sequence runs even if
    /// the mod plan is empty: a config-only change still needs the checkout
    /// advanced and the server restarted on it.
    pub async fn poll_once(&self) -> Result<bool, PollError> {
        if !self.updater.is_update_available().await? {
            return Ok(false);
        }

        let latest = self.updater.latest_manifest().await?;
        self.bus.publish(
            Event::now(EventKind::UpdateAvailable).with_reason(latest.version.clone()),
        );
        log::info!("update available: {} {}", latest.name, latest.version);

        let mut current = self.updater.current_manifest().await?;
        if let Some(c) = &mut current {
            c.detect(self.updater.root());
        }
        let entries = diff(current.as_ref(), Some(&latest));
        let mut update = plan(&entries, Role::Server, false);

        let was_running = self.supervisor.state() == ServerState::Running;
        if was_running {
            self.notify_players(&latest.version, &update).await;
        }

        // Fetch everything while the server is still up; the downtime is
        // then just the stop protocol plus a handful of renames.
        self.updater.download_all(&mut update.downloads).await?;

        if was_running {
            self.supervisor.set_auto_restart(false);
            self.supervisor.stop().await?;
        }

        self.updater.sync_checkout().await?;
        apply(self.updater.root(), &update.downloads, &update.deletes).await?;
        self.bus.publish(Event::now(EventKind::UpdateApplied));

        if was_running {
            self.supervisor.start().await?;
            self.supervisor.set_auto_restart(true);
        }
        Ok(true)
    }

    /// Sends the one-line update notice to online players.
    ///
    /// Best effort: a failed write is logged and the update proceeds.
    async fn notify_players(&self, version: &str, update: &UpdatePlan) {
        if self.supervisor.player_count() == 0 {
            return;
        }
        let notice = console::update_notice(
            version,
            update.new_count(),
            update.changed_count(),
            update.deletes.len(),
            &self.cfg.history_url(),
        );
        if let Err(e) = self.supervisor.input(&notice).await {
            log::warn!("failed to notify players: {e}");
        }
    }

    /// Starts the server (auto-restart armed) if it is not up.
    async fn ensure_server_running(&self) {
        if self.supervisor.state() != ServerState::Stopped {
            return;
        }
        self.supervisor.set_auto_restart(true);
        if let Err(e) = self.supervisor.start().await {
            log::error!("failed to start server: {e}");
        }
    }
}
