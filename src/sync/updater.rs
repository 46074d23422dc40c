//! # Updater: orchestrates the remote collaborators.
//!
//! [`Updater`] glues the [`VersionControl`], [`ManifestSource`], and
//! [`Downloader`] seams together: it detects whether the remote branch has
//! moved, fetches and parses the latest manifest, stages mod downloads, and
//! advances the local checkout.
//!
//! ## Rules
//! - Failures are `Result`s, never panics; everything here is retried by
//!   the update loop on its next poll.
//! - Downloads are staged under `<root>/.staging` so activation is a
//!   same-filesystem rename (the system temp dir may live on another
//!   device, which would silently turn the move into copy+delete).
//! - Update detection without a local checkout always reports `true`.

use std::path::Path;
use std::sync::Arc;

use tokio::fs;

use crate::config::SyncConfig;
use crate::error::{PollError, SyncError};
use crate::events::{Bus, Event, EventKind};
use crate::manifest::{diff, plan, Manifest, PlannedDownload, Role};
use crate::remote::{Downloader, ManifestSource, VersionControl};

use super::apply::apply;

/// Directory under the installation root where in-flight downloads land.
const STAGING_DIR: &str = ".staging";

/// Orchestrates manifest retrieval, update detection, downloads, and
/// checkout synchronization over the collaborator seams.
pub struct Updater {
    cfg: SyncConfig,
    vcs: Arc<dyn VersionControl>,
    source: Arc<dyn ManifestSource>,
    downloader: Arc<dyn Downloader>,
    bus: Bus,
}

impl Updater {
    /// Creates an updater over the given collaborators.
    pub fn new(
        cfg: SyncConfig,
        vcs: Arc<dyn VersionControl>,
        source: Arc<dyn ManifestSource>,
        downloader: Arc<dyn Downloader>,
        bus: Bus,
    ) -> Self {
        Self {
            cfg,
            vcs,
            source,
            downloader,
            bus,
        }
    }

    /// Installation root this updater mutates.
    pub fn root(&self) -> &Path {
        &self.cfg.root
    }

    /// Whether a local checkout exists yet.
    pub fn has_checkout(&self) -> bool {
        self.cfg.root.join(".git").exists()
    }

    /// Loads the local manifest from the installation root.
    pub async fn current_manifest(&self) -> Result<Option<Manifest>, SyncError> {
        Manifest::load(&self.cfg.root).await
    }

    /// Fetches and parses the manifest at the tip of the tracked branch.
    pub async fn latest_manifest(&self) -> Result<Manifest, SyncError> {
        let bytes = self
            .source
            .fetch_manifest(&self.cfg.owner_repo(), &self.cfg.branch)
            .await?;
        Manifest::parse(&bytes)
    }

    /// Cheap probe: does the remote repository serve a parseable manifest?
    pub async fn verify_remote(&self) -> bool {
        self.latest_manifest().await.is_ok()
    }

    /// Whether the remote branch head differs from the local checkout.
    ///
    /// Without a checkout this is trivially `true`. Otherwise the
    /// remote-tracking refs are refreshed and the local head id is compared
    /// against the remote branch head id.
    pub async fn is_update_available(&self) -> Result<bool, SyncError> {
        if !self.has_checkout() {
            return Ok(true);
        }
        self.vcs.fetch().await?;
        let local = self.vcs.current_ref().await?;
        let remote = self
            .source
            .fetch_branch_head(&self.cfg.owner_repo(), &self.cfg.branch)
            .await?;
        Ok(local != remote)
    }

    /// Downloads every planned mod sequentially into the staging directory,
    /// recording the staged path on each entry and publishing per-mod
    /// progress events.
    pub async fn download_all(
        &self,
        downloads: &mut [PlannedDownload],
    ) -> Result<(), SyncError> {
        if downloads.is_empty() {
            return Ok(());
        }
        let staging = self.cfg.root.join(STAGING_DIR);
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| SyncError::Io(format!("creating {}: {e}", staging.display())))?;

        let total = downloads.len();
        for (index, d) in downloads.iter_mut().enumerate() {
            let name = d.new.name.clone();
            self.bus
                .publish(Event::now(EventKind::DownloadStarted).with_mod(name.clone()));

            let dest = staging.join(format!("{}.part", d.new.file_name()));
            let bus = self.bus.clone();
            let progress_name = name.clone();
            let on_progress = move |received: u64, total_bytes: u64| {
                bus.publish(
                    Event::now(EventKind::DownloadProgress)
                        .with_mod(progress_name.clone())
                        .with_progress(received, total_bytes),
                );
            };
            self.downloader
                .fetch(&d.new.url, &dest, Some(&on_progress))
                .await?;
            d.new.staged = Some(dest);

            self.bus
                .publish(Event::now(EventKind::DownloadFinished).with_mod(name.clone()));
            log::info!("downloaded {name} ({}/{total})", index + 1);
        }
        Ok(())
    }

    /// Advances the local checkout: hard-reset onto the remote branch when a
    /// checkout exists, clone otherwise.
    pub async fn sync_checkout(&self) -> Result<(), SyncError> {
        if self.has_checkout() {
            self.vcs
                .reset_hard(&format!("origin/{}", self.cfg.branch))
                .await
        } else {
            let url = format!("https://github.com/{}.git", self.cfg.owner_repo());
            self.vcs.clone_repo(&url, &self.cfg.branch).await
        }
    }

    /// One-shot unattended sync: fetch the latest manifest, plan against the
    /// local state, download, advance the checkout, and apply.
    ///
    /// Used when no server is live; newly introduced optional mods are
    /// skipped, like in every unattended path.
    pub async fn sync_once(&self, role: Role) -> Result<(), PollError> {
        let latest = self.latest_manifest().await?;
        let mut current = self.current_manifest().await?;
        if let Some(c) = &mut current {
            c.detect(&self.cfg.root);
        }

        let entries = diff(current.as_ref(), Some(&latest));
        let mut update = plan(&entries, role, false);

        self.download_all(&mut update.downloads).await?;
        self.sync_checkout().await?;
        apply(&self.cfg.root, &update.downloads, &update.deletes).await?;
        self.bus.publish(Event::now(EventKind::UpdateApplied));
        Ok(())
    }
}
