//! # Collaborator seams for everything remote.
//!
//! The reconciliation core never talks to the network or a version-control
//! implementation directly; it depends on these three traits. Production
//! embedders wire in a git binding, a GitHub API client, and an HTTP
//! downloader; tests wire in in-memory fakes.
//!
//! All traits are object-safe and `Send + Sync` so they can be shared as
//! `Arc<dyn ...>` handles across the update loop and the supervisor tasks.

use std::path::Path;

use async_trait::async_trait;

use crate::error::SyncError;

/// Byte-level progress callback: `(received, total)`, `total == 0` when the
/// remote did not announce a length.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Local checkout of the modpack repository.
///
/// Exactly the four capabilities the core needs; cloning over an existing
/// checkout is a contract violation and implementations fail loudly on it.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Initializes a checkout of `url` tracking `branch`.
    async fn clone_repo(&self, url: &str, branch: &str) -> Result<(), SyncError>;

    /// Updates remote-tracking refs.
    async fn fetch(&self) -> Result<(), SyncError>;

    /// Hard-resets the working tree to the given ref.
    async fn reset_hard(&self, reference: &str) -> Result<(), SyncError>;

    /// Resolves the id of the current local head.
    async fn current_ref(&self) -> Result<String, SyncError>;
}

/// Remote manifest retrieval over a repository hosting API.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetches the raw manifest bytes at the tip of `branch`.
    async fn fetch_manifest(&self, owner_repo: &str, branch: &str) -> Result<Vec<u8>, SyncError>;

    /// Resolves the id of the remote branch head.
    async fn fetch_branch_head(&self, owner_repo: &str, branch: &str)
        -> Result<String, SyncError>;
}

/// Raw byte transfer for mod downloads.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url` into `dest`, reporting progress as bytes arrive.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<(), SyncError>;

    /// Requests cancellation of the in-flight transfer, if any.
    fn cancel(&self);
}
