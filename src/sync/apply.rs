//! # Applying a computed plan to the mods directory.
//!
//! [`apply`] mutates the mods directory to match the target manifest: for
//! each planned download it removes the superseded file (honoring the
//! `.disabled` suffix) and moves the staged file into place under its
//! canonical enabled name; for each planned delete it removes the current
//! file. Moves are renames, never copies, to keep the window of
//! inconsistency minimal.
//!
//! ## Rules
//! - The mods directory is created if absent.
//! - Already-done work is tolerated (a missing superseded file, a staged
//!   file that was moved by a previous pass), which makes applying the same
//!   plan twice a no-op.
//! - There is no rollback: the first real failure aborts the pass, and the
//!   caller must not treat the plan as applied.

use std::io;
use std::path::Path;

use tokio::fs;

use crate::error::ApplyError;
use crate::manifest::{Mod, PlannedDownload};

/// Applies downloads and deletes to `<root>/mods`.
pub async fn apply(
    root: &Path,
    downloads: &[PlannedDownload],
    deletes: &[Mod],
) -> Result<(), ApplyError> {
    let mods_dir = root.join("mods");
    fs::create_dir_all(&mods_dir).await.map_err(|e| ApplyError::Io {
        path: mods_dir.clone(),
        source: e,
    })?;

    for d in downloads {
        if let Some(old) = &d.old {
            if old.exists {
                remove_if_present(&mods_dir.join(old.current_file_name())).await?;
            }
        }
        let target = mods_dir.join(d.new.file_name());
        match &d.new.staged {
            Some(staged) if staged.exists() => {
                fs::rename(staged, &target).await.map_err(|e| ApplyError::Io {
                    path: target.clone(),
                    source: e,
                })?;
            }
            // Staged file already consumed and the target in place: done.
            _ if target.exists() => {}
            _ => {
                return Err(ApplyError::MissingStagedFile {
                    name: d.new.name.clone(),
                })
            }
        }
    }

    for m in deletes {
        remove_if_present(&mods_dir.join(m.current_file_name())).await?;
    }
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<(), ApplyError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ApplyError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn make_mod(name: &str, version: &str, enabled: bool, exists: bool) -> Mod {
        Mod {
            name: name.to_string(),
            version: version.to_string(),
            url: format!("https://example.com/{name}-{version}.jar"),
            server: true,
            client: true,
            optional: false,
            exists,
            enabled,
            staged: None,
        }
    }

    fn stage(dir: &Path, m: &mut Mod) -> PathBuf {
        let staged = dir.join(format!("{}.part", m.file_name()));
        std::fs::write(&staged, format!("payload {}", m.version)).unwrap();
        m.staged = Some(staged.clone());
        staged
    }

    fn dir_listing(mods_dir: &Path) -> BTreeSet<String> {
        std::fs::read_dir(mods_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn upgrade_replaces_old_file_with_staged() {
        let root = tempfile::tempdir().unwrap();
        let mods_dir = root.path().join("mods");
        std::fs::create_dir(&mods_dir).unwrap();
        std::fs::write(mods_dir.join("modX-v1.jar"), b"old").unwrap();

        let old = make_mod("modX", "v1", true, true);
        let mut new = make_mod("modX", "v2", false, false);
        stage(root.path(), &mut new);

        let downloads = vec![PlannedDownload {
            new,
            old: Some(old),
        }];
        apply(root.path(), &downloads, &[]).await.unwrap();

        assert_eq!(
            dir_listing(&mods_dir),
            BTreeSet::from(["modX-v2.jar".to_string()])
        );
    }

    #[tokio::test]
    async fn disabled_predecessor_is_removed_under_its_suffix() {
        let root = tempfile::tempdir().unwrap();
        let mods_dir = root.path().join("mods");
        std::fs::create_dir(&mods_dir).unwrap();
        std::fs::write(mods_dir.join("modX-v1.jar.disabled"), b"old").unwrap();

        let old = make_mod("modX", "v1", false, true);
        let mut new = make_mod("modX", "v2", false, false);
        stage(root.path(), &mut new);

        apply(
            root.path(),
            &[PlannedDownload {
                new,
                old: Some(old),
            }],
            &[],
        )
        .await
        .unwrap();

        assert_eq!(
            dir_listing(&mods_dir),
            BTreeSet::from(["modX-v2.jar".to_string()])
        );
    }

    #[tokio::test]
    async fn deletes_remove_current_files() {
        let root = tempfile::tempdir().unwrap();
        let mods_dir = root.path().join("mods");
        std::fs::create_dir(&mods_dir).unwrap();
        std::fs::write(mods_dir.join("gone-v1.jar"), b"bye").unwrap();

        let gone = make_mod("gone", "v1", true, true);
        apply(root.path(), &[], &[gone]).await.unwrap();
        assert!(dir_listing(&mods_dir).is_empty());
    }

    #[tokio::test]
    async fn applying_twice_is_a_no_op() {
        let root = tempfile::tempdir().unwrap();
        let mods_dir = root.path().join("mods");
        std::fs::create_dir(&mods_dir).unwrap();
        std::fs::write(mods_dir.join("modX-v1.jar"), b"old").unwrap();
        std::fs::write(mods_dir.join("dead-v1.jar"), b"dead").unwrap();

        let mut new = make_mod("modX", "v2", false, false);
        stage(root.path(), &mut new);
        let downloads = vec![PlannedDownload {
            new,
            old: Some(make_mod("modX", "v1", true, true)),
        }];
        let deletes = vec![make_mod("dead", "v1", true, true)];

        apply(root.path(), &downloads, &deletes).await.unwrap();
        let after_first = dir_listing(&mods_dir);

        apply(root.path(), &downloads, &deletes).await.unwrap();
        assert_eq!(dir_listing(&mods_dir), after_first);
        assert_eq!(after_first, BTreeSet::from(["modX-v2.jar".to_string()]));
    }

    #[tokio::test]
    async fn missing_staged_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let new = make_mod("modX", "v2", false, false); // never staged

        let err = apply(
            root.path(),
            &[PlannedDownload { new, old: None }],
            &[],
        )
        .await
        .unwrap_err();
        assert_eq!(err.as_label(), "apply_missing_staged");
    }

    #[tokio::test]
    async fn creates_mods_directory_when_absent() {
        let root = tempfile::tempdir().unwrap();
        let mut new = make_mod("fresh", "v1", false, false);
        stage(root.path(), &mut new);

        apply(root.path(), &[PlannedDownload { new, old: None }], &[])
            .await
            .unwrap();
        assert!(root.path().join("mods").join("fresh-v1.jar").is_file());
    }
}
