//! # Modpack manifest model.
//!
//! A [`Manifest`] is an ordered, name-unique list of [`Mod`]s plus display
//! metadata, loaded from the well-known `modpack.json` at the installation
//! root or parsed from bytes fetched remotely.
//!
//! Parsing normalizes the mod list: mods are sorted by name ascending and
//! duplicate names are rejected, because every downstream algorithm (the
//! differ's linear merge in particular) assumes both properties.
//!
//! On-disk state (`exists`/`enabled`) is not part of the wire format; it is
//! filled in by [`Manifest::detect`] when the manifest is probed against a
//! mods directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SyncError;

/// Well-known manifest file name under the installation root.
pub const MANIFEST_FILE: &str = "modpack.json";

/// Suffix marking a mod file as present but turned off.
const DISABLED_SUFFIX: &str = ".disabled";

/// One mod of a modpack.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Mod {
    /// Unique key within a manifest.
    pub name: String,
    /// Display version; also part of the on-disk file name.
    pub version: String,
    /// Download source.
    pub url: String,
    /// Applicable on server installations.
    #[serde(default)]
    pub server: bool,
    /// Applicable on client installations.
    #[serde(default)]
    pub client: bool,
    /// Requires explicit opt-in when newly introduced.
    #[serde(default)]
    pub optional: bool,

    /// Present in the mods directory (enabled or disabled). Derived.
    #[serde(skip)]
    pub exists: bool,
    /// Present under its enabled name. Derived.
    #[serde(skip)]
    pub enabled: bool,
    /// Staged download location while a fetch is in flight.
    #[serde(skip)]
    pub staged: Option<PathBuf>,
}

impl Mod {
    /// Canonical enabled file name: `{name}-{version}.jar`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.jar", self.name, self.version)
    }

    /// File name the mod currently occupies on disk, honoring the disabled
    /// suffix.
    pub fn current_file_name(&self) -> String {
        if self.enabled {
            self.file_name()
        } else {
            format!("{}{}", self.file_name(), DISABLED_SUFFIX)
        }
    }

    /// Whether this mod applies to the given deployment role.
    pub fn applicable(&self, server: bool) -> bool {
        if server {
            self.server
        } else {
            self.client
        }
    }
}

/// Ordered, name-unique list of mods plus display metadata.
#[derive(Clone, Debug, Deserialize)]
pub struct Manifest {
    /// Modpack display title.
    pub name: String,
    /// Modpack version.
    pub version: String,
    /// Modpack authors.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Mods, sorted by name ascending after parsing.
    pub mods: Vec<Mod>,
}

impl Manifest {
    /// Parses a manifest from raw bytes.
    ///
    /// Sorts mods by name and rejects duplicate names with
    /// [`SyncError::Parse`].
    pub fn parse(bytes: &[u8]) -> Result<Self, SyncError> {
        let mut manifest: Manifest =
            serde_json::from_slice(bytes).map_err(|e| SyncError::Parse(e.to_string()))?;
        manifest.mods.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in manifest.mods.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(SyncError::Parse(format!(
                    "duplicate mod name '{}'",
                    pair[0].name
                )));
            }
        }
        Ok(manifest)
    }

    /// Loads the manifest from `<root>/modpack.json`.
    ///
    /// Returns `Ok(None)` when the file does not exist (fresh installation).
    pub async fn load(root: &Path) -> Result<Option<Self>, SyncError> {
        let path = root.join(MANIFEST_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Self::parse(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Io(format!(
                "reading {}: {e}",
                path.display()
            ))),
        }
    }

    /// Probes the mods directory and fills each mod's `exists`/`enabled`
    /// derived state.
    pub fn detect(&mut self, root: &Path) {
        let mods_dir = root.join("mods");
        for m in &mut self.mods {
            let file = mods_dir.join(m.file_name());
            m.enabled = file.exists();
            m.exists = m.enabled
                || mods_dir
                    .join(format!("{}{}", m.file_name(), DISABLED_SUFFIX))
                    .exists();
        }
    }
}
