//! # Update planning.
//!
//! [`plan`] turns a manifest diff plus a deployment [`Role`] and an
//! optional-mod policy into an [`UpdatePlan`]: what to download, what to
//! offer for opt-in, and what to delete.
//!
//! ## Decision table (per diff entry)
//! ```text
//! new absent, or not applicable to the role:
//!     old present and on disk            → delete old
//! new present and applicable:
//!     old absent or old.url != new.url   → a real change:
//!         not optional                   → download (new, old)
//!         optional, old absent, prompt   → optional candidate
//!         optional, old absent, no prompt→ skip (unattended installs
//!                                          never pull new optional content)
//!     unchanged                          → nothing
//! ```
//!
//! ## Rules
//! - A mod name never appears in both the download and the delete list of
//!   one `plan` call.
//! - Role applicability is a capability-flag check on the mod, filtered by
//!   the role passed in; there is no type dispatch.
//! - Optional candidates are decided per-mod by the caller; an accepted
//!   candidate is appended to the downloads as `(new, None)`.

use super::diff::DiffEntry;
use super::model::Mod;

/// Deployment variant determining which mods are applicable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Server installation: mods flagged `server` apply.
    Server,
    /// Client installation: mods flagged `client` apply.
    Client,
}

/// A planned download: the mod to fetch and the mod it supersedes, if any.
#[derive(Clone, Debug)]
pub struct PlannedDownload {
    /// Mod to download and activate.
    pub new: Mod,
    /// Previously installed mod this one replaces.
    pub old: Option<Mod>,
}

/// Output of one [`plan`] call.
#[derive(Clone, Debug, Default)]
pub struct UpdatePlan {
    /// Mods to download, paired with the mods they supersede.
    pub downloads: Vec<PlannedDownload>,
    /// Newly introduced optional mods awaiting caller opt-in.
    pub optional: Vec<Mod>,
    /// Mods whose current files are to be removed.
    pub deletes: Vec<Mod>,
}

impl UpdatePlan {
    /// True when nothing is to be downloaded, offered, or deleted.
    pub fn is_empty(&self) -> bool {
        self.downloads.is_empty() && self.optional.is_empty() && self.deletes.is_empty()
    }

    /// Number of planned downloads without a predecessor (brand-new mods).
    pub fn new_count(&self) -> usize {
        self.downloads.iter().filter(|d| d.old.is_none()).count()
    }

    /// Number of planned downloads replacing an installed mod.
    pub fn changed_count(&self) -> usize {
        self.downloads.iter().filter(|d| d.old.is_some()).count()
    }

    /// Accepts an optional candidate, appending it to the downloads.
    pub fn accept_optional(&mut self, m: Mod) {
        self.downloads.push(PlannedDownload { new: m, old: None });
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Server
    }
}

/// Builds download/optional/delete lists from a manifest diff.
///
/// `prompt_optional = false` is the unattended mode used by the server
/// update loop: newly introduced optional mods are skipped entirely.
pub fn plan(entries: &[DiffEntry<'_>], role: Role, prompt_optional: bool) -> UpdatePlan {
    let server = role == Role::Server;
    let mut out = UpdatePlan::default();

    for entry in entries {
        match entry.new {
            Some(new) if new.applicable(server) => {
                let changed = entry.old.map_or(true, |old| old.url != new.url);
                if !changed {
                    continue;
                }
                if !new.optional {
                    out.downloads.push(PlannedDownload {
                        new: new.clone(),
                        old: entry.old.cloned(),
                    });
                } else if entry.old.is_none() && prompt_optional {
                    out.optional.push(new.clone());
                }
            }
            _ => {
                if let Some(old) = entry.old {
                    if old.exists {
                        out.deletes.push(old.clone());
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::diff;
    use crate::manifest::Manifest;

    fn manifest(mods: &[(&str, &str, bool, bool)]) -> Manifest {
        // (name, version, server, optional)
        let json = mods
            .iter()
            .map(|(n, v, s, o)| {
                format!(
                    r#"{{"name":"{n}","version":"{v}","url":"https://example.com/{n}-{v}.jar","server":{s},"client":true,"optional":{o}}}"#
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        Manifest::parse(
            format!(r#"{{"name":"t","version":"1","mods":[{json}]}}"#).as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn unattended_server_update_with_new_optional() {
        // A = [modX v1], B = [modX v2, modY v1 optional]
        let a = manifest(&[("modX", "v1", true, false)]);
        let b = manifest(&[("modX", "v2", true, false), ("modY", "v1", true, true)]);

        let entries = diff(Some(&a), Some(&b));
        let plan = plan(&entries, Role::Server, false);

        assert_eq!(plan.downloads.len(), 1);
        assert_eq!(plan.downloads[0].new.version, "v2");
        assert_eq!(plan.downloads[0].old.as_ref().unwrap().version, "v1");
        assert!(plan.deletes.is_empty());
        assert!(plan.optional.is_empty());
    }

    #[test]
    fn removed_mod_with_file_on_disk_is_deleted() {
        let mut a = manifest(&[("modZ", "v1", true, false)]);
        a.mods[0].exists = true;
        a.mods[0].enabled = true;
        let b = Manifest::parse(br#"{"name":"t","version":"1","mods":[]}"#).unwrap();

        let entries = diff(Some(&a), Some(&b));
        let plan = plan(&entries, Role::Server, false);

        assert!(plan.downloads.is_empty());
        assert_eq!(plan.deletes.len(), 1);
        assert_eq!(plan.deletes[0].name, "modZ");
    }

    #[test]
    fn removed_mod_without_file_is_ignored() {
        let a = manifest(&[("ghost", "v1", true, false)]); // exists = false
        let b = Manifest::parse(br#"{"name":"t","version":"1","mods":[]}"#).unwrap();

        let entries = diff(Some(&a), Some(&b));
        let plan = plan(&entries, Role::Server, false);
        assert!(plan.is_empty());
    }

    #[test]
    fn inapplicable_mod_is_deleted_not_downloaded() {
        // Client-only mod on a server installation, with an old file on disk.
        let mut a = manifest(&[("clientmod", "v1", false, false)]);
        a.mods[0].exists = true;
        let b = manifest(&[("clientmod", "v2", false, false)]);

        let entries = diff(Some(&a), Some(&b));
        let plan = plan(&entries, Role::Server, false);
        assert!(plan.downloads.is_empty());
        assert_eq!(plan.deletes.len(), 1);
    }

    #[test]
    fn unchanged_url_is_a_no_op() {
        let a = manifest(&[("same", "v1", true, false)]);
        let entries = diff(Some(&a), Some(&a));
        let plan = plan(&entries, Role::Server, false);
        assert!(plan.is_empty());
    }

    #[test]
    fn prompting_collects_new_optionals() {
        let b = manifest(&[("opt", "v1", true, true)]);
        let entries = diff(None, Some(&b));

        let plan = super::plan(&entries, Role::Server, true);
        assert!(plan.downloads.is_empty());
        assert_eq!(plan.optional.len(), 1);
        assert_eq!(plan.optional[0].name, "opt");
    }

    #[test]
    fn accepted_optional_joins_downloads() {
        let b = manifest(&[("opt", "v1", true, true)]);
        let entries = diff(None, Some(&b));
        let mut plan = super::plan(&entries, Role::Server, true);

        let candidate = plan.optional.remove(0);
        plan.accept_optional(candidate);
        assert_eq!(plan.downloads.len(), 1);
        assert!(plan.downloads[0].old.is_none());
    }

    #[test]
    fn role_filter_uses_client_flag_for_clients() {
        let b = manifest(&[("servermod", "v1", true, false)]);
        // server=true, client=true in fixture, so narrow it:
        let mut b = b;
        b.mods[0].client = false;

        let entries = diff(None, Some(&b));
        let plan = super::plan(&entries, Role::Client, false);
        assert!(plan.downloads.is_empty());
    }

    #[test]
    fn no_name_in_both_downloads_and_deletes() {
        let mut a = manifest(&[
            ("gone", "v1", true, false),
            ("kept", "v1", true, false),
            ("stale", "v1", true, false),
        ]);
        for m in &mut a.mods {
            m.exists = true;
        }
        let b = manifest(&[("kept", "v2", true, false), ("fresh", "v1", true, false)]);

        let entries = diff(Some(&a), Some(&b));
        let plan = super::plan(&entries, Role::Server, false);

        for d in &plan.downloads {
            assert!(
                plan.deletes.iter().all(|del| del.name != d.new.name),
                "'{}' planned for both download and delete",
                d.new.name
            );
        }
    }
}
