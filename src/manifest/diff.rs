//! # Manifest comparison.
//!
//! [`diff`] pairs up the mods of two manifests by name with a linear merge
//! over the (already name-sorted) mod lists, like a two-pointer set union.
//!
//! ## Rules
//! - Runs in O(n+m); no allocation beyond the output vector.
//! - Emits exactly one entry per name in the union of both manifests'
//!   mod names, sorted ascending.
//! - For a name present on both sides, one entry pairs both mods; for a
//!   name on one side only, the other side is `None`.
//! - Either manifest may be absent and is treated as empty.
//! - Pure: no side effects, no I/O.

use std::cmp::Ordering;

use super::model::{Manifest, Mod};

/// Pairing of an old and/or new mod sharing a name across two manifests.
///
/// At least one side is always present.
#[derive(Clone, Copy, Debug)]
pub struct DiffEntry<'a> {
    /// The mod as the current (local) manifest knows it.
    pub old: Option<&'a Mod>,
    /// The mod as the latest (remote) manifest knows it.
    pub new: Option<&'a Mod>,
}

impl<'a> DiffEntry<'a> {
    /// Name shared by both sides of the entry.
    pub fn name(&self) -> &'a str {
        // Invariant: at least one side is present.
        self.new.or(self.old).map(|m| m.name.as_str()).unwrap_or("")
    }
}

/// Compares two manifests, pairing mods by name.
///
/// `current` is the local installation's manifest, `latest` the manifest to
/// move towards; entries come out sorted by name ascending.
pub fn diff<'a>(
    current: Option<&'a Manifest>,
    latest: Option<&'a Manifest>,
) -> Vec<DiffEntry<'a>> {
    const EMPTY: &[Mod] = &[];
    let old_mods = current.map_or(EMPTY, |m| m.mods.as_slice());
    let new_mods = latest.map_or(EMPTY, |m| m.mods.as_slice());

    let mut entries = Vec::with_capacity(old_mods.len().max(new_mods.len()));
    let (mut i, mut j) = (0, 0);

    while i < old_mods.len() || j < new_mods.len() {
        let old = old_mods.get(i);
        let new = new_mods.get(j);
        let order = match (old, new) {
            (Some(o), Some(n)) => o.name.as_str().cmp(n.name.as_str()),
            (Some(_), None) => Ordering::Less,
            (None, _) => Ordering::Greater,
        };
        match order {
            Ordering::Less => {
                entries.push(DiffEntry { old, new: None });
                i += 1;
            }
            Ordering::Greater => {
                entries.push(DiffEntry { old: None, new });
                j += 1;
            }
            Ordering::Equal => {
                entries.push(DiffEntry { old, new });
                i += 1;
                j += 1;
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(names: &[&str]) -> Manifest {
        let mods = names
            .iter()
            .map(|n| {
                format!(
                    r#"{{"name":"{n}","version":"1.0","url":"https://example.com/{n}.jar"}}"#
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        Manifest::parse(
            format!(r#"{{"name":"t","version":"1","mods":[{mods}]}}"#).as_bytes(),
        )
        .unwrap()
    }

    fn names(entries: &[DiffEntry]) -> Vec<String> {
        entries.iter().map(|e| e.name().to_string()).collect()
    }

    #[test]
    fn union_covered_once_sorted() {
        let a = manifest(&["alpha", "both", "zeta"]);
        let b = manifest(&["beta", "both", "omega"]);
        let entries = diff(Some(&a), Some(&b));
        assert_eq!(names(&entries), ["alpha", "beta", "both", "omega", "zeta"]);
        for e in &entries {
            assert!(e.old.is_some() || e.new.is_some());
        }
    }

    #[test]
    fn sides_match_source_manifests() {
        let a = manifest(&["only-old", "shared"]);
        let b = manifest(&["only-new", "shared"]);
        let entries = diff(Some(&a), Some(&b));

        let only_new = entries.iter().find(|e| e.name() == "only-new").unwrap();
        assert!(only_new.old.is_none());
        assert_eq!(only_new.new.unwrap().name, "only-new");

        let only_old = entries.iter().find(|e| e.name() == "only-old").unwrap();
        assert!(only_old.new.is_none());
        assert_eq!(only_old.old.unwrap().name, "only-old");

        let shared = entries.iter().find(|e| e.name() == "shared").unwrap();
        assert_eq!(shared.old.unwrap().name, "shared");
        assert_eq!(shared.new.unwrap().name, "shared");
    }

    #[test]
    fn identical_manifests_pair_every_mod() {
        let a = manifest(&["one", "two", "three"]);
        let entries = diff(Some(&a), Some(&a));
        assert_eq!(entries.len(), 3);
        for e in entries {
            let (old, new) = (e.old.unwrap(), e.new.unwrap());
            assert_eq!(old.name, new.name);
        }
    }

    #[test]
    fn absent_manifest_treated_as_empty() {
        let a = manifest(&["x", "y"]);

        let entries = diff(None, Some(&a));
        assert_eq!(names(&entries), ["x", "y"]);
        assert!(entries.iter().all(|e| e.old.is_none()));

        let entries = diff(Some(&a), None);
        assert_eq!(names(&entries), ["x", "y"]);
        assert!(entries.iter().all(|e| e.new.is_none()));

        assert!(diff(None, None).is_empty());
    }
}
