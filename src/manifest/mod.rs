//! Modpack manifest model, comparison, and update planning.

mod diff;
mod model;
mod plan;

pub use diff::{diff, DiffEntry};
pub use model::{Manifest, Mod, MANIFEST_FILE};
pub use plan::{plan, PlannedDownload, Role, UpdatePlan};
