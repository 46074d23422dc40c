//! Synchronization: collaborator orchestration, file mutations, and the
//! top-level update loop.

mod apply;
mod update_loop;
mod updater;

pub use apply::apply;
pub use update_loop::UpdateLoop;
pub use updater::Updater;
