//! Event bus and the runtime events flowing over it.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
