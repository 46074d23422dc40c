//! Supervision of the live server process: lifecycle state machine, output
//! parsing, console wire format, and the supervisor itself.

pub mod console;
mod parser;
mod state;
mod supervisor;

pub use parser::OutputEvent;
pub use state::ServerState;
pub use supervisor::ServerSupervisor;
