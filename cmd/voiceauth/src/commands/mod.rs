//! CLI commands module.

mod enroll;
mod inspect;
mod util;
mod verify;

pub use enroll::EnrollCommand;
pub use inspect::InspectCommand;
pub use verify::VerifyCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
