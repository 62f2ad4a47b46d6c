//! Data structures shared across the subsystem

pub mod command_event;
pub mod session;

pub use command_event::CommandEvent;
pub use session::{SessionId, SessionInfo, SessionStatus};
