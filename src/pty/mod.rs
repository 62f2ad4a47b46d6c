//! PTY management
//!
//! The low-level handle (`handle`), the per-process session built on top
//! of it (`session`), and the event types subscribers consume (`events`).

pub mod events;
pub mod handle;
pub mod session;

pub use events::{
    AnnotationSubscription, CommandEventSubscription, OutputSubscription, SessionEvent,
};
pub use handle::{PtyHandle, PtyReader};
pub use session::{Session, SignalKind};
