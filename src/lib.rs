//! Termlink - terminal process and shell-integration plumbing
//!
//! This library manages pseudoterminal-backed process sessions and turns
//! their raw byte streams into structured events.
//!
//! ## Features
//!
//! - **PTY Sessions:** Cross-platform pseudoterminal processes via `portable-pty`
//! - **Shell Integration:** Command boundary markers parsed into command events
//! - **Output Classification:** Regex rules annotate URLs, errors, and highlights
//! - **Input Interception:** Prioritized handlers can rewrite or consume input
//! - **Session Registry:** Concurrent sessions managed and introspected by id
//!
//! ## Module Organization
//!
//! - [`service`] - The [`TerminalService`] facade callers talk to
//! - [`registry`] - Session registry keyed by id
//! - [`pty`] - PTY handle, process session, read loop, event subscriptions
//! - [`integration`] - Shell-integration marker parsing
//! - [`output_parser`] - Output classification rules and annotations
//! - [`intercept`] - Input interception pipeline
//! - [`config`] - Session and library configuration (TOML)
//! - [`models`] - Data structures (SessionId, SessionStatus, CommandEvent)
//! - [`mod@error`] - Error types and Result alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use termlink::{SessionConfig, TerminalService};
//!
//! # async fn run() -> termlink::Result<()> {
//! let service = TerminalService::new();
//! let id = service.create_session(&SessionConfig::default()).await?;
//!
//! let mut output = service.subscribe_output(&id).await?;
//! service.send_input(&id, b"echo hello\n").await?;
//! while let Some(chunk) = output.recv().await {
//!     print!("{}", String::from_utf8_lossy(&chunk));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading Model
//!
//! Each session pairs two blocking I/O threads (PTY reader and writer)
//! with one async read-loop task. A blocked session never stalls another;
//! each subscriber owns an unbounded event queue, so a slow consumer
//! buffers instead of losing output and always observes termination,
//! however late it subscribes.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod models;

// Core modules
pub mod integration;
pub mod intercept;
pub mod output_parser;
pub mod pty;
pub mod registry;
pub mod service;

// Re-exports for core functionality
pub use config::{SessionConfig, TermlinkConfig};
pub use error::{Error, Result};
pub use service::TerminalService;

// Convenience re-exports for common types
pub use intercept::{InterceptAction, InterceptorId, InterceptorPipeline};
pub use models::{CommandEvent, SessionId, SessionInfo, SessionStatus};
pub use output_parser::{Annotation, Classification, OutputParser, OutputRule};
pub use pty::{Session, SessionEvent, SignalKind};

// Version information
/// The current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The library name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing from `RUST_LOG`, defaulting to `info`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
