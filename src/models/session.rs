//! Session Identity and Status
//!
//! Identifier, lifecycle status, and introspection snapshot for one
//! PTY-backed shell session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque identifier for a session
///
/// Backed by a UUID v4, so identifiers are never reused within (or across)
/// process runs. A caller holding a stale id after the session was removed
/// gets `SessionNotFound`, never another session's handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unique session id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionStatus {
    /// Session is being created; the child has not produced output yet
    #[default]
    Starting,
    /// Child process is running
    Running,
    /// Child exited on its own with the given exit code
    Exited(i32),
    /// Session was terminated by a caller-initiated kill
    Killed,
}

impl SessionStatus {
    /// Whether the child is still alive (Starting or Running)
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Starting | SessionStatus::Running)
    }

    /// Whether the session has reached a terminal state
    pub fn is_terminated(&self) -> bool {
        !self.is_active()
    }

    /// Exit code, if the child exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SessionStatus::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Starting => write!(f, "starting"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Exited(code) => write!(f, "exited ({})", code),
            SessionStatus::Killed => write!(f, "killed"),
        }
    }
}

/// Introspection snapshot of a session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session identifier
    pub id: SessionId,
    /// OS process id of the child, if known
    pub pid: Option<u32>,
    /// Shell (or arbitrary command) the session runs
    pub shell: PathBuf,
    /// Working directory the child was spawned in
    pub working_directory: PathBuf,
    /// Current lifecycle status
    pub status: SessionStatus,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Current terminal size as (cols, rows)
    pub size: (u16, u16),
}
