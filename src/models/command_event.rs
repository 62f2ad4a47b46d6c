//! Command Event Model
//!
//! A structured record of one foreground command recovered from the
//! shell-integration markers embedded in the output stream. Events for a
//! session never overlap and are ordered by `started_at`, since a shell
//! executes foreground commands one at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::session::SessionId;

/// One foreground command's start/end/exit-code record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Session the command ran in
    pub session_id: SessionId,

    /// Literal command text as reported by the start marker
    pub command_text: String,

    /// When the start marker was observed
    pub started_at: DateTime<Utc>,

    /// When the end marker was observed; `None` while the command runs
    pub ended_at: Option<DateTime<Utc>>,

    /// Exit code from the end marker; `None` while running, or when the
    /// session ended before the command finished (unknown outcome)
    pub exit_code: Option<i32>,

    /// Working directory of the session when the command started
    pub working_directory_at_start: PathBuf,
}

impl CommandEvent {
    /// Open a new event at the start marker
    pub fn opened(session_id: SessionId, command_text: String, working_directory: PathBuf) -> Self {
        Self {
            session_id,
            command_text,
            started_at: Utc::now(),
            ended_at: None,
            exit_code: None,
            working_directory_at_start: working_directory,
        }
    }

    /// Close the event with the exit code from the end marker
    pub fn close(&mut self, exit_code: Option<i32>) {
        self.ended_at = Some(Utc::now());
        self.exit_code = exit_code;
    }

    /// Whether the command is still running
    pub fn is_running(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Wall-clock duration, once closed
    pub fn duration(&self) -> Option<std::time::Duration> {
        self.ended_at.map(|end| {
            end.signed_duration_since(self.started_at)
                .to_std()
                .unwrap_or_default()
        })
    }

    /// Whether the command finished with exit code 0
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}
