//! Session Configuration
//!
//! Spawn-time configuration for sessions, plus TOML loading for hosts that
//! keep defaults in a config file. The default shell and working directory
//! come from the host environment (`$SHELL`, the user's home directory);
//! the subsystem only ever accepts them as parameters.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default terminal width in columns
pub const DEFAULT_COLS: u16 = 80;
/// Default terminal height in rows
pub const DEFAULT_ROWS: u16 = 24;
/// Default grace period before a kill escalates to a forced termination
pub const DEFAULT_KILL_ESCALATION_MS: u64 = 5000;

/// Configuration for spawning one session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Shell or command to run; `None` resolves the user's shell
    pub shell: Option<PathBuf>,
    /// Arguments passed to the shell
    pub args: Vec<String>,
    /// Working directory; `None` resolves the host default
    pub working_directory: Option<PathBuf>,
    /// Extra environment entries, applied in order (later entries win)
    pub env: Vec<(String, String)>,
    /// Whether the child inherits the parent environment
    pub inherit_env: bool,
    /// Initial terminal width
    pub cols: u16,
    /// Initial terminal height
    pub rows: u16,
    /// Grace period before kill escalates to a forced termination
    pub kill_escalation_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: None,
            args: Vec::new(),
            working_directory: None,
            env: Vec::new(),
            inherit_env: true,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            kill_escalation_ms: DEFAULT_KILL_ESCALATION_MS,
        }
    }
}

impl SessionConfig {
    /// Config that runs the given command instead of the user's shell
    pub fn command(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            shell: Some(program.into()),
            args,
            ..Self::default()
        }
    }

    /// Resolve the shell to spawn, falling back to the user's shell
    pub fn resolved_shell(&self) -> Result<PathBuf> {
        let shell = self.shell.clone().unwrap_or_else(user_shell);
        resolve_executable(&shell)
    }

    /// Resolve the working directory to spawn in
    pub fn resolved_working_directory(&self) -> Result<PathBuf> {
        let dir = self
            .working_directory
            .clone()
            .unwrap_or_else(default_working_directory);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(Error::WorkingDirectoryNotFound { path: dir })
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermlinkConfig {
    /// Defaults applied to new sessions
    pub session: SessionConfig,
}

impl TermlinkConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Get the user's shell from the environment, or the platform default
pub fn user_shell() -> PathBuf {
    std::env::var("SHELL")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_shell())
}

/// Get the default shell for the current platform
pub fn default_shell() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("cmd.exe")
    } else {
        PathBuf::from("/bin/sh")
    }
}

/// Get the default working directory for new sessions
pub fn default_working_directory() -> PathBuf {
    dirs::home_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Resolve an executable to an absolute path
///
/// Paths containing a separator are checked directly; bare names are
/// searched on `PATH`. Fails with `ShellNotFound` when nothing matches,
/// so spawn failures are distinguishable from later runtime crashes.
pub fn resolve_executable(program: &Path) -> Result<PathBuf> {
    if program.components().count() > 1 {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(Error::ShellNotFound {
            shell: program.display().to_string(),
        });
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(program);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(Error::ShellNotFound {
        shell: program.display().to_string(),
    })
}

/// Environment entries injected into every session
///
/// `TERM` makes full-screen applications behave; the `TERMLINK` variables
/// let shell startup hooks detect the host and emit the command markers
/// the shell-integration parser listens for.
pub fn integration_env() -> Vec<(String, String)> {
    vec![
        ("TERM".to_string(), "xterm-256color".to_string()),
        ("TERMLINK".to_string(), "1".to_string()),
        (
            "TERMLINK_VERSION".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ),
    ]
}
