//! Error types and Result aliases for termlink

use std::fmt;
use std::path::PathBuf;

/// Result type alias for termlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for termlink
#[derive(Debug)]
pub enum Error {
    // === PTY-related errors ===
    /// Failed to allocate a PTY pair
    PtyCreationFailed {
        reason: String,
    },

    /// Failed to clone the PTY controller reader
    PtyReaderCloneFailed {
        reason: String,
    },

    /// Failed to take the PTY controller writer
    PtyWriterTakeFailed {
        reason: String,
    },

    /// Failed to resize the PTY
    ResizeFailed {
        reason: String,
    },

    /// Failed to write input to the PTY
    WriteFailed {
        reason: String,
    },

    // === Spawn errors ===
    /// Shell executable could not be located
    ShellNotFound {
        shell: String,
    },

    /// Working directory does not exist
    WorkingDirectoryNotFound {
        path: PathBuf,
    },

    /// Failed to spawn the child process in the PTY
    CommandSpawnFailed {
        command: String,
        reason: String,
    },

    // === Session errors ===
    /// Caller referenced a stale or unknown session id
    SessionNotFound {
        session_id: String,
    },

    /// Refused to remove a session whose child is still running
    SessionStillRunning {
        session_id: String,
    },

    /// Failed to deliver a signal to the child process
    SignalSendFailed {
        signal: String,
        reason: String,
    },

    // === Interceptor errors ===
    /// Caller referenced an unknown interceptor id
    InterceptorNotFound {
        interceptor_id: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        reason: String,
    },

    // === I/O and pattern errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // PTY errors
            Error::PtyCreationFailed { reason } => {
                write!(f, "Failed to create PTY: {}", reason)
            }
            Error::PtyReaderCloneFailed { reason } => {
                write!(f, "Failed to clone PTY reader: {}", reason)
            }
            Error::PtyWriterTakeFailed { reason } => {
                write!(f, "Failed to take PTY writer: {}", reason)
            }
            Error::ResizeFailed { reason } => {
                write!(f, "Failed to resize PTY: {}", reason)
            }
            Error::WriteFailed { reason } => {
                write!(f, "Failed to write to PTY: {}", reason)
            }

            // Spawn errors
            Error::ShellNotFound { shell } => {
                write!(f, "Shell '{}' not found", shell)
            }
            Error::WorkingDirectoryNotFound { path } => {
                write!(f, "Working directory '{}' does not exist", path.display())
            }
            Error::CommandSpawnFailed { command, reason } => {
                write!(f, "Failed to spawn '{}': {}", command, reason)
            }

            // Session errors
            Error::SessionNotFound { session_id } => {
                write!(f, "Session '{}' not found", session_id)
            }
            Error::SessionStillRunning { session_id } => {
                write!(f, "Session '{}' is still running", session_id)
            }
            Error::SignalSendFailed { signal, reason } => {
                write!(f, "Failed to send signal '{}': {}", signal, reason)
            }

            // Interceptor errors
            Error::InterceptorNotFound { interceptor_id } => {
                write!(f, "Interceptor '{}' not found", interceptor_id)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigParseFailed { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }

            // I/O and pattern errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed {
            reason: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
