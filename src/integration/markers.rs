//! Shell-Integration Marker Sequences
//!
//! The shell hook brackets every foreground command with OSC 133 sequences
//! (the FinalTerm convention, as injected by modern terminal hosts):
//!
//! - `ESC ] 133 ; A BEL`              prompt is about to be drawn
//! - `ESC ] 133 ; B BEL`              user input begins
//! - `ESC ] 133 ; C ; <command> BEL`  command execution starts; our hook
//!   appends the literal command text as an extra parameter
//! - `ESC ] 133 ; D ; <exit> BEL`     command finished with exit code
//!
//! `ST` (`ESC \`) is accepted as an alternative terminator. Anything that
//! does not parse is ignored; the raw stream is never modified.

/// Escape byte
pub const ESC: u8 = 0x1b;
/// Bell, the common OSC terminator
pub const BEL: u8 = 0x07;
/// OSC introducer bytes (`ESC ]`)
pub const OSC_PREFIX: &[u8] = b"\x1b]";
/// Marker family all shell-integration sequences share
pub const MARKER_FAMILY: &[u8] = b"133;";

/// A recognized shell-integration marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Prompt about to be drawn (`133;A`); carries no command data
    PromptStart,
    /// User input begins (`133;B`); carries no command data
    InputStart,
    /// Command execution starts, with the literal command text (`133;C;...`)
    CommandStart(String),
    /// Command finished (`133;D;...`); `None` when the code is absent
    /// or unparseable
    CommandEnd(Option<i32>),
}

/// Parse one OSC payload (the bytes between `ESC ]` and the terminator)
///
/// Returns `None` for anything outside the `133;` family or with an
/// unknown discriminator; callers skip those without side effects.
pub fn parse_marker(payload: &[u8]) -> Option<Marker> {
    let rest = payload.strip_prefix(MARKER_FAMILY)?;
    let (kind, args) = match rest.split_first() {
        Some((kind, args)) => (*kind, args),
        None => return None,
    };

    match kind {
        b'A' if args.is_empty() => Some(Marker::PromptStart),
        b'B' if args.is_empty() => Some(Marker::InputStart),
        b'C' => {
            let text = args.strip_prefix(b";").unwrap_or(b"");
            Some(Marker::CommandStart(
                String::from_utf8_lossy(text).into_owned(),
            ))
        }
        b'D' => {
            let code = args
                .strip_prefix(b";")
                .and_then(|s| std::str::from_utf8(s).ok())
                .and_then(|s| s.trim().parse::<i32>().ok());
            Some(Marker::CommandEnd(code))
        }
        _ => None,
    }
}

/// Render the start marker for a command (used by tests and shell hooks)
pub fn command_start_sequence(command: &str) -> Vec<u8> {
    let mut seq = Vec::with_capacity(command.len() + 8);
    seq.extend_from_slice(b"\x1b]133;C;");
    seq.extend_from_slice(command.as_bytes());
    seq.push(BEL);
    seq
}

/// Render the end marker for an exit code (used by tests and shell hooks)
pub fn command_end_sequence(exit_code: i32) -> Vec<u8> {
    format!("\x1b]133;D;{}\x07", exit_code).into_bytes()
}
