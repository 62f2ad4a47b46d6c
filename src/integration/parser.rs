//! Shell-Integration Parser
//!
//! Single-pass state machine over the outbound byte stream. The parser is
//! a pure observer: it derives `CommandEvent`s from marker sequences while
//! the raw bytes are forwarded to subscribers untouched, whatever state the
//! parser is in. Markers split across chunk boundaries are reassembled from
//! a small residual buffer kept between `feed` calls.

use std::path::PathBuf;

use super::markers::{self, Marker, BEL, ESC};
use crate::models::{CommandEvent, SessionId};

/// Residual bytes kept across feeds while waiting for an OSC terminator.
/// A sequence that grows past this without terminating is discarded, so a
/// hostile or broken stream degrades to "no structured events".
const MAX_RESIDUAL: usize = 4096;

/// Parser states: outside or inside a foreground command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Inside a command; `depth` counts nested start markers (a hook
    /// re-emitted by a subshell) that must unwind before the event closes
    InCommand { depth: u32 },
}

/// Stateful scanner that turns marker sequences into command events
pub struct MarkerParser {
    session_id: SessionId,
    working_directory: PathBuf,
    state: State,
    open_event: Option<CommandEvent>,
    residual: Vec<u8>,
}

impl MarkerParser {
    /// Create a parser for one session's output stream
    pub fn new(session_id: SessionId, working_directory: PathBuf) -> Self {
        Self {
            session_id,
            working_directory,
            state: State::Idle,
            open_event: None,
            residual: Vec::new(),
        }
    }

    /// Whether a command is currently open
    pub fn in_command(&self) -> bool {
        matches!(self.state, State::InCommand { .. })
    }

    /// Consume one output chunk and return the events it completes
    ///
    /// An event with `ended_at == None` is emitted when a start marker
    /// opens a command; the same command yields a closed event once its
    /// matching end marker arrives.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<CommandEvent> {
        let data: Vec<u8> = if self.residual.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.residual);
            joined.extend_from_slice(chunk);
            joined
        };

        let mut events = Vec::new();
        let mut i = 0;

        while i < data.len() {
            if data[i] != ESC {
                i += 1;
                continue;
            }

            // Lone ESC at the end of the chunk: wait for more bytes
            if i + 1 >= data.len() {
                self.stash_residual(&data[i..]);
                return events;
            }

            // Not an OSC introducer; skip the escape and rescan
            if data[i + 1] != b']' {
                i += 1;
                continue;
            }

            match find_terminator(&data, i + 2) {
                Some((payload_end, seq_end)) => {
                    if let Some(marker) = markers::parse_marker(&data[i + 2..payload_end]) {
                        if let Some(event) = self.apply(marker) {
                            events.push(event);
                        }
                    }
                    i = seq_end;
                }
                None => {
                    // Unterminated sequence: buffer it for the next feed
                    self.stash_residual(&data[i..]);
                    return events;
                }
            }
        }

        events
    }

    /// Close any command left open when the session ends
    ///
    /// The event is closed with an unknown exit code rather than retried;
    /// the child is gone and no end marker can arrive.
    pub fn finish(&mut self) -> Option<CommandEvent> {
        self.state = State::Idle;
        self.residual.clear();
        let mut event = self.open_event.take()?;
        event.close(None);
        Some(event)
    }

    fn stash_residual(&mut self, tail: &[u8]) {
        if tail.len() <= MAX_RESIDUAL {
            self.residual = tail.to_vec();
        } else {
            debug!(
                "Discarding {}-byte unterminated escape sequence",
                tail.len()
            );
            self.residual.clear();
        }
    }

    /// Apply one marker to the state machine; returns the event to emit
    fn apply(&mut self, marker: Marker) -> Option<CommandEvent> {
        match (marker, self.state) {
            (Marker::CommandStart(text), State::Idle) => {
                let event = CommandEvent::opened(
                    self.session_id.clone(),
                    text,
                    self.working_directory.clone(),
                );
                self.open_event = Some(event.clone());
                self.state = State::InCommand { depth: 0 };
                Some(event)
            }
            (Marker::CommandStart(_), State::InCommand { depth }) => {
                // Nested hook emission; the outer command stays open
                self.state = State::InCommand { depth: depth + 1 };
                None
            }
            (Marker::CommandEnd(_), State::InCommand { depth }) if depth > 0 => {
                self.state = State::InCommand { depth: depth - 1 };
                None
            }
            (Marker::CommandEnd(code), State::InCommand { .. }) => {
                self.state = State::Idle;
                match self.open_event.take() {
                    Some(mut event) => {
                        event.close(code);
                        Some(event)
                    }
                    None => None,
                }
            }
            // Unmatched end markers and prompt/input markers are ignored
            (Marker::CommandEnd(_), State::Idle) => None,
            (Marker::PromptStart | Marker::InputStart, _) => None,
        }
    }
}

/// Find the end of an OSC sequence starting at `start` (first payload byte)
///
/// Returns `(payload_end, sequence_end)` where `payload_end` is the index
/// of the terminator's first byte and `sequence_end` the index just past it.
fn find_terminator(data: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut i = start;
    while i < data.len() {
        match data[i] {
            BEL => return Some((i, i + 1)),
            ESC => {
                if i + 1 < data.len() {
                    if data[i + 1] == b'\\' {
                        return Some((i, i + 2));
                    }
                    // An ESC that does not begin ST aborts the sequence
                    return Some((i, i));
                }
                // ESC at the end of data: terminator may be split
                return None;
            }
            _ => i += 1,
        }
    }
    None
}
