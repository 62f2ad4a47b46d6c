//! Unit tests for shell-integration marker parsing
//!
//! Covers the command boundary state machine: plain command cycles,
//! markers split across chunks, nesting, and garbage tolerance.

use std::path::PathBuf;
use termlink::integration::markers::{command_end_sequence, command_start_sequence};
use termlink::integration::MarkerParser;
use termlink::models::SessionId;

fn parser() -> MarkerParser {
    MarkerParser::new(SessionId::new(), PathBuf::from("/tmp"))
}

#[test]
fn test_single_command_cycle() {
    let mut p = parser();

    let mut chunk = command_start_sequence("ls -la");
    chunk.extend_from_slice(b"total 42\r\n");
    chunk.extend_from_slice(&command_end_sequence(0));

    let events = p.feed(&chunk);
    assert_eq!(events.len(), 2);

    assert!(events[0].is_running());
    assert_eq!(events[0].command_text, "ls -la");
    assert_eq!(events[0].working_directory_at_start, PathBuf::from("/tmp"));

    assert!(!events[1].is_running());
    assert_eq!(events[1].command_text, "ls -la");
    assert_eq!(events[1].exit_code, Some(0));
    assert!(events[1].succeeded());
}

#[test]
fn test_failing_command_reports_exit_code() {
    let mut p = parser();
    let mut chunk = command_start_sequence("false");
    chunk.extend_from_slice(&command_end_sequence(1));

    let events = p.feed(&chunk);
    assert_eq!(events[1].exit_code, Some(1));
    assert!(!events[1].succeeded());
}

#[test]
fn test_output_without_markers_yields_nothing() {
    let mut p = parser();
    assert!(p.feed(b"plain output\r\nmore output\r\n").is_empty());
    assert!(p.feed(b"\x1b[31mcolored\x1b[0m").is_empty());
    assert!(!p.in_command());
}

#[test]
fn test_marker_split_across_chunks() {
    let mut p = parser();
    let seq = command_start_sequence("cargo build");

    // Split in the middle of the payload
    let (a, b) = seq.split_at(7);
    assert!(p.feed(a).is_empty());
    let events = p.feed(b);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].command_text, "cargo build");
    assert!(p.in_command());
}

#[test]
fn test_marker_split_byte_by_byte() {
    let mut p = parser();
    let mut seq = command_start_sequence("echo hi");
    seq.extend_from_slice(&command_end_sequence(0));

    let mut events = Vec::new();
    for byte in seq {
        events.extend(p.feed(&[byte]));
    }
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].exit_code, Some(0));
}

#[test]
fn test_st_terminator_accepted() {
    let mut p = parser();
    // Same marker family, ESC backslash terminator instead of BEL
    let chunk = b"\x1b]133;C;make\x1b\\output\x1b]133;D;2\x1b\\";
    let events = p.feed(chunk);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].command_text, "make");
    assert_eq!(events[1].exit_code, Some(2));
}

#[test]
fn test_split_st_terminator() {
    let mut p = parser();
    // Chunk boundary lands between ESC and backslash of the terminator
    assert!(p.feed(b"\x1b]133;C;git status\x1b").is_empty());
    let events = p.feed(b"\\");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].command_text, "git status");
}

#[test]
fn test_nested_markers_keep_outer_command_open() {
    let mut p = parser();

    let mut chunk = command_start_sequence("outer");
    chunk.extend_from_slice(&command_start_sequence("inner"));
    chunk.extend_from_slice(&command_end_sequence(0));

    let events = p.feed(&chunk);
    // Only the outer open event; the inner pair is swallowed
    assert_eq!(events.len(), 1);
    assert!(p.in_command());

    let events = p.feed(&command_end_sequence(0));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].command_text, "outer");
    assert_eq!(events[0].exit_code, Some(0));
    assert!(!p.in_command());
}

#[test]
fn test_end_marker_without_start_is_ignored() {
    let mut p = parser();
    assert!(p.feed(&command_end_sequence(0)).is_empty());
    assert!(!p.in_command());
}

#[test]
fn test_garbage_exit_code_closes_with_unknown() {
    let mut p = parser();
    let mut chunk = command_start_sequence("cmd");
    chunk.extend_from_slice(b"\x1b]133;D;garbage\x07");

    let events = p.feed(&chunk);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].exit_code, None);
    assert!(!events[1].is_running());
}

#[test]
fn test_prompt_and_input_markers_are_tolerated() {
    let mut p = parser();
    let mut chunk = Vec::new();
    chunk.extend_from_slice(b"\x1b]133;A\x07prompt$ ");
    chunk.extend_from_slice(b"\x1b]133;B\x07");
    chunk.extend_from_slice(&command_start_sequence("pwd"));
    chunk.extend_from_slice(&command_end_sequence(0));

    let events = p.feed(&chunk);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].command_text, "pwd");
}

#[test]
fn test_finish_closes_open_command_with_unknown_exit() {
    let mut p = parser();
    p.feed(&command_start_sequence("sleep 100"));
    assert!(p.in_command());

    let event = p.finish().unwrap();
    assert_eq!(event.command_text, "sleep 100");
    assert_eq!(event.exit_code, None);
    assert!(!event.is_running());
    assert!(event.ended_at.is_some());

    // Nothing left to close
    assert!(p.finish().is_none());
    assert!(!p.in_command());
}

#[test]
fn test_oversized_unterminated_sequence_recovers() {
    let mut p = parser();
    let mut chunk = b"\x1b]133;C;".to_vec();
    chunk.extend(std::iter::repeat(b'x').take(8192));
    assert!(p.feed(&chunk).is_empty());

    // The oversized fragment is discarded; later markers still parse
    let mut next = command_start_sequence("echo ok");
    next.extend_from_slice(&command_end_sequence(0));
    let events = p.feed(&next);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].command_text, "echo ok");
}

#[test]
fn test_unknown_osc_sequences_are_skipped() {
    let mut p = parser();
    // Title set and hyperlink OSC sequences around a real marker
    let mut chunk = b"\x1b]0;window title\x07".to_vec();
    chunk.extend_from_slice(b"\x1b]8;;https://example.com\x07link\x1b]8;;\x07");
    chunk.extend_from_slice(&command_start_sequence("true"));
    chunk.extend_from_slice(&command_end_sequence(0));

    let events = p.feed(&chunk);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].command_text, "true");
}

#[test]
fn test_command_text_with_semicolons_is_preserved() {
    let mut p = parser();
    let mut chunk = command_start_sequence("echo a; echo b");
    chunk.extend_from_slice(&command_end_sequence(0));

    let events = p.feed(&chunk);
    assert_eq!(events[0].command_text, "echo a; echo b");
}
