//! Unit tests for output classification rules

use termlink::output_parser::{Classification, OutputParser};

#[test]
fn test_default_rules_match_urls() {
    let parser = OutputParser::with_default_rules();
    let chunk = b"docs at https://docs.rs/regex and http://example.com/a?b=1 here";
    let annotations = parser.scan(chunk);

    let urls: Vec<_> = annotations
        .iter()
        .filter(|a| a.classification == Classification::Hyperlink)
        .collect();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0].text, "https://docs.rs/regex");
    assert_eq!(urls[1].text, "http://example.com/a?b=1");

    // Offsets address the original chunk
    assert_eq!(
        &chunk[urls[0].range.clone()],
        "https://docs.rs/regex".as_bytes()
    );
}

#[test]
fn test_default_rules_match_compiler_errors() {
    let parser = OutputParser::with_default_rules();
    let chunk = b"error[E0308]: mismatched types\nwarning: unused variable\n";
    let annotations = parser.scan(chunk);

    let errors: Vec<_> = annotations
        .iter()
        .filter(|a| a.classification == Classification::ErrorPattern)
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].text, "error[E0308]:");
    assert_eq!(errors[1].text, "warning:");
}

#[test]
fn test_default_rules_match_panics_and_not_found() {
    let parser = OutputParser::with_default_rules();
    let annotations = parser.scan(b"thread 'main' panicked at src/main.rs:3:5");
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].classification, Classification::ErrorPattern);

    let annotations = parser.scan(b"sh: foo: command not found\n");
    assert_eq!(annotations.len(), 1);

    let annotations = parser.scan(b"cat: /nope: No such file or directory\n");
    assert_eq!(annotations.len(), 1);
}

#[test]
fn test_plain_output_yields_no_annotations() {
    let parser = OutputParser::with_default_rules();
    assert!(parser.scan(b"total 12\ndrwxr-xr-x 2 user user\n").is_empty());
    assert!(parser.scan(b"").is_empty());
}

#[test]
fn test_empty_parser_never_matches() {
    let parser = OutputParser::empty();
    assert_eq!(parser.rule_count(), 0);
    assert!(parser.scan(b"error: https://example.com").is_empty());
}

#[test]
fn test_custom_rule_is_applied() {
    let mut parser = OutputParser::empty();
    parser
        .add_rule("ticket", r"PROJ-\d+", Classification::Highlight)
        .unwrap();

    let annotations = parser.scan(b"fixed in PROJ-1234 and PROJ-9");
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].text, "PROJ-1234");
    assert_eq!(annotations[1].text, "PROJ-9");
    assert_eq!(annotations[0].classification, Classification::Highlight);
}

#[test]
fn test_invalid_rule_pattern_is_rejected() {
    let mut parser = OutputParser::empty();
    assert!(parser
        .add_rule("broken", r"[unclosed", Classification::Highlight)
        .is_err());
    assert_eq!(parser.rule_count(), 0);
}

#[test]
fn test_overlapping_rules_all_report() {
    let mut parser = OutputParser::empty();
    parser
        .add_rule("word", r"deadline", Classification::Highlight)
        .unwrap();
    parser
        .add_rule("prefix", r"dead", Classification::ErrorPattern)
        .unwrap();

    let annotations = parser.scan(b"deadline today");
    assert_eq!(annotations.len(), 2);
}

#[test]
fn test_offsets_survive_invalid_utf8() {
    let parser = OutputParser::with_default_rules();
    // Invalid UTF-8 bytes before the match must not shift offsets
    let mut chunk: Vec<u8> = vec![0xff, 0xfe, 0xfd, b' '];
    chunk.extend_from_slice(b"https://example.com done");

    let annotations = parser.scan(&chunk);
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].range, 4..23);
    assert_eq!(&chunk[annotations[0].range.clone()], b"https://example.com");
}
