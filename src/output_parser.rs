//! Output Parser
//!
//! Stateless pattern matching over each output chunk for semantic
//! classification: hyperlinks, known error formats, host-defined
//! highlights. Rules only emit side-channel annotations keyed by byte
//! offset; the bytes delivered to subscribers are never altered.
//!
//! Patterns run on raw bytes (`regex::bytes`), so offsets stay exact even
//! when a chunk contains invalid UTF-8.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::ops::Range;

use crate::error::Result;

/// What a matched region of output represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A clickable link (URLs and the like)
    Hyperlink,
    /// A known error format
    ErrorPattern,
    /// A host-defined highlight
    Highlight,
}

/// One registered classification rule
#[derive(Debug, Clone)]
pub struct OutputRule {
    /// Short name for logs and debugging
    pub name: String,
    /// Pattern matched against each output chunk
    pub pattern: Regex,
    /// Classification applied to matched regions
    pub classification: Classification,
}

/// A side-channel annotation for one matched region of a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Byte range of the match within the chunk
    pub range: Range<usize>,
    /// What the region represents
    pub classification: Classification,
    /// Matched text (lossily decoded for convenience)
    pub text: String,
}

static DEFAULT_RULES: Lazy<Vec<OutputRule>> = Lazy::new(|| {
    vec![
        OutputRule {
            name: "url".to_string(),
            pattern: Regex::new(r"https?://[^\s\x00-\x1f<>\x22]+").unwrap(),
            classification: Classification::Hyperlink,
        },
        OutputRule {
            name: "compiler-error".to_string(),
            pattern: Regex::new(r"(?m)^(?:error|warning)(?:\[[A-Za-z0-9]+\])?:").unwrap(),
            classification: Classification::ErrorPattern,
        },
        OutputRule {
            name: "panic".to_string(),
            pattern: Regex::new(r"thread '[^']*' panicked at").unwrap(),
            classification: Classification::ErrorPattern,
        },
        OutputRule {
            name: "not-found".to_string(),
            pattern: Regex::new(r"(?i)command not found|no such file or directory").unwrap(),
            classification: Classification::ErrorPattern,
        },
    ]
});

/// Rule set applied to every output chunk of a session
#[derive(Debug, Clone)]
pub struct OutputParser {
    rules: Vec<OutputRule>,
}

impl OutputParser {
    /// Parser with no rules; `scan` always returns nothing
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Parser with the built-in URL and error-format rules
    pub fn with_default_rules() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Add a rule; multiple rules may match the same region
    pub fn add_rule(
        &mut self,
        name: &str,
        pattern: &str,
        classification: Classification,
    ) -> Result<()> {
        let pattern = Regex::new(pattern)?;
        self.rules.push(OutputRule {
            name: name.to_string(),
            pattern,
            classification,
        });
        Ok(())
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Match every rule against one chunk and collect annotations
    ///
    /// Purely observational: the chunk is not modified and no state is
    /// carried between calls.
    pub fn scan(&self, chunk: &[u8]) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        for rule in &self.rules {
            for m in rule.pattern.find_iter(chunk) {
                annotations.push(Annotation {
                    range: m.start()..m.end(),
                    classification: rule.classification,
                    text: String::from_utf8_lossy(m.as_bytes()).into_owned(),
                });
            }
        }
        annotations
    }
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::with_default_rules()
    }
}
