//! Input Interception Pipeline
//!
//! Ordered set of (pattern, handler) registrations that may observe,
//! rewrite, or fully consume input bytes before they reach a session's
//! PTY. Cross-cutting features (safety confirmations, macro expansion,
//! command-tracking hooks) hang off this pipeline without the session
//! knowing about them.
//!
//! Evaluation order: highest priority first, ties broken by registration
//! order. The first handler that consumes the input short-circuits the
//! rest. A handler that panics is treated as "no match" and logged; it
//! never blocks input delivery.

use regex::bytes::Regex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::SessionId;

/// Identifier returned by `register`, used to unregister
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterceptorId(String);

impl InterceptorId {
    fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a handler decided about one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptAction {
    /// Let the input continue unchanged
    PassThrough,
    /// Replace the input; lower-priority interceptors see the rewrite
    Rewrite(Vec<u8>),
    /// Swallow the input entirely
    Consume,
}

/// Result of running the whole pipeline over one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// Bytes to deliver to the PTY (possibly rewritten)
    Deliver(Vec<u8>),
    /// Input was consumed; nothing reaches the PTY
    Consumed,
}

/// Handler invoked when an interceptor's pattern matches the input
pub type InterceptHandler = Arc<dyn Fn(&[u8], &SessionId) -> InterceptAction + Send + Sync>;

struct Registration {
    id: InterceptorId,
    pattern_source: String,
    pattern: Regex,
    handler: InterceptHandler,
    priority: i32,
    seq: u64,
}

/// Concurrency-safe interceptor registry shared by all sessions
pub struct InterceptorPipeline {
    /// Kept sorted by (priority desc, registration order asc)
    registrations: RwLock<Vec<Registration>>,
    next_seq: AtomicU64,
}

impl InterceptorPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register a handler for input matching `pattern`
    pub fn register(
        &self,
        pattern: &str,
        priority: i32,
        handler: InterceptHandler,
    ) -> Result<InterceptorId> {
        let compiled = Regex::new(pattern)?;
        let id = InterceptorId::new();
        let registration = Registration {
            id: id.clone(),
            pattern_source: pattern.to_string(),
            pattern: compiled,
            handler,
            priority,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };

        let mut regs = self.registrations.write().expect("interceptor lock poisoned");
        regs.push(registration);
        regs.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));

        debug!("Registered interceptor {} for pattern '{}'", id.as_str(), pattern);
        Ok(id)
    }

    /// Remove one interceptor by id
    pub fn unregister(&self, id: &InterceptorId) -> Result<()> {
        let mut regs = self.registrations.write().expect("interceptor lock poisoned");
        let before = regs.len();
        regs.retain(|r| &r.id != id);
        if regs.len() == before {
            return Err(Error::InterceptorNotFound {
                interceptor_id: id.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Remove every interceptor registered with the given pattern source
    pub fn unregister_pattern(&self, pattern: &str) -> usize {
        let mut regs = self.registrations.write().expect("interceptor lock poisoned");
        let before = regs.len();
        regs.retain(|r| r.pattern_source != pattern);
        before - regs.len()
    }

    /// Number of registered interceptors
    pub fn len(&self) -> usize {
        self.registrations.read().expect("interceptor lock poisoned").len()
    }

    /// Whether the pipeline has no registrations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the pipeline over one input on behalf of a session
    pub fn dispatch(&self, input: &[u8], session: &SessionId) -> InterceptOutcome {
        let regs = self.registrations.read().expect("interceptor lock poisoned");
        let mut current = input.to_vec();

        for reg in regs.iter() {
            if !reg.pattern.is_match(&current) {
                continue;
            }

            let result = catch_unwind(AssertUnwindSafe(|| (reg.handler)(&current, session)));
            match result {
                Ok(InterceptAction::Consume) => {
                    debug!(
                        "Interceptor '{}' consumed input for session {}",
                        reg.pattern_source, session
                    );
                    return InterceptOutcome::Consumed;
                }
                Ok(InterceptAction::Rewrite(bytes)) => {
                    current = bytes;
                }
                Ok(InterceptAction::PassThrough) => {}
                Err(_) => {
                    warn!(
                        "Interceptor '{}' panicked; treating as no match",
                        reg.pattern_source
                    );
                }
            }
        }

        InterceptOutcome::Deliver(current)
    }
}

impl Default for InterceptorPipeline {
    fn default() -> Self {
        Self::new()
    }
}
