//! Session Event Stream
//!
//! Each session publishes its output, command events, and annotations
//! through a fan-out bus that gives every subscriber its own unbounded
//! queue. A slow consumer buffers instead of losing chunks, so delivery
//! is at-least-once per chunk and in publication order. The `Terminated`
//! event is published exactly once per session, after which the bus
//! closes: drained subscriptions end with `None`, and a subscriber that
//! joins after termination ends immediately.

use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::{CommandEvent, SessionStatus};
use crate::output_parser::Annotation;

/// Events published on a session's bus
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Raw output chunk, byte-for-byte as produced by the child
    Output(Vec<u8>),
    /// A command opened or closed by the shell-integration parser
    Command(CommandEvent),
    /// A side-channel classification from the output parser
    Annotation(Annotation),
    /// The session reached a terminal state; published exactly once
    Terminated {
        /// Final status (`Exited(code)` or `Killed`)
        status: SessionStatus,
    },
}

/// Fan-out bus: one unbounded queue per subscriber
///
/// Dropped subscribers are pruned on the next publish.
pub(crate) struct EventBus {
    /// `None` once the session terminated and the bus closed
    subscribers: Mutex<Option<Vec<UnboundedSender<SessionEvent>>>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(Some(Vec::new())),
        }
    }

    /// Deliver an event to every live subscriber
    pub(crate) fn publish(&self, event: SessionEvent) {
        let mut guard = self.subscribers.lock().expect("event bus lock poisoned");
        if let Some(subscribers) = guard.as_mut() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    /// Close the bus; queued events stay readable until drained
    pub(crate) fn close(&self) {
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .take();
    }

    /// Attach a new subscriber queue
    ///
    /// On a closed bus the returned receiver yields `None` right away.
    pub(crate) fn attach(&self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(subscribers) = self
            .subscribers
            .lock()
            .expect("event bus lock poisoned")
            .as_mut()
        {
            subscribers.push(tx);
        }
        rx
    }
}

/// Subscription to a session's raw output chunks
///
/// Dropping the subscription (or calling `unsubscribe`) detaches it.
pub struct OutputSubscription {
    pub(crate) rx: UnboundedReceiver<SessionEvent>,
}

impl OutputSubscription {
    /// Receive the next output chunk; `None` once the session terminates
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        while let Some(event) = self.rx.recv().await {
            match event {
                SessionEvent::Output(bytes) => return Some(bytes),
                SessionEvent::Terminated { .. } => return None,
                _ => {}
            }
        }
        None
    }

    /// Receive without waiting; `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        while let Ok(event) = self.rx.try_recv() {
            if let SessionEvent::Output(bytes) = event {
                return Some(bytes);
            }
        }
        None
    }

    /// Explicitly detach the subscription
    pub fn unsubscribe(self) {}
}

/// Subscription to a session's command events
pub struct CommandEventSubscription {
    pub(crate) rx: UnboundedReceiver<SessionEvent>,
}

impl CommandEventSubscription {
    /// Receive the next command event; `None` once the session terminates
    pub async fn recv(&mut self) -> Option<CommandEvent> {
        while let Some(event) = self.rx.recv().await {
            match event {
                SessionEvent::Command(command) => return Some(command),
                SessionEvent::Terminated { .. } => return None,
                _ => {}
            }
        }
        None
    }

    /// Receive without waiting; `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<CommandEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if let SessionEvent::Command(command) = event {
                return Some(command);
            }
        }
        None
    }

    /// Explicitly detach the subscription
    pub fn unsubscribe(self) {}
}

/// Subscription to a session's output annotations
pub struct AnnotationSubscription {
    pub(crate) rx: UnboundedReceiver<SessionEvent>,
}

impl AnnotationSubscription {
    /// Receive the next annotation; `None` once the session terminates
    pub async fn recv(&mut self) -> Option<Annotation> {
        while let Some(event) = self.rx.recv().await {
            match event {
                SessionEvent::Annotation(annotation) => return Some(annotation),
                SessionEvent::Terminated { .. } => return None,
                _ => {}
            }
        }
        None
    }

    /// Receive without waiting; `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<Annotation> {
        while let Ok(event) = self.rx.try_recv() {
            if let SessionEvent::Annotation(annotation) = event {
                return Some(annotation);
            }
        }
        None
    }

    /// Explicitly detach the subscription
    pub fn unsubscribe(self) {}
}
