//! Terminal Service
//!
//! The single entry point callers use: session creation, input and resize,
//! termination, event subscriptions, and interceptor registration, all
//! keyed by session id so callers never hold a session object directly.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::intercept::{InterceptHandler, InterceptorId, InterceptorPipeline};
use crate::models::{SessionId, SessionInfo};
use crate::output_parser::OutputParser;
use crate::pty::{
    AnnotationSubscription, CommandEventSubscription, OutputSubscription, SignalKind,
};
use crate::registry::SessionRegistry;

/// Facade over the registry, pipeline, and output rules
pub struct TerminalService {
    registry: SessionRegistry,
    interceptors: Arc<InterceptorPipeline>,
}

impl TerminalService {
    /// Build a service with the stock output classification rules
    pub fn new() -> Self {
        Self::with_output_rules(OutputParser::with_default_rules())
    }

    /// Build a service with caller supplied output rules
    pub fn with_output_rules(output_rules: OutputParser) -> Self {
        let interceptors = Arc::new(InterceptorPipeline::new());
        Self {
            registry: SessionRegistry::new(interceptors.clone(), Arc::new(output_rules)),
            interceptors,
        }
    }

    /// Spawn a new session and return its id
    pub async fn create_session(&self, config: &SessionConfig) -> Result<SessionId> {
        self.registry.create_session(config).await
    }

    /// Send input to a session, subject to interception
    pub async fn send_input(&self, id: &SessionId, data: &[u8]) -> Result<()> {
        let session = self.registry.get(id).await?;
        let guard = session.lock().await;
        guard.send_input(data)
    }

    /// Resize a session's terminal
    pub async fn resize(&self, id: &SessionId, cols: u16, rows: u16) -> Result<()> {
        let session = self.registry.get(id).await?;
        let mut guard = session.lock().await;
        guard.resize(cols, rows)
    }

    /// Terminate a session; a no-op if it already terminated
    pub async fn kill(&self, id: &SessionId, signal: SignalKind) -> Result<()> {
        let session = self.registry.get(id).await?;
        let guard = session.lock().await;
        guard.kill(signal)
    }

    /// Introspection snapshot of one session
    pub async fn session_info(&self, id: &SessionId) -> Result<SessionInfo> {
        self.registry.info(id).await
    }

    /// Snapshots of all registered sessions
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        self.registry.list().await
    }

    /// Remove a terminated session from the registry
    pub async fn remove_session(&self, id: &SessionId) -> Result<()> {
        self.registry.remove(id).await
    }

    /// Drop all terminated sessions, returning how many were removed
    pub async fn cleanup_terminated(&self) -> usize {
        self.registry.cleanup_terminated().await
    }

    /// Subscribe to a session's raw output stream
    pub async fn subscribe_output(&self, id: &SessionId) -> Result<OutputSubscription> {
        let session = self.registry.get(id).await?;
        let guard = session.lock().await;
        Ok(guard.subscribe_output())
    }

    /// Subscribe to a session's command events
    pub async fn subscribe_command_events(
        &self,
        id: &SessionId,
    ) -> Result<CommandEventSubscription> {
        let session = self.registry.get(id).await?;
        let guard = session.lock().await;
        Ok(guard.subscribe_command_events())
    }

    /// Subscribe to a session's output annotations
    pub async fn subscribe_annotations(&self, id: &SessionId) -> Result<AnnotationSubscription> {
        let session = self.registry.get(id).await?;
        let guard = session.lock().await;
        Ok(guard.subscribe_annotations())
    }

    /// Register an input interceptor, shared across all sessions
    pub fn register_interceptor(
        &self,
        pattern: &str,
        priority: i32,
        handler: InterceptHandler,
    ) -> Result<InterceptorId> {
        self.interceptors.register(pattern, priority, handler)
    }

    /// Remove an interceptor by id
    pub fn unregister_interceptor(&self, id: &InterceptorId) -> Result<()> {
        self.interceptors.unregister(id)
    }
}

impl Default for TerminalService {
    fn default() -> Self {
        Self::new()
    }
}
