//! Session Registry
//!
//! Tracks every live and recently terminated session by id. Entries are
//! individually locked, so operations on one session never serialize
//! against operations on another.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::intercept::InterceptorPipeline;
use crate::models::{SessionId, SessionInfo};
use crate::output_parser::OutputParser;
use crate::pty::Session;

/// Registry of sessions, keyed by id
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>>,
    interceptors: Arc<InterceptorPipeline>,
    output_rules: Arc<OutputParser>,
}

impl SessionRegistry {
    pub fn new(interceptors: Arc<InterceptorPipeline>, output_rules: Arc<OutputParser>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            interceptors,
            output_rules,
        }
    }

    /// Spawn a session and register it
    pub async fn create_session(&self, config: &SessionConfig) -> Result<SessionId> {
        let session = Session::spawn(
            config,
            self.interceptors.clone(),
            self.output_rules.clone(),
        )?;
        let id = session.id().clone();

        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        debug!("Registered session {} ({} total)", id, sessions.len());
        Ok(id)
    }

    /// Look up a session by id
    pub async fn get(&self, id: &SessionId) -> Result<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound {
                session_id: id.to_string(),
            })
    }

    /// Whether a session with this id is registered
    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Introspection snapshot of one session
    pub async fn info(&self, id: &SessionId) -> Result<SessionInfo> {
        let session = self.get(id).await?;
        let info = session.lock().await.info();
        Ok(info)
    }

    /// Snapshots of every registered session
    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions.values() {
            infos.push(session.lock().await.info());
        }
        infos
    }

    /// Number of sessions whose child is still alive
    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        let mut count = 0;
        for session in sessions.values() {
            if session.lock().await.is_active() {
                count += 1;
            }
        }
        count
    }

    /// Remove a terminated session from the registry
    ///
    /// Refuses to drop a session that is still running; kill it first.
    pub async fn remove(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(id).ok_or_else(|| Error::SessionNotFound {
            session_id: id.to_string(),
        })?;
        if session.lock().await.is_active() {
            return Err(Error::SessionStillRunning {
                session_id: id.to_string(),
            });
        }
        sessions.remove(id);
        debug!("Removed session {} ({} remaining)", id, sessions.len());
        Ok(())
    }

    /// Drop every terminated session, returning how many were removed
    pub async fn cleanup_terminated(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut dead = Vec::new();
        for (id, session) in sessions.iter() {
            if !session.lock().await.is_active() {
                dead.push(id.clone());
            }
        }
        for id in &dead {
            sessions.remove(id);
        }
        if !dead.is_empty() {
            info!("Cleaned up {} terminated sessions", dead.len());
        }
        dead.len()
    }
}
