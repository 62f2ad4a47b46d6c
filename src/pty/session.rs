//! Process Session
//!
//! Binds one spawned child process to one PTY handle and runs its
//! lifecycle: a dedicated read-loop task per session streams output to
//! subscribers and feeds the shell-integration and output parsers, while
//! callers write, resize, and kill through short synchronous operations.
//! Per-session concurrency means a blocked session never starves others.

use chrono::{DateTime, Utc};
use portable_pty::{Child, ChildKiller, CommandBuilder};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::events::{
    AnnotationSubscription, CommandEventSubscription, EventBus, OutputSubscription, SessionEvent,
};
use super::handle::PtyHandle;
use crate::config::{integration_env, SessionConfig};
use crate::error::{Error, Result};
use crate::integration::MarkerParser;
use crate::intercept::{InterceptOutcome, InterceptorPipeline};
use crate::models::{SessionId, SessionInfo, SessionStatus};
use crate::output_parser::OutputParser;

/// Termination signal requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Interrupt (Ctrl+C equivalent)
    Interrupt,
    /// Hangup, the classic "terminal went away"
    Hangup,
    /// Graceful termination request
    Terminate,
    /// Forceful, unignorable kill
    Kill,
}

impl SignalKind {
    fn name(&self) -> &'static str {
        match self {
            SignalKind::Interrupt => "SIGINT",
            SignalKind::Hangup => "SIGHUP",
            SignalKind::Terminate => "SIGTERM",
            SignalKind::Kill => "SIGKILL",
        }
    }
}

/// PTY handle slot shared with the read loop, which empties it at
/// end of stream
type HandleSlot = Arc<Mutex<Option<PtyHandle>>>;

/// One shell (or arbitrary command) bound to one PTY
pub struct Session {
    id: SessionId,
    shell: PathBuf,
    working_directory: PathBuf,
    pid: Option<u32>,
    created_at: DateTime<Utc>,
    handle: HandleSlot,
    /// Last known terminal size; outlives the handle itself
    cols: u16,
    rows: u16,
    status_rx: watch::Receiver<SessionStatus>,
    kill_requested: Arc<AtomicBool>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    kill_escalation_ms: u64,
    interceptors: Arc<InterceptorPipeline>,
    events: Arc<EventBus>,
}

impl Session {
    /// Spawn a new session from the given configuration
    ///
    /// Fails with `ShellNotFound` or `WorkingDirectoryNotFound` before any
    /// resources are allocated, so callers can distinguish bad parameters
    /// from a later runtime crash.
    pub fn spawn(
        config: &SessionConfig,
        interceptors: Arc<InterceptorPipeline>,
        output_rules: Arc<OutputParser>,
    ) -> Result<Self> {
        let shell = config.resolved_shell()?;
        let working_directory = config.resolved_working_directory()?;

        let mut handle = PtyHandle::open(config.cols, config.rows)?;

        let mut cmd = CommandBuilder::new(&shell);
        cmd.args(&config.args);
        cmd.cwd(&working_directory);
        if !config.inherit_env {
            cmd.env_clear();
        }
        // Applied in order, so later entries win over earlier ones
        for (key, value) in integration_env().iter().chain(config.env.iter()) {
            cmd.env(key, value);
        }

        let (child, reader) = handle.spawn_child(cmd)?;
        let pid = child.process_id();
        let killer = child.clone_killer();

        let id = SessionId::new();
        let (status_tx, status_rx) = watch::channel(SessionStatus::Starting);
        let kill_requested = Arc::new(AtomicBool::new(false));
        let events = Arc::new(EventBus::new());
        let handle: HandleSlot = Arc::new(Mutex::new(Some(handle)));

        info!(
            "Spawned session {} running {} (pid {:?}) in {}",
            id,
            shell.display(),
            pid,
            working_directory.display()
        );

        let session = Self {
            id: id.clone(),
            shell,
            working_directory: working_directory.clone(),
            pid,
            created_at: Utc::now(),
            handle: handle.clone(),
            cols: config.cols,
            rows: config.rows,
            status_rx,
            kill_requested: kill_requested.clone(),
            killer,
            kill_escalation_ms: config.kill_escalation_ms,
            interceptors,
            events: events.clone(),
        };

        run_read_loop(
            id,
            reader,
            child,
            MarkerParser::new(session.id.clone(), working_directory),
            output_rules,
            events,
            status_tx,
            kill_requested,
            handle,
        );

        Ok(session)
    }

    /// Session identifier
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Child process id, if known
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current lifecycle status
    pub fn status(&self) -> SessionStatus {
        *self.status_rx.borrow()
    }

    /// Whether the child is still alive
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Introspection snapshot
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            pid: self.pid,
            shell: self.shell.clone(),
            working_directory: self.working_directory.clone(),
            status: self.status(),
            created_at: self.created_at,
            size: (self.cols, self.rows),
        }
    }

    /// Send input, routed through the interception pipeline first
    ///
    /// Consumed input is a success with zero bytes reaching the PTY.
    /// Fails once the session has terminated and released its PTY.
    pub fn send_input(&self, data: &[u8]) -> Result<()> {
        match self.interceptors.dispatch(data, &self.id) {
            InterceptOutcome::Consumed => Ok(()),
            InterceptOutcome::Deliver(bytes) => {
                let guard = self.handle.lock().expect("pty handle lock poisoned");
                match guard.as_ref() {
                    Some(handle) => handle.write(&bytes),
                    None => Err(Error::WriteFailed {
                        reason: "session terminated".to_string(),
                    }),
                }
            }
        }
    }

    /// Resize the terminal; a no-op when the size is unchanged
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        {
            let mut guard = self.handle.lock().expect("pty handle lock poisoned");
            let Some(handle) = guard.as_mut() else {
                return Err(Error::ResizeFailed {
                    reason: "session terminated".to_string(),
                });
            };
            handle.resize(cols, rows)?;
        }
        self.cols = cols;
        self.rows = rows;
        Ok(())
    }

    /// Current terminal size as (cols, rows)
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Request termination; idempotent
    ///
    /// The requested signal is sent first. If the child is still alive
    /// after the escalation grace period it is forcefully killed, which
    /// guarantees the read loop unblocks within bounded time even when
    /// the child ignores the signal.
    pub fn kill(&self, signal: SignalKind) -> Result<()> {
        if self.status().is_terminated() {
            debug!("Session {} already terminated; kill is a no-op", self.id);
            return Ok(());
        }

        self.kill_requested.store(true, Ordering::SeqCst);
        info!("Killing session {} with {}", self.id, signal.name());

        if signal == SignalKind::Kill {
            return self.force_kill(signal);
        }

        self.send_signal(signal)?;

        // Escalate to a forced kill if the child ignores the signal
        let mut status = self.status_rx.clone();
        let mut killer = self.killer.clone_killer();
        let escalation = std::time::Duration::from_millis(self.kill_escalation_ms);
        let id = self.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(escalation).await;
            if status.borrow_and_update().is_active() {
                warn!(
                    "Session {} ignored {} for {:?}; escalating to forced kill",
                    id,
                    signal.name(),
                    escalation
                );
                if let Err(e) = killer.kill() {
                    error!("Forced kill of session {} failed: {}", id, e);
                }
            }
        });

        Ok(())
    }

    fn force_kill(&self, signal: SignalKind) -> Result<()> {
        let mut killer = self.killer.clone_killer();
        killer.kill().map_err(|e| Error::SignalSendFailed {
            signal: signal.name().to_string(),
            reason: e.to_string(),
        })
    }

    #[cfg(unix)]
    fn send_signal(&self, signal: SignalKind) -> Result<()> {
        use nix::sys::signal::{kill, Signal as NixSignal};
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            // No pid to signal; fall back to the portable killer
            return self.force_kill(signal);
        };

        let nix_signal = match signal {
            SignalKind::Interrupt => NixSignal::SIGINT,
            SignalKind::Hangup => NixSignal::SIGHUP,
            SignalKind::Terminate => NixSignal::SIGTERM,
            SignalKind::Kill => NixSignal::SIGKILL,
        };

        match kill(Pid::from_raw(pid as i32), nix_signal) {
            Ok(()) => Ok(()),
            // The child exited between the status check and the signal;
            // same outcome as killing a terminated session
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(Error::SignalSendFailed {
                signal: signal.name().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn send_signal(&self, signal: SignalKind) -> Result<()> {
        // No per-signal delivery off unix; any kill is a forced kill
        self.force_kill(signal)
    }

    /// Subscribe to raw output chunks
    pub fn subscribe_output(&self) -> OutputSubscription {
        OutputSubscription {
            rx: self.events.attach(),
        }
    }

    /// Subscribe to command events
    pub fn subscribe_command_events(&self) -> CommandEventSubscription {
        CommandEventSubscription {
            rx: self.events.attach(),
        }
    }

    /// Subscribe to output annotations
    pub fn subscribe_annotations(&self) -> AnnotationSubscription {
        AnnotationSubscription {
            rx: self.events.attach(),
        }
    }
}

/// The read loop: one task per session, suspended only on the PTY read
#[allow(clippy::too_many_arguments)]
fn run_read_loop(
    id: SessionId,
    mut reader: super::handle::PtyReader,
    mut child: Box<dyn Child + Send + Sync>,
    mut parser: MarkerParser,
    output_rules: Arc<OutputParser>,
    events: Arc<EventBus>,
    status_tx: watch::Sender<SessionStatus>,
    kill_requested: Arc<AtomicBool>,
    handle: HandleSlot,
) {
    tokio::spawn(async move {
        status_tx.send_replace(SessionStatus::Running);

        while let Some(chunk) = reader.read_chunk().await {
            // The parsers consume each chunk before it is forwarded,
            // keeping command events ordered with the raw stream.
            for event in parser.feed(&chunk) {
                events.publish(SessionEvent::Command(event));
            }
            for annotation in output_rules.scan(&chunk) {
                events.publish(SessionEvent::Annotation(annotation));
            }
            events.publish(SessionEvent::Output(chunk));
        }

        // End of stream: release the controller fd and input channel,
        // which also unblocks the writer thread
        handle.lock().expect("pty handle lock poisoned").take();

        // Reap the child off the async runtime
        let exit_code =
            tokio::task::spawn_blocking(move || child.wait().map(|s| s.exit_code() as i32).ok())
                .await
                .ok()
                .flatten();

        if let Some(event) = parser.finish() {
            events.publish(SessionEvent::Command(event));
        }

        let final_status = if kill_requested.load(Ordering::SeqCst) {
            SessionStatus::Killed
        } else {
            SessionStatus::Exited(exit_code.unwrap_or(-1))
        };

        // Event first, status second: subscribers drain the bus before the
        // status watch reports termination
        events.publish(SessionEvent::Terminated {
            status: final_status,
        });
        events.close();
        status_tx.send_replace(final_status);
        info!("Session {} finished: {}", id, final_status);
    });
}
