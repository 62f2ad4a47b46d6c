//! Integration tests for session lifecycle
//!
//! Spawns real child processes through the service facade and verifies
//! creation, input, resize, termination, and registry behavior end to end.

#![cfg(unix)]

use std::time::{Duration, Instant};
use termlink::{
    Error, SessionConfig, SessionStatus, SignalKind, TerminalService,
};

fn sh(script: &str) -> SessionConfig {
    SessionConfig::command("sh", vec!["-c".to_string(), script.to_string()])
}

/// Drain a session's output until the stream ends, returning everything seen
async fn drain_output(service: &TerminalService, id: &termlink::SessionId) -> Vec<u8> {
    let mut output = service.subscribe_output(id).await.unwrap();
    let mut collected = Vec::new();
    while let Some(chunk) = output.recv().await {
        collected.extend(chunk);
    }
    collected
}

#[tokio::test]
async fn test_echo_round_trip() {
    let service = TerminalService::new();
    // The leading sleep keeps early output from racing the subscription
    let id = service
        .create_session(&sh("sleep 0.2; echo hello-world"))
        .await
        .unwrap();

    let collected = drain_output(&service, &id).await;
    assert!(String::from_utf8_lossy(&collected).contains("hello-world"));

    let info = service.session_info(&id).await.unwrap();
    assert_eq!(info.status, SessionStatus::Exited(0));
    assert!(info.pid.is_some());
}

#[tokio::test]
async fn test_input_reaches_the_child() {
    let service = TerminalService::new();
    let id = service.create_session(&sh("read line; echo got:$line")).await.unwrap();

    let mut output = service.subscribe_output(&id).await.unwrap();
    service.send_input(&id, b"ping\n").await.unwrap();

    let mut collected = Vec::new();
    while let Some(chunk) = output.recv().await {
        collected.extend(chunk);
    }
    assert!(String::from_utf8_lossy(&collected).contains("got:ping"));
    assert_eq!(
        service.session_info(&id).await.unwrap().status,
        SessionStatus::Exited(0)
    );
}

#[tokio::test]
async fn test_exit_code_propagates() {
    let service = TerminalService::new();
    let id = service.create_session(&sh("exit 7")).await.unwrap();
    drain_output(&service, &id).await;
    assert_eq!(
        service.session_info(&id).await.unwrap().status,
        SessionStatus::Exited(7)
    );
}

#[tokio::test]
async fn test_resize_is_idempotent_and_visible_to_child() {
    let service = TerminalService::new();
    let config = SessionConfig {
        cols: 80,
        rows: 24,
        ..sh("sleep 30")
    };
    let id = service.create_session(&config).await.unwrap();

    assert_eq!(service.session_info(&id).await.unwrap().size, (80, 24));

    service.resize(&id, 120, 40).await.unwrap();
    // Same size again is a no-op, not an error
    service.resize(&id, 120, 40).await.unwrap();
    assert_eq!(service.session_info(&id).await.unwrap().size, (120, 40));

    service.kill(&id, SignalKind::Kill).await.unwrap();
    drain_output(&service, &id).await;
}

#[tokio::test]
async fn test_kill_is_idempotent() {
    let service = TerminalService::new();
    let id = service.create_session(&sh("sleep 30")).await.unwrap();

    service.kill(&id, SignalKind::Terminate).await.unwrap();
    drain_output(&service, &id).await;
    assert_eq!(
        service.session_info(&id).await.unwrap().status,
        SessionStatus::Killed
    );

    // Killing a dead session succeeds and changes nothing
    service.kill(&id, SignalKind::Terminate).await.unwrap();
    service.kill(&id, SignalKind::Kill).await.unwrap();
    assert_eq!(
        service.session_info(&id).await.unwrap().status,
        SessionStatus::Killed
    );
}

#[tokio::test]
async fn test_kill_escalates_when_signal_is_ignored() {
    let service = TerminalService::new();
    let config = SessionConfig {
        kill_escalation_ms: 300,
        ..sh("trap '' TERM; sleep 30")
    };
    let id = service.create_session(&config).await.unwrap();

    // Give the shell a moment to install its trap
    tokio::time::sleep(Duration::from_millis(200)).await;

    let start = Instant::now();
    service.kill(&id, SignalKind::Terminate).await.unwrap();
    drain_output(&service, &id).await;

    // Terminated by the escalation well before sleep would have finished
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(
        service.session_info(&id).await.unwrap().status,
        SessionStatus::Killed
    );
}

#[tokio::test]
async fn test_spawn_failures_are_distinct() {
    let service = TerminalService::new();

    let config = SessionConfig::command("/no/such/binary", vec![]);
    assert!(matches!(
        service.create_session(&config).await,
        Err(Error::ShellNotFound { .. })
    ));

    let config = SessionConfig {
        working_directory: Some("/no/such/dir".into()),
        ..sh("true")
    };
    assert!(matches!(
        service.create_session(&config).await,
        Err(Error::WorkingDirectoryNotFound { .. })
    ));

    assert!(service.list_sessions().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let service = TerminalService::new();
    let blocked = service.create_session(&sh("sleep 30")).await.unwrap();
    let quick = service
        .create_session(&sh("sleep 0.2; echo fast"))
        .await
        .unwrap();

    // The blocked session must not delay the quick one
    let collected = drain_output(&service, &quick).await;
    assert!(String::from_utf8_lossy(&collected).contains("fast"));

    let infos = service.list_sessions().await;
    assert_eq!(infos.len(), 2);

    service.kill(&blocked, SignalKind::Kill).await.unwrap();
    drain_output(&service, &blocked).await;
}

#[tokio::test]
async fn test_remove_and_cleanup() {
    let service = TerminalService::new();
    let running = service.create_session(&sh("sleep 30")).await.unwrap();
    let finished = service.create_session(&sh("true")).await.unwrap();
    drain_output(&service, &finished).await;

    // A running session cannot be removed
    assert!(matches!(
        service.remove_session(&running).await,
        Err(Error::SessionStillRunning { .. })
    ));

    service.remove_session(&finished).await.unwrap();
    assert!(matches!(
        service.session_info(&finished).await,
        Err(Error::SessionNotFound { .. })
    ));

    service.kill(&running, SignalKind::Kill).await.unwrap();
    drain_output(&service, &running).await;
    assert_eq!(service.cleanup_terminated().await, 1);
    assert!(service.list_sessions().await.is_empty());
}

#[tokio::test]
async fn test_slow_subscriber_receives_every_byte() {
    let service = TerminalService::new();
    let id = service
        .create_session(&sh("sleep 0.2; seq 1 700000"))
        .await
        .unwrap();

    let mut output = service.subscribe_output(&id).await.unwrap();
    // Let the whole multi-megabyte stream pile up before reading a byte
    tokio::time::sleep(Duration::from_secs(2)).await;

    let mut collected = Vec::new();
    while let Some(chunk) = output.recv().await {
        collected.extend(chunk);
    }

    let text = String::from_utf8_lossy(&collected);
    let numbers: Vec<&str> = text.split_whitespace().collect();
    assert_eq!(numbers.first(), Some(&"1"));
    assert_eq!(numbers.last(), Some(&"700000"));
    assert_eq!(numbers.len(), 700_000);
}

#[tokio::test]
async fn test_input_rejected_after_exit() {
    let service = TerminalService::new();
    let id = service.create_session(&sh("true")).await.unwrap();
    drain_output(&service, &id).await;

    // Termination released the PTY, so there is nowhere to write
    assert!(matches!(
        service.send_input(&id, b"late\n").await,
        Err(Error::WriteFailed { .. })
    ));
}

#[tokio::test]
async fn test_late_subscriber_still_terminates() {
    let service = TerminalService::new();
    let id = service.create_session(&sh("true")).await.unwrap();
    drain_output(&service, &id).await;

    // Subscribing after termination must return end of stream, not hang
    let mut late = service.subscribe_output(&id).await.unwrap();
    let next = tokio::time::timeout(Duration::from_secs(5), late.recv()).await;
    assert_eq!(next.unwrap(), None);
}
