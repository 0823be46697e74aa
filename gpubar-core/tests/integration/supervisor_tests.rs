//! Supervisor end-to-end tests on a paused clock

use std::time::Duration;

use gpubar_core::{
    ConnectionMeta, ConnectionStatus, ConnectionSupervisor, ErrorCode, GpuEvent, RemoteMetricsClient,
    RetryPolicy, SupervisorConfig,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};

use super::{RTX_ROW, ScriptedSsh, fail};

const PATIENCE: Duration = Duration::from_secs(120);

fn start(
    runner: std::sync::Arc<ScriptedSsh>,
    config: SupervisorConfig,
) -> (ConnectionSupervisor, mpsc::Receiver<GpuEvent>) {
    ConnectionSupervisor::start(config, RemoteMetricsClient::new(runner))
}

/// Waits for the first metadata event matching `pred`, collecting every
/// event seen on the way
async fn wait_for(
    rx: &mut mpsc::Receiver<GpuEvent>,
    seen: &mut Vec<GpuEvent>,
    pred: impl Fn(&ConnectionMeta) -> bool,
) -> ConnectionMeta {
    timeout(PATIENCE, async {
        loop {
            let event = rx.recv().await.expect("worker alive");
            seen.push(event.clone());
            if let GpuEvent::Meta(meta) = event
                && pred(&meta)
            {
                return meta;
            }
        }
    })
    .await
    .expect("expected metadata never arrived")
}

#[tokio::test(start_paused = true)]
async fn auth_failure_reports_error_metadata() {
    let runner = ScriptedSsh::new([fail("gpuhost: Permission denied (publickey).")]);
    let (sup, mut rx) = start(runner, SupervisorConfig::default());
    sup.set_target("gpuhost", 0);

    let mut seen = Vec::new();
    let meta = wait_for(&mut rx, &mut seen, |m| m.consecutive_failures == 1).await;
    assert_eq!(meta.status, ConnectionStatus::Error);
    assert_eq!(meta.error_code, Some(ErrorCode::AuthFailed));
    assert_eq!(meta.next_retry_in_sec, 2);
    assert_eq!(meta.active_target, "gpuhost");
    assert!(seen.iter().any(|e| matches!(e, GpuEvent::Error(_))));
    assert!(!seen.iter().any(|e| matches!(e, GpuEvent::Snapshot(_))));

    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["errorCode"], "auth_failed");
    assert_eq!(json["consecutiveFailures"], 1);
    assert_eq!(json["nextRetryInSec"], 2);
    sup.shutdown();
}

#[tokio::test(start_paused = true)]
async fn recovers_after_backoff_and_goes_live() {
    let runner = ScriptedSsh::new([fail("connect to host gpuhost port 22: Connection refused"), Ok(RTX_ROW.into())]);
    let (sup, mut rx) = start(runner.clone(), SupervisorConfig::default());
    let started = Instant::now();
    sup.set_target("gpuhost", 0);

    let mut seen = Vec::new();
    let meta = wait_for(&mut rx, &mut seen, |m| m.status == ConnectionStatus::Live).await;
    assert!(Instant::now() - started >= Duration::from_secs(2));
    assert_eq!(meta.consecutive_failures, 0);
    assert_eq!(meta.next_retry_in_sec, 0);
    assert_eq!(meta.error_code, None);
    assert!(meta.last_success_ts > 0);

    let snapshot = seen
        .iter()
        .find_map(|e| match e {
            GpuEvent::Snapshot(s) => Some(s.clone()),
            _ => None,
        })
        .expect("snapshot before live metadata");
    let gpu = &snapshot.gpus()[0];
    assert_eq!((gpu.fan_speed, gpu.power_draw, gpu.power_limit), (45, 210, 450));
    assert_eq!(runner.calls().len(), 2);
    sup.shutdown();
}

#[tokio::test(start_paused = true)]
async fn stale_then_error_with_custom_threshold() {
    let runner = ScriptedSsh::new([
        Ok(RTX_ROW.into()),
        fail("Connection timed out"),
        fail("Connection timed out"),
        fail("Connection timed out"),
    ]);
    let config = SupervisorConfig::default().with_policy(
        RetryPolicy::new()
            .with_backoff_secs(&[1])
            .with_error_threshold(3),
    );
    let (sup, mut rx) = start(runner, config);
    sup.set_target("gpuhost", 0);

    let mut seen = Vec::new();
    let meta = wait_for(&mut rx, &mut seen, |m| m.status == ConnectionStatus::Error).await;
    assert_eq!(meta.consecutive_failures, 3);
    assert_eq!(meta.error_code, Some(ErrorCode::Timeout));

    let statuses: Vec<(ConnectionStatus, u32)> = seen
        .iter()
        .filter_map(|e| match e {
            GpuEvent::Meta(m) if m.active_target == "gpuhost" => {
                Some((m.status, m.consecutive_failures))
            }
            _ => None,
        })
        .collect();
    assert!(statuses.contains(&(ConnectionStatus::Live, 0)));
    assert!(statuses.contains(&(ConnectionStatus::Stale, 1)));
    assert!(statuses.contains(&(ConnectionStatus::Stale, 2)));
    assert!(!statuses.contains(&(ConnectionStatus::Stale, 3)));
    sup.shutdown();
}

#[tokio::test(start_paused = true)]
async fn target_change_starts_fresh_session() {
    let runner = ScriptedSsh::new([
        fail("Could not resolve hostname first"),
        fail("Could not resolve hostname first"),
        Ok(RTX_ROW.into()),
    ]);
    let (sup, mut rx) = start(runner.clone(), SupervisorConfig::default());
    sup.set_target("first", 0);

    let mut seen = Vec::new();
    wait_for(&mut rx, &mut seen, |m| m.consecutive_failures == 2).await;

    sup.set_target("second", 2222);
    let first = wait_for(&mut rx, &mut seen, |m| m.active_target == "second").await;
    assert_eq!(first.status, ConnectionStatus::Connecting);
    assert_eq!(first.consecutive_failures, 0);
    assert_eq!(first.active_port, 2222);

    let live = wait_for(&mut rx, &mut seen, |m| m.status == ConnectionStatus::Live).await;
    assert_eq!(live.active_target, "second");
    let (target, _) = runner.calls().last().cloned().unwrap();
    assert_eq!(target.port(), 2222);
    sup.shutdown();
}

#[tokio::test(start_paused = true)]
async fn retry_now_skips_backoff() {
    let runner = ScriptedSsh::new([fail("Connection refused"), fail("Connection refused")]);
    let config = SupervisorConfig::default()
        .with_policy(RetryPolicy::new().with_backoff_secs(&[600]));
    let (sup, mut rx) = start(runner.clone(), config);
    sup.set_target("gpuhost", 0);

    let mut seen = Vec::new();
    let meta = wait_for(&mut rx, &mut seen, |m| m.consecutive_failures == 1).await;
    assert_eq!(meta.next_retry_in_sec, 600);

    let before = Instant::now();
    sup.retry_now();
    wait_for(&mut rx, &mut seen, |m| m.consecutive_failures == 2).await;
    assert!(Instant::now() - before < Duration::from_secs(600));
    assert_eq!(runner.calls().len(), 2);
    sup.shutdown();
}

#[tokio::test(start_paused = true)]
async fn clearing_target_returns_to_idle() {
    let runner = ScriptedSsh::new([fail("Connection refused")]);
    let (sup, mut rx) = start(runner.clone(), SupervisorConfig::default());
    sup.set_target("gpuhost", 0);

    let mut seen = Vec::new();
    wait_for(&mut rx, &mut seen, |m| m.consecutive_failures == 1).await;

    sup.set_target("", 0);
    let idle = wait_for(&mut rx, &mut seen, |m| m.status == ConnectionStatus::Idle).await;
    assert_eq!(idle, ConnectionMeta::default());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(runner.calls().len(), 1);
    sup.shutdown();
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_event_stream() {
    let runner = ScriptedSsh::new([]);
    let (sup, mut rx) = start(runner, SupervisorConfig::default());
    sup.shutdown();

    let closed = timeout(PATIENCE, async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_target_leaves_session_alone() {
    let runner = ScriptedSsh::new([
        Ok("0, A, 1, 2, 3, 4\n1, B, 5, 6, 7, 8\n".into()),
    ]);
    let (sup, _rx) = start(runner, SupervisorConfig::default());
    let result = sup.test_target("probe", 0).await;
    assert!(result.success);
    assert_eq!(result.gpu_count, 2);
    assert!(sup.target().is_empty());
    sup.shutdown();
}
