//! Facade and settings wiring

use std::fs;

use gpubar_core::settings::CONFIG_FILE_NAME;
use gpubar_core::{
    AppSettings, ConnectionStatus, DisplayMode, GpuBarService, GpuEvent, RemoteMetricsClient,
    SettingsManager, SshConfigResolver,
};

use super::{RTX_ROW, ScriptedSsh, fail};

#[tokio::test(start_paused = true)]
async fn facade_round_trip() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join("config"), "Host rig\n HostName 10.9.8.7\n Port 2022\n").unwrap();

    let runner = ScriptedSsh::new([fail("bash: nvidia-smi: command not found"), Ok(RTX_ROW.into())]);
    let (service, mut events) = GpuBarService::start_with(
        AppSettings::default().supervisor_config(),
        RemoteMetricsClient::new(runner.clone()),
        SshConfigResolver::with_paths(home.path().join("config"), home.path()),
    );

    let aliases = service.list_ssh_config_connections();
    assert_eq!(aliases.len(), 1);
    let rig = &aliases[0];

    let probe = service.test_connection(&rig.target, i64::from(rig.port)).await;
    assert!(!probe.success);
    assert_eq!(probe.code, "nvidia_smi_missing");

    service.set_connection(&rig.target, i64::from(rig.port));
    loop {
        match events.recv().await {
            Some(GpuEvent::Meta(meta)) if meta.status == ConnectionStatus::Live => {
                assert_eq!(meta.active_target, "10.9.8.7");
                assert_eq!(meta.active_port, 2022);
                break;
            }
            Some(_) => {}
            None => panic!("worker stopped"),
        }
    }
    service.retry_connection();
    service.shutdown();
}

#[test]
fn settings_drive_supervisor_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[monitoring]\npoll_interval_secs = 120\n\n[retry]\nbackoff_secs = [3]\nerror_threshold = 2\n\n[display]\nmode = \"multi\"\n",
    )
    .unwrap();

    let settings = SettingsManager::with_config_dir(dir.path()).load().unwrap();
    let config = settings.supervisor_config();
    assert_eq!(config.poll_interval, std::time::Duration::from_secs(60));
    assert_eq!(config.policy.error_threshold(), 2);
    assert_eq!(config.policy.delay_for(4), std::time::Duration::from_secs(3));
    assert_eq!(settings.display.mode, DisplayMode::Multi);
}
