#![cfg(unix)]

use camino::{Utf8Path, Utf8PathBuf};
use skirmish_app_core::{EngineSettingsPort, LaunchOrchestrator};
use skirmish_core::{
    LaunchEvent, LaunchRequest, OptionTable, ProcessState, Rendezvous, SettingsPatch,
};
use std::os::unix::fs::PermissionsExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn rendezvous() -> Rendezvous {
    Rendezvous {
        address: "127.0.0.1".into(),
        port: 47001,
    }
}

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    (dir, root)
}

/// Engine stub: prints each argument on its own line, then leaves a marker.
fn echo_engine(root: &Utf8Path) -> Utf8PathBuf {
    let engine_dir = root.join("engine");
    std::fs::create_dir_all(&engine_dir).unwrap();
    let path = engine_dir.join("spring");
    let marker = root.join("spawned");
    std::fs::write(
        &path,
        format!("#!/bin/sh\nfor arg in \"$@\"; do echo \"$arg\"; done\ntouch '{marker}'\n"),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn stdout_lines(events: &[LaunchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            LaunchEvent::Stdout(line) => Some(line.clone()),
            _ => None,
        })
        .collect()
}

struct RejectingSettings {
    calls: Arc<AtomicUsize>,
}

impl EngineSettingsPort for RejectingSettings {
    fn apply(&self, _write_dir: &Utf8Path, _patch: &SettingsPatch) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("invalid engine setting \"Bad Key\": key contains whitespace")
    }
}

#[tokio::test]
async fn settings_failure_is_reported_after_launch_returns_and_nothing_spawns() {
    let (_guard, root) = temp_root();
    let engine = echo_engine(&root);
    let calls = Arc::new(AtomicUsize::new(0));

    let orchestrator = LaunchOrchestrator::new(rendezvous())
        .expect("orchestrator")
        .with_settings_port(RejectingSettings {
            calls: Arc::clone(&calls),
        });

    let handle = orchestrator.launch(LaunchRequest::new(engine, root.join("write")), Vec::new());

    // Single-threaded test runtime: the launch task has not run yet.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(handle.state(), ProcessState::Idle);

    let (events, state) = handle.collect().await;
    assert_eq!(
        events,
        vec![LaunchEvent::Failed(
            "invalid engine setting \"Bad Key\": key contains whitespace".into()
        )]
    );
    assert!(matches!(state, ProcessState::Failed { exit_code: None, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!root.join("spawned").exists());
    assert!(!root.join("write").join("script.txt").exists());
}

#[tokio::test]
async fn malformed_override_in_request_aborts_before_spawn() {
    let (_guard, root) = temp_root();
    let engine = echo_engine(&root);

    let mut request = LaunchRequest::new(engine, root.join("write"));
    request.settings = SettingsPatch {
        defaults: OptionTable::new(),
        overrides: [("Broken Key", "1")].into_iter().collect(),
    };

    let orchestrator = LaunchOrchestrator::new(rendezvous()).expect("orchestrator");
    let (events, _) = orchestrator.launch(request, Vec::new()).collect().await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        LaunchEvent::Failed(msg) => {
            assert!(msg.contains("Failed to apply engine settings"), "{msg}");
            assert!(msg.contains("Broken Key"), "{msg}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(!root.join("spawned").exists());
}

#[tokio::test]
async fn start_script_replaces_caller_arguments() {
    let (_guard, root) = temp_root();
    let engine = echo_engine(&root);
    let write_dir = root.join("write");

    let mut request = LaunchRequest::new(engine, write_dir.clone());
    request.isolation = true;
    request.match_options.game = "byar:test".into();
    request.match_options.map = "Quicksilver 1.1".into();
    request.match_options.mod_options = [("scenario", "intro")].into_iter().collect();
    request.settings.overrides = [("VSync", "1")].into_iter().collect();

    let orchestrator = LaunchOrchestrator::new(rendezvous())
        .expect("orchestrator")
        .with_launcher_version("9.9.9");
    let (events, state) = orchestrator
        .launch(request, vec!["--safemode".into()])
        .collect()
        .await;

    let script_path = write_dir.join("script.txt");
    assert_eq!(
        stdout_lines(&events),
        vec![
            "--write-dir".to_string(),
            write_dir.to_string(),
            "--isolation".to_string(),
            script_path.to_string(),
        ]
    );
    assert!(!stdout_lines(&events).contains(&"--safemode".to_string()));
    assert_eq!(state, ProcessState::Finished { exit_code: 0 });

    let script = std::fs::read_to_string(&script_path).expect("script written");
    assert!(script.starts_with("[GAME]\n{\n    GameType = byar:test;\n"));
    assert!(script.contains("    MapName = Quicksilver 1.1;\n"));
    assert!(script.contains("    _sl_port = 47001;\n"));
    assert!(script.contains(&format!("    _sl_write_path = {write_dir};\n")));
    assert!(script.contains("    _sl_launcher_version = 9.9.9;\n    scenario = intro;\n"));

    let settings = std::fs::read_to_string(write_dir.join("springsettings.cfg")).unwrap();
    assert_eq!(settings, "VSync = 1\n");
    assert!(!write_dir.join("sl-connection.json").exists());
}

#[tokio::test]
async fn connection_file_mode_forwards_caller_arguments() {
    let (_guard, root) = temp_root();
    let engine = echo_engine(&root);
    let write_dir = root.join("write");

    let mut request = LaunchRequest::new(engine, write_dir.clone());
    request.use_external_config_file = false;

    let orchestrator = LaunchOrchestrator::new(rendezvous())
        .expect("orchestrator")
        .with_launcher_version("9.9.9");
    let (events, state) = orchestrator
        .launch(request, vec!["--safemode".into(), "--nocolor".into()])
        .collect()
        .await;

    assert_eq!(
        stdout_lines(&events),
        vec![
            "--write-dir".to_string(),
            write_dir.to_string(),
            "--safemode".to_string(),
            "--nocolor".to_string(),
        ]
    );
    assert_eq!(state, ProcessState::Finished { exit_code: 0 });

    let raw = std::fs::read_to_string(write_dir.join("sl-connection.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["_sl_address"], "127.0.0.1");
    assert_eq!(json["_sl_port"], 47001);
    assert_eq!(json["_sl_write_path"], write_dir.as_str());
    assert_eq!(json["_sl_launcher_version"], "9.9.9");
    assert!(!write_dir.join("script.txt").exists());
}

#[tokio::test]
async fn unwritable_write_dir_fails_without_spawning() {
    let (_guard, root) = temp_root();
    let engine = echo_engine(&root);
    // A regular file where the write directory should be.
    let write_dir = root.join("not-a-dir");
    std::fs::write(&write_dir, b"").unwrap();

    let orchestrator = LaunchOrchestrator::new(rendezvous()).expect("orchestrator");
    let (events, _) = orchestrator
        .launch(LaunchRequest::new(engine, write_dir), Vec::new())
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        LaunchEvent::Failed(msg) if msg.starts_with("Failed to write start script")
    ));
    assert!(!root.join("spawned").exists());
}

#[tokio::test]
async fn missing_engine_reports_once_through_orchestrator() {
    let (_guard, root) = temp_root();
    let engine_dir = root.join("engine").join("105.1");
    std::fs::create_dir_all(&engine_dir).unwrap();

    let orchestrator = LaunchOrchestrator::new(rendezvous()).expect("orchestrator");
    let (events, _) = orchestrator
        .launch(
            LaunchRequest::new(engine_dir.join("spring"), root.join("write")),
            Vec::new(),
        )
        .collect()
        .await;

    assert_eq!(
        events,
        vec![LaunchEvent::Failed(skirmish_config::MISSING_ENGINE_MESSAGE.into())]
    );
    assert!(!engine_dir.exists());
}
