use std::io::Write;
use std::time::Duration;

use placement::app::{Application, RunOutcome};
use placement::common::{load_config, read_group_file, StartupConfig};
use placement::shutdown::{ShutdownManager, ShutdownReason};
use placement_core::{HandleStatus, Runnable};
use placement_testing_utils::StubAgent;
use tokio::time::timeout;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn test_local_group_runs_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let group_path = write_file(
        &dir,
        "pipeline.toml",
        r#"
        [[encoder]]
        name = "enc"

        [[indexer]]
        "#,
    );
    let startup = StartupConfig {
        config_path: Some(write_file(&dir, "placement.toml", "")),
        group_path: group_path.clone(),
        ..StartupConfig::default()
    };

    let app = Application::new(load_config(&startup).unwrap())
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    let (name, group) = read_group_file(&group_path).unwrap();
    let placement = app.plan(&name, group).unwrap();

    let plan = placement.describe();
    assert_eq!(plan.name, "pipeline");
    assert_eq!(plan.kind, "local_aggregate");
    assert_eq!(plan.members.len(), 2);

    let manager = ShutdownManager::new();
    let rx = manager.subscribe().await;
    let trigger = manager.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.shutdown(ShutdownReason::Requested).await;
    });

    let outcome = timeout(Duration::from_secs(5), app.run(&placement, rx))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome, RunOutcome::Shutdown(ShutdownReason::Requested));
    assert_eq!(placement.status().await.unwrap(), HandleStatus::Stopped);
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_ends_when_placement_exits() {
    let dir = tempfile::tempdir().unwrap();
    let group_path = write_file(
        &dir,
        "job.json",
        r#"{ "task": { "command": "sh", "args": ["-c", "exit 0"] } }"#,
    );

    let app = Application::new(Default::default())
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    let (name, group) = read_group_file(&group_path).unwrap();
    let placement = app.plan(&name, group).unwrap();

    let manager = ShutdownManager::new();
    let outcome = timeout(
        Duration::from_secs(5),
        app.run(&placement, manager.subscribe().await),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, RunOutcome::Exited(HandleStatus::Stopped));
}

#[tokio::test]
async fn test_remote_group_delegated_and_stopped() {
    let agent = StubAgent::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_file(
        &dir,
        "placement.toml",
        &format!("[remote]\nagent_port = {}\n", agent.port()),
    );
    let group_path = write_file(
        &dir,
        "flow.json",
        &format!(
            r#"{{ "encoder": [{{ "host": "{0}" }}, {{ "host": "{0}" }}] }}"#,
            agent.host()
        ),
    );

    let startup = StartupConfig {
        config_path: Some(config_path),
        group_path: group_path.clone(),
        ..StartupConfig::default()
    };
    let app = Application::new(load_config(&startup).unwrap())
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    let (name, group) = read_group_file(&group_path).unwrap();
    let placement = app.plan(&name, group).unwrap();
    assert_eq!(placement.describe().kind, "remote_coordinated/delegated");

    let manager = ShutdownManager::new();
    let rx = manager.subscribe().await;
    manager.shutdown(ShutdownReason::Requested).await;

    app.run(&placement, rx).await.unwrap();

    assert_eq!(agent.requests_for("POST", "groups").len(), 1);
    assert_eq!(agent.requests_for("DELETE", "groups").len(), 1);
    assert_eq!(agent.running_count(), 0);
}

#[tokio::test]
async fn test_no_remote_pins_group_locally() {
    let dir = tempfile::tempdir().unwrap();
    let group_path = write_file(&dir, "flow.json", r#"{ "encoder": { "host": "203.0.113.5" } }"#);
    let startup = StartupConfig {
        config_path: Some(write_file(&dir, "placement.toml", "")),
        group_path: group_path.clone(),
        no_remote: true,
        ..StartupConfig::default()
    };

    let app = Application::new(load_config(&startup).unwrap()).unwrap();
    let (name, group) = read_group_file(&group_path).unwrap();
    let placement = app.plan(&name, group).unwrap();

    let plan = placement.describe();
    assert_eq!(plan.kind, "local_aggregate");
    assert_eq!(plan.members[0].host, None);
}
