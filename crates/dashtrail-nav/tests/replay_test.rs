#![allow(clippy::expect_used, clippy::unwrap_used)]

//! End-to-end replays: scripts driven through in-memory ports.

use std::sync::Arc;

use dashtrail_core::config::PanelOptions;
use dashtrail_directory::mock::MockDirectoryClient;
use dashtrail_nav::replay::{parse_script, run_with_args, Replay};
use serde_json::Value;

const SCRIPT: &str = r#"
{"event": "mount", "path": "/d/home/home", "query": {"orgId": "1"}}
{"event": "route", "path": "/d/svc/services", "query": {"orgId": "1", "var-env": "prod"}}
{"event": "route", "path": "/d/db/databases", "query": {"orgId": "1"}}
{"event": "click", "id": "svc"}
{"event": "mount", "path": "/d/svc/services", "query": {"orgId": "1", "var-env": "prod"}}
"#;

fn directory() -> MockDirectoryClient {
    MockDirectoryClient::new()
        .with_dashboard("home", "Home")
        .with_dashboard("svc", "Services")
        .with_dashboard("db", "Databases")
}

fn lines(out: &[u8]) -> Vec<Value> {
    String::from_utf8(out.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn replay_prints_one_line_per_event_and_a_summary() {
    let replay = Replay::new(
        PanelOptions::default(),
        100,
        Arc::new(directory()),
        "http://grafana.test/",
    );
    let mut out = Vec::new();
    replay
        .run(parse_script(SCRIPT).unwrap(), &mut out)
        .await
        .unwrap();

    let lines = lines(&out);
    assert_eq!(lines.len(), 6);

    assert_eq!(lines[0]["event"], "mount");
    assert_eq!(lines[0]["outcome"], "synced");
    assert_eq!(lines[0]["trail"], serde_json::json!(["home"]));
    assert_eq!(lines[0]["messages"][0]["dashboard"], "home");

    assert_eq!(lines[2]["trail"], serde_json::json!(["home", "svc", "db"]));

    assert_eq!(lines[3]["event"], "click");
    assert_eq!(
        lines[3]["outcome"],
        "navigated: http://grafana.test/d/svc/services?orgId=1&var-env=prod"
    );
    assert_eq!(lines[3]["trail"], serde_json::json!(["home", "svc"]));
    assert_eq!(lines[3]["messages"][0]["passthroughParams"], "&var-env=prod");

    // The reload after the click seeds from session storage.
    assert_eq!(lines[4]["trail"], serde_json::json!(["home", "svc"]));
    assert_eq!(
        lines[4]["location"],
        "http://grafana.test/d/svc/services?breadcrumb=home%2Csvc&orgId=1&var-env=prod"
    );

    let summary = &lines[5];
    assert_eq!(summary["showText"], true);
    assert_eq!(summary["trail"][1]["displayName"], "Services");
    assert_eq!(replay.controller().trail().len(), 2);
}

#[tokio::test]
async fn clicking_an_unknown_crumb_is_reported() {
    let replay = Replay::new(
        PanelOptions::default(),
        100,
        Arc::new(directory()),
        "http://grafana.test",
    );
    let events = parse_script(r#"{"event": "click", "id": "nope"}"#).unwrap();
    let mut out = Vec::new();
    replay.run(events, &mut out).await.unwrap();
    let lines = lines(&out);
    assert_eq!(lines[0]["outcome"], "ignored: nope is not on the trail");
    assert_eq!(lines[1]["trail"], serde_json::json!([]));
}

#[test]
fn binary_entry_point_runs_a_fixture_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("events.jsonl");
    let fixture = dir.path().join("directory.json");
    let config = dir.path().join("config.yaml");
    std::fs::write(&script, SCRIPT).unwrap();
    std::fs::write(
        &fixture,
        r#"{"org": 1, "dashboards": [
            {"id": "home", "title": "Home", "path": "/d/home/home"},
            {"id": "svc", "title": "Services", "path": "/d/svc/services"},
            {"id": "db", "title": "Databases", "path": "/d/db/databases"}
        ]}"#,
    )
    .unwrap();
    std::fs::write(
        &config,
        "directory:\n  base_url: http://grafana.test\nlogging:\n  level: warn\n",
    )
    .unwrap();

    let argv: Vec<String> = vec![
        "--script".into(),
        script.display().to_string(),
        "--directory".into(),
        fixture.display().to_string(),
        format!("--config={}", config.display()),
    ];
    assert_eq!(run_with_args(&argv), 0);
}

#[test]
fn binary_entry_point_reports_runtime_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "logging:\n  level: warn\n").unwrap();
    let missing = dir.path().join("missing.jsonl");

    let argv: Vec<String> = vec![
        "--script".into(),
        missing.display().to_string(),
        "--config".into(),
        config.display().to_string(),
    ];
    assert_eq!(run_with_args(&argv), 1);

    let bad = dir.path().join("bad.jsonl");
    std::fs::write(&bad, "{\"event\": \"teleport\"}\n").unwrap();
    let argv: Vec<String> = vec![
        "--script".into(),
        bad.display().to_string(),
        "--config".into(),
        config.display().to_string(),
    ];
    assert_eq!(run_with_args(&argv), 1);
}

#[test]
fn binary_entry_point_rejects_bad_usage() {
    assert_eq!(run_with_args(&["--unknown".to_string()]), 2);
    assert_eq!(run_with_args(&["--config".to_string()]), 2);
}
