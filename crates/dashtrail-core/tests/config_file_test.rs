#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Config loading from YAML files on disk.

use std::io::Write;
use std::time::Duration;

use dashtrail_core::config::{load_config_with_env, ENV_LOG_LEVEL};

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn yaml_sections_override_defaults() {
    let file = write_config(
        r#"
panel:
  isRootDashboard: true
  breadcrumbItemsMaxAmount: 10
directory:
  base_url: https://grafana.example
  api_token: secret
  search_limit: 200
  request_timeout_ms: 2500
logging:
  level: debug
  format: json
"#,
    );
    let path = file.path().to_str().unwrap();

    let (cfg, used) = load_config_with_env(Some(path), |_| None).unwrap();

    assert_eq!(used.as_deref(), Some(file.path()));
    assert!(cfg.panel.is_root_dashboard);
    assert!(!cfg.panel.hide_text_in_root_dashboard);
    assert_eq!(cfg.panel.breadcrumb_items_max_amount, 10);
    assert_eq!(cfg.directory.base_url, "https://grafana.example");
    assert_eq!(cfg.directory.api_token.as_deref(), Some("secret"));
    assert_eq!(cfg.directory.search_limit, 200);
    assert_eq!(cfg.directory.request_timeout, Duration::from_millis(2500));
    assert_eq!(cfg.directory.connect_timeout, Duration::from_secs(2));
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.logging.format, "json");
    assert!(cfg.validate().is_ok());
}

#[test]
fn environment_beats_file() {
    let file = write_config("logging:\n  level: debug\n");
    let path = file.path().to_str().unwrap();

    let (cfg, _) = load_config_with_env(Some(path), |key| {
        (key == ENV_LOG_LEVEL).then(|| "warn".to_string())
    })
    .unwrap();

    assert_eq!(cfg.logging.level, "warn");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");

    let err = load_config_with_env(Some(missing.to_str().unwrap()), |_| None).unwrap_err();
    assert!(err.contains("failed to load config file"), "err={err}");
}

#[test]
fn unparsable_yaml_is_an_error() {
    let file = write_config("panel: [not, a, map]\n");
    let err = load_config_with_env(Some(file.path().to_str().unwrap()), |_| None).unwrap_err();
    assert!(err.starts_with("parse config"), "err={err}");
}

#[test]
fn xdg_default_location_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_dir = dir.path().join("dashtrail");
    std::fs::create_dir_all(&cfg_dir).unwrap();
    std::fs::write(cfg_dir.join("config.yaml"), "panel:\n  hideTextInRootDashboard: true\n")
        .unwrap();
    let xdg = dir.path().to_str().unwrap().to_string();

    let (cfg, used) = load_config_with_env(None, |key| {
        (key == "XDG_CONFIG_HOME").then(|| xdg.clone())
    })
    .unwrap();

    assert!(used.is_some());
    assert!(cfg.panel.hide_text_in_root_dashboard);
}
