//! Configuration for dashtrail.
//!
//! Precedence: defaults < YAML config file < environment overrides. The
//! panel section uses the host's camelCase option names so the same
//! structure deserializes from the panel's JSON options.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_MAX_LENGTH;

pub const ENV_DIRECTORY_URL: &str = "DASHTRAIL_DIRECTORY_URL";
pub const ENV_API_TOKEN: &str = "DASHTRAIL_API_TOKEN";
pub const ENV_MAX_ITEMS: &str = "DASHTRAIL_MAX_ITEMS";
pub const ENV_LOG_LEVEL: &str = "DASHTRAIL_LOG_LEVEL";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub panel: PanelOptions,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

/// Options set on the breadcrumb panel by the dashboard author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelOptions {
    /// The hosting dashboard is the root of the navigation tree; mounting it
    /// resets the trail.
    pub is_root_dashboard: bool,
    pub hide_text_in_root_dashboard: bool,
    pub breadcrumb_items_max_amount: usize,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            is_root_dashboard: false,
            hide_text_in_root_dashboard: false,
            breadcrumb_items_max_amount: DEFAULT_MAX_LENGTH,
        }
    }
}

impl PanelOptions {
    /// Parse the panel's JSON options; missing keys take their defaults.
    pub fn from_panel_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|err| format!("parse panel options: {err}"))
    }

    /// Whether breadcrumb text is rendered.
    pub fn show_text(&self) -> bool {
        !(self.is_root_dashboard && self.hide_text_in_root_dashboard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub search_limit: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            api_token: None,
            search_limit: 1000,
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "console".into(),
        }
    }
}

impl Config {
    /// Validates the configuration, returning an error message on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.panel.breadcrumb_items_max_amount < 1 {
            return Err("panel.breadcrumbItemsMaxAmount must be at least 1".into());
        }

        if self.directory.base_url.trim().is_empty() {
            return Err("directory.base_url is required".into());
        }
        if self.directory.search_limit < 1 {
            return Err("directory.search_limit must be at least 1".into());
        }
        if self.directory.connect_timeout.is_zero() {
            return Err("directory.connect_timeout_ms must be greater than 0".into());
        }
        if self.directory.request_timeout.is_zero() {
            return Err("directory.request_timeout_ms must be greater than 0".into());
        }

        match self.logging.level.to_lowercase().trim() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err("logging.level must be one of trace, debug, info, warn, error".into())
            }
        }
        match self.logging.format.to_lowercase().trim() {
            "console" | "json" => {}
            _ => return Err("logging.format must be one of console, json".into()),
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    #[serde(default)]
    panel: PartialPanelOptions,
    #[serde(default)]
    directory: PartialDirectoryConfig,
    #[serde(default)]
    logging: PartialLoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialPanelOptions {
    #[serde(default)]
    is_root_dashboard: Option<bool>,
    #[serde(default)]
    hide_text_in_root_dashboard: Option<bool>,
    #[serde(default)]
    breadcrumb_items_max_amount: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialDirectoryConfig {
    #[serde(default)]
    base_url: String,
    #[serde(default)]
    api_token: String,
    #[serde(default)]
    search_limit: usize,
    #[serde(default)]
    connect_timeout_ms: u64,
    #[serde(default)]
    request_timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
struct PartialLoggingConfig {
    #[serde(default)]
    level: String,
    #[serde(default)]
    format: String,
}

/// Load config from `config_file` (hard error if explicit and unreadable) or
/// the default location, then apply process environment overrides.
pub fn load_config(config_file: Option<&str>) -> Result<(Config, Option<PathBuf>), String> {
    load_config_with_env(config_file, |key| std::env::var(key).ok())
}

/// Same as `load_config` with an explicit environment lookup.
pub fn load_config_with_env<F>(
    config_file: Option<&str>,
    env: F,
) -> Result<(Config, Option<PathBuf>), String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = Config::default();

    let explicit = config_file
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let (path_to_try, required) = match explicit {
        Some(path) => (Some(path), true),
        None => (default_config_path(&env), false),
    };

    let mut used = None;
    if let Some(path) = path_to_try {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let parsed: PartialConfig =
                    serde_yaml::from_str(&text).map_err(|err| format!("parse config: {err}"))?;
                apply_partial(&mut cfg, parsed);
                used = Some(path);
            }
            Err(err) => {
                if required {
                    return Err(format!("failed to load config file: {err}"));
                }
            }
        }
    }

    apply_env_overrides(&mut cfg, &env)?;
    Ok((cfg, used))
}

fn default_config_path<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(xdg) = env("XDG_CONFIG_HOME").filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(xdg).join("dashtrail").join("config.yaml"));
    }
    env("HOME").filter(|v| !v.trim().is_empty()).map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("dashtrail")
            .join("config.yaml")
    })
}

fn apply_partial(cfg: &mut Config, partial: PartialConfig) {
    if let Some(value) = partial.panel.is_root_dashboard {
        cfg.panel.is_root_dashboard = value;
    }
    if let Some(value) = partial.panel.hide_text_in_root_dashboard {
        cfg.panel.hide_text_in_root_dashboard = value;
    }
    if let Some(value) = partial.panel.breadcrumb_items_max_amount {
        cfg.panel.breadcrumb_items_max_amount = value;
    }
    if !partial.directory.base_url.trim().is_empty() {
        cfg.directory.base_url = partial.directory.base_url.trim().to_string();
    }
    if !partial.directory.api_token.trim().is_empty() {
        cfg.directory.api_token = Some(partial.directory.api_token.trim().to_string());
    }
    if partial.directory.search_limit > 0 {
        cfg.directory.search_limit = partial.directory.search_limit;
    }
    if partial.directory.connect_timeout_ms > 0 {
        cfg.directory.connect_timeout = Duration::from_millis(partial.directory.connect_timeout_ms);
    }
    if partial.directory.request_timeout_ms > 0 {
        cfg.directory.request_timeout = Duration::from_millis(partial.directory.request_timeout_ms);
    }
    if !partial.logging.level.trim().is_empty() {
        cfg.logging.level = partial.logging.level.trim().to_string();
    }
    if !partial.logging.format.trim().is_empty() {
        cfg.logging.format = partial.logging.format.trim().to_string();
    }
}

fn apply_env_overrides<F>(cfg: &mut Config, env: &F) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env(ENV_DIRECTORY_URL).filter(|v| !v.trim().is_empty()) {
        cfg.directory.base_url = url.trim().to_string();
    }
    if let Some(token) = env(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
        cfg.directory.api_token = Some(token.trim().to_string());
    }
    if let Some(raw) = env(ENV_MAX_ITEMS).filter(|v| !v.trim().is_empty()) {
        cfg.panel.breadcrumb_items_max_amount = raw
            .trim()
            .parse()
            .map_err(|err| format!("{ENV_MAX_ITEMS}: {err}"))?;
    }
    if let Some(level) = env(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        cfg.logging.level = level.trim().to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn config_defaults() {
        let cfg = Config::default();
        assert!(!cfg.panel.is_root_dashboard);
        assert!(!cfg.panel.hide_text_in_root_dashboard);
        assert_eq!(cfg.panel.breadcrumb_items_max_amount, 25);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "console");
    }

    #[test]
    fn config_default_validates() {
        assert!(Config::default().validate().is_ok(), "default config must validate");
    }

    #[test]
    fn validate_rejects_zero_max_items() {
        let mut cfg = Config::default();
        cfg.panel.breadcrumb_items_max_amount = 0;
        let err = match cfg.validate() {
            Ok(()) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.contains("breadcrumbItemsMaxAmount"), "err={err}");
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "bogus".into();
        let err = match cfg.validate() {
            Ok(()) => panic!("expected error"),
            Err(err) => err,
        };
        assert!(err.contains("logging.level"), "err={err}");
    }

    #[test]
    fn panel_json_uses_camel_case_and_defaults() {
        let opts = PanelOptions::from_panel_json(r#"{"isRootDashboard": true}"#)
            .unwrap_or_default();
        assert!(opts.is_root_dashboard);
        assert_eq!(opts.breadcrumb_items_max_amount, 25);
        assert!(opts.show_text());

        let hidden = PanelOptions {
            is_root_dashboard: true,
            hide_text_in_root_dashboard: true,
            ..PanelOptions::default()
        };
        assert!(!hidden.show_text());
    }

    #[test]
    fn missing_default_file_is_not_an_error() {
        let (cfg, used) = match load_config_with_env(None, no_env) {
            Ok(value) => value,
            Err(err) => panic!("load: {err}"),
        };
        assert!(used.is_none());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn env_overrides_apply_last() {
        let env = |key: &str| match key {
            ENV_MAX_ITEMS => Some("7".to_string()),
            ENV_DIRECTORY_URL => Some("https://grafana.internal".to_string()),
            _ => None,
        };
        let (cfg, _) = match load_config_with_env(None, env) {
            Ok(value) => value,
            Err(err) => panic!("load: {err}"),
        };
        assert_eq!(cfg.panel.breadcrumb_items_max_amount, 7);
        assert_eq!(cfg.directory.base_url, "https://grafana.internal");
    }

    #[test]
    fn bad_env_number_is_reported() {
        let env = |key: &str| (key == ENV_MAX_ITEMS).then(|| "many".to_string());
        assert!(load_config_with_env(None, env).is_err());
    }
}
