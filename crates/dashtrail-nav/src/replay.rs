//! `dashtrail-replay`: drive a controller from a JSON-lines event script.
//!
//! Each non-blank line is one event:
//!
//! ```text
//! {"event": "mount", "path": "/d/a/home", "query": {"orgId": "1"}}
//! {"event": "route", "path": "/d/b/detail", "query": {"var-host": "web-1"}}
//! {"event": "pop", "path": "/d/a/home", "query": {"breadcrumb": "a"}}
//! {"event": "click", "id": "a"}
//! ```
//!
//! Every event prints one JSON line with its outcome, the trail ids and the
//! frame messages it produced. The final line carries the full trail.

use std::io::Write;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use dashtrail_core::config::{load_config, Config, LoggingConfig, PanelOptions};
use dashtrail_core::params::QueryParams;
use dashtrail_directory::http::{HttpDirectoryClient, HttpDirectoryConfig};
use dashtrail_directory::mock::{DirectoryFixture, MockDirectoryClient};
use dashtrail_directory::service::DirectoryClient;

use crate::controller::{CycleOutcome, NavigationController};
use crate::memory::{MemoryMessaging, MemoryNavigation, MemoryStorage};
use crate::ports::{Location, NavigationPort};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub script: String,
    pub config_file: String,
    pub directory_file: String,
    pub log_level: String,
    pub log_format: String,
}

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Mount {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        query: QueryParams,
    },
    Route {
        path: String,
        #[serde(default)]
        query: QueryParams,
    },
    Pop {
        path: String,
        #[serde(default)]
        query: QueryParams,
    },
    Click {
        id: String,
    },
}

impl ScriptEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Mount { .. } => "mount",
            Self::Route { .. } => "route",
            Self::Pop { .. } => "pop",
            Self::Click { .. } => "click",
        }
    }
}

/// Parse a whole script. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptEvent>, String> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|err| format!("script line {}: {err}", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn outcome_label(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Synced => "synced".to_string(),
        CycleOutcome::Degraded(err) => format!("degraded: {err}"),
        CycleOutcome::Superseded => "superseded".to_string(),
    }
}

/// A controller wired to in-memory ports.
pub struct Replay {
    controller: NavigationController,
    navigation: Arc<MemoryNavigation>,
    messaging: Arc<MemoryMessaging>,
    origin: String,
}

impl Replay {
    pub fn new(
        panel: PanelOptions,
        search_limit: usize,
        directory: Arc<dyn DirectoryClient>,
        origin: &str,
    ) -> Self {
        let origin = origin.trim_end_matches('/').to_string();
        let navigation = Arc::new(MemoryNavigation::new(Location::new(
            origin.as_str(),
            "/",
            QueryParams::new(),
        )));
        let messaging = Arc::new(MemoryMessaging::new());
        let controller = NavigationController::new(
            panel,
            directory,
            navigation.clone(),
            Arc::new(MemoryStorage::new()),
            messaging.clone(),
        )
        .with_search_limit(search_limit);
        Self {
            controller,
            navigation,
            messaging,
            origin,
        }
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    fn location(&self, path: &str, query: QueryParams) -> Location {
        Location::new(self.origin.as_str(), path, query)
    }

    /// Apply one event and describe what happened.
    pub async fn apply(&self, event: ScriptEvent) -> Value {
        let name = event.name();
        let posted_before = self.messaging.count();
        let outcome = match event {
            ScriptEvent::Mount { path, query } => {
                if path.is_some() || !query.is_empty() {
                    let path = path.unwrap_or_else(|| self.navigation.current_location().path);
                    self.navigation.set_location(self.location(&path, query));
                }
                outcome_label(&self.controller.mount().await)
            }
            ScriptEvent::Route { path, query } => {
                self.navigation.set_location(self.location(&path, query));
                outcome_label(&self.controller.route_changed().await)
            }
            ScriptEvent::Pop { path, query } => {
                self.navigation.pop_to(self.location(&path, query));
                outcome_label(&self.controller.history_popped().await)
            }
            ScriptEvent::Click { id } => match self.controller.navigate_to_crumb(&id) {
                Some(destination) => format!("navigated: {destination}"),
                None => format!("ignored: {id} is not on the trail"),
            },
        };
        let messages: Vec<Value> = self
            .messaging
            .messages()
            .into_iter()
            .skip(posted_before)
            .collect();
        let trail: Vec<String> = self
            .controller
            .trail()
            .into_iter()
            .map(|item| item.id)
            .collect();
        json!({
            "event": name,
            "outcome": outcome,
            "trail": trail,
            "location": self.navigation.current_location().href(),
            "messages": messages,
        })
    }

    /// Run `events` in order, writing one JSON line per event and a final
    /// line with the full trail.
    pub async fn run<W: Write>(&self, events: Vec<ScriptEvent>, out: &mut W) -> Result<(), String> {
        for event in events {
            let step = self.apply(event).await;
            writeln!(out, "{step}").map_err(|err| format!("write output: {err}"))?;
        }
        let view = self.controller.view();
        let summary = json!({ "trail": view.items, "showText": view.show_text });
        writeln!(out, "{summary}").map_err(|err| format!("write output: {err}"))
    }
}

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    run_with_args(&args)
}

pub fn run_with_args(argv: &[String]) -> i32 {
    let parsed = match parse_args(argv) {
        Ok(args) => args,
        Err(err) => {
            eprint!("{err}");
            return 2;
        }
    };
    if parsed.script.trim().is_empty() {
        eprint!("{}", usage(Some("--script is required")));
        return 2;
    }

    let (mut cfg, _used_path) = match load_config(if parsed.config_file.is_empty() {
        None
    } else {
        Some(parsed.config_file.as_str())
    }) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Error loading config: {err}");
            return 1;
        }
    };
    if !parsed.log_level.trim().is_empty() {
        cfg.logging.level = parsed.log_level.trim().to_string();
    }
    if !parsed.log_format.trim().is_empty() {
        cfg.logging.format = parsed.log_format.trim().to_string();
    }
    if let Err(err) = cfg.validate() {
        eprintln!("Invalid config: {err}");
        return 1;
    }
    init_tracing(&cfg.logging);

    let script = match std::fs::read_to_string(parsed.script.trim()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read script: {err}");
            return 1;
        }
    };
    let events = match parse_script(&script) {
        Ok(events) => events,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let directory = match build_directory(&cfg, parsed.directory_file.trim()) {
        Ok(directory) => directory,
        Err(err) => {
            eprintln!("failed to initialize directory: {err}");
            return 1;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return 1;
        }
    };

    let replay = Replay::new(
        cfg.panel.clone(),
        cfg.directory.search_limit,
        directory,
        &cfg.directory.base_url,
    );
    let mut stdout = std::io::stdout().lock();
    match runtime.block_on(replay.run(events, &mut stdout)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn build_directory(cfg: &Config, fixture_path: &str) -> Result<Arc<dyn DirectoryClient>, String> {
    if !fixture_path.is_empty() {
        let text = std::fs::read_to_string(fixture_path)
            .map_err(|err| format!("read directory fixture: {err}"))?;
        let fixture = DirectoryFixture::from_json(&text).map_err(|err| err.to_string())?;
        return Ok(Arc::new(MockDirectoryClient::from_fixture(fixture)));
    }
    let client = HttpDirectoryClient::new(HttpDirectoryConfig {
        base_url: cfg.directory.base_url.clone(),
        api_token: cfg.directory.api_token.clone(),
        search_limit: cfg.directory.search_limit,
        connect_timeout: cfg.directory.connect_timeout,
        request_timeout: cfg.directory.request_timeout,
    })
    .map_err(|err| err.to_string())?;
    Ok(Arc::new(client))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if logging.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = installed {
        eprintln!("Warning: logging not initialized: {err}");
    }
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut out = Args::default();
    let mut idx = 0usize;

    while idx < argv.len() {
        let token = &argv[idx];
        let (key, inline) = if let Some((k, v)) = token.split_once('=') {
            (k.to_string(), Some(v.to_string()))
        } else {
            (token.to_string(), None)
        };

        match key.as_str() {
            "--script" => {
                out.script = take_value(argv, &mut idx, inline, "--script")?;
            }
            "--config" => {
                out.config_file = take_value(argv, &mut idx, inline, "--config")?;
            }
            "--directory" => {
                out.directory_file = take_value(argv, &mut idx, inline, "--directory")?;
            }
            "--log-level" => {
                out.log_level = take_value(argv, &mut idx, inline, "--log-level")?;
            }
            "--log-format" => {
                out.log_format = take_value(argv, &mut idx, inline, "--log-format")?;
            }
            "-h" | "--help" => return Err(usage(None)),
            other => return Err(usage(Some(&format!("unknown flag: {other}")))),
        }
        idx += 1;
    }

    Ok(out)
}

fn take_value(
    argv: &[String],
    idx: &mut usize,
    inline: Option<String>,
    flag: &str,
) -> Result<String, String> {
    if let Some(value) = inline {
        return Ok(value);
    }
    *idx += 1;
    argv.get(*idx)
        .cloned()
        .ok_or_else(|| usage(Some(&format!("missing value for {flag}"))))
}

fn usage(message: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(msg) = message {
        if !msg.trim().is_empty() {
            out.push_str(&format!("Error: {msg}\n\n"));
        }
    }
    out.push_str("Usage: dashtrail-replay --script FILE [options]\n\n");
    out.push_str("Options:\n");
    out.push_str("  --script string      JSON-lines event script (required)\n");
    out.push_str("  --config string      config file (default is $HOME/.config/dashtrail/config.yaml)\n");
    out.push_str("  --directory string   JSON directory fixture; omit to query directory.base_url\n");
    out.push_str("  --log-level string   override logging level (trace, debug, info, warn, error)\n");
    out.push_str("  --log-format string  override logging format (json, console)\n");
    out
}
