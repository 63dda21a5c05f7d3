//! Observability setup: structured JSONL logging.
//!
//! Stdout carries command output (`--json` reports included), so logs go to
//! a daily-rolled file, or to stderr when no log directory is writable.

use std::fs::OpenOptions;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "VERSTAMP_LOG_PATH";
const ENV_LOG_DIR: &str = "VERSTAMP_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Configuration for observability setup.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// The service name used for the log file name and default directory.
    pub service: String,
    /// Directory for JSONL log files from the loaded configuration.
    pub log_dir: Option<Utf8PathBuf>,
}

impl ObservabilityConfig {
    /// Config for this binary, with the configured log directory if any.
    pub fn from_env_with_overrides(log_dir: Option<Utf8PathBuf>) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: Utf8PathBuf,
    file_name: String,
}

impl LogTarget {
    #[cfg(test)]
    fn path(&self) -> Utf8PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Keeps the background log writer alive; hold it until exit.
pub struct ObservabilityGuard {
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let (writer, guard) = match resolve_log_target(&cfg.service, cfg.log_dir.as_deref()) {
        Ok(target) => tracing_appender::non_blocking(tracing_appender::rolling::daily(
            &target.dir,
            &target.file_name,
        )),
        Err(err) => {
            eprintln!("Warning: {err}. Falling back to stderr logging.");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    let log_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init()?;

    tracing::debug!(service = %cfg.service, "observability initialized");

    Ok(ObservabilityGuard { _log_guard: guard })
}

/// Build an `EnvFilter` from CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > `RUST_LOG` > `default_level`
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

// ============================================================================
// Log Target Resolution
// ============================================================================

fn resolve_log_target(service: &str, config_dir: Option<&Utf8Path>) -> Result<LogTarget, String> {
    let var = |name: &str| {
        std::env::var(name)
            .ok()
            .filter(|v: &String| !v.is_empty())
            .map(Utf8PathBuf::from)
    };

    resolve_log_target_with(
        service,
        var(ENV_LOG_PATH),
        var(ENV_LOG_DIR),
        config_dir.map(Utf8Path::to_path_buf),
    )
}

fn resolve_log_target_with(
    service: &str,
    path_override: Option<Utf8PathBuf>,
    dir_override: Option<Utf8PathBuf>,
    config_dir: Option<Utf8PathBuf>,
) -> Result<LogTarget, String> {
    if let Some(path) = path_override {
        return log_target_from_path(&path);
    }

    if let Some(dir) = dir_override.or(config_dir) {
        return log_target_from_dir(dir, service);
    }

    let file_name = format!("{service}{LOG_FILE_SUFFIX}");
    let mut candidates = Vec::new();

    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", service)
        && let Ok(dir) = Utf8PathBuf::from_path_buf(proj_dirs.data_local_dir().join("logs"))
    {
        candidates.push(dir);
    }
    if let Some(dir) = std::env::current_dir()
        .ok()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
    {
        candidates.push(dir);
    }

    candidates
        .into_iter()
        .find(|dir| ensure_writable(dir, &file_name).is_ok())
        .map(|dir| LogTarget {
            dir,
            file_name: file_name.clone(),
        })
        .ok_or_else(|| "No writable log directory found".to_string())
}

fn log_target_from_dir(dir: Utf8PathBuf, service: &str) -> Result<LogTarget, String> {
    let file_name = format!("{service}{LOG_FILE_SUFFIX}");
    ensure_writable(&dir, &file_name)?;
    Ok(LogTarget { dir, file_name })
}

fn log_target_from_path(path: &Utf8Path) -> Result<LogTarget, String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("{ENV_LOG_PATH} must include a file name"))?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    ensure_writable(&dir, &file_name)?;

    Ok(LogTarget { dir, file_name })
}

fn ensure_writable(dir: &Utf8Path, file_name: &str) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create log directory {dir}: {e}"))?;

    let path = dir.join(file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("Failed to open log file {path}: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap().join(name);
        (tmp, dir)
    }

    #[test]
    fn env_filter_quiet_overrides_verbose() {
        assert_eq!(env_filter(true, 2, "info").to_string(), "error");
    }

    #[test]
    fn env_filter_verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 3, "info").to_string(), "trace");
    }

    #[test]
    fn path_override_wins() {
        let (_tmp, dir) = scratch_dir("override");
        let file = dir.join("custom.jsonl");

        let target =
            resolve_log_target_with("verstamp", Some(file.clone()), Some(dir.join("other")), None)
                .unwrap();

        assert_eq!(target.path(), file);
        assert!(file.is_file());
    }

    #[test]
    fn dir_override_beats_config_dir() {
        let (_tmp, dir) = scratch_dir("env");
        let target = resolve_log_target_with(
            "verstamp",
            None,
            Some(dir.clone()),
            Some(dir.join("config")),
        )
        .unwrap();

        assert_eq!(target.dir, dir);
        assert_eq!(target.file_name, "verstamp.jsonl");
    }

    #[test]
    fn config_dir_is_used_without_overrides() {
        let (_tmp, dir) = scratch_dir("config");
        let target = resolve_log_target_with("demo", None, None, Some(dir.clone())).unwrap();

        assert_eq!(target, LogTarget {
            dir,
            file_name: "demo.jsonl".to_string(),
        });
    }
}
