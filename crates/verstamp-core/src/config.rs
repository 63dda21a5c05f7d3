//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with defaults that match a typical npm-style project
//!
//! # Supported formats
//!
//! The following configuration file formats are supported:
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `.verstamp.<ext>` in current directory or any parent
//! - `verstamp.<ext>` in current directory or any parent
//! - `~/.config/verstamp/config.<ext>` (user config)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use verstamp_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("version files: {:?}", config.versioning.version_files);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::format::FormatterKind;
use crate::version::IncrementerKind;
use crate::versioner::VersionerKind;

/// The configuration for verstamp.
///
/// Deserialized from config files found during discovery (TOML, YAML, or JSON).
/// Every section is optional; missing keys take their defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// How versions are read, computed, formatted and bundled.
    pub versioning: VersioningConfig,
    /// Where and how the release is recorded.
    pub git: GitConfig,
    /// Hook commands per release phase.
    pub hooks: HooksConfig,
    /// Release command behavior.
    pub release: ReleaseConfig,
}

/// Version resolution and storage.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct VersioningConfig {
    /// Bump level passed to the incrementer (default: `"patch"`).
    ///
    /// Kept as a string so an unknown level surfaces as an invalid-level
    /// error when resolving, not as a config parse failure.
    pub level: String,
    /// Files holding the version. The first is read; all are written.
    pub version_files: Vec<Utf8PathBuf>,
    /// On-disk format of the version files.
    pub versioner: VersionerKind,
    /// How the next version is computed.
    pub incrementer: IncrementerKind,
    /// How the version is displayed in tags and messages.
    pub formatter: FormatterKind,
    /// Prefix used by `formatter = "prefix"`.
    pub tag_prefix: String,
    /// Produce a zip of `HEAD` named after the tag.
    pub bundle: bool,
    /// Directory the archive is written to. Bundling is skipped without it.
    pub bundle_dir: Option<Utf8PathBuf>,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            level: "patch".to_string(),
            version_files: vec![Utf8PathBuf::from("package.json")],
            versioner: VersionerKind::default(),
            incrementer: IncrementerKind::default(),
            formatter: FormatterKind::default(),
            tag_prefix: "v".to_string(),
            bundle: false,
            bundle_dir: None,
        }
    }
}

/// Commit, tag and push settings.
///
/// Messages support `%V` (raw version) and `%FV` (formatted version).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Files staged for the version commit.
    pub add: Vec<String>,
    /// Remote that tags are fetched from and pushed to.
    pub remote: String,
    /// Branch to push. Empty means the checked-out branch.
    pub branch: String,
    /// Commit message template.
    pub commit_message: String,
    /// Tag annotation template.
    pub tag_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            add: vec!["package.json".to_string()],
            remote: "origin".to_string(),
            branch: String::new(),
            commit_message: "%FV".to_string(),
            tag_message: "Releasing %FV".to_string(),
        }
    }
}

/// Hook commands to run after each release phase.
///
/// Each hook is a list of shell commands executed in order. Commands
/// support variable interpolation:
/// - `{version}`: the new version (e.g., `1.2.3`)
/// - `{prev_version}`: the previous version
/// - `{tag}`: the pushed tag (e.g., `v1.2.3`)
/// - `{bundle_path}`: absolute path of the archive
///
/// # Example
///
/// ```toml
/// [hooks]
/// post_bundle = ["aws s3 cp {bundle_path} s3://releases/"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HooksConfig {
    /// Commands to run after the version files are written.
    pub post_write: Vec<String>,
    /// Commands to run after the commit and tag are pushed.
    pub post_record: Vec<String>,
    /// Commands to run after the archive is written.
    pub post_bundle: Vec<String>,
}

/// Release command behavior.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Prompt for confirmation before mutating anything (default: true).
    ///
    /// The `--yes`/`-y` CLI flag overrides this at runtime.
    pub confirm: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self { confirm: true }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "verstamp";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/verstamp/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal.
    ///
    /// When walking up directories, stop if we find a directory containing
    /// this file or directory name. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. User config (`~/.config/verstamp/config.<ext>`)
    /// 4. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        let sources = self.sources();
        tracing::debug!(count = sources.len(), "loading configuration");

        let config: Config = sources
            .iter()
            .fold(
                Figment::new().merge(Serialized::defaults(Config::default())),
                |figment, path| Self::merge_file(figment, path),
            )
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;

        tracing::info!(
            log_level = config.log_level.as_str(),
            versioner = ?config.versioning.versioner,
            remote = %config.git.remote,
            "configuration loaded"
        );
        Ok(config)
    }

    /// The config files [`load`](Self::load) merges, lowest precedence first:
    /// user config, then project config, then explicit files in order.
    pub fn sources(&self) -> Vec<Utf8PathBuf> {
        let user = self
            .include_user_config
            .then(find_user_config)
            .flatten();
        let project = self
            .project_search_root
            .as_deref()
            .and_then(|root| self.find_project_config(root));

        user.into_iter()
            .chain(project)
            .chain(self.explicit_files.iter().cloned())
            .collect()
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<Config> {
        if self.sources().is_empty() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            // Check for boundary marker
            if let Some(ref marker) = self.boundary_marker {
                let marker_path = dir.join(marker);
                if marker_path.exists() && dir != start {
                    // Found boundary in a parent dir, stop searching
                    break;
                }
            }

            // Check for config files in this directory (try each extension)
            for ext in CONFIG_EXTENSIONS {
                // Dotfile first (.verstamp.toml)
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                // Then the plain name (verstamp.toml)
                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("toml") => figment.merge(Toml::file_exact(path.as_str())),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Find the project config file path without loading it.
///
/// Useful for commands that need to know where config is located.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new()
        .with_project_search(start.as_ref())
        .without_boundary_marker()
        .find_project_config(start.as_ref())
}

/// Get the project directories for XDG-compliant path resolution.
///
/// Returns `None` if the home directory cannot be determined.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// First `config.<ext>` in the user config directory.
fn find_user_config() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

/// Get the user config directory path.
///
/// Returns `~/.config/verstamp/` on Linux, `~/Library/Application Support/verstamp/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
