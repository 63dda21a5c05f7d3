//! Doctor command: diagnose configuration and environment.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};
use verstamp_core::config::{self, ConfigLoader};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    config: ConfigStatus,
    tools: ToolStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// User config directory
    user_dir: Option<String>,
    /// Config files that would be merged, lowest precedence first
    sources: Vec<String>,
}

#[derive(Serialize)]
struct ToolStatus {
    /// Resolved path of the git binary
    git: Option<String>,
    /// Whether `cwd` is inside a work tree
    in_repository: bool,
}

#[derive(Serialize)]
struct EnvironmentInfo {
    /// Current working directory
    cwd: String,
    /// Relevant environment variables
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

const WATCHED_VARS: &[(&str, &str)] = &[
    ("XDG_CONFIG_HOME", "Override config directory"),
    ("RUST_LOG", "Log filter directive"),
    ("VERSTAMP_LOG_PATH", "Explicit log file path"),
    ("VERSTAMP_LOG_DIR", "Log directory"),
];

impl DoctorReport {
    fn gather(cwd: &camino::Utf8Path) -> Self {
        let sources = ConfigLoader::new().with_project_search(cwd).sources();
        let repo = verstamp_core::git::Repo::new(cwd);

        Self {
            config: ConfigStatus {
                user_dir: config::user_config_dir().map(|p| p.to_string()),
                sources: sources.iter().map(ToString::to_string).collect(),
            },
            tools: ToolStatus {
                git: which::which("git")
                    .ok()
                    .map(|p| p.display().to_string()),
                in_repository: repo.is_inside().unwrap_or(false),
            },
            environment: EnvironmentInfo {
                cwd: cwd.to_string(),
                env_vars: WATCHED_VARS
                    .iter()
                    .map(|&(name, description)| EnvVar {
                        name,
                        value: std::env::var(name).ok(),
                        description,
                    })
                    .collect(),
            },
        }
    }
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(cwd);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration".bold().underline());
    if report.config.sources.is_empty() {
        println!("  {} No config file found, using defaults", "○".yellow());
        offer_config_creation()?;
    } else {
        for source in &report.config.sources {
            println!("  {} {}", "✓".green(), source.cyan());
        }
    }
    print!("  {}: ", "User config dir".dimmed());
    match report.config.user_dir {
        Some(ref dir) => println!("{}", dir.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
    println!();

    println!("{}", "Tools".bold().underline());
    match report.tools.git {
        Some(ref git) => println!("  {} git: {}", "✓".green(), git.cyan()),
        None => println!("  {} git not found on PATH", "✗".red()),
    }
    if report.tools.in_repository {
        println!("  {} inside a git work tree", "✓".green());
    } else {
        println!("  {} not inside a git work tree", "○".yellow());
    }
    println!();

    println!("{}", "Environment".bold().underline());
    println!("  {}: {}", "Working directory".dimmed(), cwd.cyan());

    let set_vars: Vec<_> = report
        .environment
        .env_vars
        .iter()
        .filter(|v| v.value.is_some())
        .collect();

    if set_vars.is_empty() {
        println!("  {} No XDG/logging overrides set", "○".dimmed());
    } else {
        for var in set_vars {
            println!(
                "  {}: {} {}",
                var.name.dimmed(),
                var.value.as_deref().unwrap_or("").cyan(),
                format!("({})", var.description).dimmed()
            );
        }
    }

    Ok(())
}

/// Offer to create a default config file when none exists.
fn offer_config_creation() -> anyhow::Result<()> {
    let Some(config_dir) = config::user_config_dir() else {
        return Ok(());
    };

    let config_path = config_dir.join("config.yaml");

    // Don't prompt if running non-interactively
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let create = Confirm::new("Create a default config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    if let Ok(true) = create {
        std::fs::create_dir_all(&config_dir)?;
        let yaml = serde_saphyr::to_string(&config::Config::default())?;
        std::fs::write(&config_path, yaml)?;
        println!("  {} Created {}", "✓".green(), config_path.cyan());
    }

    Ok(())
}
