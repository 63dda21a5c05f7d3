//! Current command: print the version in the first version file.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use verstamp_core::config::Config;
use verstamp_core::store::VersionStore;

/// Arguments for the `current` subcommand.
#[derive(Args, Debug, Default)]
pub struct CurrentArgs {
    // Uses global --json flag for structured output
}

#[derive(Serialize)]
struct CurrentVersion {
    version: String,
    file: String,
}

/// Read and print the current version.
#[instrument(name = "cmd_current", skip_all, fields(json_output))]
pub fn cmd_current(
    _args: CurrentArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing current command");

    let versioner = config.versioning.versioner.build();
    let store = VersionStore::new(cwd, &config.versioning.version_files, versioner.as_ref());
    let version = store.read().context("failed to read current version")?;
    let file = store
        .files()
        .first()
        .map(ToString::to_string)
        .unwrap_or_default();

    if global_json {
        let current = CurrentVersion { version, file };
        println!("{}", serde_json::to_string_pretty(&current)?);
    } else {
        println!("{} {}", version.green().bold(), format!("({file})").dimmed());
    }

    Ok(())
}
