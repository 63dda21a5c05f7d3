//! Next command: preview the version a release would produce.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use verstamp_core::config::Config;
use verstamp_core::release::{Release, ReleaseEvent, ReleaseOptions};
use verstamp_core::version::BumpLevel;

/// Arguments for the `next` subcommand.
#[derive(Args, Debug, Default)]
pub struct NextArgs {
    /// Bump level (overrides config)
    #[arg(short, long, value_enum)]
    pub level: Option<BumpLevel>,

    /// Pick the bump level from a list
    #[arg(short, long, conflicts_with = "level")]
    pub interactive: bool,
}

#[derive(Serialize)]
struct NextVersion {
    previous: String,
    next: String,
    level: String,
}

/// Resolve and print the next version. Fetches tags, writes nothing.
#[instrument(name = "cmd_next", skip_all, fields(json_output))]
pub fn cmd_next(
    args: NextArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, level = ?args.level, "executing next command");

    let configured = config.versioning.level.as_str();
    let level = super::resolve_level(
        args.level,
        args.interactive && !global_json,
        || {
            let versioner = config.versioning.versioner.build();
            verstamp_core::store::VersionStore::new(
                cwd,
                &config.versioning.version_files,
                versioner.as_ref(),
            )
            .read()
            .context("failed to read current version")
        },
        configured,
    )?;

    let options = ReleaseOptions {
        dry_run: true,
        level: level.clone(),
        ..ReleaseOptions::default()
    };
    let mut release = Release::new(cwd, config, options);
    let mut ignore = |_: ReleaseEvent| {};
    release
        .read_previous(&mut ignore)
        .context("failed to read current version")?;
    release
        .resolve_current(&mut ignore)
        .context("failed to resolve next version")?;

    let context = release.context();
    let next = NextVersion {
        previous: context.previous.clone(),
        next: context.version().to_string(),
        level: level.unwrap_or_else(|| configured.to_string()),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&next)?);
    } else {
        println!(
            "{} → {} {}",
            next.previous.dimmed(),
            next.next.green().bold(),
            format!("({})", next.level).dimmed(),
        );
    }

    Ok(())
}
