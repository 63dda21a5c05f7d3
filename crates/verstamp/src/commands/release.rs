//! Release command: thin CLI layer over `verstamp_core::release`.

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use verstamp_core::config::Config;
use verstamp_core::release::{PhaseOutcome, Release, ReleaseEvent, ReleaseOptions};
use verstamp_core::version::BumpLevel;

/// Arguments for the `release` subcommand.
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Bump level (overrides config)
    #[arg(short, long, value_enum)]
    pub level: Option<BumpLevel>,

    /// Pick the bump level from a list
    #[arg(short, long, conflicts_with = "level")]
    pub interactive: bool,

    /// Keep the current version: no write, commit or tag
    #[arg(long)]
    pub skip_versioning: bool,

    /// Zip HEAD into the bundle directory (overrides config)
    #[arg(long, conflicts_with = "no_bundle")]
    pub bundle: bool,

    /// Do not bundle (overrides config)
    #[arg(long, conflicts_with = "bundle")]
    pub no_bundle: bool,

    /// Preview what would happen without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Execute the release command.
#[instrument(name = "cmd_release", skip_all)]
pub fn cmd_release(
    args: ReleaseArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = global_json,
        dry_run = args.dry_run,
        skip_versioning = args.skip_versioning,
        "executing release command"
    );

    let bundle = if args.bundle {
        Some(true)
    } else if args.no_bundle {
        Some(false)
    } else {
        None
    };

    let mut release = Release::new(
        cwd,
        config,
        ReleaseOptions {
            skip_versioning: args.skip_versioning,
            dry_run: args.dry_run,
            level: None,
            bundle,
        },
    );
    let is_dry = args.dry_run;
    let mut on_event = |event: ReleaseEvent| {
        if !global_json {
            handle_event(event, is_dry);
        }
    };

    release
        .read_previous(&mut on_event)
        .context("failed to read current version")?;

    let interactive = args.interactive && !args.skip_versioning && !global_json;
    let level = super::resolve_level(
        args.level,
        interactive,
        || Ok(release.context().previous.clone()),
        &config.versioning.level,
    )?;

    if !global_json {
        if is_dry {
            println!("\n{}", "DRY RUN — no changes will be made".yellow().bold());
        }
        println!(
            "\n{}: {} ({})",
            "Release".bold(),
            release.context().previous.dimmed(),
            level.as_deref().unwrap_or(&config.versioning.level),
        );
        println!();
    }

    // Confirm before anything is written (unless dry-run, --yes, or config says no)
    if !is_dry && !global_json && config.release.confirm && !args.yes {
        print_phase_summary(&args, config);
        let confirmed = Confirm::new("Proceed with release?")
            .with_default(true)
            .prompt()
            .context("confirmation prompt failed")?;
        if !confirmed {
            println!("{}", "Release cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    let mut release = release.with_level(level);
    release
        .resolve_current(&mut on_event)
        .context("version resolution failed")?;
    release.record(&mut on_event).context("recording failed")?;
    release.bundle(&mut on_event).context("bundling failed")?;
    let outcome = release.finish();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!();
        if is_dry {
            println!(
                "{} Dry run complete — {} would be released, {} hooks would run",
                "✓".green(),
                outcome.context.version().bold(),
                outcome.hooks_run,
            );
        } else {
            let name = outcome
                .context
                .tag_name
                .as_deref()
                .unwrap_or_else(|| outcome.context.version());
            println!(
                "{} Released {} ({} phases, {} hooks)",
                "✓".green().bold(),
                name.green().bold(),
                outcome.phases.len(),
                outcome.hooks_run,
            );
            if let Some(ref path) = outcome.context.bundle_path {
                println!("  {}: {}", "Bundle".dimmed(), path.cyan());
            }
        }
    }

    Ok(())
}

/// Handle a release event for terminal progress display.
fn handle_event(event: ReleaseEvent, is_dry: bool) {
    match event {
        ReleaseEvent::PhaseStarted(phase) => {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
                spinner.set_style(
                    style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
                );
            }
            spinner.set_message(format!("{phase}..."));
            // Phases are synchronous; the spinner only flashes.
            spinner.finish_and_clear();
        }
        ReleaseEvent::PhaseCompleted(phase, outcome) => match outcome {
            PhaseOutcome::Success { message } => {
                let prefix = if is_dry { "○" } else { "✓" };
                println!(
                    "  {} {} {}",
                    prefix.green(),
                    format!("{phase}").bold(),
                    message.dimmed(),
                );
            }
            PhaseOutcome::Skipped { reason } => {
                println!(
                    "  {} {} {}",
                    "–".yellow(),
                    format!("{phase}").bold(),
                    format!("skipped: {reason}").dimmed(),
                );
            }
        },
        ReleaseEvent::HooksStarted {
            phase,
            count,
            commands,
            will_execute,
        } => {
            if will_execute {
                debug!(%phase, count, "running hooks");
            } else {
                for cmd in &commands {
                    println!("    {} {}", "hook →".dimmed(), cmd.cyan());
                }
            }
        }
        ReleaseEvent::HooksCompleted { phase, count } => {
            debug!(%phase, count, "hooks completed");
        }
    }
}

/// Print a summary of phases and hooks before the confirmation prompt.
fn print_phase_summary(args: &ReleaseArgs, config: &Config) {
    let bundling = if args.bundle {
        true
    } else if args.no_bundle {
        false
    } else {
        config.versioning.bundle
    };
    let phases: &[(&str, bool)] = &[
        ("write", !args.skip_versioning),
        ("record", !args.skip_versioning),
        ("bundle", bundling),
    ];

    let active: Vec<&str> = phases
        .iter()
        .filter(|(_, on)| *on)
        .map(|(n, _)| *n)
        .collect();
    let skipped: Vec<&str> = phases
        .iter()
        .filter(|(_, on)| !*on)
        .map(|(n, _)| *n)
        .collect();

    print!("  {}: {}", "Phases".dimmed(), active.join(", ").bold());
    if !skipped.is_empty() {
        print!(" {}", format!("(skip: {})", skipped.join(", ")).dimmed());
    }
    println!();

    if !args.skip_versioning {
        println!(
            "  {}: {} → {} {}",
            "Push".dimmed(),
            config.git.remote,
            if config.git.branch.is_empty() {
                "current branch"
            } else {
                config.git.branch.as_str()
            },
            format!("(stage: {})", config.git.add.join(", ")).dimmed(),
        );
    }

    let hook_count = count_hooks(config);
    if hook_count > 0 {
        println!(
            "  {}: {} hook command{}",
            "Hooks".dimmed(),
            hook_count,
            if hook_count == 1 { "" } else { "s" }
        );
    }

    println!();
}

/// Count total hook commands configured.
fn count_hooks(config: &Config) -> usize {
    let hooks = &config.hooks;
    hooks.post_write.len() + hooks.post_record.len() + hooks.post_bundle.len()
}
