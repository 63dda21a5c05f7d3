//! Command implementations

pub mod current;

pub mod doctor;

pub mod info;

pub mod next;

pub mod preflight;

pub mod release;

use anyhow::Context;
use inquire::Select;
use owo_colors::OwoColorize;
use verstamp_core::version::BumpLevel;

/// Prompt the user to pick a bump level, starting at `default`.
///
/// Shared by commands that accept `--interactive` (next, release).
pub fn prompt_level_selection(previous: &str, default: &str) -> anyhow::Result<String> {
    println!(
        "{}: {}",
        "Current version".dimmed(),
        if previous.is_empty() {
            "none (first release)".yellow().to_string()
        } else {
            previous.to_string()
        }
    );

    let options: Vec<&str> = BumpLevel::ALL.iter().map(|l| l.as_str()).collect();
    let cursor = options.iter().position(|l| *l == default).unwrap_or(0);

    let selection = Select::new("Select bump level:", options)
        .with_starting_cursor(cursor)
        .prompt()
        .context("level selection cancelled")?;

    Ok(selection.to_string())
}

/// Resolve the level for a command: explicit flag, then prompt, then config.
pub(crate) fn resolve_level(
    explicit: Option<BumpLevel>,
    interactive: bool,
    previous: impl FnOnce() -> anyhow::Result<String>,
    configured: &str,
) -> anyhow::Result<Option<String>> {
    if let Some(level) = explicit {
        return Ok(Some(level.as_str().to_string()));
    }
    if interactive {
        let previous = previous()?;
        return prompt_level_selection(&previous, configured).map(Some);
    }
    Ok(None)
}
