//! Release orchestrator: the full versioning workflow.
//!
//! Sequences the version store, resolver, recorder and archiver across four
//! phases, threading results through a [`VersioningContext`]:
//!
//! 1. **read previous**: read the version from the first version file.
//! 2. **resolve current**: compute the next version and write it to every
//!    version file (`post_write` hooks).
//! 3. **record**: stage, commit, push, tag, push tag (`post_record` hooks).
//! 4. **bundle**: zip `HEAD` named after the tag (`post_bundle` hooks).
//!
//! Phases can be driven one by one (a host pipeline calling into its own
//! lifecycle) or all at once with [`Release::run`]. Events are emitted at
//! phase boundaries so the CLI can render progress.
//!
//! Failures abort the remaining phases. Nothing is rolled back: a written
//! version file or a pushed commit without a tag stays as it is.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::archive;
use crate::config::{Config, VersioningConfig};
use crate::context::VersioningContext;
use crate::format::{Formatter, expand};
use crate::git::Repo;
use crate::hooks;
use crate::record::Recorder;
use crate::store::VersionStore;
use crate::version::Incrementer;
use crate::versioner::Versioner;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from the release workflow.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Version resolution failed.
    #[error(transparent)]
    Version(#[from] crate::version::VersionError),

    /// Reading or writing a version file failed.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Committing, tagging or pushing failed.
    #[error(transparent)]
    Record(#[from] crate::record::RecordError),

    /// The archive could not be produced.
    #[error(transparent)]
    Archive(#[from] crate::archive::ArchiveError),

    /// A hook command failed.
    #[error(transparent)]
    Hook(#[from] crate::hooks::HookError),
}

/// Result alias for release operations.
pub type ReleaseResult<T> = Result<T, ReleaseError>;

// ──────────────────────────────────────────────
// Options and capabilities
// ──────────────────────────────────────────────

/// Per-invocation switches layered over the configuration.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Keep the previous version: no resolution, write, commit or tag.
    pub skip_versioning: bool,
    /// Resolve the next version but change nothing.
    pub dry_run: bool,
    /// Bump level overriding `versioning.level`.
    pub level: Option<String>,
    /// Bundling switch overriding `versioning.bundle`.
    pub bundle: Option<bool>,
}

/// The pluggable pieces a release is assembled from.
pub struct Capabilities {
    /// Reads and writes version files.
    pub versioner: Box<dyn Versioner>,
    /// Computes the next version.
    pub incrementer: Box<dyn Incrementer>,
    /// Produces tag names and `%FV`.
    pub formatter: Box<dyn Formatter>,
}

impl Capabilities {
    /// The built-ins named in `config`, resolving tags from `remote`.
    pub fn from_config(config: &VersioningConfig, repo: &Repo, remote: &str) -> Self {
        let prefix = config
            .formatter
            .tag_prefix(config.incrementer, &config.tag_prefix);
        Self {
            versioner: config.versioner.build(),
            incrementer: config.incrementer.build(repo, remote, prefix),
            formatter: config.formatter.build(config.incrementer, &config.tag_prefix),
        }
    }
}

// ──────────────────────────────────────────────
// Phases and events
// ──────────────────────────────────────────────

/// Phases of the release workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePhase {
    /// Read the version currently on disk.
    ReadPrevious,
    /// Compute and write the next version.
    ResolveCurrent,
    /// Commit, tag and push.
    Record,
    /// Archive `HEAD`.
    Bundle,
}

impl fmt::Display for ReleasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadPrevious => write!(f, "read previous"),
            Self::ResolveCurrent => write!(f, "resolve current"),
            Self::Record => write!(f, "record"),
            Self::Bundle => write!(f, "bundle"),
        }
    }
}

/// Events emitted during the release for progress reporting.
#[derive(Debug, Clone)]
pub enum ReleaseEvent {
    /// A phase has started.
    PhaseStarted(ReleasePhase),
    /// A phase has completed.
    PhaseCompleted(ReleasePhase, PhaseOutcome),
    /// Hook commands are about to run (or would run in dry-run mode).
    HooksStarted {
        /// Which phase the hooks belong to.
        phase: ReleasePhase,
        /// Number of hook commands.
        count: usize,
        /// The hook commands with interpolation applied.
        commands: Vec<String>,
        /// Whether these hooks will actually be executed (false in dry-run mode).
        will_execute: bool,
    },
    /// Hook commands have finished (or were skipped in dry-run mode).
    HooksCompleted {
        /// Which phase the hooks belong to.
        phase: ReleasePhase,
        /// Number of hook commands that ran (or would have run).
        count: usize,
    },
}

/// Outcome of a single phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum PhaseOutcome {
    /// Phase completed successfully.
    Success {
        /// Description of what happened.
        message: String,
    },
    /// Phase was skipped.
    Skipped {
        /// Why the phase was skipped.
        reason: String,
    },
}

impl PhaseOutcome {
    fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// Outcome of the full release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    /// Everything the release produced.
    pub context: VersioningContext,
    /// Results of each phase, in order.
    pub phases: Vec<(ReleasePhase, PhaseOutcome)>,
    /// Total number of hook commands executed (or previewed).
    pub hooks_run: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

// ──────────────────────────────────────────────
// Orchestrator
// ──────────────────────────────────────────────

/// A release in progress.
pub struct Release<'a> {
    root: Utf8PathBuf,
    repo: Repo,
    config: &'a Config,
    options: ReleaseOptions,
    caps: Capabilities,
    context: VersioningContext,
    phases: Vec<(ReleasePhase, PhaseOutcome)>,
    hooks_run: usize,
}

impl<'a> Release<'a> {
    /// Prepare a release of the project at `root` using the configured built-ins.
    pub fn new(root: impl Into<Utf8PathBuf>, config: &'a Config, options: ReleaseOptions) -> Self {
        let root = root.into();
        let repo = Repo::new(&root);
        let caps = Capabilities::from_config(&config.versioning, &repo, &config.git.remote);
        Self {
            root,
            repo,
            config,
            options,
            caps,
            context: VersioningContext::default(),
            phases: Vec::new(),
            hooks_run: 0,
        }
    }

    /// Replace the versioner, incrementer and formatter.
    #[must_use]
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Override the bump level for the phases still to run.
    ///
    /// Lets a caller read the previous version first and pick a level after.
    #[must_use]
    pub fn with_level(mut self, level: Option<String>) -> Self {
        if level.is_some() {
            self.options.level = level;
        }
        self
    }

    /// The context accumulated so far.
    pub const fn context(&self) -> &VersioningContext {
        &self.context
    }

    /// Run every phase in order.
    #[instrument(skip_all, fields(
        root = %self.root,
        dry_run = self.options.dry_run,
        skip_versioning = self.options.skip_versioning
    ))]
    pub fn run(mut self, mut on_event: impl FnMut(ReleaseEvent)) -> ReleaseResult<ReleaseOutcome> {
        self.read_previous(&mut on_event)?;
        self.resolve_current(&mut on_event)?;
        self.record(&mut on_event)?;
        self.bundle(&mut on_event)?;
        Ok(self.finish())
    }

    /// Consume the release and return its outcome.
    pub fn finish(self) -> ReleaseOutcome {
        info!(
            previous = %self.context.previous,
            current = self.context.current.as_deref().unwrap_or(""),
            hooks_run = self.hooks_run,
            dry_run = self.options.dry_run,
            "release complete"
        );
        ReleaseOutcome {
            context: self.context,
            phases: self.phases,
            hooks_run: self.hooks_run,
            dry_run: self.options.dry_run,
        }
    }

    /// Read the previous version from the first version file.
    pub fn read_previous(
        &mut self,
        on_event: &mut impl FnMut(ReleaseEvent),
    ) -> ReleaseResult<PhaseOutcome> {
        let phase = ReleasePhase::ReadPrevious;
        on_event(ReleaseEvent::PhaseStarted(phase));

        let previous = self.store().read()?;
        let outcome = PhaseOutcome::success(format!("Previous version {previous}"));
        self.context = VersioningContext::new(previous);

        Ok(self.complete(phase, outcome, on_event))
    }

    /// Resolve the next version and write it to every version file.
    ///
    /// With `skip_versioning` the previous version becomes the current one
    /// and nothing is written.
    pub fn resolve_current(
        &mut self,
        on_event: &mut impl FnMut(ReleaseEvent),
    ) -> ReleaseResult<PhaseOutcome> {
        let phase = ReleasePhase::ResolveCurrent;
        on_event(ReleaseEvent::PhaseStarted(phase));

        if self.options.skip_versioning {
            let previous = self.context.previous.clone();
            self.context.set_current(previous.as_str());
            let outcome = PhaseOutcome::skipped(format!("Versioning skipped, keeping {previous}"));
            return Ok(self.complete(phase, outcome, on_event));
        }

        let level = self
            .options
            .level
            .as_deref()
            .unwrap_or(&self.config.versioning.level);
        let previous = &self.context.previous;
        let next = self.caps.incrementer.increment(previous, level)?;

        let outcome = if self.options.dry_run {
            PhaseOutcome::success(format!("Would write {next} ({previous} → {next}, {level})"))
        } else {
            self.store().write(&next)?;
            PhaseOutcome::success(format!("{previous} → {next} ({level})"))
        };
        self.context.set_current(next);

        let outcome = self.complete(phase, outcome, on_event);
        self.run_phase_hooks(phase, on_event)?;
        Ok(outcome)
    }

    /// Commit the version files, tag the commit and push both.
    pub fn record(&mut self, on_event: &mut impl FnMut(ReleaseEvent)) -> ReleaseResult<PhaseOutcome> {
        let phase = ReleasePhase::Record;
        on_event(ReleaseEvent::PhaseStarted(phase));

        if self.options.skip_versioning {
            let outcome = PhaseOutcome::skipped("Versioning skipped, nothing to record");
            return Ok(self.complete(phase, outcome, on_event));
        }

        let version = self.context.version().to_string();
        let git = &self.config.git;

        let outcome = if self.options.dry_run {
            let tag = self.caps.formatter.format(&version);
            let message = expand(&git.commit_message, &version, &tag);
            PhaseOutcome::success(format!(
                "Would commit \"{message}\", tag {tag} and push to {}",
                git.remote
            ))
        } else {
            let recorder = Recorder::new(self.repo.clone(), &git.remote, self.caps.formatter.as_ref())
                .with_branch(&git.branch);
            recorder.stage_files(&git.add)?;
            let commit = recorder.commit_version(&version, &git.commit_message)?;
            let tag = recorder.tag_version(&version, &git.tag_message)?;

            let message = format!(
                "Committed {}, tagged {tag}, pushed to {} {}",
                commit.hash, git.remote, commit.branch
            );
            self.context.record_commit(commit.hash, commit.branch);
            self.context.record_tag(tag);
            PhaseOutcome::success(message)
        };

        let outcome = self.complete(phase, outcome, on_event);
        self.run_phase_hooks(phase, on_event)?;
        Ok(outcome)
    }

    /// Archive `HEAD` into the bundle directory, named after the tag.
    pub fn bundle(&mut self, on_event: &mut impl FnMut(ReleaseEvent)) -> ReleaseResult<PhaseOutcome> {
        let phase = ReleasePhase::Bundle;
        on_event(ReleaseEvent::PhaseStarted(phase));

        let enabled = self
            .options
            .bundle
            .unwrap_or(self.config.versioning.bundle);
        if !enabled {
            let outcome = PhaseOutcome::skipped("Bundling disabled");
            return Ok(self.complete(phase, outcome, on_event));
        }
        let Some(dir) = self.bundle_dir() else {
            warn!("bundling enabled but no bundle_dir configured");
            let outcome = PhaseOutcome::skipped("No bundle directory configured");
            return Ok(self.complete(phase, outcome, on_event));
        };

        let name = self.caps.formatter.format(self.context.version());
        let outcome = if self.options.dry_run {
            PhaseOutcome::success(format!("Would bundle HEAD to {dir}/{name}.zip"))
        } else {
            let path = archive::zip(&self.repo, &dir, &name)?;
            let relative = path
                .strip_prefix(&dir)
                .map_or_else(|_| path.clone(), Utf8Path::to_path_buf);
            let message = format!("Bundled HEAD to {path}");
            self.context.record_bundle(path, relative);
            PhaseOutcome::success(message)
        };

        let outcome = self.complete(phase, outcome, on_event);
        self.run_phase_hooks(phase, on_event)?;
        Ok(outcome)
    }

    fn store(&self) -> VersionStore<'_> {
        VersionStore::new(
            &self.root,
            &self.config.versioning.version_files,
            self.caps.versioner.as_ref(),
        )
    }

    fn bundle_dir(&self) -> Option<Utf8PathBuf> {
        let dir = self.config.versioning.bundle_dir.as_ref()?;
        Some(if dir.is_absolute() {
            dir.clone()
        } else {
            self.root.join(dir)
        })
    }

    fn complete(
        &mut self,
        phase: ReleasePhase,
        outcome: PhaseOutcome,
        on_event: &mut impl FnMut(ReleaseEvent),
    ) -> PhaseOutcome {
        on_event(ReleaseEvent::PhaseCompleted(phase, outcome.clone()));
        self.phases.push((phase, outcome.clone()));
        outcome
    }

    /// Run the hooks attached to `phase`. Dry runs only report them.
    fn run_phase_hooks(
        &mut self,
        phase: ReleasePhase,
        on_event: &mut impl FnMut(ReleaseEvent),
    ) -> ReleaseResult<()> {
        let hooks = &self.config.hooks;
        let commands = match phase {
            ReleasePhase::ResolveCurrent => &hooks.post_write,
            ReleasePhase::Record => &hooks.post_record,
            ReleasePhase::Bundle => &hooks.post_bundle,
            ReleasePhase::ReadPrevious => return Ok(()),
        };
        if commands.is_empty() {
            return Ok(());
        }

        let count = commands.len();
        let hook_ctx = self.context.hook_context();
        let dry_run = self.options.dry_run;

        on_event(ReleaseEvent::HooksStarted {
            phase,
            count,
            commands: commands
                .iter()
                .map(|cmd| hooks::interpolate_command(cmd, &hook_ctx))
                .collect(),
            will_execute: !dry_run,
        });

        if !dry_run {
            hooks::run_hooks(commands, &hook_ctx, &self.root)?;
        }

        on_event(ReleaseEvent::HooksCompleted { phase, count });
        self.hooks_run += count;
        Ok(())
    }
}
