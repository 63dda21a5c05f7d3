//! Durable release records: the version commit and its annotated tag.
//!
//! A [`Recorder`] runs four operations that the caller invokes in order:
//! [`stage_files`](Recorder::stage_files),
//! [`commit_version`](Recorder::commit_version) (commit, then push the
//! branch), and [`tag_version`](Recorder::tag_version) (tag, then push the
//! tag). Nothing is retried or rolled back. A failure names the step that
//! failed, and everything before it stays on the remote.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::format::{Formatter, expand};
use crate::git::{GitError, GitResult, Repo};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// The recorder step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStep {
    /// `git add`.
    Stage,
    /// `git commit`.
    Commit,
    /// Pushing the branch.
    Push,
    /// `git tag -a`.
    Tag,
    /// Pushing the tag.
    PushTag,
}

impl fmt::Display for RecordStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::Tag => "tag",
            Self::PushTag => "push tag",
        })
    }
}

/// Errors from recording a release.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A single step failed.
    #[error("{step} failed: {source}")]
    Step {
        /// Which step.
        step: RecordStep,
        /// The git failure.
        source: GitError,
    },

    /// No branch was configured and none could be detected.
    #[error("could not determine branch to push: {0}")]
    Branch(#[source] GitError),
}

/// Result alias for recorder operations.
pub type RecordResult<T> = Result<T, RecordError>;

trait StepExt<T> {
    fn step(self, step: RecordStep) -> RecordResult<T>;
}

impl<T> StepExt<T> for GitResult<T> {
    fn step(self, step: RecordStep) -> RecordResult<T> {
        self.map_err(|source| RecordError::Step { step, source })
    }
}

// ──────────────────────────────────────────────
// Backend
// ──────────────────────────────────────────────

/// The version-control operations the recorder needs.
pub trait RecordBackend {
    /// Stage `paths` for the next commit.
    fn stage(&self, paths: &[String]) -> GitResult<()>;
    /// Commit the staged changes, returning the new commit's short hash.
    fn commit(&self, message: &str) -> GitResult<String>;
    /// Push `refspec` to `remote`.
    fn push(&self, remote: &str, refspec: &str) -> GitResult<()>;
    /// Create an annotated tag at `HEAD`.
    fn create_tag(&self, name: &str, message: &str) -> GitResult<()>;
    /// The checked-out branch, `None` when detached.
    fn current_branch(&self) -> GitResult<Option<String>>;
}

impl RecordBackend for Repo {
    fn stage(&self, paths: &[String]) -> GitResult<()> {
        self.add(paths)
    }

    fn commit(&self, message: &str) -> GitResult<String> {
        Self::commit(self, message)
    }

    fn push(&self, remote: &str, refspec: &str) -> GitResult<()> {
        Self::push(self, remote, refspec)
    }

    fn create_tag(&self, name: &str, message: &str) -> GitResult<()> {
        self.create_annotated_tag(name, message)
    }

    fn current_branch(&self) -> GitResult<Option<String>> {
        Self::current_branch(self)
    }
}

/// Supplies the branch name when none is configured.
pub type BranchFallback = Box<dyn Fn() -> GitResult<String>>;

// ──────────────────────────────────────────────
// Recorder
// ──────────────────────────────────────────────

/// A commit created and pushed by [`Recorder::commit_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedCommit {
    /// Short hash of the version commit.
    pub hash: String,
    /// Branch the commit was pushed to.
    pub branch: String,
    /// The expanded commit message.
    pub message: String,
}

/// Commits, tags and pushes a release.
pub struct Recorder<'a, B> {
    backend: B,
    remote: String,
    branch: Option<String>,
    formatter: &'a dyn Formatter,
    branch_fallback: Option<BranchFallback>,
}

impl<'a, B: RecordBackend> Recorder<'a, B> {
    /// A recorder pushing to `remote`, tagging with `formatter`'s output.
    pub fn new(backend: B, remote: impl Into<String>, formatter: &'a dyn Formatter) -> Self {
        Self {
            backend,
            remote: remote.into(),
            branch: None,
            formatter,
            branch_fallback: None,
        }
    }

    /// Push commits to `branch`. Empty means "detect".
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = (!branch.is_empty()).then_some(branch);
        self
    }

    /// Use `fallback` instead of the backend to find the branch when none is
    /// configured.
    #[must_use]
    pub fn with_branch_fallback(mut self, fallback: BranchFallback) -> Self {
        self.branch_fallback = Some(fallback);
        self
    }

    /// The branch commits are pushed to.
    ///
    /// Configured branch first, then the injected fallback, then the
    /// backend's checked-out branch (`HEAD` when detached).
    pub fn branch(&self) -> RecordResult<String> {
        if let Some(branch) = &self.branch {
            return Ok(branch.clone());
        }
        if let Some(fallback) = &self.branch_fallback {
            return fallback().map_err(RecordError::Branch);
        }
        let detected = self
            .backend
            .current_branch()
            .map_err(RecordError::Branch)?;
        Ok(detected.unwrap_or_else(|| "HEAD".to_string()))
    }

    /// Stage `files` for the version commit.
    #[instrument(skip(self))]
    pub fn stage_files(&self, files: &[String]) -> RecordResult<()> {
        self.backend.stage(files).step(RecordStep::Stage)?;
        debug!(count = files.len(), "staged files");
        Ok(())
    }

    /// Commit the staged files with `template` expanded, then push the branch.
    #[instrument(skip(self))]
    pub fn commit_version(&self, version: &str, template: &str) -> RecordResult<RecordedCommit> {
        let formatted = self.formatter.format(version);
        let message = expand(template, version, &formatted);
        let branch = self.branch()?;
        debug!(%formatted, remote = %self.remote, %branch, "committing version");

        let hash = self.backend.commit(&message).step(RecordStep::Commit)?;
        self.backend
            .push(&self.remote, &branch)
            .step(RecordStep::Push)?;

        info!(%hash, remote = %self.remote, %branch, "pushed version commit");
        Ok(RecordedCommit {
            hash,
            branch,
            message,
        })
    }

    /// Create the annotated tag for `version` and push it. Returns the tag name.
    #[instrument(skip(self))]
    pub fn tag_version(&self, version: &str, template: &str) -> RecordResult<String> {
        let tag = self.formatter.format(version);
        let annotation = expand(template, version, &tag);
        debug!(%tag, %annotation, "tagging");

        self.backend
            .create_tag(&tag, &annotation)
            .step(RecordStep::Tag)?;
        self.backend
            .push(&self.remote, &format!("refs/tags/{tag}"))
            .step(RecordStep::PushTag)?;

        info!(%tag, remote = %self.remote, "pushed tag");
        Ok(tag)
    }
}
