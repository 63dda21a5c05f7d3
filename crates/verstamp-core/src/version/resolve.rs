//! Resolve the next version against the tags already on the remote.
//!
//! The remote's tag set is the source of truth for what has been released.
//! Resolution is: bump the previous version when it is strictly ahead of
//! every tag, otherwise bump the largest tag.

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{BumpLevel, VersionResult, next_version, parse_previous, parse_version};
use crate::git::Repo;

/// Something that can list release tags.
pub trait TagSource {
    /// Fetch the current tag names. May touch the network.
    fn tags(&self) -> VersionResult<Vec<String>>;
}

impl TagSource for Vec<String> {
    fn tags(&self) -> VersionResult<Vec<String>> {
        Ok(self.clone())
    }
}

impl<T: TagSource + ?Sized> TagSource for &T {
    fn tags(&self) -> VersionResult<Vec<String>> {
        (**self).tags()
    }
}

/// Tags of a repository after fetching them from a remote.
#[derive(Debug, Clone)]
pub struct RemoteTags {
    repo: Repo,
    remote: String,
}

impl RemoteTags {
    /// Tags reachable by fetching `remote` into `repo`.
    pub fn new(repo: Repo, remote: impl Into<String>) -> Self {
        Self {
            repo,
            remote: remote.into(),
        }
    }
}

impl TagSource for RemoteTags {
    #[instrument(skip(self), fields(remote = %self.remote))]
    fn tags(&self) -> VersionResult<Vec<String>> {
        self.repo.fetch_tags(&self.remote)?;
        let tags = self.repo.tags()?;
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }
}

/// Largest semver among `tags`, or `0.0.0` when none parse.
///
/// Tags that are not versions (after stripping a `v`/`=` prefix) are ignored.
pub fn largest_version<S: AsRef<str>>(tags: &[S]) -> Version {
    tags.iter()
        .filter_map(|tag| parse_version(tag.as_ref()).ok())
        .fold(Version::new(0, 0, 0), |largest, v| {
            if v > largest { v } else { largest }
        })
}

/// Pick the base version and bump it.
///
/// The previous version wins only when it is strictly greater than the
/// largest tag; a tie bumps the tag.
pub fn resolve_next(
    previous: &Version,
    largest: &Version,
    level: BumpLevel,
) -> VersionResult<Version> {
    let base = if previous > largest { previous } else { largest };
    next_version(base, level)
}

/// Computes the next version string from the previous one and a level name.
///
/// Closures with the same signature are incrementers too.
pub trait Incrementer {
    /// The version that follows `previous` at `level`.
    fn increment(&self, previous: &str, level: &str) -> VersionResult<String>;
}

impl<F> Incrementer for F
where
    F: Fn(&str, &str) -> VersionResult<String>,
{
    fn increment(&self, previous: &str, level: &str) -> VersionResult<String> {
        self(previous, level)
    }
}

/// The default incrementer: semver bump against a tag set.
#[derive(Debug, Clone)]
pub struct SemverIncrementer<S> {
    tags: S,
    tag_prefix: String,
}

impl<S: TagSource> SemverIncrementer<S> {
    /// Resolve against the tags `tags` yields.
    pub const fn new(tags: S) -> Self {
        Self {
            tags,
            tag_prefix: String::new(),
        }
    }

    /// Strip `prefix` from tag names before reading them as versions.
    ///
    /// Must match the prefix the formatter puts on released tags, or those
    /// tags are ignored as non-versions.
    #[must_use]
    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    fn strip<'t>(&self, tag: &'t str) -> &'t str {
        if self.tag_prefix.is_empty() {
            return tag;
        }
        tag.strip_prefix(self.tag_prefix.as_str()).unwrap_or(tag)
    }
}

impl<S: TagSource> Incrementer for SemverIncrementer<S> {
    #[instrument(skip(self))]
    fn increment(&self, previous: &str, level: &str) -> VersionResult<String> {
        // Both inputs are checked before the tag source is asked for anything.
        let level: BumpLevel = level.parse()?;
        let previous = parse_previous(previous)?;

        let tags = self.tags.tags()?;
        let versions: Vec<&str> = tags.iter().map(|tag| self.strip(tag)).collect();
        let largest = largest_version(&versions);
        let next = resolve_next(&previous, &largest, level)?;

        debug!(%previous, %largest, %next, "resolved next version");
        Ok(next.to_string())
    }
}

/// Named incrementers selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementerKind {
    /// [`SemverIncrementer`] over the remote's tags.
    #[default]
    Semver,
}

impl IncrementerKind {
    /// Build the incrementer for a repository and remote.
    ///
    /// `tag_prefix` is what the formatter prepends to released tags.
    pub fn build(self, repo: &Repo, remote: &str, tag_prefix: &str) -> Box<dyn Incrementer> {
        match self {
            Self::Semver => Box::new(
                SemverIncrementer::new(RemoteTags::new(repo.clone(), remote))
                    .with_tag_prefix(tag_prefix),
            ),
        }
    }

    /// Whether this incrementer produces semver strings.
    pub const fn is_semver(self) -> bool {
        matches!(self, Self::Semver)
    }
}
