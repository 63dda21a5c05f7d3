//! The versioning context: what a release has produced so far.
//!
//! Each phase of [`release`](crate::release) fills in its own fields. The
//! finished context is the result handed back to the caller, serialized
//! into `--json` output, and exported to hook commands.
//!
//! Versions are kept as `String` so that whatever an incrementer returns
//! is carried through untouched.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::hooks::HookContext;

/// Environment variable carrying the previous version.
pub const ENV_PREVIOUS_VERSION: &str = "VERSTAMP_PREVIOUS_VERSION";

/// Environment variable carrying the current version.
pub const ENV_CURRENT_VERSION: &str = "VERSTAMP_CURRENT_VERSION";

/// Accumulated results of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningContext {
    /// Version read from the first version file.
    pub previous: String,
    /// Version being released; equals `previous` when versioning is skipped.
    pub current: Option<String>,
    /// Tag pushed for this release.
    pub tag_name: Option<String>,
    /// Short hash of the version commit.
    pub commit_hash: Option<String>,
    /// Branch the version commit was pushed to.
    pub branch: Option<String>,
    /// Absolute path of the snapshot archive.
    pub bundle_path: Option<Utf8PathBuf>,
    /// Archive path relative to the bundle directory.
    pub bundle_path_relative: Option<Utf8PathBuf>,
}

impl VersioningContext {
    /// Start a context from the previously released version.
    pub fn new(previous: impl Into<String>) -> Self {
        Self {
            previous: previous.into(),
            ..Self::default()
        }
    }

    /// The version this release settles on, falling back to `previous`.
    pub fn version(&self) -> &str {
        self.current.as_deref().unwrap_or(&self.previous)
    }

    /// Record the resolved version.
    pub fn set_current(&mut self, current: impl Into<String>) {
        self.current = Some(current.into());
    }

    /// Record the version commit.
    pub fn record_commit(&mut self, hash: String, branch: String) {
        self.commit_hash = Some(hash);
        self.branch = Some(branch);
    }

    /// Record the pushed tag.
    pub fn record_tag(&mut self, tag: String) {
        self.tag_name = Some(tag);
    }

    /// Record the archive location.
    pub fn record_bundle(&mut self, absolute: Utf8PathBuf, relative: Utf8PathBuf) {
        self.bundle_path = Some(absolute);
        self.bundle_path_relative = Some(relative);
    }

    /// Variables exported to hook commands.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![(ENV_PREVIOUS_VERSION.to_string(), self.previous.clone())];
        if let Some(current) = &self.current {
            vars.push((ENV_CURRENT_VERSION.to_string(), current.clone()));
        }
        vars
    }

    /// Derive a [`HookContext`] for hook interpolation and environment.
    pub fn hook_context(&self) -> HookContext {
        HookContext {
            version: self.version().to_string(),
            prev_version: self.previous.clone(),
            tag: self.tag_name.clone().unwrap_or_default(),
            bundle_path: self
                .bundle_path
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            env: self.env_vars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_with_only_previous() {
        let ctx = VersioningContext::new("1.1.0");
        assert_eq!(ctx.previous, "1.1.0");
        assert!(ctx.current.is_none());
        assert!(ctx.tag_name.is_none());
        assert!(ctx.bundle_path.is_none());
        assert_eq!(ctx.version(), "1.1.0");
    }

    #[test]
    fn env_vars_before_and_after_resolution() {
        let mut ctx = VersioningContext::new("1.1.0");
        assert_eq!(
            ctx.env_vars(),
            vec![(ENV_PREVIOUS_VERSION.to_string(), "1.1.0".to_string())]
        );

        ctx.set_current("1.2.0");
        assert_eq!(
            ctx.env_vars(),
            vec![
                (ENV_PREVIOUS_VERSION.to_string(), "1.1.0".to_string()),
                (ENV_CURRENT_VERSION.to_string(), "1.2.0".to_string()),
            ]
        );
    }

    #[test]
    fn hook_context_carries_everything() {
        let mut ctx = VersioningContext::new("1.1.0");
        ctx.set_current("1.2.0");
        ctx.record_tag("v1.2.0".into());
        ctx.record_bundle("/srv/dist/v1.2.0.zip".into(), "v1.2.0.zip".into());

        let hc = ctx.hook_context();
        assert_eq!(hc.version, "1.2.0");
        assert_eq!(hc.prev_version, "1.1.0");
        assert_eq!(hc.tag, "v1.2.0");
        assert_eq!(hc.bundle_path, "/srv/dist/v1.2.0.zip");
        assert_eq!(hc.env.len(), 2);
    }

    #[test]
    fn json_uses_snake_case_fields() {
        let mut ctx = VersioningContext::new("0.9.0");
        ctx.set_current("1.0.0");
        ctx.record_commit("abc1234".into(), "main".into());

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["previous"], "0.9.0");
        assert_eq!(json["current"], "1.0.0");
        assert_eq!(json["commit_hash"], "abc1234");
        assert_eq!(json["branch"], "main");
        assert!(json["bundle_path_relative"].is_null());

        let back: VersioningContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }
}
