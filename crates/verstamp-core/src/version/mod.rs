//! Version levels, parsing and the pure bump rules.
//!
//! Everything here is side-effect free. Resolving against the tags already
//! on the remote lives in [`resolve`].

pub mod resolve;

use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use resolve::{
    Incrementer, IncrementerKind, RemoteTags, SemverIncrementer, TagSource, largest_version,
    resolve_next,
};

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The requested bump level is not one of [`BumpLevel::ALL`].
    #[error(
        "invalid level {level:?} for semver incrementer; possible values: \
         major, premajor, minor, preminor, patch, prepatch, prerelease"
    )]
    InvalidLevel {
        /// The level as given.
        level: String,
    },

    /// Failed to parse a semver string.
    #[error("invalid semver: {0}")]
    InvalidSemver(#[from] semver::Error),

    /// A numeric component is already at its maximum.
    #[error("cannot bump {version}: numeric component overflows")]
    Overflow {
        /// The version that was being bumped.
        version: String,
    },

    /// A git operation failed while gathering the tag set.
    #[error("git error: {0}")]
    Git(#[from] crate::git::GitError),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver bump level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Major release (X.0.0).
    Major,
    /// Major prerelease (X.0.0-0).
    Premajor,
    /// Minor release (x.Y.0).
    Minor,
    /// Minor prerelease (x.Y.0-0).
    Preminor,
    /// Patch release (x.y.Z).
    Patch,
    /// Patch prerelease (x.y.Z-0).
    Prepatch,
    /// Next prerelease of the current or next patch.
    Prerelease,
}

impl BumpLevel {
    /// Every recognized level.
    pub const ALL: &[Self] = &[
        Self::Major,
        Self::Premajor,
        Self::Minor,
        Self::Preminor,
        Self::Patch,
        Self::Prepatch,
        Self::Prerelease,
    ];

    /// The level's configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Premajor => "premajor",
            Self::Minor => "minor",
            Self::Preminor => "preminor",
            Self::Patch => "patch",
            Self::Prepatch => "prepatch",
            Self::Prerelease => "prerelease",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpLevel {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| VersionError::InvalidLevel {
                level: s.to_string(),
            })
    }
}

/// Compute the next version by applying a bump level.
///
/// Prerelease levels use a numeric identifier: `prepatch` on `1.2.3` gives
/// `1.2.4-0`, and `prerelease` on `1.2.4-0` gives `1.2.4-1`. Releasing a
/// prerelease at its own boundary drops the suffix (`patch` on `1.2.4-0`
/// is `1.2.4`). Build metadata never survives a bump.
pub fn next_version(current: &Version, level: BumpLevel) -> VersionResult<Version> {
    let bumped = |n: u64| {
        n.checked_add(1).ok_or_else(|| VersionError::Overflow {
            version: current.to_string(),
        })
    };

    let mut next = current.clone();
    next.build = BuildMetadata::EMPTY;

    match level {
        BumpLevel::Major => {
            if next.minor != 0 || next.patch != 0 || next.pre.is_empty() {
                next.major = bumped(next.major)?;
            }
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        BumpLevel::Minor => {
            if next.patch != 0 || next.pre.is_empty() {
                next.minor = bumped(next.minor)?;
            }
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        BumpLevel::Patch => {
            if next.pre.is_empty() {
                next.patch = bumped(next.patch)?;
            }
            next.pre = Prerelease::EMPTY;
        }
        BumpLevel::Premajor => {
            next.major = bumped(next.major)?;
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::new("0")?;
        }
        BumpLevel::Preminor => {
            next.minor = bumped(next.minor)?;
            next.patch = 0;
            next.pre = Prerelease::new("0")?;
        }
        BumpLevel::Prepatch => {
            next.patch = bumped(next.patch)?;
            next.pre = Prerelease::new("0")?;
        }
        BumpLevel::Prerelease => {
            if next.pre.is_empty() {
                next.patch = bumped(next.patch)?;
            }
            next.pre = next_prerelease(&next.pre, bumped)?;
        }
    }

    Ok(next)
}

/// Increment the right-most numeric identifier, or append `.0` if none.
fn next_prerelease(
    pre: &Prerelease,
    bumped: impl Fn(u64) -> VersionResult<u64>,
) -> VersionResult<Prerelease> {
    if pre.is_empty() {
        return Ok(Prerelease::new("0")?);
    }

    let mut idents: Vec<String> = pre.as_str().split('.').map(str::to_string).collect();
    let numeric = idents
        .iter()
        .rposition(|ident| ident.parse::<u64>().is_ok());

    match numeric {
        Some(i) => {
            let n: u64 = idents[i].parse().unwrap_or_default();
            idents[i] = bumped(n)?.to_string();
        }
        None => idents.push("0".to_string()),
    }

    Ok(Prerelease::new(&idents.join("."))?)
}

/// Parse a version string, stripping an optional `v` or `=` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let s = s.trim();
    let s = s
        .strip_prefix('v')
        .or_else(|| s.strip_prefix('='))
        .unwrap_or(s);
    Ok(Version::parse(s)?)
}

/// Parse a previously released version; an empty string means no release yet.
pub fn parse_previous(s: &str) -> VersionResult<Version> {
    if s.trim().is_empty() {
        return Ok(Version::new(0, 0, 0));
    }
    parse_version(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump(v: &str, level: BumpLevel) -> String {
        next_version(&Version::parse(v).unwrap(), level)
            .unwrap()
            .to_string()
    }

    #[test]
    fn bump_patch() {
        assert_eq!(bump("1.2.3", BumpLevel::Patch), "1.2.4");
    }

    #[test]
    fn bump_minor() {
        assert_eq!(bump("1.2.3", BumpLevel::Minor), "1.3.0");
    }

    #[test]
    fn bump_major() {
        assert_eq!(bump("1.2.3", BumpLevel::Major), "2.0.0");
    }

    #[test]
    fn pre_levels_append_numeric_identifier() {
        assert_eq!(bump("1.2.3", BumpLevel::Premajor), "2.0.0-0");
        assert_eq!(bump("1.2.3", BumpLevel::Preminor), "1.3.0-0");
        assert_eq!(bump("1.2.3", BumpLevel::Prepatch), "1.2.4-0");
        assert_eq!(bump("1.2.3", BumpLevel::Prerelease), "1.2.4-0");
    }

    #[test]
    fn prerelease_increments_existing_counter() {
        assert_eq!(bump("1.2.4-0", BumpLevel::Prerelease), "1.2.4-1");
        assert_eq!(bump("1.2.4-beta.7", BumpLevel::Prerelease), "1.2.4-beta.8");
        assert_eq!(bump("1.2.4-1.beta", BumpLevel::Prerelease), "1.2.4-2.beta");
    }

    #[test]
    fn prerelease_without_counter_appends_zero() {
        assert_eq!(bump("1.2.4-beta", BumpLevel::Prerelease), "1.2.4-beta.0");
    }

    #[test]
    fn release_levels_graduate_matching_prerelease() {
        assert_eq!(bump("1.2.4-0", BumpLevel::Patch), "1.2.4");
        assert_eq!(bump("1.3.0-2", BumpLevel::Minor), "1.3.0");
        assert_eq!(bump("2.0.0-rc.1", BumpLevel::Major), "2.0.0");
    }

    #[test]
    fn release_levels_bump_past_unaligned_prerelease() {
        assert_eq!(bump("1.2.4-0", BumpLevel::Minor), "1.3.0");
        assert_eq!(bump("1.2.0-0", BumpLevel::Major), "2.0.0");
    }

    #[test]
    fn bump_drops_build_metadata() {
        assert_eq!(bump("1.2.3+build.5", BumpLevel::Patch), "1.2.4");
    }

    #[test]
    fn every_level_moves_forward() {
        for start in ["0.0.0", "1.2.3", "1.2.4-0", "2.0.0-rc.1", "0.9.9-alpha"] {
            let v = Version::parse(start).unwrap();
            for &level in BumpLevel::ALL {
                let next = next_version(&v, level).unwrap();
                assert!(next > v, "{level} on {start} gave {next}");
            }
        }
    }

    #[test]
    fn prerelease_counter_at_max_is_overflow() {
        let v = Version::parse("1.2.4-18446744073709551615").unwrap();
        let err = next_version(&v, BumpLevel::Prerelease).unwrap_err();
        assert!(matches!(err, VersionError::Overflow { ref version } if version == "1.2.4-18446744073709551615"));
    }

    #[test]
    fn components_at_max_are_overflow() {
        let max = u64::MAX;
        let cases = [
            (format!("{max}.0.0"), BumpLevel::Major),
            (format!("{max}.0.0"), BumpLevel::Premajor),
            (format!("1.{max}.0"), BumpLevel::Minor),
            (format!("1.{max}.0"), BumpLevel::Preminor),
            (format!("1.2.{max}"), BumpLevel::Patch),
            (format!("1.2.{max}"), BumpLevel::Prepatch),
            (format!("1.2.{max}"), BumpLevel::Prerelease),
        ];
        for (start, level) in cases {
            let v = Version::parse(&start).unwrap();
            assert!(
                matches!(next_version(&v, level), Err(VersionError::Overflow { .. })),
                "{level} on {start}"
            );
        }
    }

    #[test]
    fn graduating_at_max_does_not_overflow() {
        let max = u64::MAX;
        assert_eq!(bump(&format!("1.2.{max}-0"), BumpLevel::Patch), format!("1.2.{max}"));
    }

    #[test]
    fn level_parses_all_names() {
        for &level in BumpLevel::ALL {
            assert_eq!(level.as_str().parse::<BumpLevel>().unwrap(), level);
        }
    }

    #[test]
    fn unknown_level_is_invalid_level() {
        let err = "huge".parse::<BumpLevel>().unwrap_err();
        assert!(matches!(err, VersionError::InvalidLevel { ref level } if level == "huge"));
        assert!(err.to_string().contains("prerelease"));
    }

    #[test]
    fn level_names_are_case_sensitive() {
        assert!("Patch".parse::<BumpLevel>().is_err());
    }

    #[test]
    fn parse_with_v_prefix() {
        assert_eq!(parse_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_with_equals_prefix() {
        assert_eq!(parse_version("=1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_without_prefix() {
        assert_eq!(parse_version("1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_invalid() {
        assert!(parse_version("not-a-version").is_err());
        assert!(parse_version("release-1.2.3").is_err());
    }

    #[test]
    fn empty_previous_is_zero() {
        assert_eq!(parse_previous("").unwrap(), Version::new(0, 0, 0));
        assert_eq!(parse_previous("  ").unwrap(), Version::new(0, 0, 0));
    }

    #[test]
    fn level_serde_names() {
        let json = serde_json::to_string(&BumpLevel::Preminor).unwrap();
        assert_eq!(json, "\"preminor\"");
        let back: BumpLevel = serde_json::from_str("\"prepatch\"").unwrap();
        assert_eq!(back, BumpLevel::Prepatch);
    }
}
