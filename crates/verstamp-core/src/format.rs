//! Display form of a version and the `%V` / `%FV` template language.
//!
//! The formatted version doubles as the tag name, so whatever a
//! [`Formatter`] returns is exactly what lands in the remote's tag list.

use serde::{Deserialize, Serialize};

use crate::version::IncrementerKind;

/// Turns a raw version into its display form.
pub trait Formatter {
    /// Display form of `version`.
    fn format(&self, version: &str) -> String;
}

impl<F> Formatter for F
where
    F: Fn(&str) -> String,
{
    fn format(&self, version: &str) -> String {
        self(version)
    }
}

/// Prepends a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixFormatter {
    prefix: String,
}

impl PrefixFormatter {
    /// A formatter producing `<prefix><version>`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Formatter for PrefixFormatter {
    fn format(&self, version: &str) -> String {
        format!("{}{version}", self.prefix)
    }
}

/// Leaves the version untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, version: &str) -> String {
        version.to_string()
    }
}

/// Built-in formatters selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// `v` + version for semver incrementers, unchanged otherwise.
    #[default]
    Default,
    /// The version unchanged.
    Plain,
    /// The configured tag prefix + version.
    Prefix,
}

impl FormatterKind {
    /// Instantiate the formatter for the chosen incrementer and tag prefix.
    pub fn build(self, incrementer: IncrementerKind, tag_prefix: &str) -> Box<dyn Formatter> {
        match self {
            Self::Default if incrementer.is_semver() => Box::new(PrefixFormatter::new("v")),
            Self::Default | Self::Plain => Box::new(PlainFormatter),
            Self::Prefix => Box::new(PrefixFormatter::new(tag_prefix)),
        }
    }

    /// The text [`build`](Self::build)'s formatter puts in front of versions.
    pub fn tag_prefix<'p>(self, incrementer: IncrementerKind, tag_prefix: &'p str) -> &'p str {
        match self {
            Self::Default if incrementer.is_semver() => "v",
            Self::Default | Self::Plain => "",
            Self::Prefix => tag_prefix,
        }
    }
}

/// Expand `%FV` to `formatted` and `%V` to `version` in `template`.
///
/// Every occurrence is replaced. Text without either token passes through.
pub fn expand(template: &str, version: &str, formatted: &str) -> String {
    template.replace("%FV", formatted).replace("%V", version)
}
