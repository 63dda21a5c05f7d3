//! On-disk formats that carry a version string.
//!
//! A [`Versioner`] reads the version out of one file and writes a new one
//! back, leaving the rest of the file alone. Built-ins are selected by name
//! through [`VersionerKind`]; library callers can pass any implementation,
//! including a pair of closures wrapped in [`FnVersioner`].

mod json;
mod text;
mod toml;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

pub use json::JsonVersioner;
pub use text::TextVersioner;
pub use toml::TomlVersioner;

use crate::store::StoreResult;

/// Reads and writes the version held by a single file.
pub trait Versioner {
    /// The version currently stored in `path`.
    fn read(&self, path: &Utf8Path) -> StoreResult<String>;

    /// Replace the version in `path`, returning the version written.
    fn write(&self, path: &Utf8Path, version: &str) -> StoreResult<String>;
}

impl<V: Versioner + ?Sized> Versioner for Box<V> {
    fn read(&self, path: &Utf8Path) -> StoreResult<String> {
        (**self).read(path)
    }

    fn write(&self, path: &Utf8Path, version: &str) -> StoreResult<String> {
        (**self).write(path, version)
    }
}

/// A versioner assembled from a read closure and a write closure.
pub struct FnVersioner<R, W> {
    read: R,
    write: W,
}

impl<R, W> FnVersioner<R, W>
where
    R: Fn(&Utf8Path) -> StoreResult<String>,
    W: Fn(&Utf8Path, &str) -> StoreResult<String>,
{
    /// Combine `read` and `write` into a [`Versioner`].
    pub const fn new(read: R, write: W) -> Self {
        Self { read, write }
    }
}

impl<R, W> Versioner for FnVersioner<R, W>
where
    R: Fn(&Utf8Path) -> StoreResult<String>,
    W: Fn(&Utf8Path, &str) -> StoreResult<String>,
{
    fn read(&self, path: &Utf8Path) -> StoreResult<String> {
        (self.read)(path)
    }

    fn write(&self, path: &Utf8Path, version: &str) -> StoreResult<String> {
        (self.write)(path, version)
    }
}

/// Built-in versioners selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionerKind {
    /// A JSON object with a top-level `version` field.
    #[default]
    Json,
    /// A TOML document (`version`, `[package]`, or `[workspace.package]`).
    Toml,
    /// A plain file whose whole content is the version.
    Text,
}

impl VersionerKind {
    /// Instantiate the versioner.
    pub fn build(self) -> Box<dyn Versioner> {
        match self {
            Self::Json => Box::new(JsonVersioner),
            Self::Toml => Box::new(TomlVersioner),
            Self::Text => Box::new(TextVersioner),
        }
    }
}
