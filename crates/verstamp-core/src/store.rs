//! The ordered set of files that carry the project version.
//!
//! Reads consult only the first file; writes go to every file, in order,
//! stopping at the first failure. Files already written stay written.
//!
//! The on-disk format is delegated to a [`Versioner`].

use std::io::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::versioner::Versioner;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from reading or writing version files.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The file exists but could not be parsed.
    #[error("malformed version file {path}: {message}")]
    MalformedVersionFile {
        /// The offending file.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },

    /// The file parsed but holds no string `version`.
    #[error("no version field in {path}")]
    MissingVersion {
        /// The offending file.
        path: Utf8PathBuf,
    },

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file could not be replaced.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No version files were configured.
    #[error("no version files configured")]
    Empty,
}

/// Result alias for version store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ──────────────────────────────────────────────
// File set
// ──────────────────────────────────────────────

/// Ordered version files plus the format used to read and write them.
pub struct VersionStore<'a> {
    files: Vec<Utf8PathBuf>,
    versioner: &'a dyn Versioner,
}

impl<'a> VersionStore<'a> {
    /// A store over `files`, resolved against `root` when relative.
    pub fn new<P: AsRef<Utf8Path>>(
        root: &Utf8Path,
        files: &[P],
        versioner: &'a dyn Versioner,
    ) -> Self {
        let files = files
            .iter()
            .map(|f| {
                let f = f.as_ref();
                if f.is_absolute() {
                    f.to_path_buf()
                } else {
                    root.join(f)
                }
            })
            .collect();
        Self { files, versioner }
    }

    /// The resolved file paths, in order.
    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }

    /// Read the version from the first file.
    #[instrument(skip(self))]
    pub fn read(&self) -> StoreResult<String> {
        let first = self.files.first().ok_or(StoreError::Empty)?;
        let version = self.versioner.read(first)?;
        debug!(file = %first, %version, "read version");
        Ok(version)
    }

    /// Write `version` to every file in order, failing fast.
    #[instrument(skip(self))]
    pub fn write(&self, version: &str) -> StoreResult<String> {
        if self.files.is_empty() {
            return Err(StoreError::Empty);
        }
        for file in &self.files {
            self.versioner.write(file, version)?;
            debug!(%file, "wrote version");
        }
        info!(version, files = self.files.len(), "version files updated");
        Ok(version.to_string())
    }
}

/// Read a whole file as UTF-8, mapping failures to [`StoreError::Read`].
pub(crate) fn read_file(path: &Utf8Path) -> StoreResult<String> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `contents` through a sibling temp file and a rename.
///
/// Readers see either the old file or the new one, never a partial write.
/// A symlinked `path` is written through to its target; the link stays.
pub(crate) fn write_atomic(path: &Utf8Path, contents: &str) -> StoreResult<()> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let target = if path.is_symlink() {
        path.canonicalize_utf8().map_err(write_err)?
    } else {
        path.to_path_buf()
    };

    let dir = match target.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    if let Ok(meta) = std::fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(write_err)?;
    }
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;
    Ok(())
}
