use camino::Utf8Path;
use tracing::instrument;

use super::Versioner;
use crate::store::{StoreError, StoreResult, read_file, write_atomic};

/// A `VERSION` file: the trimmed content is the version.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextVersioner;

impl Versioner for TextVersioner {
    #[instrument(skip(self))]
    fn read(&self, path: &Utf8Path) -> StoreResult<String> {
        let raw = read_file(path)?;
        let version = raw.trim();
        if version.is_empty() {
            return Err(StoreError::MissingVersion {
                path: path.to_path_buf(),
            });
        }
        if version.lines().count() > 1 {
            return Err(StoreError::MalformedVersionFile {
                path: path.to_path_buf(),
                message: "expected a single line".to_string(),
            });
        }
        Ok(version.to_string())
    }

    #[instrument(skip(self))]
    fn write(&self, path: &Utf8Path, version: &str) -> StoreResult<String> {
        write_atomic(path, &format!("{version}\n"))?;
        Ok(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn trims_whitespace() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("VERSION");
        fs::write(&path, "  1.2.3\n\n").unwrap();
        assert_eq!(TextVersioner.read(&path).unwrap(), "1.2.3");
    }

    #[test]
    fn write_creates_file_with_newline() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("VERSION");
        TextVersioner.write(&path, "0.0.1").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0.0.1\n");
    }

    #[test]
    fn empty_file_has_no_version() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("VERSION");
        fs::write(&path, "\n").unwrap();
        assert!(matches!(
            TextVersioner.read(&path),
            Err(StoreError::MissingVersion { .. })
        ));
    }

    #[test]
    fn multiline_file_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("VERSION");
        fs::write(&path, "1.0.0\n2.0.0\n").unwrap();
        assert!(matches!(
            TextVersioner.read(&path),
            Err(StoreError::MalformedVersionFile { .. })
        ));
    }
}
