use camino::Utf8Path;
use toml_edit::{DocumentMut, Item, Value};
use tracing::{debug, instrument};

use super::Versioner;
use crate::store::{StoreError, StoreResult, read_file, write_atomic};

/// TOML files such as `Cargo.toml` or `pyproject.toml`.
///
/// The version is looked up as a top-level `version`, then
/// `[package].version`, then `[workspace.package].version`. Edits go
/// through `toml_edit`, so comments and layout survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlVersioner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Root,
    Package,
    WorkspacePackage,
}

impl Location {
    const SEARCH_ORDER: [Self; 3] = [Self::Root, Self::Package, Self::WorkspacePackage];

    fn item(self, doc: &DocumentMut) -> Option<&Item> {
        match self {
            Self::Root => doc.get("version"),
            Self::Package => doc.get("package")?.get("version"),
            Self::WorkspacePackage => doc.get("workspace")?.get("package")?.get("version"),
        }
    }

    fn item_mut(self, doc: &mut DocumentMut) -> Option<&mut Item> {
        match self {
            Self::Root => doc.get_mut("version"),
            Self::Package => doc.get_mut("package")?.get_mut("version"),
            Self::WorkspacePackage => doc
                .get_mut("workspace")?
                .get_mut("package")?
                .get_mut("version"),
        }
    }
}

impl TomlVersioner {
    fn load(path: &Utf8Path) -> StoreResult<DocumentMut> {
        read_file(path)?
            .parse::<DocumentMut>()
            .map_err(|e| StoreError::MalformedVersionFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn locate(doc: &DocumentMut) -> Option<(Location, String)> {
        Location::SEARCH_ORDER.into_iter().find_map(|loc| {
            loc.item(doc)
                .and_then(Item::as_str)
                .map(|v| (loc, v.to_string()))
        })
    }
}

impl Versioner for TomlVersioner {
    #[instrument(skip(self))]
    fn read(&self, path: &Utf8Path) -> StoreResult<String> {
        let doc = Self::load(path)?;
        Self::locate(&doc)
            .map(|(_, version)| version)
            .ok_or_else(|| StoreError::MissingVersion {
                path: path.to_path_buf(),
            })
    }

    #[instrument(skip(self))]
    fn write(&self, path: &Utf8Path, version: &str) -> StoreResult<String> {
        let mut doc = Self::load(path)?;
        let missing = || StoreError::MissingVersion {
            path: path.to_path_buf(),
        };

        let (location, _) = Self::locate(&doc).ok_or_else(missing)?;
        let value = location
            .item_mut(&mut doc)
            .and_then(Item::as_value_mut)
            .ok_or_else(missing)?;

        let decor = value.decor().clone();
        *value = Value::from(version);
        *value.decor_mut() = decor;
        debug!(?location, "replaced version");

        write_atomic(path, &doc.to_string())?;
        Ok(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn file(tmp: &TempDir, contents: &str) -> Utf8PathBuf {
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("Cargo.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_package_version() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "[package]\nname = \"demo\"\nversion = \"0.2.0\"\n");
        assert_eq!(TomlVersioner.read(&path).unwrap(), "0.2.0");
    }

    #[test]
    fn top_level_version_wins() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "version = \"3.0.0\"\n\n[package]\nversion = \"0.2.0\"\n");
        assert_eq!(TomlVersioner.read(&path).unwrap(), "3.0.0");
    }

    #[test]
    fn falls_back_to_workspace_package() {
        let tmp = TempDir::new().unwrap();
        let path = file(
            &tmp,
            "[workspace]\nmembers = [\"a\"]\n\n[workspace.package]\nversion = \"1.4.0\"\n",
        );
        assert_eq!(TomlVersioner.read(&path).unwrap(), "1.4.0");
    }

    #[test]
    fn inherited_package_version_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = file(
            &tmp,
            "[package]\nversion.workspace = true\n\n[workspace.package]\nversion = \"1.4.0\"\n",
        );
        assert_eq!(TomlVersioner.read(&path).unwrap(), "1.4.0");
    }

    #[test]
    fn write_keeps_comments_and_layout() {
        let tmp = TempDir::new().unwrap();
        let original = "# release me\n[package]\nname = \"demo\"\nversion = \"0.2.0\" # bumped by ci\nedition = \"2024\"\n";
        let path = file(&tmp, original);

        TomlVersioner.write(&path, "0.3.0").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            original.replace("0.2.0", "0.3.0")
        );
        assert_eq!(TomlVersioner.read(&path).unwrap(), "0.3.0");
    }

    #[test]
    fn no_version_anywhere_is_missing() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "[package]\nname = \"demo\"\n");
        assert!(matches!(
            TomlVersioner.read(&path),
            Err(StoreError::MissingVersion { .. })
        ));
        assert!(matches!(
            TomlVersioner.write(&path, "1.0.0"),
            Err(StoreError::MissingVersion { .. })
        ));
    }

    #[test]
    fn invalid_toml_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "[package\nversion = ");
        assert!(matches!(
            TomlVersioner.read(&path),
            Err(StoreError::MalformedVersionFile { .. })
        ));
    }
}
