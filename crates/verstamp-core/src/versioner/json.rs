use camino::Utf8Path;
use serde_json::Value;
use tracing::instrument;

use super::Versioner;
use crate::store::{StoreError, StoreResult, read_file, write_atomic};

/// `package.json`-style files: a JSON object with a string `version`.
///
/// Writes keep key order and re-serialize with two-space indentation and a
/// trailing newline. A missing `version` key is appended on write.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonVersioner;

impl JsonVersioner {
    fn load(path: &Utf8Path) -> StoreResult<serde_json::Map<String, Value>> {
        let raw = read_file(path)?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| StoreError::MalformedVersionFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::MalformedVersionFile {
                path: path.to_path_buf(),
                message: format!("expected a JSON object, found {}", kind(&other)),
            }),
        }
    }
}

impl Versioner for JsonVersioner {
    #[instrument(skip(self))]
    fn read(&self, path: &Utf8Path) -> StoreResult<String> {
        let map = Self::load(path)?;
        match map.get("version") {
            Some(Value::String(v)) => Ok(v.clone()),
            _ => Err(StoreError::MissingVersion {
                path: path.to_path_buf(),
            }),
        }
    }

    #[instrument(skip(self))]
    fn write(&self, path: &Utf8Path, version: &str) -> StoreResult<String> {
        let mut map = Self::load(path)?;
        map.insert("version".to_string(), Value::String(version.to_string()));

        let mut out = serde_json::to_string_pretty(&Value::Object(map)).map_err(|e| {
            StoreError::MalformedVersionFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        out.push('\n');

        write_atomic(path, &out)?;
        Ok(version.to_string())
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn file(tmp: &TempDir, contents: &str) -> Utf8PathBuf {
        let path = Utf8Path::from_path(tmp.path()).unwrap().join("package.json");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_version_field() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, r#"{"name": "app", "version": "0.3.1"}"#);
        assert_eq!(JsonVersioner.read(&path).unwrap(), "0.3.1");
    }

    #[test]
    fn write_preserves_key_order_and_other_fields() {
        let tmp = TempDir::new().unwrap();
        let original = "{\n  \"name\": \"app\",\n  \"version\": \"0.3.1\",\n  \"scripts\": {\n    \"zeta\": \"z\",\n    \"alpha\": \"a\"\n  },\n  \"license\": \"MIT\"\n}\n";
        let path = file(&tmp, original);

        JsonVersioner.write(&path, "0.4.0").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, original.replace("0.3.1", "0.4.0"));
    }

    #[test]
    fn write_normalizes_to_two_space_indent_with_newline() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, r#"{"version":"1.0.0","private":true}"#);

        JsonVersioner.write(&path, "1.0.1").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"version\": \"1.0.1\",\n  \"private\": true\n}\n"
        );
    }

    #[test]
    fn write_appends_missing_version() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "{\"name\": \"app\"}");

        JsonVersioner.write(&path, "0.1.0").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"name\": \"app\",\n  \"version\": \"0.1.0\"\n}\n"
        );
    }

    #[test]
    fn invalid_json_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "{ version: 1.0.0 }");
        assert!(matches!(
            JsonVersioner.read(&path),
            Err(StoreError::MalformedVersionFile { .. })
        ));
    }

    #[test]
    fn non_object_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "[\"1.0.0\"]");
        let err = JsonVersioner.read(&path).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn missing_or_numeric_version_is_missing() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "{\"name\": \"app\"}");
        assert!(matches!(
            JsonVersioner.read(&path),
            Err(StoreError::MissingVersion { .. })
        ));

        let path = file(&tmp, "{\"version\": 2}");
        assert!(matches!(
            JsonVersioner.read(&path),
            Err(StoreError::MissingVersion { .. })
        ));
    }

    #[test]
    fn malformed_file_is_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let path = file(&tmp, "{ broken");
        assert!(JsonVersioner.write(&path, "1.0.0").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ broken");
    }
}
