//! Zip snapshots of the committed tree.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

use crate::git::Repo;

/// Errors from producing an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive could not be written.
    #[error("failed to archive HEAD to {output}: {message}")]
    ArchiveFailed {
        /// The archive path that was attempted.
        output: Utf8PathBuf,
        /// What went wrong.
        message: String,
    },
}

/// Result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Write `HEAD` of `repo` to `<output_dir>/<name>.zip` and return that path.
///
/// A relative `output_dir` is taken relative to the repository root.
/// Uncommitted changes are not included. The repository is not modified.
#[instrument(skip(repo), fields(root = %repo.root()))]
pub fn zip(repo: &Repo, output_dir: &Utf8Path, name: &str) -> ArchiveResult<Utf8PathBuf> {
    let output_dir = if output_dir.is_absolute() {
        output_dir.to_path_buf()
    } else {
        repo.root().join(output_dir)
    };
    let output = output_dir.join(format!("{name}.zip"));
    let failed = |message: String| ArchiveError::ArchiveFailed {
        output: output.clone(),
        message,
    };

    if !output_dir.is_dir() {
        return Err(failed(format!("{output_dir} is not a directory")));
    }

    repo.archive_zip(&output, "HEAD")
        .map_err(|e| failed(e.to_string()))?;

    info!(%output, "bundled HEAD");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read as _;

    use tempfile::TempDir;

    use super::*;
    use crate::git::testing::Sandbox;

    #[test]
    fn zip_is_named_after_the_tag() {
        let sandbox = Sandbox::new();
        let out = TempDir::new().unwrap();
        let out_dir = Utf8Path::from_path(out.path()).unwrap();

        let path = zip(&sandbox.repo(), out_dir, "v1.2.3").unwrap();

        assert_eq!(path, out_dir.join("v1.2.3.zip"));
        let mut magic = [0u8; 2];
        fs::File::open(&path).unwrap().read_exact(&mut magic).unwrap();
        assert_eq!(&magic, b"PK");
    }

    #[test]
    fn zip_leaves_worktree_untouched() {
        let sandbox = Sandbox::new();
        fs::write(sandbox.work.join("scratch.txt"), "uncommitted\n").unwrap();
        let out = TempDir::new().unwrap();
        let out_dir = Utf8Path::from_path(out.path()).unwrap();

        zip(&sandbox.repo(), out_dir, "snap").unwrap();

        assert_eq!(
            sandbox.git(&["status", "--porcelain"]),
            "?? scratch.txt"
        );
        assert_eq!(fs::read_dir(out_dir).unwrap().count(), 1);
    }

    #[test]
    fn zip_holds_committed_content_not_worktree_edits() {
        let sandbox = Sandbox::new();
        let committed = fs::read_to_string(sandbox.work.join("package.json")).unwrap();
        fs::write(
            sandbox.work.join("package.json"),
            "{\n  \"name\": \"demo\",\n  \"version\": \"9.9.9\"\n}\n",
        )
        .unwrap();
        let out = TempDir::new().unwrap();
        let out_dir = Utf8Path::from_path(out.path()).unwrap();

        let path = zip(&sandbox.repo(), out_dir, "v1.0.0").unwrap();

        let mut archive = ::zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
        let mut entry = archive.by_name("package.json").unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, committed);
        assert!(!contents.contains("9.9.9"));
    }

    #[test]
    fn relative_output_dir_is_under_the_repo_root() {
        let sandbox = Sandbox::new();
        fs::create_dir(sandbox.work.join("dist")).unwrap();

        let path = zip(&sandbox.repo(), Utf8Path::new("dist"), "v1.0.0").unwrap();

        assert_eq!(path, sandbox.work.join("dist").join("v1.0.0.zip"));
        assert!(path.is_file());
    }

    #[test]
    fn missing_output_dir_is_archive_failed() {
        let sandbox = Sandbox::new();
        let out = TempDir::new().unwrap();
        let missing = Utf8Path::from_path(out.path()).unwrap().join("nope");

        let err = zip(&sandbox.repo(), &missing, "v1.0.0").unwrap_err();
        let ArchiveError::ArchiveFailed { output, message } = err;
        assert_eq!(output, missing.join("v1.0.0.zip"));
        assert!(message.contains("not a directory"));
    }

    #[test]
    fn outside_a_repo_is_archive_failed() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let repo = Repo::new(dir);

        assert!(matches!(
            zip(&repo, dir, "v1.0.0"),
            Err(ArchiveError::ArchiveFailed { .. })
        ));
    }
}
