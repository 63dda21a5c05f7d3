//! Configuration integration tests.
//!
//! Config discovery, format parsing and precedence, observed through
//! `verstamp info --json` on the compiled binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// `info --json` run from `dir`.
fn info(dir: &Path) -> serde_json::Value {
    let assert = cmd()
        .arg("-C")
        .arg(dir)
        .args(["info", "--json"])
        .assert()
        .success();
    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();

    let json = info(tmp.path());

    assert!(json["config"]["config_file"].is_null());
    assert_eq!(json["versioning"]["remote"], "origin");
    assert_eq!(json["versioning"]["version_files"][0], "package.json");
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".verstamp.toml"),
        "[git]\nremote = \"upstream\"\n",
    )
    .unwrap();

    let json = info(tmp.path());

    assert_eq!(json["versioning"]["remote"], "upstream");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".verstamp.toml")
    );
}

#[test]
fn discovers_regular_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("verstamp.toml"),
        "[versioning]\nlevel = \"minor\"\n",
    )
    .unwrap();

    assert_eq!(info(tmp.path())["versioning"]["level"], "minor");
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("packages").join("web");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(
        tmp.path().join(".verstamp.toml"),
        "[versioning]\nversioner = \"text\"\nversion_files = [\"VERSION\"]\n",
    )
    .unwrap();

    let json = info(&sub_dir);

    assert_eq!(json["versioning"]["versioner"], "text");
    assert_eq!(json["versioning"]["version_files"][0], "VERSION");
}

#[test]
fn dotfile_takes_precedence_over_regular_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".verstamp.toml"), "[git]\nremote = \"dot\"\n").unwrap();
    fs::write(tmp.path().join("verstamp.toml"), "[git]\nremote = \"plain\"\n").unwrap();

    assert_eq!(info(tmp.path())["versioning"]["remote"], "dot");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".verstamp.yaml"),
        "versioning:\n  formatter: plain\n  bundle: true\n  bundle_dir: dist\n",
    )
    .unwrap();

    let json = info(tmp.path());

    assert_eq!(json["versioning"]["formatter"], "plain");
    assert_eq!(json["versioning"]["bundle"], true);
}

#[test]
fn parses_yml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".verstamp.yml"), "log_level: debug\n").unwrap();

    assert_eq!(info(tmp.path())["config"]["log_level"], "debug");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".verstamp.json"),
        r#"{"versioning": {"versioner": "toml", "version_files": ["Cargo.toml"]}}"#,
    )
    .unwrap();

    let json = info(tmp.path());

    assert_eq!(json["versioning"]["versioner"], "toml");
    assert_eq!(json["versioning"]["version_files"][0], "Cargo.toml");
}

#[test]
fn explicit_config_flag_wins() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".verstamp.toml"), "[git]\nremote = \"project\"\n").unwrap();
    let explicit = tmp.path().join("ci.toml");
    fs::write(&explicit, "[git]\nremote = \"ci\"\n").unwrap();

    let assert = cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("--config")
        .arg(&explicit)
        .args(["info", "--json"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    assert_eq!(json["versioning"]["remote"], "ci");
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("project");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".verstamp.toml"), "[git]\nremote = \"outer\"\n").unwrap();
    fs::write(sub_dir.join(".verstamp.toml"), "[git]\nremote = \"inner\"\n").unwrap();

    assert_eq!(info(&sub_dir)["versioning"]["remote"], "inner");
}

#[test]
fn toml_preferred_over_yaml_in_same_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".verstamp.toml"), "[git]\nremote = \"toml\"\n").unwrap();
    fs::write(tmp.path().join(".verstamp.yaml"), "git:\n  remote: yaml\n").unwrap();

    assert_eq!(info(tmp.path())["versioning"]["remote"], "toml");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".verstamp.toml"), "this is not valid toml [[[").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".verstamp.json"), "{not valid json}").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn unknown_versioner_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".verstamp.toml"),
        "[versioning]\nversioner = \"xml\"\n",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".verstamp.toml"),
        "log_level = \"info\"\nunknown_field = \"ignored\"\n\n[git]\nremote = \"kept\"\n",
    )
    .unwrap();

    assert_eq!(info(tmp.path())["versioning"]["remote"], "kept");
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();

    // Outside the repository, so never reached
    fs::write(parent.join(".verstamp.toml"), "[git]\nremote = \"outside\"\n").unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    assert_eq!(info(&src)["versioning"]["remote"], "origin");
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".verstamp.toml"), "[git]\nremote = \"repo\"\n").unwrap();

    assert_eq!(info(&src)["versioning"]["remote"], "repo");
}
