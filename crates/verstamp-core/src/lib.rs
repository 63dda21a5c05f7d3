//! Core library for verstamp.
//!
//! This crate provides the versioning workflow used by the `verstamp` CLI
//! and any host build pipeline that wants to embed it.
//!
//! # Modules
//!
//! - [`archive`] - Zip snapshots of `HEAD`
//! - [`config`] - Configuration loading and management
//! - [`context`] - Values produced by a release, shared across phases
//! - [`error`] - Configuration error types and result aliases
//! - [`format`] - Tag name formatting and message templates
//! - [`git`] - Git operations for release workflows
//! - [`hooks`] - Shell hooks run between phases
//! - [`preflight`] - Release readiness checks
//! - [`record`] - Commit, tag and push a version
//! - [`release`] - Phased release orchestration
//! - [`store`] - The set of files carrying the version
//! - [`version`] - Bump levels and next-version resolution
//! - [`versioner`] - Version file formats
//!
//! # Quick Start
//!
//! ```no_run
//! use verstamp_core::{ConfigLoader, Release, ReleaseOptions};
//!
//! let config = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let outcome = Release::new(".", &config, ReleaseOptions::default())
//!     .run(|_| {})
//!     .expect("release failed");
//!
//! println!("Released {}", outcome.context.version());
//! ```
#![deny(unsafe_code)]

pub mod archive;

pub mod config;

pub mod context;

pub mod error;

pub mod format;

pub mod git;

pub mod hooks;

pub mod preflight;

pub mod record;

pub mod release;

pub mod store;

pub mod version;

pub mod versioner;

pub use config::{Config, ConfigLoader, LogLevel};

pub use context::VersioningContext;

pub use error::{ConfigError, ConfigResult};

pub use release::{Release, ReleaseError, ReleaseOptions, ReleaseOutcome};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
