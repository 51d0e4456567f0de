//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors (e.g., [`InstallError`],
//! [`SymlinkError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! SetupError
//! ├── Platform(PlatformError): detection failures, missing mandatory tools (hard stop)
//! ├── Install(InstallError)  : a single package could not be installed (counted, not fatal)
//! └── Symlink(SymlinkError)  : a single source/target pair could not be linked
//! ```
//!
//! Only [`PlatformError`] and [`InstallError::Aborted`] stop a run; everything
//! else is accumulated into the run summary.

use std::path::PathBuf;

use thiserror::Error;

use crate::resources::package_manager::PackageManager;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Host detection or preflight failure.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Package installation failure.
    #[error("Install error: {0}")]
    Install(#[from] InstallError),

    /// Symlink or backup failure.
    #[error("Symlink error: {0}")]
    Symlink(#[from] SymlinkError),
}

/// Errors that arise while probing the host. Both variants are hard stops.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No platform identifier could be obtained at all.
    #[error("Platform detection failed: {0}")]
    DetectionFailed(String),

    /// A tool the whole run depends on is not on PATH.
    #[error("Required tool '{0}' not found on PATH")]
    MissingTool(String),
}

/// Failure to invoke a package manager's database query.
///
/// A package that is simply not installed is *not* an error; this is only
/// returned when the query tool itself could not be run.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The query program could not be spawned or crashed.
    #[error("failed to query {program}: {message}")]
    Invocation {
        /// Program that was invoked.
        program: String,
        /// Underlying failure.
        message: String,
    },
}

/// Errors that arise while installing a single package.
#[derive(Error, Debug)]
pub enum InstallError {
    /// No supported system package manager is resolvable on PATH.
    #[error("no supported package manager found")]
    NoPackageManager,

    /// The package manager needs elevated privileges that are unavailable.
    #[error("{manager} requires elevated privileges (sudo unavailable or disabled)")]
    PrivilegeRequired {
        /// Manager that needed elevation.
        manager: PackageManager,
    },

    /// An external command exited non-zero.
    #[error("'{program}' failed: {detail}")]
    CommandFailed {
        /// Program that was invoked.
        program: String,
        /// Exit status or captured error output.
        detail: String,
    },

    /// A download or API call failed.
    #[error("network request to {url} failed: {detail}")]
    Network {
        /// URL that was requested.
        url: String,
        /// Underlying failure.
        detail: String,
    },

    /// The package cannot be installed this way on this host.
    #[error("cannot install '{package}': {reason}")]
    Unsupported {
        /// Package name.
        package: String,
        /// Why it is unsupported.
        reason: String,
    },

    /// Every user-space fallback tier was tried and failed.
    #[error("all fallback tiers failed for '{package}' (tried: {})", .tried.join(", "))]
    Exhausted {
        /// Package name.
        package: String,
        /// Tiers that were attempted, in order.
        tried: Vec<String>,
    },

    /// The user chose to abort at an interactive prompt.
    #[error("aborted by user")]
    Aborted,

    /// The package database could not be queried.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Errors that arise while linking one source/target pair.
#[derive(Error, Debug)]
pub enum SymlinkError {
    /// The link source does not exist.
    #[error("source does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The target's parent directory could not be created.
    #[error("cannot create parent directory {}: {source}", .path.display())]
    CreateParent {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The pre-existing target could not be moved aside.
    #[error("cannot back up {} to {}: {source}", .target.display(), .backup.display())]
    Backup {
        /// Original target path.
        target: PathBuf,
        /// Intended backup path.
        backup: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Every backup name for the target is already taken.
    #[error("no free backup name for {}", .0.display())]
    BackupNamesExhausted(PathBuf),

    /// The symlink itself could not be created.
    #[error("cannot link {} -> {}: {source}", .target.display(), .source_path.display())]
    Link {
        /// Link location.
        target: PathBuf,
        /// Link destination.
        source_path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
