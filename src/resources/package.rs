//! Package presence check.
use std::path::PathBuf;

use super::package_manager::PackageManager;
use crate::config::manifest::PackageSpec;
use crate::error::AdapterError;
use crate::exec::Executor;

/// Where a desired package currently stands on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    /// Neither in the package database nor on PATH.
    NotInstalled,
    /// Tracked by the detected package manager.
    ManagedBy(PackageManager),
    /// Binary resolvable on PATH but unknown to the detected manager.
    External(PathBuf),
}

/// Compute the status of `spec`.
///
/// The package database is consulted first, so `ManagedBy` is returned
/// exactly when the manager's installed-query says yes. Otherwise the
/// binary is looked up on PATH.
///
/// # Errors
///
/// Returns [`AdapterError`] if the manager's query tool cannot be run.
pub fn package_status(
    spec: &PackageSpec,
    manager: Option<PackageManager>,
    executor: &dyn Executor,
) -> Result<PackageStatus, AdapterError> {
    if let Some(manager) = manager
        && manager.is_installed(executor, &spec.name)?
    {
        return Ok(PackageStatus::ManagedBy(manager));
    }
    Ok(executor
        .which(spec.binary())
        .map_or(PackageStatus::NotInstalled, PackageStatus::External))
}
