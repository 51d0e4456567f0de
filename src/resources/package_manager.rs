//! System package manager adapter.
//!
//! A closed set of supported managers, each exposing the same
//! query / install / refresh contract. Output parsing lives in one
//! function per manager so it can be exercised with fixture strings.
use std::fmt;

use crate::error::{AdapterError, InstallError};
use crate::exec::{ExecResult, Executor, display_command};
use crate::platform::Elevation;

/// Supported system package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// Homebrew (macOS and Linuxbrew).
    Brew,
    /// Debian/Ubuntu `apt-get`.
    Apt,
    /// Fedora/RHEL `dnf`.
    Dnf,
    /// Arch Linux `pacman`.
    Pacman,
    /// openSUSE `zypper`.
    Zypper,
    /// Alpine `apk`.
    Apk,
    /// Legacy RHEL/CentOS `yum`.
    Yum,
}

/// Detection order. Homebrew wins over every native manager when both are
/// present (e.g. Linuxbrew alongside apt).
pub const PRIORITY: [PackageManager; 7] = [
    PackageManager::Brew,
    PackageManager::Apt,
    PackageManager::Dnf,
    PackageManager::Pacman,
    PackageManager::Zypper,
    PackageManager::Apk,
    PackageManager::Yum,
];

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Brew => "brew",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
            Self::Apk => "apk",
            Self::Yum => "yum",
        })
    }
}

impl PackageManager {
    /// Pick the first manager from [`PRIORITY`] whose binary is on PATH.
    #[must_use]
    pub fn detect(executor: &dyn Executor) -> Option<Self> {
        PRIORITY
            .into_iter()
            .find(|m| executor.which(m.binary()).is_some())
    }

    /// Executable used to detect and drive this manager.
    #[must_use]
    pub const fn binary(self) -> &'static str {
        match self {
            Self::Brew => "brew",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
            Self::Apk => "apk",
            Self::Yum => "yum",
        }
    }

    /// Whether install and refresh commands must run elevated.
    #[must_use]
    pub const fn needs_elevation(self) -> bool {
        !matches!(self, Self::Brew)
    }

    /// Package database query for `package` as `(program, args)`.
    #[must_use]
    pub fn query_command(self, package: &str) -> (&'static str, Vec<&str>) {
        match self {
            Self::Brew => ("brew", vec!["list", "--versions", package]),
            Self::Apt => ("dpkg-query", vec!["-W", "-f=${Status}", package]),
            Self::Dnf | Self::Zypper | Self::Yum => ("rpm", vec!["-q", package]),
            Self::Pacman => ("pacman", vec!["-Q", package]),
            Self::Apk => ("apk", vec!["info", "-e", package]),
        }
    }

    /// Interpret the output of [`query_command`](Self::query_command).
    ///
    /// A non-zero exit means "not installed", never an error.
    #[must_use]
    pub fn parse_query(self, result: &ExecResult) -> bool {
        if !result.success {
            return false;
        }
        let out = result.stdout.trim();
        match self {
            Self::Brew | Self::Apk => !out.is_empty(),
            Self::Apt => out.contains("install ok installed"),
            Self::Dnf | Self::Zypper | Self::Yum => !out.contains("is not installed"),
            Self::Pacman => true,
        }
    }

    /// Query the package database.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Invocation`] only when the query tool itself
    /// cannot be run.
    pub fn is_installed(
        self,
        executor: &dyn Executor,
        package: &str,
    ) -> Result<bool, AdapterError> {
        let (program, args) = self.query_command(package);
        let result =
            executor
                .run_unchecked(program, &args)
                .map_err(|e| AdapterError::Invocation {
                    program: program.to_string(),
                    message: format!("{e:#}"),
                })?;
        Ok(self.parse_query(&result))
    }

    /// Non-interactive install command for `package`, before elevation.
    #[must_use]
    pub fn install_command(self, package: &str) -> (&'static str, Vec<&str>) {
        match self {
            Self::Brew => ("brew", vec!["install", package]),
            Self::Apt => (
                "env",
                vec![
                    "DEBIAN_FRONTEND=noninteractive",
                    "apt-get",
                    "install",
                    "-y",
                    package,
                ],
            ),
            Self::Dnf => ("dnf", vec!["install", "-y", package]),
            Self::Pacman => ("pacman", vec!["-S", "--needed", "--noconfirm", package]),
            Self::Zypper => ("zypper", vec!["--non-interactive", "install", package]),
            Self::Apk => ("apk", vec!["add", package]),
            Self::Yum => ("yum", vec!["install", "-y", package]),
        }
    }

    /// Repository metadata refresh command, before elevation.
    #[must_use]
    pub const fn refresh_command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Brew => ("brew", &["update"]),
            Self::Apt => ("apt-get", &["update"]),
            Self::Dnf => ("dnf", &["makecache"]),
            Self::Pacman => ("pacman", &["-Sy"]),
            Self::Zypper => ("zypper", &["--non-interactive", "refresh"]),
            Self::Apk => ("apk", &["update"]),
            Self::Yum => ("yum", &["makecache"]),
        }
    }

    /// Install `package` with this manager.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::PrivilegeRequired`] when elevation is needed
    /// but unavailable, or [`InstallError::CommandFailed`] if the manager exits
    /// non-zero.
    pub fn install(
        self,
        executor: &dyn Executor,
        elevation: Elevation,
        package: &str,
    ) -> Result<(), InstallError> {
        let (program, args) = self.install_command(package);
        self.run_maybe_elevated(executor, elevation, program, &args)
    }

    /// Refresh repository metadata.
    ///
    /// # Errors
    ///
    /// Same conditions as [`install`](Self::install).
    pub fn refresh_index(
        self,
        executor: &dyn Executor,
        elevation: Elevation,
    ) -> Result<(), InstallError> {
        let (program, args) = self.refresh_command();
        self.run_maybe_elevated(executor, elevation, program, args)
    }

    fn run_maybe_elevated(
        self,
        executor: &dyn Executor,
        elevation: Elevation,
        program: &str,
        args: &[&str],
    ) -> Result<(), InstallError> {
        let (program, argv) = if self.needs_elevation() {
            elevation
                .wrap(program, args)
                .ok_or(InstallError::PrivilegeRequired { manager: self })?
        } else {
            (program, args.to_vec())
        };
        executor
            .run_interactive(program, &argv)
            .map_err(|e| InstallError::CommandFailed {
                program: display_command(program, &argv),
                detail: format!("{e:#}"),
            })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    fn result(success: bool, stdout: &str) -> ExecResult {
        ExecResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        }
    }

    #[test]
    fn detect_prefers_brew_over_apt() {
        let exec = MockExecutor::new().with_which(&["apt-get", "brew"]);
        assert_eq!(PackageManager::detect(&exec), Some(PackageManager::Brew));
    }

    #[test]
    fn detect_follows_priority_list() {
        let exec = MockExecutor::new().with_which(&["yum", "dnf"]);
        assert_eq!(PackageManager::detect(&exec), Some(PackageManager::Dnf));
        let exec = MockExecutor::new().with_which(&["apk", "zypper"]);
        assert_eq!(PackageManager::detect(&exec), Some(PackageManager::Zypper));
    }

    #[test]
    fn detect_none_when_nothing_on_path() {
        assert_eq!(PackageManager::detect(&MockExecutor::new()), None);
    }

    #[test]
    fn parse_dpkg_status() {
        let apt = PackageManager::Apt;
        assert!(apt.parse_query(&result(true, "install ok installed")));
        assert!(!apt.parse_query(&result(true, "deinstall ok config-files")));
        assert!(!apt.parse_query(&result(
            false,
            "dpkg-query: no packages found matching bat"
        )));
    }

    #[test]
    fn parse_rpm_query() {
        let dnf = PackageManager::Dnf;
        assert!(dnf.parse_query(&result(true, "git-2.43.0-1.fc39.x86_64\n")));
        assert!(!dnf.parse_query(&result(false, "package bat is not installed\n")));
        assert!(!dnf.parse_query(&result(true, "package bat is not installed\n")));
    }

    #[test]
    fn parse_brew_and_apk_require_output() {
        assert!(PackageManager::Brew.parse_query(&result(true, "git 2.44.0\n")));
        assert!(!PackageManager::Brew.parse_query(&result(true, "")));
        assert!(PackageManager::Apk.parse_query(&result(true, "git\n")));
        assert!(!PackageManager::Apk.parse_query(&result(true, "\n")));
    }

    #[test]
    fn parse_pacman_uses_exit_status() {
        assert!(PackageManager::Pacman.parse_query(&result(true, "git 2.44.0-1\n")));
        assert!(!PackageManager::Pacman.parse_query(&result(
            false,
            "error: package 'bat' was not found\n"
        )));
    }

    #[test]
    fn is_installed_not_found_is_false_not_error() {
        let exec = MockExecutor::new().respond("pacman -Q", false, "");
        assert!(!PackageManager::Pacman.is_installed(&exec, "bat").unwrap());
    }

    #[test]
    fn install_apt_wraps_with_sudo() {
        let exec = MockExecutor::new().succeed_unmatched();
        PackageManager::Apt
            .install(&exec, Elevation::Sudo, "git")
            .unwrap();
        assert_eq!(
            exec.calls(),
            vec!["sudo env DEBIAN_FRONTEND=noninteractive apt-get install -y git"]
        );
    }

    #[test]
    fn install_brew_never_uses_sudo() {
        let exec = MockExecutor::new().succeed_unmatched();
        PackageManager::Brew
            .install(&exec, Elevation::None, "git")
            .unwrap();
        assert_eq!(exec.calls(), vec!["brew install git"]);
    }

    #[test]
    fn install_without_elevation_is_privilege_error() {
        let exec = MockExecutor::new().succeed_unmatched();
        let err = PackageManager::Dnf
            .install(&exec, Elevation::None, "git")
            .unwrap_err();
        assert!(matches!(
            err,
            InstallError::PrivilegeRequired {
                manager: PackageManager::Dnf
            }
        ));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn install_failure_is_command_failed() {
        let exec = MockExecutor::new();
        let err = PackageManager::Pacman
            .install(&exec, Elevation::Root, "nope")
            .unwrap_err();
        assert!(matches!(err, InstallError::CommandFailed { .. }));
    }

    #[test]
    fn refresh_commands_per_manager() {
        let exec = MockExecutor::new().succeed_unmatched();
        PackageManager::Zypper
            .refresh_index(&exec, Elevation::Root)
            .unwrap();
        PackageManager::Brew
            .refresh_index(&exec, Elevation::None)
            .unwrap();
        assert_eq!(
            exec.calls(),
            vec!["zypper --non-interactive refresh", "brew update"]
        );
    }
}
