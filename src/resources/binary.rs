//! Prebuilt binary download from GitHub releases.
//!
//! Only a handful of tools publish stable, statically linked archives with a
//! predictable name. For those the latest tag is looked up, the archive for
//! the host's target triple is fetched with `curl`, unpacked with `tar`, and
//! the executable is copied into the user's bin directory.
use std::path::{Path, PathBuf};

use super::fs::{find_file, install_executable};
use super::release::ReleaseSource;
use crate::error::InstallError;
use crate::exec::{Executor, display_command};
use crate::platform::Os;

/// Seconds allowed for establishing a connection.
const CONNECT_TIMEOUT: u64 = 10;

/// A tool that can be installed from a release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseBinary {
    /// Manifest package names that map to this tool.
    pub packages: &'static [&'static str],
    /// GitHub `owner/name`.
    pub repo: &'static str,
    /// Executable inside the archive.
    pub binary: &'static str,
    /// Archive name with `{tag}`, `{version}` (tag without `v`), and
    /// `{triple}` placeholders.
    pub asset: &'static str,
    /// Whether macOS archives are published.
    pub darwin: bool,
}

/// Tools with a download tier.
pub const RELEASE_BINARIES: &[ReleaseBinary] = &[
    ReleaseBinary {
        packages: &["bat"],
        repo: "sharkdp/bat",
        binary: "bat",
        asset: "bat-{tag}-{triple}.tar.gz",
        darwin: true,
    },
    ReleaseBinary {
        packages: &["eza"],
        repo: "eza-community/eza",
        binary: "eza",
        asset: "eza_{triple}.tar.gz",
        darwin: false,
    },
    ReleaseBinary {
        packages: &["ripgrep"],
        repo: "BurntSushi/ripgrep",
        binary: "rg",
        asset: "ripgrep-{version}-{triple}.tar.gz",
        darwin: true,
    },
    ReleaseBinary {
        packages: &["fd", "fd-find"],
        repo: "sharkdp/fd",
        binary: "fd",
        asset: "fd-{tag}-{triple}.tar.gz",
        darwin: true,
    },
];

/// Look up the download entry for a manifest package name.
#[must_use]
pub fn lookup(package: &str) -> Option<&'static ReleaseBinary> {
    RELEASE_BINARIES
        .iter()
        .find(|b| b.packages.contains(&package))
}

/// Rust target triple of published archives for `os`/`arch`.
///
/// Linux `x86_64` uses the static musl build; `aarch64` archives are
/// published for glibc.
#[must_use]
pub fn target_triple(os: Os, arch: &str) -> Option<&'static str> {
    match (os, arch) {
        (Os::Linux, "x86_64") => Some("x86_64-unknown-linux-musl"),
        (Os::Linux, "aarch64") => Some("aarch64-unknown-linux-gnu"),
        (Os::MacOs, "x86_64") => Some("x86_64-apple-darwin"),
        (Os::MacOs, "aarch64") => Some("aarch64-apple-darwin"),
        _ => None,
    }
}

impl ReleaseBinary {
    /// Archive file name for `tag` and `triple`.
    #[must_use]
    pub fn asset_name(&self, tag: &str, triple: &str) -> String {
        self.asset
            .replace("{tag}", tag)
            .replace("{version}", tag.trim_start_matches('v'))
            .replace("{triple}", triple)
    }

    /// Full download URL.
    #[must_use]
    pub fn download_url(&self, tag: &str, triple: &str) -> String {
        format!(
            "https://github.com/{}/releases/download/{tag}/{}",
            self.repo,
            self.asset_name(tag, triple)
        )
    }

    fn triple_for(&self, os: Os, arch: &str) -> Option<&'static str> {
        if os == Os::MacOs && !self.darwin {
            return None;
        }
        target_triple(os, arch)
    }
}

/// Inputs shared by every download.
#[derive(Debug)]
pub struct BinaryDownload<'a> {
    /// Host OS.
    pub os: Os,
    /// Normalized CPU architecture.
    pub arch: &'a str,
    /// Where the executable is installed.
    pub bin_dir: &'a Path,
    /// Scratch directory for archives; created and removed per download.
    pub work_dir: &'a Path,
    /// Transfer timeout in seconds.
    pub timeout_secs: u64,
    /// Tag lookup.
    pub releases: &'a dyn ReleaseSource,
    /// Runs `curl` and `tar`.
    pub executor: &'a dyn Executor,
}

impl BinaryDownload<'_> {
    /// Download and install the release binary for `package`.
    ///
    /// Returns the installed executable's path.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Unsupported`] if there is no download entry or
    /// archive for this host, [`InstallError::Network`] if the tag lookup or
    /// download fails, and [`InstallError::CommandFailed`] if unpacking or
    /// installing fails.
    pub fn install(&self, package: &str) -> Result<PathBuf, InstallError> {
        let entry = lookup(package).ok_or_else(|| InstallError::Unsupported {
            package: package.to_string(),
            reason: "no release download available".to_string(),
        })?;
        let triple = entry
            .triple_for(self.os, self.arch)
            .ok_or_else(|| InstallError::Unsupported {
                package: package.to_string(),
                reason: format!("no release archive for {} {}", self.os, self.arch),
            })?;

        let tag = self.releases.latest_tag(entry.repo)?;
        let url = entry.download_url(&tag, triple);
        let scratch = self.work_dir.join(entry.binary);
        let result = self.fetch_and_install(entry, &url, &scratch);
        if scratch.exists()
            && let Err(e) = std::fs::remove_dir_all(&scratch)
        {
            tracing::debug!("leaving {}: {e}", scratch.display());
        }
        result
    }

    fn fetch_and_install(
        &self,
        entry: &ReleaseBinary,
        url: &str,
        scratch: &Path,
    ) -> Result<PathBuf, InstallError> {
        let io_failure = |what: &str, e: &dyn std::fmt::Display| InstallError::CommandFailed {
            program: what.to_string(),
            detail: e.to_string(),
        };
        std::fs::create_dir_all(scratch).map_err(|e| io_failure("mkdir", &e))?;
        let archive = scratch.join("release.tar.gz");
        let archive_str = archive.to_string_lossy();
        let scratch_str = scratch.to_string_lossy();
        let connect_timeout = CONNECT_TIMEOUT.to_string();
        let transfer_timeout = self.timeout_secs.to_string();

        tracing::debug!("downloading {url}");
        self.executor
            .run(
                "curl",
                &[
                    "-fsSL",
                    "--connect-timeout",
                    &connect_timeout,
                    "--max-time",
                    &transfer_timeout,
                    "-o",
                    &archive_str,
                    url,
                ],
            )
            .map_err(|e| InstallError::Network {
                url: url.to_string(),
                detail: format!("{e:#}"),
            })?;

        let tar_args = ["-xzf", &*archive_str, "-C", &*scratch_str];
        self.executor
            .run("tar", &tar_args)
            .map_err(|e| InstallError::CommandFailed {
                program: display_command("tar", &tar_args),
                detail: format!("{e:#}"),
            })?;

        let found = find_file(scratch, entry.binary).ok_or_else(|| InstallError::CommandFailed {
            program: "tar".to_string(),
            detail: format!("archive does not contain '{}'", entry.binary),
        })?;
        let dest = self.bin_dir.join(entry.binary);
        install_executable(&found, &dest).map_err(|e| io_failure("install", &format!("{e:#}")))?;
        Ok(dest)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::ExecResult;
    use crate::resources::test_helpers::MockExecutor;

    #[derive(Debug)]
    struct FixedTag(&'static str);

    impl ReleaseSource for FixedTag {
        fn latest_tag(&self, _repo: &str) -> Result<String, InstallError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug)]
    struct Offline;

    impl ReleaseSource for Offline {
        fn latest_tag(&self, repo: &str) -> Result<String, InstallError> {
            Err(InstallError::Network {
                url: repo.to_string(),
                detail: "offline".to_string(),
            })
        }
    }

    /// Executor whose `tar` drops the named binary into the `-C` directory.
    #[derive(Debug)]
    struct Unpacker {
        inner: MockExecutor,
        binary: &'static str,
    }

    impl Executor for Unpacker {
        fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            let result = self.inner.run(program, args)?;
            if program == "tar" {
                let dest = Path::new(args[3]).join("pkg");
                std::fs::create_dir_all(&dest)?;
                std::fs::write(dest.join(self.binary), "#!/bin/sh\n")?;
            }
            Ok(result)
        }

        fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.inner.run_unchecked(program, args)
        }

        fn run_interactive(&self, program: &str, args: &[&str]) -> anyhow::Result<()> {
            self.inner.run_interactive(program, args)
        }

        fn which(&self, program: &str) -> Option<PathBuf> {
            self.inner.which(program)
        }
    }

    #[test]
    fn asset_names_follow_each_projects_scheme() {
        let rg = lookup("ripgrep").unwrap();
        assert_eq!(
            rg.download_url("14.1.0", "x86_64-unknown-linux-musl"),
            "https://github.com/BurntSushi/ripgrep/releases/download/14.1.0/ripgrep-14.1.0-x86_64-unknown-linux-musl.tar.gz"
        );
        let bat = lookup("bat").unwrap();
        assert_eq!(
            bat.asset_name("v0.24.0", "aarch64-apple-darwin"),
            "bat-v0.24.0-aarch64-apple-darwin.tar.gz"
        );
        assert_eq!(
            lookup("eza").unwrap().asset_name("v0.18.0", "x86_64-unknown-linux-musl"),
            "eza_x86_64-unknown-linux-musl.tar.gz"
        );
        assert_eq!(lookup("fd-find").unwrap().binary, "fd");
    }

    #[test]
    fn triples_by_host() {
        assert_eq!(
            target_triple(Os::Linux, "aarch64"),
            Some("aarch64-unknown-linux-gnu")
        );
        assert_eq!(target_triple(Os::MacOs, "x86_64"), Some("x86_64-apple-darwin"));
        assert_eq!(target_triple(Os::Linux, "riscv64"), None);
        assert_eq!(target_triple(Os::Unknown, "x86_64"), None);
        assert_eq!(lookup("eza").unwrap().triple_for(Os::MacOs, "aarch64"), None);
    }

    #[test]
    fn unknown_package_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let exec = MockExecutor::new();
        let dl = BinaryDownload {
            os: Os::Linux,
            arch: "x86_64",
            bin_dir: dir.path(),
            work_dir: dir.path(),
            timeout_secs: 120,
            releases: &FixedTag("v1"),
            executor: &exec,
        };
        assert!(matches!(
            dl.install("jq").unwrap_err(),
            InstallError::Unsupported { .. }
        ));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn tag_lookup_failure_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let exec = MockExecutor::new().succeed_unmatched();
        let dl = BinaryDownload {
            os: Os::Linux,
            arch: "x86_64",
            bin_dir: dir.path(),
            work_dir: dir.path(),
            timeout_secs: 120,
            releases: &Offline,
            executor: &exec,
        };
        assert!(matches!(
            dl.install("bat").unwrap_err(),
            InstallError::Network { .. }
        ));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn download_failure_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let exec = MockExecutor::new().respond("curl", false, "");
        let dl = BinaryDownload {
            os: Os::Linux,
            arch: "x86_64",
            bin_dir: &dir.path().join("bin"),
            work_dir: &dir.path().join("work"),
            timeout_secs: 120,
            releases: &FixedTag("v0.10.2"),
            executor: &exec,
        };
        assert!(matches!(
            dl.install("fd").unwrap_err(),
            InstallError::Network { .. }
        ));
        assert!(!dir.path().join("work/fd").exists());
    }

    #[cfg(unix)]
    #[test]
    fn installs_executable_into_bin_dir() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        let exec = Unpacker {
            inner: MockExecutor::new().succeed_unmatched(),
            binary: "rg",
        };
        let dl = BinaryDownload {
            os: Os::Linux,
            arch: "x86_64",
            bin_dir: &bin,
            work_dir: &dir.path().join("work"),
            timeout_secs: 60,
            releases: &FixedTag("14.1.0"),
            executor: &exec,
        };
        let installed = dl.install("ripgrep").unwrap();
        assert_eq!(installed, bin.join("rg"));
        let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        let calls = exec.inner.calls();
        assert!(calls[0].starts_with("curl -fsSL --connect-timeout 10 --max-time 60 -o "));
        assert!(calls[0].ends_with("ripgrep-14.1.0-x86_64-unknown-linux-musl.tar.gz"));
        assert!(calls[1].starts_with("tar -xzf "));
        assert!(!dir.path().join("work/rg").exists());
    }
}
