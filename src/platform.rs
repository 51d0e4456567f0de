//! Host detection: OS, Linux distribution, CPU architecture, package manager
//! and privilege level, gathered once into an immutable [`HostFacts`].
use std::fmt;
use std::path::Path;

use crate::error::PlatformError;
use crate::exec::Executor;
use crate::resources::package_manager::PackageManager;

/// Detected operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// macOS (`darwin*` identifiers).
    MacOs,
    /// Any Linux distribution.
    Linux,
    /// Windows shells (MSYS, Cygwin, MinGW). Handled like [`Os::Unknown`].
    Windows,
    /// Anything else: only common packages, no shell configuration.
    Unknown,
}

impl Os {
    /// Classify a platform identifier such as `$OSTYPE` or `uname -s` output.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotsetup::platform::Os;
    ///
    /// assert_eq!(Os::from_identifier("darwin23"), Os::MacOs);
    /// assert_eq!(Os::from_identifier("Linux"), Os::Linux);
    /// assert_eq!(Os::from_identifier("linux-gnu"), Os::Linux);
    /// assert_eq!(Os::from_identifier("freebsd14.0"), Os::Unknown);
    /// ```
    #[must_use]
    pub fn from_identifier(id: &str) -> Self {
        let id = id.trim().to_ascii_lowercase();
        if id.starts_with("darwin") || id == "macos" {
            Self::MacOs
        } else if id.starts_with("linux") {
            Self::Linux
        } else if id.starts_with("msys")
            || id.starts_with("cygwin")
            || id.starts_with("mingw")
            || id == "windows"
        {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    /// Manifest tier name for this OS (`packages/<name>.txt`), if any.
    #[must_use]
    pub const fn manifest_tier(self) -> Option<&'static str> {
        match self {
            Self::MacOs => Some("macos"),
            Self::Linux => Some("linux"),
            Self::Windows | Self::Unknown => None,
        }
    }

    /// Whether shell auto-configuration is supported.
    #[must_use]
    pub const fn supports_shell_setup(self) -> bool {
        matches!(self, Self::MacOs | Self::Linux)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Family of related Linux distributions sharing a package manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    /// Debian, Ubuntu and derivatives.
    Debian,
    /// RHEL, Fedora, CentOS, Rocky, Alma, Amazon Linux.
    Rhel,
    /// Arch Linux and derivatives.
    Arch,
    /// openSUSE and SLES.
    Suse,
    /// Alpine Linux.
    Alpine,
}

impl DistroFamily {
    /// Map a single distribution identifier (`ID` or an `ID_LIKE` token).
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        match id.as_str() {
            "debian" | "ubuntu" | "linuxmint" | "pop" | "raspbian" | "elementary" | "kali"
            | "neon" | "zorin" => Some(Self::Debian),
            "rhel" | "fedora" | "centos" | "rocky" | "almalinux" | "amzn" | "ol" | "redhat" => {
                Some(Self::Rhel)
            }
            "arch" | "archarm" | "manjaro" | "endeavouros" | "garuda" | "artix" => Some(Self::Arch),
            "alpine" => Some(Self::Alpine),
            s if s.starts_with("opensuse") || s == "suse" || s == "sles" => Some(Self::Suse),
            _ => None,
        }
    }

    /// Resolve the family from `ID` first, then each `ID_LIKE` token.
    #[must_use]
    pub fn resolve(id: &str, id_like: &[String]) -> Option<Self> {
        Self::from_id(id).or_else(|| id_like.iter().find_map(|like| Self::from_id(like)))
    }

    /// Manifest tier name (`packages/<name>.txt`).
    #[must_use]
    pub const fn manifest_tier(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Rhel => "rhel",
            Self::Arch => "arch",
            Self::Suse => "suse",
            Self::Alpine => "alpine",
        }
    }
}

impl fmt::Display for DistroFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_tier())
    }
}

/// How elevated commands are run on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Already running as uid 0; commands run directly.
    Root,
    /// Commands are prefixed with `sudo`.
    Sudo,
    /// No elevation available or `--no-sudo` given.
    None,
}

impl Elevation {
    /// Build the argv for running `program args..` with this elevation.
    ///
    /// Returns `None` when elevation is unavailable.
    #[must_use]
    pub fn wrap<'a>(self, program: &'a str, args: &[&'a str]) -> Option<(&'a str, Vec<&'a str>)> {
        match self {
            Self::Root => Some((program, args.to_vec())),
            Self::Sudo => {
                let mut argv = Vec::with_capacity(args.len() + 1);
                argv.push(program);
                argv.extend_from_slice(args);
                Some(("sudo", argv))
            }
            Self::None => None,
        }
    }
}

/// Static facts about the host, created once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct HostFacts {
    /// Operating system family.
    pub os: Os,
    /// Distribution identifier (Linux only; `"unknown"` if undetectable).
    pub distro: Option<String>,
    /// Distribution family used to pick the per-family manifest.
    pub family: Option<DistroFamily>,
    /// Normalized CPU architecture (`x86_64`, `aarch64`, ...).
    pub arch: String,
    /// First package manager from the fixed priority list found on PATH.
    pub package_manager: Option<PackageManager>,
    /// Privilege level for elevated commands.
    pub elevation: Elevation,
}

impl HostFacts {
    /// Probe the running host.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DetectionFailed`] if no platform identifier can
    /// be obtained at all.
    pub fn probe(executor: &dyn Executor, no_sudo: bool) -> Result<Self, PlatformError> {
        let identifier = resolve_identifier(
            std::env::var("OSTYPE").ok(),
            || capture(executor, "uname", &["-s"]),
            std::env::consts::OS,
        )?;
        Ok(Self::detect(executor, no_sudo, &identifier, Path::new("/etc")))
    }

    /// Build facts for the platform named by `identifier`, reading
    /// distribution files from `etc`.
    #[must_use]
    pub fn detect(
        executor: &dyn Executor,
        no_sudo: bool,
        identifier: &str,
        etc: &Path,
    ) -> Self {
        let os = Os::from_identifier(identifier);

        let (distro, family) = if os == Os::Linux {
            let release = detect_linux_release(etc);
            let family = DistroFamily::resolve(&release.id, &release.id_like);
            (Some(release.id), family)
        } else {
            (None, None)
        };

        let arch = normalize_arch(
            &capture(executor, "uname", &["-m"]).unwrap_or_else(|| std::env::consts::ARCH.into()),
        );

        Self {
            os,
            distro,
            family,
            arch,
            package_manager: PackageManager::detect(executor),
            elevation: detect_elevation(executor, no_sudo),
        }
    }

    /// Whether elevated (system package manager) installs are permitted.
    #[must_use]
    pub fn sudo_allowed(&self) -> bool {
        self.elevation != Elevation::None
    }

    /// Manifest tiers that apply to this host, in load order.
    #[must_use]
    pub fn manifest_tiers(&self) -> Vec<&'static str> {
        let mut tiers = vec!["common"];
        tiers.extend(self.os.manifest_tier());
        tiers.extend(self.family.map(DistroFamily::manifest_tier));
        tiers
    }
}

/// Run a command and return its trimmed stdout if it succeeded and is non-empty.
fn capture(executor: &dyn Executor, program: &str, args: &[&str]) -> Option<String> {
    executor
        .run_unchecked(program, args)
        .ok()
        .filter(|r| r.success)
        .map(|r| r.stdout.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pick the first non-empty platform identifier: environment, then `uname`,
/// then the compile-time OS name.
///
/// # Errors
///
/// Returns [`PlatformError::DetectionFailed`] if every source is empty.
pub fn resolve_identifier(
    env: Option<String>,
    uname: impl FnOnce() -> Option<String>,
    compiled: &str,
) -> Result<String, PlatformError> {
    env.filter(|s| !s.trim().is_empty())
        .or_else(uname)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(compiled.to_string()).filter(|s| !s.trim().is_empty()))
        .ok_or_else(|| PlatformError::DetectionFailed("no platform identifier".to_string()))
}

/// Map `uname -m` spellings onto the names used in release asset URLs.
#[must_use]
pub fn normalize_arch(raw: &str) -> String {
    match raw.trim() {
        "amd64" | "x64" => "x86_64".to_string(),
        "arm64" => "aarch64".to_string(),
        other => other.to_string(),
    }
}

fn detect_elevation(executor: &dyn Executor, no_sudo: bool) -> Elevation {
    if no_sudo {
        return Elevation::None;
    }
    if capture(executor, "id", &["-u"]).as_deref() == Some("0") {
        return Elevation::Root;
    }
    if executor.which("sudo").is_some() {
        Elevation::Sudo
    } else {
        Elevation::None
    }
}

/// Identity fields read from the distribution release files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxRelease {
    /// Lowercase distribution id (`ubuntu`, `fedora`, ...), or `unknown`.
    pub id: String,
    /// Parent distributions from `ID_LIKE`.
    pub id_like: Vec<String>,
}

/// Identify the distribution from files under `etc`.
///
/// Priority: `os-release`, `lsb-release`, `redhat-release`, `debian_version`.
#[must_use]
pub fn detect_linux_release(etc: &Path) -> LinuxRelease {
    if let Ok(content) = std::fs::read_to_string(etc.join("os-release"))
        && let Some(release) = parse_os_release(&content)
    {
        return release;
    }
    if let Ok(content) = std::fs::read_to_string(etc.join("lsb-release"))
        && let Some(id) = key_value(&content, "DISTRIB_ID")
    {
        return LinuxRelease {
            id: id.to_ascii_lowercase(),
            id_like: Vec::new(),
        };
    }
    let id = if etc.join("redhat-release").exists() {
        "rhel"
    } else if etc.join("debian_version").exists() {
        "debian"
    } else {
        "unknown"
    };
    LinuxRelease {
        id: id.to_string(),
        id_like: Vec::new(),
    }
}

/// Parse `ID` and `ID_LIKE` from os-release content.
#[must_use]
pub fn parse_os_release(content: &str) -> Option<LinuxRelease> {
    let id = key_value(content, "ID")?.to_ascii_lowercase();
    let id_like = key_value(content, "ID_LIKE")
        .map(|v| {
            v.split_whitespace()
                .map(str::to_ascii_lowercase)
                .collect()
        })
        .unwrap_or_default();
    Some(LinuxRelease { id, id_like })
}

/// Find `KEY=value` in shell-style content, stripping surrounding quotes.
fn key_value(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        if k.trim() != key {
            return None;
        }
        let v = v.trim().trim_matches('"').trim_matches('\'');
        (!v.is_empty()).then(|| v.to_string())
    })
}
