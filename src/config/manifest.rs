//! Package manifest loading.
//!
//! A manifest is plain UTF-8 text with one package per line. Blank lines and
//! lines starting with `#` are ignored. An optional second token names the
//! binary when it differs from the package (`ripgrep rg`).
use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::path::Path;

/// Package names whose executable has a different name.
const BINARY_OVERRIDES: &[(&str, &str)] = &[
    ("ripgrep", "rg"),
    ("fd-find", "fdfind"),
    ("neovim", "nvim"),
    ("git-delta", "delta"),
    ("du-dust", "dust"),
    ("bottom", "btm"),
    ("tealdeer", "tldr"),
];

/// A package to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Package name as understood by the package manager.
    pub name: String,
    /// Executable name when it differs from `name`.
    pub binary_name_override: Option<String>,
}

impl PackageSpec {
    /// Create a spec, applying the built-in binary name table.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let binary_name_override = BINARY_OVERRIDES
            .iter()
            .find(|(pkg, _)| *pkg == name)
            .map(|(_, bin)| (*bin).to_string());
        Self {
            name: name.to_string(),
            binary_name_override,
        }
    }

    /// Name to look for on PATH.
    #[must_use]
    pub fn binary(&self) -> &str {
        self.binary_name_override.as_deref().unwrap_or(&self.name)
    }
}

/// Parse manifest content.
#[must_use]
pub fn parse(content: &str) -> Vec<PackageSpec> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let name = tokens.next()?;
            let mut spec = PackageSpec::new(name);
            if let Some(bin) = tokens.next().filter(|t| !t.starts_with('#')) {
                spec.binary_name_override = Some(bin.to_string());
            }
            Some(spec)
        })
        .collect()
}

/// Load a single manifest file. A missing file yields an empty list.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load(path: &Path) -> Result<Vec<PackageSpec>> {
    if !path.exists() {
        tracing::debug!("manifest not found: {}", path.display());
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest: {}", path.display()))?;
    Ok(parse(&content))
}

/// Load `packages/<tier>.txt` for each tier in order and merge them,
/// keeping the first occurrence of each package name.
///
/// # Errors
///
/// Returns an error if any existing manifest cannot be read.
pub fn load_tiers(packages_dir: &Path, tiers: &[&str]) -> Result<Vec<PackageSpec>> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for tier in tiers {
        for spec in load(&packages_dir.join(format!("{tier}.txt")))? {
            if seen.insert(spec.name.clone()) {
                merged.push(spec);
            }
        }
    }
    Ok(merged)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn names(specs: &[PackageSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let specs = parse("git\n# comment\n\nbat\n");
        assert_eq!(names(&specs), vec!["git", "bat"]);
    }

    #[test]
    fn parse_comment_only_is_empty() {
        assert!(parse("# nothing here\n\n   \n  # indented comment\n").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn parse_preserves_order_and_trims() {
        let specs = parse("  zsh  \nfish\n\tjq\n");
        assert_eq!(names(&specs), vec!["zsh", "fish", "jq"]);
    }

    #[test]
    fn explicit_binary_override() {
        let specs = parse("fd-find fd\nopenssh ssh\n");
        assert_eq!(specs[0].binary(), "fd");
        assert_eq!(specs[1].binary(), "ssh");
    }

    #[test]
    fn trailing_comment_is_not_an_override() {
        let specs = parse("jq # json tool\n");
        assert_eq!(specs[0].binary(), "jq");
    }

    #[test]
    fn builtin_override_table() {
        assert_eq!(PackageSpec::new("ripgrep").binary(), "rg");
        assert_eq!(PackageSpec::new("neovim").binary(), "nvim");
        assert_eq!(PackageSpec::new("git").binary(), "git");
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let specs = load(&dir.path().join("nonexistent.txt")).unwrap();
        assert!(specs.is_empty(), "missing file should produce empty list");
    }

    #[test]
    fn load_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("common.txt");
        std::fs::write(&path, "git\nbat\n").unwrap();
        assert_eq!(load(&path).unwrap(), load(&path).unwrap());
    }

    #[test]
    fn load_tiers_merges_and_dedups_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("common.txt"), "git\nripgrep\n").unwrap();
        std::fs::write(dir.path().join("linux.txt"), "ripgrep rg\nxclip\n").unwrap();
        std::fs::write(dir.path().join("debian.txt"), "fd-find\ngit\n").unwrap();
        let specs = load_tiers(dir.path(), &["common", "linux", "debian", "arch"]).unwrap();
        assert_eq!(names(&specs), vec!["git", "ripgrep", "xclip", "fd-find"]);
    }
}
