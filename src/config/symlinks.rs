//! The fixed table of managed configuration links.
use crate::platform::Os;

/// A link from `symlinks/<source>` to `$HOME/<target>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symlink {
    /// Path relative to the repository's `symlinks/` directory.
    pub source: String,
    /// Path relative to `$HOME`.
    pub target: String,
}

impl Symlink {
    fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Links applied on every supported OS.
const COMMON: &[(&str, &str)] = &[
    ("git/gitconfig", ".gitconfig"),
    ("starship/starship.toml", ".config/starship.toml"),
    ("ghostty/config", ".config/ghostty/config"),
    ("tmux/tmux.conf", ".tmux.conf"),
    ("nvim", ".config/nvim"),
];

/// Editor settings live in an OS-specific application directory.
const fn vscode_settings_target(os: Os) -> Option<&'static str> {
    match os {
        Os::MacOs => Some("Library/Application Support/Code/User/settings.json"),
        Os::Linux => Some(".config/Code/User/settings.json"),
        Os::Windows | Os::Unknown => None,
    }
}

/// Links for `os`. Shell rc files are linked by the shell configurator.
#[must_use]
pub fn table(os: Os) -> Vec<Symlink> {
    let mut links: Vec<Symlink> = COMMON.iter().map(|(s, t)| Symlink::new(s, t)).collect();
    if let Some(target) = vscode_settings_target(os) {
        links.push(Symlink::new("vscode/settings.json", target));
    }
    links
}
