//! Command: print version information.

/// Version string, preferring the one stamped at build time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTSETUP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
pub fn run() {
    println!("dotsetup {}", version());
}
