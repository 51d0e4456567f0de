//! Idempotent environment-provisioning engine.
//!
//! Detects the host, installs the packages listed in `packages/` through the
//! system package manager (or user-space installers when elevation is not
//! allowed), links configuration files from `symlinks/` into `$HOME` with
//! backup-before-overwrite, and sets up an interactive shell. Running it
//! twice changes nothing the second time.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: package manifests, the symlink table, and `dotsetup.toml`
//! - **[`resources`]**: idempotent `check + apply` primitives (packages, symlinks, login shell, …)
//! - **[`tasks`]**: named units of work run in a fixed order
//! - **[`commands`]**: top-level subcommand orchestration (`run`, `reset`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod prompt;
pub mod resources;
pub mod tasks;
