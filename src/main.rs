//! `dotsetup` binary.
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use dotsetup::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    if matches!(args.command, cli::Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let log_file = logging::log_file_path(args.command.name());
    logging::init_subscriber(args.verbose, args.command.name(), log_file.as_deref());
    let log = Arc::new(logging::Logger::new(log_file));

    match args.command {
        cli::Command::Run(opts) => commands::run::run(&args.global, &opts, &log),
        cli::Command::Reset => commands::reset::run(&args.global, log.as_ref()),
        cli::Command::Version => Ok(()),
    }
}
