//! `driftcheck` command-line entry point.
use std::process::ExitCode;

use clap::Parser;

use driftcheck::cancel::CancelToken;
use driftcheck::cli::{Cli, Command};
use driftcheck::commands;
use driftcheck::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    logging::init_subscriber(args.verbose, args.command.name());
    let log = Logger::new(args.command.name());

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        log.warn(&format!("cannot install Ctrl-C handler: {e}"));
    }

    let result = match &args.command {
        Command::Check(opts) => commands::check::run(&args.global, opts, &log, &cancel),
        Command::Validate(opts) => commands::validate::run(&args.global, opts, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
