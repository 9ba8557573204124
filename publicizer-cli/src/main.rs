mod app;
mod error;
mod output;
mod paths;
mod run;

use std::{
    io::{IsTerminal, Write},
    process::ExitCode,
};

use clap::{error::ErrorKind, Parser};

use crate::{
    app::{Cli, RunConfig},
    error::CliError,
};

fn main() -> ExitCode {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    // known even when the rest of the command line does not parse
    let exit_requested = std::env::args_os().any(|arg| arg == "--exit");

    let code = match Cli::try_parse() {
        Ok(cli) => {
            init_logging(cli.verbose);
            match execute(&cli) {
                Ok(()) => 0,
                Err(error) => report(&error),
            }
        }
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = error.print();
            0
        }
        Err(error) => {
            let message = error.to_string();
            let message = message
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ");
            report(&CliError::Argument(message.to_string()))
        }
    };

    if !exit_requested && std::io::stdin().is_terminal() {
        wait_for_enter();
    }

    ExitCode::from(code)
}

fn execute(cli: &Cli) -> Result<(), CliError> {
    let config = RunConfig::from_cli(cli)?;
    let summary = run::run(&config)?;
    output::print_summary(&summary);
    output::print_warnings(&summary.report.warnings);
    Ok(())
}

/// Show publicizer info+ on stderr; --verbose enables debug; RUST_LOG overrides
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("publicizer", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn report(error: &CliError) -> u8 {
    eprintln!("error: {error}");
    if let Some(hint) = error.hint() {
        eprintln!("hint: {hint}");
    }
    error.exit_code()
}

fn wait_for_enter() {
    eprint!("Press Enter to exit...");
    let _ = std::io::stderr().flush();
    let _ = std::io::stdin().read_line(&mut String::new());
}
