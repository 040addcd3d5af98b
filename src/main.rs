mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, StateCommand};
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Apply(args) => commands::apply::run(&args),
        Command::Destroy(args) => commands::destroy::run(&args),
        Command::State(cmd) => match cmd {
            StateCommand::List => commands::state::list(),
            StateCommand::Show { address } => commands::state::show(&address),
        },
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "gantry", &mut io::stdout());
            Ok(())
        }
    }
}
