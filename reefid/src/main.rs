mod allocate;
mod check;
mod grid;
mod options;
mod selftest;

use anyhow::Result;
use clap::{error::ErrorKind, CommandFactory, Parser};
use options::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli {
        Cli { test: true, .. } => selftest::run(),
        Cli {
            cmd: Some(Command::Allocate(allocate)),
            ..
        } => allocate.run(),
        Cli {
            cmd: Some(Command::Grid(grid)),
            ..
        } => grid.run(),
        Cli {
            cmd: Some(Command::Check(check)),
            ..
        } => check.run(),
        Cli { cmd: None, .. } => Cli::command()
            .error(ErrorKind::MissingSubcommand, "a subcommand or --test is required")
            .exit(),
    }
}
