use anyhow::Result;

use community_rankings::cli::Command;
use community_rankings::{handle_recompute, handle_seed, handle_serve, handle_setup, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::Recompute => handle_recompute(),
        Command::Seed { path } => handle_seed(path),
        Command::Setup => handle_setup(),
    }
}
