use anyhow::Result;

use wordle_plus::cli::Command;
use wordle_plus::services::tournament::NewTournament;
use wordle_plus::{handle_create_tournament, handle_register, handle_reset, handle_serve, interpret};

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
        Command::Reset => handle_reset(),
        Command::Register { username } => handle_register(username),
        Command::CreateTournament {
            name,
            max_players,
            word_length,
            description,
        } => handle_create_tournament(NewTournament {
            name: name.clone(),
            description: description.clone(),
            max_players: *max_players,
            word_length: *word_length,
        }),
    }
}
