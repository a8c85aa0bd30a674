use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Wordle+ game backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Start the backend server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Drop every table and recreate an empty schema
    Reset,
    /// Create a user with its player record and print an API token
    Register {
        username: String,
    },
    /// Create a tournament open for registration
    CreateTournament {
        #[arg(long)]
        name: String,
        /// Bracket size, a power of two
        #[arg(long)]
        max_players: i64,
        #[arg(long, default_value_t = 5)]
        word_length: i64,
        #[arg(long, default_value = "")]
        description: String,
    },
}
