pub mod bracket;
pub mod duel;

pub use bracket::TournamentState;
pub use duel::{decide_winner, Side};
