pub mod settings;

pub use settings::{AppConfig, AuthSettings, DatabaseSettings, GameSettings};
