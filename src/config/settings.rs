#[derive(Debug, Clone)]
pub struct GameSettings {
    pub tournament_bonus_xp: i64,
    pub page_size: usize,
    pub min_word_length: i64,
    pub max_word_length: i64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            tournament_bonus_xp: 1000,
            page_size: 10,
            min_word_length: 4,
            max_word_length: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub token_ttl_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "wordle_plus.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub game: GameSettings,
    pub auth: AuthSettings,
    pub database: DatabaseSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DATABASE_PATH` and `TOKEN_EXPIRED_AFTER_SECONDS`.
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database.path = path;
        }

        match std::env::var("TOKEN_EXPIRED_AFTER_SECONDS").map(|v| v.parse::<i64>()) {
            Ok(Ok(secs)) if secs > 0 => config.auth.token_ttl_secs = secs,
            Ok(_) => log::warn!("Ignoring invalid TOKEN_EXPIRED_AFTER_SECONDS"),
            Err(_) => {}
        }

        config
    }
}
