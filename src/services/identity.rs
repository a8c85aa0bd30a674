use chrono::{Duration, Utc};
use log::info;
use rand::Rng;
use rusqlite::Connection;

use crate::config::AuthSettings;
use crate::database::models::{AuthToken, Player, User};
use crate::database::{begin_write, players, users};
use crate::errors::{GameError, GameResult};

const TOKEN_BYTES: usize = 20;
const MAX_USERNAME_LEN: usize = 150;

/// The authenticated caller. A user without a player record can still be
/// authenticated; game operations call `require_player`.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub player: Option<Player>,
}

impl Identity {
    pub fn require_player(&self) -> GameResult<&Player> {
        self.player.as_ref().ok_or_else(|| GameError::not_found("Player"))
    }
}

pub struct IdentityService {
    settings: AuthSettings,
}

impl IdentityService {
    pub fn new(settings: AuthSettings) -> Self {
        Self { settings }
    }

    /// Creates a user, its player record and a fresh token.
    pub fn register(&self, conn: &mut Connection, username: &str) -> GameResult<(Player, AuthToken)> {
        validate_username(username)?;

        let tx = begin_write(conn)?;
        if users::find_by_username(&tx, username)?.is_some() {
            return Err(GameError::conflict("A user with that username already exists."));
        }
        let user = users::insert_user(&tx, username, Utc::now())?;
        let player = players::insert_player(&tx, user.id)?;
        let token = users::issue_token(&tx, user.id, &generate_token_key(), Utc::now())?;
        tx.commit()?;

        info!("Registered player {} ({})", player.id, username);
        Ok((player, token))
    }

    pub fn authenticate(&self, conn: &Connection, key: &str) -> GameResult<Identity> {
        let token = users::find_token(conn, key)?
            .ok_or_else(|| GameError::Unauthorized("Invalid token.".to_string()))?;

        if self.is_expired(&token) {
            users::delete_token(conn, key)?;
            return Err(GameError::Unauthorized("Token has expired.".to_string()));
        }

        let user = users::find_by_id(conn, token.user_id)?
            .ok_or_else(|| GameError::Unauthorized("Invalid token.".to_string()))?;
        let player = players::find_by_user_id(conn, user.id)?;

        Ok(Identity { user, player })
    }

    /// A TTL too large to subtract from now means tokens never expire.
    fn is_expired(&self, token: &AuthToken) -> bool {
        Duration::try_seconds(self.settings.token_ttl_secs)
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
            .is_some_and(|cutoff| token.created_at < cutoff)
    }
}

fn validate_username(username: &str) -> GameResult<()> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c));

    if username.is_empty() || username.len() > MAX_USERNAME_LEN || !valid_chars {
        return Err(GameError::validation(
            "username must be 1-150 characters of letters, digits and @.+-_",
        ));
    }
    Ok(())
}

fn generate_token_key() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().r#gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
