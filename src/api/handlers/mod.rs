use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::Deserialize;

use crate::config::settings::AppConfig;
use crate::database::{self, DbConn};
use crate::errors::{GameError, GameResult};
use crate::services::identity::Identity;
use crate::services::GameServices;

pub mod classics;
pub mod duels;
pub mod notifications;
pub mod players;
pub mod tournaments;

/// `axum::Json` whose rejections become `GameError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(GameError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(GameError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(GameError))]
pub struct ApiQuery<T>(pub T);

pub struct AppState {
    pub pool: Pool<SqliteConnectionManager>,
    pub config: AppConfig,
    pub services: GameServices,
}

impl AppState {
    pub fn connection(&self) -> GameResult<DbConn> {
        Ok(database::get_connection(&self.pool)?)
    }

    /// Resolves the `Authorization: Token <key>` (or `Bearer <key>`) header.
    pub fn authenticate(&self, conn: &Connection, headers: &HeaderMap) -> GameResult<Identity> {
        let key = token_key(headers).ok_or_else(|| {
            GameError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;
        self.services.identity.authenticate(conn, key)
    }
}

fn token_key(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;

    match scheme {
        "Token" | "Bearer" if !key.trim().is_empty() => Some(key.trim()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
}

impl PageParams {
    pub fn offset(&self, page_size: usize) -> usize {
        (self.page.unwrap_or(1).max(1) - 1) * page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(token_key(&headers("Token abc")), Some("abc"));
        assert_eq!(token_key(&headers("Bearer abc")), Some("abc"));
        assert_eq!(token_key(&headers("Basic abc")), None);
        assert_eq!(token_key(&headers("Token ")), None);
        assert_eq!(token_key(&HeaderMap::new()), None);
    }

    #[test]
    fn pages_start_at_one() {
        assert_eq!(PageParams { page: None }.offset(10), 0);
        assert_eq!(PageParams { page: Some(0) }.offset(10), 0);
        assert_eq!(PageParams { page: Some(3) }.offset(10), 20);
    }
}
