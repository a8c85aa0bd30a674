pub mod classics;
pub mod connection;
pub mod games;
pub mod models;
pub mod notifications;
pub mod players;
pub mod rounds;
pub mod setup;
pub mod tournaments;
pub mod users;

pub use connection::{begin_write, create_pool, get_connection, DbConn, DbPool};
pub use models::*;
