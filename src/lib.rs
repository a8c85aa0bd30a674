pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::services::notifications::StoredNotifications;
use crate::services::server::ServerService;
use crate::services::tournament::NewTournament;
use crate::services::GameServices;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::from_env();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_reset() -> Result<()> {
    let config = AppConfig::from_env();
    database::setup::reset_database_at(&config.database.path)
}

pub fn handle_register(username: &str) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::setup::open_database(&config.database.path)?;
    let mut conn = database::get_connection(&pool)?;

    let services = GameServices::new(&config, Arc::new(StoredNotifications));
    let (player, token) = services.identity.register(&mut conn, username)?;

    println!("Player {} created. Token: {}", player.id, token.key);
    Ok(())
}

pub fn handle_create_tournament(request: NewTournament) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::setup::open_database(&config.database.path)?;
    let mut conn = database::get_connection(&pool)?;

    let services = GameServices::new(&config, Arc::new(StoredNotifications));
    let tournament = services.tournaments.create(&mut conn, request)?;

    info!("Created tournament {} ({})", tournament.id, tournament.name);
    println!("Tournament {} created.", tournament.id);
    Ok(())
}
