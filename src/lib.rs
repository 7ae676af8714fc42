pub mod analytics;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod ranking;
pub mod services;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::services::recompute::RecomputeOrchestrator;
use crate::services::seeding;
use crate::services::server::ServerService;

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

pub fn handle_recompute() -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::create_pool(&config.database_path)?;
    let conn = database::get_connection(&pool)?;
    database::setup::init_schema(&conn)?;

    let cache = Arc::new(ResultCache::new(config.cache.default_ttl));
    let orchestrator = RecomputeOrchestrator::new(pool, cache, config);
    let summary = orchestrator.run_once()?;
    info!("{:?}", summary);
    Ok(())
}

pub fn handle_seed(path: &Path) -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::create_pool(&config.database_path)?;
    let conn = database::get_connection(&pool)?;
    database::setup::init_schema(&conn)?;

    let catalog = seeding::load_catalog(path)?;
    let cache = Arc::new(ResultCache::new(config.cache.default_ttl));
    seeding::seed_catalog(&pool, &cache, &catalog)?;
    Ok(())
}

pub fn handle_setup() -> Result<()> {
    let config = AppConfig::from_env();
    let pool = database::create_pool(&config.database_path)?;
    let conn = database::get_connection(&pool)?;
    database::setup::init_schema(&conn)?;
    info!("Schema ready at {}", config.database_path);
    Ok(())
}
