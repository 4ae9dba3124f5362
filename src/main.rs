//! `todo` - personal task tracking service.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use todo_service::api;
use todo_service::cli::{Cli, Command};
use todo_service::config::{Config, ConfigLoader};
use todo_service::db::Database;
use todo_service::logging::{self, LogTarget};
use todo_service::scheduler::{LoopTiming, ScheduleRegistry};
use todo_service::service::TodoService;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command_or_default() == Command::InitConfig {
        print!("{}", Config::default().to_yaml()?);
        return Ok(());
    }

    let loader = ConfigLoader::load(cli.config.as_deref())?;
    let config_path = loader.config_path().map(|p| p.display().to_string());
    let mut config = loader.into_config();
    if let Some(database) = &cli.database {
        config.server.storage_path = database.clone();
    }

    if cli.command_or_default() == Command::PrintConfig {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init(
        &LogTarget::parse(&cli.log),
        &logging::default_directive(cli.verbose, &config.log_level),
        config.development.pretty_logging,
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = config_path.as_deref().unwrap_or("defaults"),
        "starting todo service"
    );

    serve(config).await
}

async fn serve(config: Config) -> Result<()> {
    config.ensure_storage_dir()?;
    let db = Arc::new(
        Database::open(&config.server.storage_path)?
            .with_results_limit(config.server.storage_results_limit),
    );
    info!(path = %config.server.storage_path.display(), "opened database");

    let registry = Arc::new(ScheduleRegistry::new(
        Arc::clone(&db),
        LoopTiming::from(&config.scheduler),
    ));
    registry.recover()?;

    let service = TodoService::new(db, Arc::clone(&registry), config.dev_mode_enabled());
    let listener = api::bind(&config.server.host).await?;
    let result = api::run_server(
        listener,
        api::build_router(service),
        api::shutdown_signal(),
        config.server.shutdown_timeout(),
    )
    .await;

    registry.shutdown().await;
    info!("todo service stopped");
    result
}
