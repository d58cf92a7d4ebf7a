use anyhow::Result;
use clap::Parser;

use rig_watcher::cli::{Cli, RigCommandHandler, commands::Commands};
use rig_watcher::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Poll {
            host,
            port,
            retry,
            pretty,
        } => {
            RigCommandHandler::run_poll(host, port, retry, pretty)?;
        }
        Commands::Watch {
            config,
            interval,
            database,
        } => {
            let mut app_config = AppConfig::load(config.as_deref())?;
            if let Some(interval) = interval {
                app_config.interval_secs = interval;
            }
            if let Some(database) = database {
                app_config.database = database;
            }
            RigCommandHandler::run_watch(app_config).await?;
        }
        Commands::InitDb { database, config } => {
            let app_config = AppConfig::load(config.as_deref())?;
            let database = database.unwrap_or(app_config.database);
            RigCommandHandler::run_init_db(&database)?;
        }
    }

    Ok(())
}
