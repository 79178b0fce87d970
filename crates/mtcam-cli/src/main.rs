mod catalog;
mod daemon;
mod db;
mod records;
mod tick;
mod tz;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mtcam")]
#[command(about = "Mountain webcam scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one scrape tick now and commit its records.
    Tick {
        /// Print the outcome table instead of committing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run ticks on the configured cron schedule until interrupted.
    Daemon,
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Mountain timezone maintenance.
    Tz {
        #[command(subcommand)]
        command: TzCommands,
    },
    /// Catalog file tools.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Show persisted scrape records.
    Records {
        /// Only this camera id.
        #[arg(long)]
        camera: Option<i64>,
        /// How far back to look, in hours.
        #[arg(long, default_value_t = 1)]
        hours: u32,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
    /// Upsert mountains and cameras from the catalog file.
    Seed,
}

#[derive(Debug, Subcommand)]
enum TzCommands {
    /// Fetch current offsets for every mountain from the Time Zone API.
    Refresh,
}

#[derive(Debug, Subcommand)]
enum CatalogCommands {
    /// Validate the catalog file without touching the database.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = mtcam_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Tick { dry_run } => {
            let pool = connect(&config).await?;
            tick::run_tick(&pool, &config, dry_run).await
        }
        Commands::Daemon => {
            let pool = connect(&config).await?;
            daemon::run_daemon(pool, config).await
        }
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => db::run_ping(&pool).await,
                DbCommands::Migrate => db::run_migrate(&pool).await,
                DbCommands::Seed => db::run_seed(&pool, &config).await,
            }
        }
        Commands::Tz {
            command: TzCommands::Refresh,
        } => {
            let pool = connect(&config).await?;
            tz::run_refresh(&pool, &config).await
        }
        Commands::Catalog {
            command: CatalogCommands::Check,
        } => catalog::run_check(&config),
        Commands::Records { camera, hours } => {
            let pool = connect(&config).await?;
            records::run_list(&pool, camera, hours).await
        }
    }
}

async fn connect(config: &mtcam_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = mtcam_db::PoolConfig::from_app_config(config);
    let database_url = config.require_database_url()?;
    let pool = mtcam_db::connect_pool(database_url, pool_config).await?;
    Ok(pool)
}

/// Resolves on ctrl-c or, on unix, SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal");
}

#[cfg(test)]
mod tests;
