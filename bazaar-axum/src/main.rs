use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use bazaar::{BazaarBuilder, BazaarBuilderError, SqliteRepositoryProvider, WithStorage};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for the Bazaar server
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(
        long,
        env = "BAZAAR_DATABASE_URL",
        default_value = "sqlite://bazaar.db?mode=rwc"
    )]
    database_url: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, env = "BAZAAR_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Consecutive failed logins before an email is locked out
        #[arg(long, env = "BAZAAR_MAX_FAILED_ATTEMPTS", default_value_t = 5)]
        max_failed_attempts: u32,

        /// How long a locked-out email has to wait, in minutes
        #[arg(long, env = "BAZAAR_LOCKOUT_MINUTES", default_value_t = 30)]
        lockout_minutes: u32,
    },
    /// Run database migrations
    Migrate,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bazaar=info,bazaar_core=info,bazaar_axum=info,bazaar_server=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            max_failed_attempts,
            lockout_minutes,
        } => serve(&cli.database_url, bind, max_failed_attempts, lockout_minutes).await,
        Commands::Migrate => {
            let bazaar = connect(&cli.database_url).await?.build().await?;
            bazaar.migrate().await.context("running migrations")?;
            tracing::info!("Migrations applied");
            Ok(())
        }
        Commands::Version => {
            println!("Bazaar v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn connect(
    database_url: &str,
) -> Result<BazaarBuilder<WithStorage<SqliteRepositoryProvider>>, BazaarBuilderError> {
    BazaarBuilder::new().with_sqlite(database_url).await
}

async fn serve(
    database_url: &str,
    bind: SocketAddr,
    max_failed_attempts: u32,
    lockout_minutes: u32,
) -> anyhow::Result<()> {
    let bazaar = connect(database_url)
        .await?
        .with_max_failed_attempts(max_failed_attempts)
        .with_lockout_period(chrono::Duration::minutes(i64::from(lockout_minutes)))
        .apply_migrations(true)
        .build()
        .await?;
    let bazaar = Arc::new(bazaar);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let eviction = bazaar.start_eviction_task(shutdown_rx);

    let app = bazaar_axum::routes(bazaar);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(address = %bind, max_failed_attempts, lockout_minutes, "Bazaar listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    eviction.await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
