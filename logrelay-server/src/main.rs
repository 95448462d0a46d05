//! Log relay
//!
//! Runs as an HTTP service woken up by a scheduler, or as a one-shot
//! command for system cron.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logrelay_client::{CollectorClient, IdentityClient, SlackClient};
use logrelay_server::api::{self, AppState};
use logrelay_server::config::Config;
use logrelay_server::db;
use logrelay_server::repository::{
    ChatWebhook, CheckpointStore, MemoryCheckpointStore, PgCheckpointStore,
};
use logrelay_server::service::{Collaborators, ScheduledRun};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Parser)]
#[command(name = "logrelay")]
#[command(about = "Forwards tenant logs to Splunk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve HTTP; scheduled requests trigger a run
    Serve {
        /// Address to listen on
        #[arg(long, env = "LOGRELAY_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
        bind: String,
    },
    /// Perform one scheduled run and exit
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logrelay_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let scheduled = Arc::new(ScheduledRun::new(&config, collaborators(&config).await?));

    // No subcommand means serve, still honouring the bind address variable
    let command = cli.command.unwrap_or_else(|| Command::Serve {
        bind: std::env::var("LOGRELAY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
    });

    match command {
        Command::Serve { bind } => serve(&bind, scheduled).await,
        Command::Run => run_once(&scheduled).await,
    }
}

async fn collaborators(config: &Config) -> Result<Collaborators> {
    let store: Arc<dyn CheckpointStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgCheckpointStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, checkpoints are kept in memory only");
            Arc::new(MemoryCheckpointStore::new())
        }
    };

    let chat = config
        .slack_webhook_url
        .as_ref()
        .map(|url| Arc::new(SlackClient::new(url.clone())) as Arc<dyn ChatWebhook>);
    if chat.is_none() {
        tracing::warn!("SLACK_INCOMING_WEBHOOK_URL not set, notifications are disabled");
    }

    Ok(Collaborators {
        source: Arc::new(IdentityClient::new(config.identity_settings())),
        collector: Arc::new(CollectorClient::new(config.collector_settings())),
        chat,
        store,
    })
}

async fn serve(bind: &str, scheduled: Arc<ScheduledRun>) -> Result<()> {
    let app = api::create_router(AppState { scheduled });

    tracing::info!("Listening on {}", bind);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")
}

async fn run_once(scheduled: &ScheduledRun) -> Result<()> {
    let result = scheduled.execute_and_report().await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
