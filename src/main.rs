use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase};
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llpg_matcher::config::Config;
use llpg_matcher::observability::AppObservability;
use llpg_matcher::orchestrator::Orchestrator;
use llpg_matcher::store::{Migrator, SeaOrmStore};

#[derive(Parser)]
#[command(name = "llpg-matcher")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve historic free-text property addresses against a gazetteer of UPRNs")]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL, overriding the config file
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Label identifying this run, stamped onto every persisted result
    #[arg(short = 'r', long, default_value = "default")]
    run_label: String,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("llpg_matcher={}", cli.log_level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config).with_context(|| format!("loading config from {}", cli.config))?
    } else {
        Config::from_env().context("loading config from environment")?
    };
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    info!(run_label = %cli.run_label, database_url = %config.database.url, "starting matching run");

    let mut connect_options = ConnectOptions::new(config.database.url.clone());
    connect_options
        .max_connections(config.database.max_open)
        .min_connections(config.database.max_idle)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(3));
    let connection = SeaOrmDatabase::connect(connect_options).await.context("connecting to store")?;

    Migrator::up(&connection, None).await.context("running store migrations")?;
    info!("store migrations applied");

    let store = Arc::new(SeaOrmStore::new(connection));
    let observability = Arc::new(
        AppObservability::new(&config.observability.service_name, config.observability.otlp_endpoint.as_deref())
            .context("initialising observability")?,
    );

    let orchestrator = Orchestrator::new(
        store.clone(),
        store.clone(),
        None,
        None,
        None,
        None,
        config,
        observability,
    );

    let cancellation = CancellationToken::new();
    let shutdown_signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, finishing current batch");
            shutdown_signal.cancel();
        }
    });

    let summary = orchestrator.run(&cli.run_label, cancellation).await?;
    info!(
        total_inputs = summary.total_inputs,
        auto_accept = summary.auto_accept,
        review = summary.review,
        reject = summary.reject,
        "matching run complete"
    );

    Ok(())
}
