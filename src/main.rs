mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use commands::Runtime;
use tourwatch::config::Config;

#[derive(Parser)]
#[command(
    name = "tourwatch",
    version,
    about = "Watch OCTO tours and get notified when later dates open up",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML configuration file; environment variables are used when absent
    #[arg(long, global = true, env = "TOURWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(
        long,
        global = true,
        env = "DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    debug: bool,

    /// SQLite database path (":memory:" for an in-memory database)
    #[arg(long, global = true, env = "DB")]
    db: Option<String>,

    /// Booking API access token
    #[arg(long, global = true, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Pushover application token
    #[arg(long, global = true, env = "PUSHOVER_APP_TOKEN", hide_env_values = true)]
    pushover_app_token: Option<String>,

    /// Pushover recipient (user or group) token
    #[arg(long, global = true, env = "PUSHOVER_RECIPIENT_TOKEN", hide_env_values = true)]
    pushover_recipient_token: Option<String>,

    /// Webhook URL receiving availability alerts
    #[arg(long, global = true)]
    webhook_url: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync tracked tours on a fixed interval (default)
    Watch {
        /// Tick interval, e.g. 15s, 5m, 1h
        #[arg(long)]
        interval: Option<String>,
    },

    /// Sync tracked tours once and print the latest availability table
    Update,

    /// Print the slot table of a tour
    Search {
        /// Product id of the tour
        #[arg(long)]
        tour_id: Uuid,

        /// First date to search (YYYY-MM-DD, default today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date to search (YYYY-MM-DD, default one year after start)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Print the description document of every tracked tour
    Details,

    /// Load tours from a JSON file
    Load {
        /// JSON array of tours
        #[arg(long)]
        data: PathBuf,
    },

    /// Run the HTTP API together with the watch loop
    Serve {
        /// Tick interval, e.g. 15s, 5m, 1h
        #[arg(long)]
        interval: Option<String>,

        /// Listen address, e.g. :7077 or 127.0.0.1:7077
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = resolve_config(&cli)?;
    let command = cli.command.unwrap_or(Commands::Watch { interval: None });

    match &command {
        Commands::Watch { interval } | Commands::Serve { interval, .. } => {
            if let Some(interval) = interval {
                config.watch.interval = interval.clone();
            }
        }
        _ => {}
    }
    if let Commands::Serve {
        addr: Some(addr), ..
    } = &command
    {
        config.server.addr = addr.clone();
    }

    setup_tracing(&config.logging.format, &config.logging.level)?;

    let rt = Runtime::open(config)?;
    tracing::debug!(database = %rt.config.database.path, "tourwatch starting");

    match command {
        Commands::Watch { .. } => {
            let interval = rt.config.watch_interval()?;
            tracing::info!(interval = ?interval, "Starting watch command");
            commands::watch(&rt, interval).await?;
        }

        Commands::Update => commands::update(&rt).await?,

        Commands::Search {
            tour_id,
            start,
            end,
        } => {
            tracing::info!(tour_id = %tour_id, start = ?start, end = ?end, "Starting search command");
            commands::search(&rt, tour_id, start, end).await?;
        }

        Commands::Details => commands::details(&rt).await?,

        Commands::Load { data } => commands::load(&rt, &data).await?,

        Commands::Serve { .. } => {
            let addr = rt.config.listen_addr()?;
            let interval = rt.config.watch_interval()?;
            tracing::info!(addr = %addr, interval = ?interval, "Starting serve command");
            commands::serve(&rt, addr, interval).await?;
        }
    }

    Ok(())
}

/// Load the base configuration and apply command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("Failed to read configuration from environment")?,
    };

    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    if let Some(token) = &cli.access_token {
        config.api.access_token = Some(token.clone());
    }
    if let Some(token) = &cli.pushover_app_token {
        config.notify.pushover_app_token = Some(token.clone());
    }
    if let Some(token) = &cli.pushover_recipient_token {
        config.notify.pushover_recipient_token = Some(token.clone());
    }
    if let Some(url) = &cli.webhook_url {
        config.notify.webhook_url = Some(url.clone());
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if cli.debug {
        config.logging.level = String::from("debug");
    }

    Ok(config)
}

fn setup_tracing(format: &str, level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("tourwatch={level},warn")))
        .context("Invalid log level")?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
