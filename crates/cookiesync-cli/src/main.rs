mod commands;
mod source;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use cookiesync_core::AppConfig;
use cookiesync_erp::{ErpClient, ErpConfig};
use cookiesync_sheets::{HttpSettings, ServiceAccountKey, SheetsClient, TokenSource};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cookiesync")]
#[command(about = "Sync ERP cookie inventory into the planning spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upsert current ERP stock into the inventory sheet (the default)
    Inventory {
        /// Log the planned writes without touching the spreadsheet
        #[arg(long)]
        dry_run: bool,
    },
    /// Merge open work orders into the WIP sheet
    Wip {
        /// Log the planned writes without touching the spreadsheet
        #[arg(long)]
        dry_run: bool,
    },
    /// Refresh names and weights in the Index sheet from the ERP item master
    Index {
        /// Log the planned writes without touching the spreadsheet
        #[arg(long)]
        dry_run: bool,
    },
    /// Recompute piece counts and names in the production schedule
    Schedule {
        /// Log the planned writes without touching the spreadsheet
        #[arg(long)]
        dry_run: bool,
    },
    /// Project stock day by day and list shortages
    Forecast {
        /// Log the planned writes without touching the spreadsheet
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cookiesync_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let default = Commands::Inventory { dry_run: false };
    let command = cli.command.unwrap_or(default);
    let result = run(command, &config).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "sync failed");
    }
    result
}

async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let today = now.date();
    let sheets = connect_sheets(config)?;

    match command {
        Commands::Inventory { dry_run } => {
            let mut erp = connect_erp(config, today).await?;
            commands::run_inventory(config, &sheets, &mut erp, now, dry_run).await
        }
        Commands::Wip { dry_run } => {
            let mut erp = connect_erp(config, today).await?;
            commands::run_wip(config, &sheets, &mut erp, now, dry_run).await
        }
        Commands::Index { dry_run } => {
            let mut erp = connect_erp(config, today).await?;
            commands::run_index(config, &sheets, &mut erp, dry_run).await
        }
        Commands::Schedule { dry_run } => {
            let mut erp = match connect_erp(config, today).await {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!(
                        error = %format!("{e:#}"),
                        "ERP unavailable; names will come from the Index sheet"
                    );
                    None
                }
            };
            commands::run_schedule(config, &sheets, erp.as_mut(), dry_run).await
        }
        Commands::Forecast { dry_run } => {
            commands::run_forecast(config, &sheets, today, dry_run).await
        }
    }
}

fn connect_sheets(config: &AppConfig) -> anyhow::Result<SheetsClient> {
    let key = ServiceAccountKey::from_file(&config.service_account_path)?;
    let settings = HttpSettings {
        timeout_secs: config.http_timeout_secs,
        max_retries: config.http_max_retries,
        retry_backoff_ms: config.http_retry_backoff_ms,
    };
    SheetsClient::new(
        &config.spreadsheet_id,
        TokenSource::ServiceAccount(key),
        settings,
    )
    .context("failed to build Sheets client")
}

async fn connect_erp(config: &AppConfig, today: NaiveDate) -> anyhow::Result<ErpClient> {
    let erp_config = ErpConfig::from_app_config(config, today)?;
    ErpClient::connect(erp_config)
        .await
        .context("failed to connect to ERP database")
}
