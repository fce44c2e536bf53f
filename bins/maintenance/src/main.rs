//! Batch maintenance for Cashdesk balances.
//!
//! Every command is a dry run unless `--execute` is passed AND the
//! confirmation environment variable (`CASHDESK_CONFIRM_EXECUTE` by default)
//! is set to `yes`. Run during low-traffic windows; remove duplicates before
//! recalculating.
//!
//! Usage:
//!   cashdesk-maintenance duplicates              - Report duplicate records
//!   cashdesk-maintenance recalculate             - Rebuild snapshots from the ledger
//!   cashdesk-maintenance correct --file t.json   - Apply manual target balances
//!   cashdesk-maintenance drift                   - List drifted snapshots (read only)
//!   cashdesk-maintenance --execute duplicates    - Remove duplicates

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cashdesk_core::maintenance::{RunMode, TargetBalance};
use cashdesk_db::{BalanceRepository, MaintenanceRepository, ReferenceData, connect_with};
use cashdesk_shared::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "cashdesk-maintenance")]
#[command(about = "Balance recalculation and data hygiene for Cashdesk")]
struct Cli {
    /// Apply changes. Also requires the confirmation variable set to `yes`.
    #[arg(long, global = true)]
    execute: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recalculate every snapshot from the ledger.
    Recalculate,
    /// Bring (point, currency) pairs to manually counted targets.
    Correct {
        /// JSON array of target balances.
        #[arg(long)]
        file: PathBuf,
    },
    /// Find exchanges, transfers and guide movements recorded twice.
    Duplicates,
    /// List snapshots that drifted from the ledger. Never writes.
    Drift,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashdesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;

    let confirm_var = &config.maintenance.confirm_env_var;
    let confirmed = std::env::var(confirm_var).is_ok_and(|value| value == "yes");
    let mode = RunMode::from_flags(cli.execute, confirmed);
    if cli.execute && !mode.is_execute() {
        warn!(variable = %confirm_var, "--execute ignored, set the confirmation variable to 'yes'");
    }
    info!(%mode, command = ?cli.command, "Starting maintenance run");

    let db = connect_with(&config.database).await?;
    let reference = ReferenceData::load(&db, &config.reference).await?;
    let maintenance = MaintenanceRepository::new(db.clone(), reference.system_user);

    match cli.command {
        Command::Recalculate => {
            let report = maintenance.recalculate_all(mode).await?;
            print_json(&report)?;
        }
        Command::Correct { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let targets: Vec<TargetBalance> =
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
            let report = maintenance.apply_target_corrections(&targets, mode).await?;
            print_json(&report)?;
        }
        Command::Duplicates => {
            let reports = maintenance.remove_duplicates(mode).await?;
            print_json(&reports)?;
        }
        Command::Drift => {
            let drifted = BalanceRepository::new(db).drift_report().await?;
            print_json(&drifted)?;
        }
    }

    if !mode.is_execute() {
        info!("Dry run, nothing was written");
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
