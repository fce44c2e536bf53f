//! Provisions the system user and the base currency.
//!
//! Run once after migrating a new database, and again whenever the reference
//! configuration changes. Existing rows are left untouched.
//!
//! Usage: cargo run --bin provisioner

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cashdesk_db::{ReferenceRepository, connect_with};
use cashdesk_shared::AppConfig;

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

    let config = AppConfig::load()?;
    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let report = ReferenceRepository::new(db)
        .provision(&config.reference)
        .await?;

    info!(
        system_user = %report.data.system_user,
        base_currency = %report.data.base_currency,
        created_user = report.created_user,
        created_currency = report.created_currency,
        "Provisioning complete"
    );

    Ok(())
}
