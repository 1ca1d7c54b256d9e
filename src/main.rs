//! Bootstrap binary: prepares the affiliate database schema.
//!
//! The HTTP request layer lives in a separate service; this binary exists so
//! deployments and local development can initialize (or verify) the schema the
//! core crate expects.

use dotenvy::dotenv;
use glowlink::config;
use glowlink::errors::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Non-fatal, env vars can be set externally
    dotenv().ok();

    let settings = config::settings::load_or_default();
    info!(
        attribution_window_days = settings.attribution_window_days,
        "loaded settings"
    );

    let db = config::database::create_connection(&settings)
        .await
        .inspect_err(|e| error!("failed to connect to database: {e}"))?;

    config::database::create_tables(&db)
        .await
        .inspect_err(|e| error!("failed to create tables: {e}"))?;

    info!(
        url = %config::database::get_database_url(&settings),
        "affiliate schema ready"
    );
    Ok(())
}
