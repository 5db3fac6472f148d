//! Invoice charger.
//!
//! Polls an Airtable table for unpaid invoices, charges each customer's
//! saved Stripe card once and writes the result back to the record.

mod config;

use payment_processor::StripeClient;
use reconciler::PollScheduler;
use record_store::AirtableClient;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        table = %config.table,
        "Starting invoice charger v{}",
        reconciler::version()
    );

    // Both clients are checked before the first cycle; bad credentials are fatal.
    let scheduler_config = config.scheduler_config();
    let store = AirtableClient::connect(config.store, &config.table).await?;
    let stripe = StripeClient::new(config.stripe)?;
    let scheduler = PollScheduler::new(store, stripe, scheduler_config);

    let shutdown = CancellationToken::new();
    let mut worker = tokio::spawn(scheduler.run(shutdown.clone()));

    tokio::select! {
        result = wait_for_signal() => {
            result?;
            info!("Shutdown requested, finishing the current record");
            shutdown.cancel();
            worker.await?;
        }
        result = &mut worker => result?,
    }

    info!("Invoice charger stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
