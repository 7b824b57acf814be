//! KFT Service - shared household ledger
//!
//! This is the main entry point: it opens the store, registers the authorized users
//! and runs the month-end scheduler until the process is told to stop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kft_service::{shutdown_signal, Ledger, PeriodScheduler, ServiceConfig};
use kft_store::KvStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kft_service=debug,kft_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting KFT Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        data_dir = %config.data_dir,
        users = config.users.len(),
        admin = ?config.admin_username(),
        resync_secs = config.resync_interval_secs,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let ledger = Arc::new(Ledger::open(store)?);
    ledger.register_users(config.users.as_slice(), config.admin_username())?;

    let cancel = CancellationToken::new();
    let mut scheduler = PeriodScheduler::new(Arc::clone(&ledger))
        .with_resync_interval(config.resync_interval())
        .spawn(cancel.clone());

    let signalled = tokio::select! {
        () = shutdown_signal() => true,
        result = &mut scheduler => {
            // The scheduler only returns early on failure.
            result??;
            false
        }
    };

    if signalled {
        cancel.cancel();
        scheduler.await??;
    }

    tracing::info!("KFT Service stopped");
    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn KvStore>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(kft_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn KvStore>, Box<dyn std::error::Error>> {
    tracing::warn!(
        path = %config.data_dir,
        "Built without RocksDB, using in-memory store; data will not persist"
    );
    Ok(Arc::new(kft_store::MemoryStore::new()))
}
