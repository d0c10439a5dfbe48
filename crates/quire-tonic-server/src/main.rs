use anyhow::Context;
use clap::Parser;
use quire_tonic_core::quire::{MemoryStore, RecordStore};
use quire_tonic_server::server::{
    config::{CliArgs, ServerConfig, StoreBackend},
    lifecycle::{Lifecycle, interrupt_signal},
    telemetry::init_telemetry,
};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let res = match config.store {
        StoreBackend::Memory => serve(MemoryStore::new(), &config).await,
        StoreBackend::Mongo => serve_mongo(&config).await,
    };

    providers.shutdown();
    res
}

#[cfg(feature = "mongodb")]
async fn serve_mongo(config: &ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Connecting to the record store");
    let store = quire_tonic_core::quire::MongoStore::connect(
        &config.mongo_uri,
        &config.mongo_database,
        &config.mongo_collection,
    )
    .await
    .context("failed to connect to the record store")?;
    serve(store, config).await
}

#[cfg(not(feature = "mongodb"))]
#[allow(clippy::unused_async)]
async fn serve_mongo(_config: &ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!("built without the `mongodb` feature; use --store memory")
}

async fn serve<S: RecordStore>(store: S, config: &ServerConfig) -> anyhow::Result<()> {
    let running = Lifecycle::new(store)
        .start(config)
        .await
        .context("failed to start the record service")?;
    log_startup_info(&running.local_addr().to_string(), config);

    interrupt_signal().await?;
    running.shutdown().await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(addr: &str, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting record service on {addr} with full config: {config:#?}");
    } else {
        tracing::info!(
            "Starting record service on {addr} with {:?} store, batches of {}",
            config.store,
            config.list_batch_size
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_connect_failure_is_returned_not_raised() {
        let args = CliArgs::try_parse_from([
            "quire-tonic-server",
            "--store",
            "mongo",
            "--mongo-uri",
            "not-a-mongodb-uri",
        ])
        .unwrap();
        let config = ServerConfig::try_from(args).unwrap();

        assert!(serve_mongo(&config).await.is_err());
    }
}
