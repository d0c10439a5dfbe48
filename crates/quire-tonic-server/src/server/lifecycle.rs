//! Process lifecycle: start serving, then drain and stop in order.
//!
//! ```text
//! Unstarted --start()--> Listening --shutdown()--> Draining --> Stopped
//! ```
//!
//! [`Lifecycle`] owns the store connection before anything listens.
//! [`Lifecycle::start`] binds the listener, registers the services and runs
//! the accept loop on a background task. [`Running::shutdown`] stops
//! accepting, waits for in-flight calls (they finish or hit their own
//! deadlines; nothing is force-cancelled), closes the listener and only then
//! closes the store.
//!
//! The current phase is published on a [`watch`] channel.

use crate::server::{config::ServerConfig, service::handler::RecordService};
use anyhow::Context;
use quire_tonic_core::{
    proto::{FILE_DESCRIPTOR_SET, records_server::RecordsServer},
    quire::RecordStore,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal, sync::watch, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Store connected, nothing bound yet.
    Unstarted,
    /// Accepting calls.
    Listening,
    /// No longer accepting; waiting for in-flight calls.
    Draining,
    /// Listener and store connection closed.
    Stopped,
}

/// A server that has not started listening yet.
pub struct Lifecycle<S> {
    store: Arc<S>,
    phase: watch::Sender<Phase>,
}

impl<S: RecordStore> Lifecycle<S> {
    /// Takes ownership of an already connected store.
    pub fn new(store: S) -> Self {
        let (phase, _) = watch::channel(Phase::Unstarted);
        Self {
            store: Arc::new(store),
            phase,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Binds `config.server_addr` and starts serving in the background.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound or the reflection service cannot
    /// be built. The phase stays [`Phase::Unstarted`] and the store is left
    /// untouched; callers treat this as fatal.
    pub async fn start(self, config: &ServerConfig) -> anyhow::Result<Running<S>> {
        let listener = TcpListener::bind(&config.server_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.server_addr))?;
        let local_addr = listener.local_addr()?;

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<RecordsServer<RecordService<S>>>()
            .await;

        let service = RecordService::new(Arc::clone(&self.store), config);

        let reflection = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;

        let shutdown = CancellationToken::new();

        let router = Server::builder()
            .accept_http1(true)
            .http2_adaptive_window(Some(true))
            .layer(
                ServiceBuilder::new()
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    )
                    .layer(GrpcWebLayer::new()),
            )
            .add_service(health_service)
            .add_service(reflection)
            .add_service(build_record_service(service));

        let serve = tokio::spawn(router.serve_with_incoming_shutdown(
            TcpListenerStream::new(listener),
            shutdown.clone().cancelled_owned(),
        ));

        self.phase.send_replace(Phase::Listening);
        tracing::info!("Listening on {local_addr}");

        Ok(Running {
            store: self.store,
            phase: self.phase,
            local_addr,
            shutdown,
            serve,
            health_reporter,
        })
    }
}

fn build_record_service<S: RecordStore>(
    service: RecordService<S>,
) -> RecordsServer<RecordService<S>> {
    RecordsServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

/// A server accepting calls on a background task.
pub struct Running<S> {
    store: Arc<S>,
    phase: watch::Sender<Phase>,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    serve: JoinHandle<Result<(), tonic::transport::Error>>,
    health_reporter: HealthReporter,
}

impl<S: RecordStore> Running<S> {
    /// The bound address; useful when binding port 0.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// The shared store connection.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Drains and stops the server.
    ///
    /// The store is closed even when the accept loop failed; the first error
    /// encountered is returned after both steps ran.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // === Phase 1: Stop accepting ===
        self.phase.send_replace(Phase::Draining);
        tracing::info!("Refusing new calls");
        self.health_reporter
            .set_not_serving::<RecordsServer<RecordService<S>>>()
            .await;
        self.shutdown.cancel();

        // === Phase 2: Wait for in-flight calls; the listener closes on return ===
        tracing::info!("Draining in-flight calls");
        let served = self.serve.await;
        tracing::info!("Listener closed");

        // === Phase 3: Close the store connection ===
        let closed = self.store.close().await;
        tracing::info!("Store connection closed");

        self.phase.send_replace(Phase::Stopped);

        served
            .context("accept loop panicked")?
            .context("accept loop failed")?;
        closed.context("failed to close store connection")?;
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
///
/// # Errors
///
/// Fails if a signal handler cannot be installed.
pub async fn interrupt_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        anyhow::Ok(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")
    };

    tokio::select! {
        res = ctrl_c => {
            res?;
            tracing::info!("Received Ctrl+C signal");
        },
        res = terminate => {
            res?;
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    Ok(())
}
