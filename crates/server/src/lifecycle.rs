//! Startup and shutdown of the repository server

use crate::counter::RequestCounter;
use crate::handler::IndexHandler;
use crate::latency::LatencyInjector;
use crate::limiter::AdmissionLimiter;
use crate::router::router;
use axum::Router;
use bytes::Bytes;
use slowrepo_config::{CatalogConfig, Config, ServerConfig};
use slowrepo_errors::{Error, ServeError};
use slowrepo_index::{verify_index, IndexBuilder};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Build the catalog's index and return its verified bytes
///
/// # Errors
///
/// Returns the builder's or validator's error; nothing may be served then.
pub fn prepare_index(catalog: &CatalogConfig) -> Result<Bytes, Error> {
    let mut builder = IndexBuilder::new().with_base_url(catalog.base_url.clone());
    builder.extend(catalog.charts.iter().cloned())?;
    let index = builder.build();

    let bytes = verify_index(&index)?;
    info!(
        charts = index.chart_count(),
        versions = index.version_count(),
        bytes = bytes.len(),
        "index.yaml verified"
    );
    Ok(Bytes::from(bytes))
}

/// A bound, not yet serving, repository server
pub struct RegistryServer {
    listener: TcpListener,
    app: Router,
    requests: CancellationToken,
    grace: Duration,
    local_addr: SocketAddr,
}

impl RegistryServer {
    /// Build and verify the index, then open the listener
    ///
    /// The listener is only opened once the index has passed verification.
    ///
    /// # Errors
    ///
    /// Returns index errors from [`prepare_index`] or `BindFailed`.
    pub async fn bind(config: &Config) -> Result<Self, Error> {
        let index = prepare_index(&config.catalog)?;
        let handler = IndexHandler::new(
            index,
            AdmissionLimiter::new(config.server.max_index_concurrency),
            LatencyInjector::new(config.server.simulate_index_duration),
            RequestCounter::new(),
        );
        Self::bind_with_handler(&config.server, handler).await
    }

    /// Open the listener for an already prepared handler
    ///
    /// # Errors
    ///
    /// Returns `BindFailed` if the address cannot be bound.
    pub async fn bind_with_handler(
        server: &ServerConfig,
        handler: IndexHandler,
    ) -> Result<Self, Error> {
        let addr = server.bind_addr();
        let bind_failed = |e: std::io::Error| ServeError::BindFailed {
            addr: addr.clone(),
            message: e.to_string(),
        };
        let listener = TcpListener::bind(&addr).await.map_err(bind_failed)?;
        let local_addr = listener.local_addr().map_err(bind_failed)?;

        let requests = CancellationToken::new();
        let app = router(handler, &server.charts_dir, requests.clone());

        Ok(Self {
            listener,
            app,
            requests,
            grace: server.shutdown_grace,
            local_addr,
        })
    }

    /// Address the listener actually bound
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` fires, then drain within the grace period
    ///
    /// After `shutdown` no new connections are accepted. When the grace
    /// period runs out, every request still queued for admission or inside
    /// its simulated delay is cancelled and answers 500, and `run` returns
    /// without waiting further. Connections live on their own tasks, so a
    /// response body already being written is left to finish on its own.
    ///
    /// # Errors
    ///
    /// Returns `ServeError::Server` if the accept loop fails.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), Error> {
        let Self {
            listener,
            app,
            requests,
            grace,
            local_addr,
        } = self;

        info!(addr = %local_addr, "Listening on {local_addr}");

        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => return result.map_err(server_failed),
            () = shutdown.cancelled() => {}
        }

        info!(grace = ?grace, "shutting down, waiting for in-flight requests");
        match tokio::time::timeout(grace, &mut serve).await {
            Ok(result) => result.map_err(server_failed),
            Err(_) => {
                warn!(grace = ?grace, "grace period elapsed, cancelling in-flight requests");
                requests.cancel();
                Ok(())
            }
        }
    }
}

fn server_failed(err: std::io::Error) -> Error {
    ServeError::Server {
        message: err.to_string(),
    }
    .into()
}
