//! Common test utilities for end-to-end server tests

use slowrepo_config::Config;
use slowrepo_errors::Error;
use slowrepo_server::RegistryServer;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running server on an ephemeral loopback port
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), Error>>,
    charts: TempDir,
}

impl TestServer {
    /// Bind and start a server, letting `configure` adjust the defaults
    pub async fn start(configure: impl FnOnce(&mut Config)) -> Self {
        let charts = TempDir::new().unwrap();

        let mut config = Config::default();
        config.server.listen_addr = "127.0.0.1:0".to_string();
        config.server.charts_dir = charts.path().to_path_buf();
        config.server.shutdown_grace = Duration::from_millis(200);
        configure(&mut config);

        let server = RegistryServer::bind(&config).await.unwrap();
        let addr = server.local_addr();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server.run(shutdown.clone()));

        Self {
            addr,
            shutdown,
            handle,
            charts,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn charts_dir(&self) -> &Path {
        self.charts.path()
    }

    /// Fire the shutdown token and wait for `run` to return
    pub async fn stop(self) -> Result<(), Error> {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop within 5s")
            .expect("server task panicked")
    }
}
