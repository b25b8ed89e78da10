//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use ezstub::config::RuntimeConfig;
use ezstub::http::HttpServer;
use ezstub::lifecycle::{bootstrap, Shutdown};
use tokio::net::TcpListener;

/// A stub server running on an ephemeral loopback port.
pub struct TestStub {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub dir: tempfile::TempDir,
}

impl TestStub {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestStub {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Write `config` (plus extra files) into a temp dir and serve it.
pub async fn start_stub(config: &str, files: &[(&str, &[u8])]) -> TestStub {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    let config_path = dir.path().join("ezstub.yaml");
    std::fs::write(&config_path, config).unwrap();

    let (addr, shutdown) = serve(&config_path).await;
    TestStub { addr, shutdown, dir }
}

async fn serve(config_path: &Path) -> (SocketAddr, Shutdown) {
    let boot = bootstrap(config_path).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(boot.table, &RuntimeConfig::default());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
