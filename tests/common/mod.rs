use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use todo_api_rust::config::AppConfig;
use todo_api_rust::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Development defaults with request logging off and a private upload directory
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.files.upload_dir = std::env::temp_dir().join(format!("todo-api-test-{}", uuid::Uuid::new_v4().simple()));
    config
}

pub fn test_config_with_database() -> AppConfig {
    let mut config = test_config();
    config.database.url = Some("sqlite::memory:".to_string());
    config
}

/// Start a fresh server (own store, own database) on an unused port
pub async fn spawn_server(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let state = AppState::initialize(config).await?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind {}", base_url))?;

    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let server = TestServer { port, base_url, state };
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Poll until `check` returns true; used for the asynchronous mirror writes
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check().await? {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    anyhow::bail!("condition not met within {:?}", timeout)
}
