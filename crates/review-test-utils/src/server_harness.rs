//! Test server harness for E2E testing
//!
//! Provides `TestReviewServer` for spawning real Review Service instances in
//! tests.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use review_service::config::Config;
use review_service::observability::metrics::init_metrics_recorder;
use review_service::routes::{self, AppState};
use review_service::services::{RandomSource, ReviewService, SeededRandom, ThreadRandom};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Process-wide metrics handle; the Prometheus recorder can only be
/// installed once per process.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the Review Service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[sqlx::test(migrations = "../../migrations")]
/// async fn test_health_e2e(pool: PgPool) -> Result<()> {
///     let server = TestReviewServer::spawn(pool).await?;
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestReviewServer {
    addr: SocketAddr,
    pool: PgPool,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestReviewServer {
    /// Spawn a server over `pool` with thread-local randomness.
    ///
    /// The server binds to a random available port (127.0.0.1:0) and runs in
    /// the background until dropped.
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn_with_random(pool, Arc::new(ThreadRandom)).await
    }

    /// Spawn a server whose reviewer selection is reproducible for `seed`.
    pub async fn spawn_seeded(pool: PgPool, seed: u64) -> Result<Self, anyhow::Error> {
        Self::spawn_with_random(pool, Arc::new(SeededRandom::new(seed))).await
    }

    /// Spawn a server with an explicit random source.
    pub async fn spawn_with_random(
        pool: PgPool,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("RUN_MIGRATIONS".to_string(), "false".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState {
            pool: pool.clone(),
            config: config.clone(),
            service: ReviewService::with_pool(pool.clone(), random),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            _handle: handle,
        })
    }

    /// Get reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestReviewServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
