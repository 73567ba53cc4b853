//! # ossrelay: AI server output relay
//!
//! `ossrelay` moves files produced by an AI image/model server into an S3-compatible object
//! storage bucket (Aliyun OSS in production) and hands back where they ended up.
//!
//! ## Overview
//!
//! Workflow tools on the AI server side call `POST /save-oss` with a list of output filenames
//! and the server's host and port. For each filename, in order, the relay:
//!
//! 1. fetches `http://{host}:{port}/view?filename={name}&type=output`, checking that the body
//!    length matches any declared `Content-Length`
//! 2. derives a fresh object key `{unix_seconds}_{index}.{original extensions}`
//! 3. uploads the bytes to the configured bucket
//! 4. sniffs the content to pick a public URL: a thumbnail URL for PNG/JPEG, a direct URL for
//!    binary glTF, and no URL otherwise
//!
//! The response lists `{"filename": key, "oss_url": url}` per requested file. The first failure
//! ends the batch with an error response; files uploaded before it are left in the bucket.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Batch logic lives in [`relay`],
//! which depends only on two traits: [`relay::fetch::UpstreamFetcher`] (reqwest in production)
//! and [`storage::ObjectStore`] (`aws-sdk-s3` against OSS in production, or in-memory).
//! Nothing is persisted by the relay itself and no state is shared between requests beyond
//! read-only configuration.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use ossrelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = ossrelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     ossrelay::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod errors;
mod openapi;
pub mod relay;
pub mod storage;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use config::StorageBackend;
use relay::{Relay, fetch::ReqwestFetcher};
use std::sync::Arc;
use storage::{InMemoryObjectStore, ObjectStore, OssObjectStore, PublicUrls};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .relay(relay)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub relay: Relay,
}

/// Build the object store selected by `storage.backend`
pub async fn create_object_store(config: &Config) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Oss => Arc::new(OssObjectStore::from_config(&config.storage).await?),
        StorageBackend::Memory => {
            info!("Using in-memory object store; relayed files will not survive a restart");
            Arc::new(InMemoryObjectStore::new(config.storage.bucket.clone()))
        }
    };
    Ok(store)
}

/// Build the main application router with all endpoints and middleware.
///
/// - `GET /test`, `GET /healthz`: liveness
/// - `POST /save-oss`: batch relay
/// - `GET /api-docs/openapi.json`: OpenAPI document
/// - `GET /internal/metrics`: Prometheus metrics, when `enable_metrics` is set
///
/// Every route is wrapped in a tracing layer.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let enable_metrics = state.config.enable_metrics;

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/test", get(api::handlers::health::test))
        .route("/save-oss", post(api::handlers::relay::save_oss))
        .route("/api-docs/openapi.json", get(|| async { Json(openapi::ApiDoc::openapi()) }))
        .with_state(state);

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] builds the object store, the upstream fetcher and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting relay with configuration: {:#?}", config);

        let store = create_object_store(&config).await?;
        Self::new_with_store(config, store)
    }

    /// Create an application writing to a caller-provided store
    pub fn new_with_store(config: Config, store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let fetcher = ReqwestFetcher::new(&config.upstream)?;
        let public_urls = PublicUrls::from_config(&config.storage);
        let relay = Relay::new(Arc::new(fetcher), store, public_urls);

        let app_state = AppState::builder().config(config.clone()).relay(relay).build();
        let router = build_router(app_state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Relay listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::config::StorageBackend;
    use crate::test_utils::{create_test_config, install_crypto_provider};

    #[tokio::test]
    async fn test_application_with_memory_backend() {
        install_crypto_provider();
        let mut config = create_test_config();
        config.storage.backend = StorageBackend::Memory;

        let app = crate::Application::new(config).await;
        assert!(app.is_ok(), "Application::new should succeed");

        let server = app.unwrap().into_test_server();

        let health_response = server.get("/healthz").await;
        assert_eq!(health_response.status_code().as_u16(), 200);
        assert_eq!(health_response.text(), "OK");

        let openapi_response = server.get("/api-docs/openapi.json").await;
        assert_eq!(openapi_response.status_code().as_u16(), 200);
        assert!(openapi_response.text().contains("/save-oss"));
    }

    #[tokio::test]
    async fn test_build_router_with_metrics_disabled() {
        let (server, _store) = crate::test_utils::create_test_app();

        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_build_router_with_metrics_enabled() {
        let mut config = create_test_config();
        config.enable_metrics = true;
        let (server, _store) = crate::test_utils::create_test_app_with_config(config);

        server.get("/test").await;

        let metrics_response = server.get("/internal/metrics").await;
        assert_eq!(metrics_response.status_code().as_u16(), 200);
        let metrics_content = metrics_response.text();
        assert!(metrics_content.contains("# HELP") || metrics_content.contains("# TYPE"));
    }
}
