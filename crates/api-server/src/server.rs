//! API server: HTTP routes plus the Prometheus exporter.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use axum::routing::{get, post};
use axum::{Json, Router};
use rotation_core::config::AppConfig;
use rotation_engine::RotationService;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

/// Build the HTTP router over a rotation service.
pub fn router(service: Arc<RotationService>, request_timeout: Duration) -> Router {
    let state = AppState {
        service,
        request_timeout,
        start_time: Instant::now(),
    };

    let rotation = "/groups/:group_id/slots/:slot_id/banners/:banner_id";

    Router::new()
        // Entities
        .route("/banners", post(rest::add_banner))
        .route(
            "/banners/:banner_id",
            get(rest::get_banner).delete(rest::delete_banner),
        )
        .route("/slots", post(rest::add_slot))
        .route(
            "/slots/:slot_id",
            get(rest::get_slot).delete(rest::delete_slot),
        )
        .route("/groups", post(rest::add_group))
        .route(
            "/groups/:group_id",
            get(rest::get_group).delete(rest::delete_group),
        )
        // Rotations
        .route(
            rotation,
            post(rest::add_rotation)
                .get(rest::get_rotation)
                .delete(rest::delete_rotation),
        )
        .route(&format!("{rotation}/click"), post(rest::register_click))
        .route(&format!("{rotation}/stats"), get(rest::get_stats))
        .route(
            "/groups/:group_id/slots/:slot_id/banner",
            get(rest::choose_banner),
        )
        // Operational endpoints
        .route("/version", get(rest::version))
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Owns the HTTP listener and metrics exporter for one process.
pub struct ApiServer {
    config: AppConfig,
    service: Arc<RotationService>,
}

impl ApiServer {
    pub fn new(config: AppConfig, service: Arc<RotationService>) -> Self {
        Self { config, service }
    }

    /// Serve HTTP until `shutdown` resolves.
    pub async fn start_http(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let app = router(
            self.service.clone(),
            Duration::from_millis(self.config.api.request_timeout_ms),
        );

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Install the Prometheus recorder and its scrape listener on a separate port.
    /// Must be called from within the Tokio runtime.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
