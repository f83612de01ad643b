//! # inventario: asset inventory form backed by a spreadsheet
//!
//! Staff register physical assets (unit, category, description, brand, serial number,
//! condition) through an HTML form. Each unit becomes one row in a Google Sheets spreadsheet,
//! which is the only store: there is no local database. A second page lists every row and
//! lets staff edit a row in place.
//!
//! ## Architecture
//!
//! ```text
//! HTML pages / JSON API (axum)
//!          │
//!   InventoryService          list, submit, update
//!          │
//!   codec                     AssetRecord <-> 7-cell row
//!          │
//!   SpreadsheetGateway        Google Sheets v4 (or in-memory)
//! ```
//!
//! - [`api`]: route handlers and wire models
//! - [`service`]: the three use cases
//! - [`codec`]: the row layout
//! - [`sheets`]: the gateway trait and its implementations
//! - [`config`]: YAML + environment configuration
//!
//! ## Routes
//!
//! | Route              | Method | Purpose                                      |
//! |--------------------|--------|----------------------------------------------|
//! | `/`                | GET    | registration form                            |
//! | `/inventario`      | GET    | inventory browser                            |
//! | `/sucesso`         | GET    | confirmation page                            |
//! | `/api/items`       | GET    | every item as JSON                           |
//! | `/api/update_row`  | POST   | overwrite one row (JSON)                     |
//! | `/submit`          | POST   | append new items (form), redirects           |
//! | `/update`          | POST   | overwrite one row (form), redirects          |
//! | `/healthz`         | GET    | liveness                                     |
//! | `/docs`            | GET    | API reference                                |
//! | `/internal/metrics`| GET    | Prometheus metrics, when enabled             |
//!
//! ## Running
//!
//! ```bash
//! GOOGLE_CREDENTIALS_JSON="$(cat service-account.json)" inventario -f config.yaml
//! ```
//!
//! The spreadsheet must be shared with the service account's email address.

pub mod api;
pub mod codec;
pub mod config;
pub mod errors;
pub mod openapi;
pub mod service;
pub mod sheets;
mod static_assets;
pub mod telemetry;

#[cfg(test)]
mod test;

use axum::{
    Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;
use crate::service::{Clock, InventoryService, SystemClock};
use crate::sheets::SpreadsheetGateway;

/// State shared by every handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .inventory(Arc::new(inventory))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub inventory: Arc<InventoryService>,
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    let enable_metrics = state.config.enable_metrics;

    let api_routes = Router::new()
        .route("/items", get(api::handlers::items::list_items))
        .route("/update_row", post(api::handlers::items::update_row));

    let mut router = Router::new()
        .route("/", get(api::handlers::pages::index))
        .route("/inventario", get(api::handlers::pages::inventory))
        .route("/sucesso", get(api::handlers::pages::success))
        .route("/submit", post(api::handlers::forms::submit))
        .route("/update", post(api::handlers::forms::update))
        .nest("/api", api_routes)
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

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

/// The configured HTTP service.
///
/// [`Application::new`] builds the gateway selected by configuration and the router;
/// [`Application::serve`] binds the listener and runs until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let gateway = sheets::create_gateway(&config.sheets)?;
        Self::with_gateway(config, gateway, Arc::new(SystemClock))
    }

    /// Build around an existing gateway and clock instead of the configured ones.
    pub fn with_gateway(config: Config, gateway: Arc<dyn SpreadsheetGateway>, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        debug!("Starting inventory service with configuration: {:#?}", config);

        let inventory = InventoryService::new(gateway, clock, config.limits.clone());
        let state = AppState::builder().config(config.clone()).inventory(Arc::new(inventory)).build();
        let router = build_router(state);

        Ok(Self { router, config })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Inventory listening on http://{}, available at http://localhost:{}",
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
