//! Bill of Materials core for StockFlow.
//!
//! Resolves the current BOM of a parent product, joins component stock, and
//! reports buildable quantity, unit cost, version history and where-used
//! lookups. An axum router exposes the same operations over HTTP.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    /// Absent when services run over in-memory repositories
    pub db: Option<Arc<DatabaseConnection>>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, cfg: &config::AppConfig) -> Self {
        Self {
            services: handlers::AppServices::from_db(db.clone(), cfg.summary_concurrency()),
            db: Some(db),
        }
    }

    pub fn with_services(services: handlers::AppServices) -> Self {
        Self { db: None, services }
    }
}

/// Versioned API routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().nest("/boms", handlers::bom::bom_routes())
}

/// Full application router with request tracing
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod prelude {
    pub use crate::errors::{ApiError, ServiceError};
    pub use crate::models::{BomLineItem, BomVersion, Product, VersionStatus};
    pub use crate::services::bom::{BomCandidate, BomService, BomSummary, Scope, WhereUsedRow};
    pub use crate::AppState;
}
