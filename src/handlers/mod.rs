pub mod bom;
pub mod common;
pub mod health;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::services::BomService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub bom: Arc<BomService>,
}

impl AppServices {
    pub fn new(bom: Arc<BomService>) -> Self {
        Self { bom }
    }

    /// Wires every service over one database pool
    pub fn from_db(db: Arc<DatabaseConnection>, summary_concurrency: usize) -> Self {
        Self::new(Arc::new(
            BomService::from_db(db).with_summary_concurrency(summary_concurrency),
        ))
    }
}
