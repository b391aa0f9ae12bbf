//! Storage seams for the BOM core.
//!
//! Each entity gets a narrow async trait so the calculation services never see
//! the query builder. The sea-orm implementations live next to the traits;
//! tests substitute in-memory ones.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    BomCostComponent, BomLineItem, BomVersion, CostComponentInput, NewBomLineItem, NewBomVersion,
    Product, VersionStatus,
};

pub mod bom_line_repository;
pub mod bom_version_repository;
pub mod cost_component_repository;
pub mod product_repository;

pub use bom_line_repository::SeaOrmComponentRepository;
pub use bom_version_repository::SeaOrmVersionRepository;
pub use cost_component_repository::SeaOrmCostComponentRepository;
pub use product_repository::SeaOrmProductRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// BOM line items (`product_bom`)
#[async_trait]
pub trait ComponentRepository: Send + Sync {
    async fn find_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError>;

    async fn find_by_component(
        &self,
        branch_id: Uuid,
        component_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError>;

    async fn find_by_id(
        &self,
        branch_id: Uuid,
        line_id: Uuid,
    ) -> Result<Option<BomLineItem>, ServiceError>;

    /// Distinct parent ids that own at least one line item
    async fn parent_ids(&self, branch_id: Uuid) -> Result<Vec<Uuid>, ServiceError>;

    /// Subset of `product_ids` that are themselves parents of a BOM
    async fn parents_among(
        &self,
        branch_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, ServiceError>;

    async fn insert_many(
        &self,
        items: Vec<NewBomLineItem>,
    ) -> Result<Vec<BomLineItem>, ServiceError>;

    async fn update_quantity(
        &self,
        branch_id: Uuid,
        line_id: Uuid,
        quantity_required: Decimal,
        scrap_factor: Option<Decimal>,
    ) -> Result<BomLineItem, ServiceError>;

    async fn delete_by_parent(&self, branch_id: Uuid, parent_id: Uuid)
        -> Result<u64, ServiceError>;

    async fn delete_by_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<u64, ServiceError>;
}

/// BOM versions (`bom_versions`)
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Versions of a parent, highest version number first
    async fn find_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<BomVersion>, ServiceError>;

    async fn find_by_id(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<BomVersion>, ServiceError>;

    async fn find_by_number(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        version_number: &str,
    ) -> Result<Option<BomVersion>, ServiceError>;

    /// Distinct parent ids that own at least one version
    async fn parent_ids(&self, branch_id: Uuid) -> Result<Vec<Uuid>, ServiceError>;

    async fn create(&self, version: NewBomVersion) -> Result<BomVersion, ServiceError>;

    async fn set_status(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
        status: VersionStatus,
    ) -> Result<BomVersion, ServiceError>;

    /// Archives every version of `parent_id` except `keep_id`
    async fn archive_others(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        keep_id: Uuid,
    ) -> Result<u64, ServiceError>;

    async fn delete_by_parent(&self, branch_id: Uuid, parent_id: Uuid)
        -> Result<u64, ServiceError>;
}

/// Products (`products`)
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_ids(
        &self,
        branch_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, ServiceError>;

    /// Products that are not variants, ordered by name
    async fn find_non_variants(&self, branch_id: Uuid) -> Result<Vec<Product>, ServiceError>;
}

/// Labor/overhead entries (`bom_cost_components`)
#[async_trait]
pub trait CostComponentRepository: Send + Sync {
    async fn find_by_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<Vec<BomCostComponent>, ServiceError>;

    async fn create(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
        input: CostComponentInput,
    ) -> Result<BomCostComponent, ServiceError>;

    async fn update(
        &self,
        branch_id: Uuid,
        id: Uuid,
        input: CostComponentInput,
    ) -> Result<BomCostComponent, ServiceError>;

    async fn delete(&self, branch_id: Uuid, id: Uuid) -> Result<(), ServiceError>;

    /// Removes every entry attached to the given versions
    async fn delete_by_versions(
        &self,
        branch_id: Uuid,
        version_ids: &[Uuid],
    ) -> Result<u64, ServiceError>;
}
