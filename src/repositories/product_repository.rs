use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::entities::product::{Column, Entity as ProductEntity};
use crate::errors::ServiceError;
use crate::models::Product;
use crate::repositories::{BaseRepository, ProductRepository, Repository};

/// sea-orm backed access to `products`
#[derive(Debug, Clone)]
pub struct SeaOrmProductRepository {
    base: BaseRepository,
}

impl SeaOrmProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn find_by_ids(
        &self,
        branch_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = ProductEntity::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(self.base.get_db())
            .await
            .map_err(|e| {
                error!("Failed to fetch {} products: {}", ids.len(), e);
                ServiceError::db_error(e)
            })?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_non_variants(&self, branch_id: Uuid) -> Result<Vec<Product>, ServiceError> {
        let rows = ProductEntity::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::IsVariant.eq(false))
            .order_by_asc(Column::Name)
            .all(self.base.get_db())
            .await
            .map_err(|e| {
                error!("Failed to fetch BOM candidate products: {}", e);
                ServiceError::db_error(e)
            })?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
