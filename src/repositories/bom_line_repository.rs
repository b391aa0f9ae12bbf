use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::entities::product_bom::{self, Column, Entity as ProductBom};
use crate::errors::ServiceError;
use crate::models::{BomLineItem, NewBomLineItem};
use crate::repositories::{BaseRepository, ComponentRepository, Repository};

/// sea-orm backed access to `product_bom`
#[derive(Debug, Clone)]
pub struct SeaOrmComponentRepository {
    base: BaseRepository,
}

impl SeaOrmComponentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl ComponentRepository for SeaOrmComponentRepository {
    async fn find_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        let rows = ProductBom::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.eq(parent_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.base.get_db())
            .await
            .map_err(|e| {
                error!("Failed to fetch BOM line items for {}: {}", parent_id, e);
                ServiceError::db_error(e)
            })?;

        Ok(rows.into_iter().map(BomLineItem::from).collect())
    }

    async fn find_by_component(
        &self,
        branch_id: Uuid,
        component_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        let rows = ProductBom::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ComponentProductId.eq(component_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(rows.into_iter().map(BomLineItem::from).collect())
    }

    async fn find_by_id(
        &self,
        branch_id: Uuid,
        line_id: Uuid,
    ) -> Result<Option<BomLineItem>, ServiceError> {
        let row = ProductBom::find_by_id(line_id)
            .filter(Column::BranchId.eq(branch_id))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(row.map(BomLineItem::from))
    }

    async fn parent_ids(&self, branch_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        ProductBom::find()
            .select_only()
            .column(Column::ParentProductId)
            .distinct()
            .filter(Column::BranchId.eq(branch_id))
            .into_tuple::<Uuid>()
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn parents_among(
        &self,
        branch_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, ServiceError> {
        if product_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = ProductBom::find()
            .select_only()
            .column(Column::ParentProductId)
            .distinct()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.is_in(product_ids.iter().copied()))
            .into_tuple::<Uuid>()
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ids.into_iter().collect())
    }

    async fn insert_many(
        &self,
        items: Vec<NewBomLineItem>,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        let db = self.base.get_db();
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            let model = product_bom::ActiveModel {
                branch_id: Set(item.branch_id),
                parent_product_id: Set(item.parent_product_id),
                component_product_id: Set(item.component_product_id),
                quantity_required: Set(item.quantity_required),
                unit_of_measure: Set(item.unit_of_measure),
                scrap_factor: Set(Some(item.scrap_factor)),
                production_step: Set(item.production_step),
                bom_version_id: Set(item.bom_version_id),
                ..Default::default()
            };

            let inserted = model.insert(db).await.map_err(|e| {
                error!("Failed to insert BOM line item: {}", e);
                ServiceError::db_error(e)
            })?;
            created.push(BomLineItem::from(inserted));
        }

        Ok(created)
    }

    async fn update_quantity(
        &self,
        branch_id: Uuid,
        line_id: Uuid,
        quantity_required: Decimal,
        scrap_factor: Option<Decimal>,
    ) -> Result<BomLineItem, ServiceError> {
        let db = self.base.get_db();

        let existing = ProductBom::find_by_id(line_id)
            .filter(Column::BranchId.eq(branch_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM line {} not found", line_id)))?;

        let mut model = existing.into_active_model();
        model.quantity_required = Set(quantity_required);
        if let Some(scrap) = scrap_factor {
            model.scrap_factor = Set(Some(scrap));
        }

        let updated = model.update(db).await.map_err(ServiceError::db_error)?;
        Ok(BomLineItem::from(updated))
    }

    async fn delete_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = ProductBom::delete_many()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.eq(parent_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(result.rows_affected)
    }

    async fn delete_by_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = ProductBom::delete_many()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::BomVersionId.eq(version_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(result.rows_affected)
    }
}
