use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::bom_cost_component::{self, Column, Entity as CostComponentEntity};
use crate::errors::ServiceError;
use crate::models::{BomCostComponent, CostComponentInput};
use crate::repositories::{BaseRepository, CostComponentRepository, Repository};

/// sea-orm backed access to `bom_cost_components`
#[derive(Debug, Clone)]
pub struct SeaOrmCostComponentRepository {
    base: BaseRepository,
}

impl SeaOrmCostComponentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl CostComponentRepository for SeaOrmCostComponentRepository {
    async fn find_by_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<Vec<BomCostComponent>, ServiceError> {
        let rows = CostComponentEntity::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::BomVersionId.eq(version_id))
            .order_by_asc(Column::CostType)
            .order_by_asc(Column::CreatedAt)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(rows.into_iter().map(BomCostComponent::from).collect())
    }

    async fn create(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
        input: CostComponentInput,
    ) -> Result<BomCostComponent, ServiceError> {
        let model = bom_cost_component::ActiveModel {
            branch_id: Set(branch_id),
            bom_version_id: Set(version_id),
            cost_type: Set(input.cost_type),
            description: Set(input.description),
            rate_per_unit: Set(input.rate_per_unit),
            quantity: Set(input.quantity),
            total_cost: Set(input.rate_per_unit * input.quantity),
            ..Default::default()
        };

        let created = model
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(BomCostComponent::from(created))
    }

    async fn update(
        &self,
        branch_id: Uuid,
        id: Uuid,
        input: CostComponentInput,
    ) -> Result<BomCostComponent, ServiceError> {
        let db = self.base.get_db();

        let existing = CostComponentEntity::find_by_id(id)
            .filter(Column::BranchId.eq(branch_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Cost component {} not found", id)))?;

        let mut model = existing.into_active_model();
        model.cost_type = Set(input.cost_type);
        model.description = Set(input.description);
        model.rate_per_unit = Set(input.rate_per_unit);
        model.quantity = Set(input.quantity);
        model.total_cost = Set(input.rate_per_unit * input.quantity);

        let updated = model.update(db).await.map_err(ServiceError::db_error)?;
        Ok(BomCostComponent::from(updated))
    }

    async fn delete(&self, branch_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let result = CostComponentEntity::delete_many()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::Id.eq(id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Cost component {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn delete_by_versions(
        &self,
        branch_id: Uuid,
        version_ids: &[Uuid],
    ) -> Result<u64, ServiceError> {
        if version_ids.is_empty() {
            return Ok(0);
        }

        let result = CostComponentEntity::delete_many()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::BomVersionId.is_in(version_ids.iter().copied()))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(result.rows_affected)
    }
}
