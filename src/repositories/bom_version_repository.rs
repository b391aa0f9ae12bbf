use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::entities::bom_version::{self, Column, Entity as BomVersionEntity};
use crate::errors::ServiceError;
use crate::models::{BomVersion, NewBomVersion, VersionStatus};
use crate::repositories::{BaseRepository, Repository, VersionRepository};

/// sea-orm backed access to `bom_versions`
#[derive(Debug, Clone)]
pub struct SeaOrmVersionRepository {
    base: BaseRepository,
}

impl SeaOrmVersionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl VersionRepository for SeaOrmVersionRepository {
    async fn find_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<BomVersion>, ServiceError> {
        let rows = BomVersionEntity::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.eq(parent_id))
            .order_by_desc(Column::VersionNumber)
            .all(self.base.get_db())
            .await
            .map_err(|e| {
                error!("Failed to fetch BOM versions for {}: {}", parent_id, e);
                ServiceError::db_error(e)
            })?;

        Ok(rows.into_iter().map(BomVersion::from).collect())
    }

    async fn find_by_id(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<BomVersion>, ServiceError> {
        let row = BomVersionEntity::find_by_id(version_id)
            .filter(Column::BranchId.eq(branch_id))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(row.map(BomVersion::from))
    }

    async fn find_by_number(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        version_number: &str,
    ) -> Result<Option<BomVersion>, ServiceError> {
        let row = BomVersionEntity::find()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.eq(parent_id))
            .filter(Column::VersionNumber.eq(version_number))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(row.map(BomVersion::from))
    }

    async fn parent_ids(&self, branch_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        BomVersionEntity::find()
            .select_only()
            .column(Column::ParentProductId)
            .distinct()
            .filter(Column::BranchId.eq(branch_id))
            .into_tuple::<Uuid>()
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)
    }

    async fn create(&self, version: NewBomVersion) -> Result<BomVersion, ServiceError> {
        let model = bom_version::ActiveModel {
            branch_id: Set(version.branch_id),
            parent_product_id: Set(version.parent_product_id),
            version_number: Set(version.version_number),
            status: Set(version.status),
            ..Default::default()
        };

        let created = model.insert(self.base.get_db()).await.map_err(|e| {
            error!("Failed to create BOM version: {}", e);
            ServiceError::db_error(e)
        })?;

        Ok(BomVersion::from(created))
    }

    async fn set_status(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
        status: VersionStatus,
    ) -> Result<BomVersion, ServiceError> {
        let db = self.base.get_db();

        let existing = BomVersionEntity::find_by_id(version_id)
            .filter(Column::BranchId.eq(branch_id))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("BOM version {} not found", version_id))
            })?;

        let mut model = existing.into_active_model();
        model.status = Set(status);

        let updated = model.update(db).await.map_err(ServiceError::db_error)?;
        Ok(BomVersion::from(updated))
    }

    async fn archive_others(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        keep_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = BomVersionEntity::update_many()
            .col_expr(Column::Status, Expr::value(VersionStatus::Archived.to_string()))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.eq(parent_id))
            .filter(Column::Id.ne(keep_id))
            .filter(Column::Status.ne(VersionStatus::Archived))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(result.rows_affected)
    }

    async fn delete_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = BomVersionEntity::delete_many()
            .filter(Column::BranchId.eq(branch_id))
            .filter(Column::ParentProductId.eq(parent_id))
            .exec(self.base.get_db())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(result.rows_affected)
    }
}
