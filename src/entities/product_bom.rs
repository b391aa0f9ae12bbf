use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::BomLineItem;

/// BOM line item: one component requirement of a parent product
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_bom")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    pub parent_product_id: Uuid,
    pub component_product_id: Uuid,
    pub quantity_required: Decimal,
    pub unit_of_measure: String,
    pub scrap_factor: Option<Decimal>,
    pub production_step: Option<String>,
    pub bom_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bom_version::Entity",
        from = "Column::BomVersionId",
        to = "super::bom_version::Column::Id"
    )]
    BomVersion,
}

impl Related<super::bom_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BomVersion.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = self.id {
                self.id = ActiveValue::Set(Uuid::new_v4());
            }

            if let ActiveValue::NotSet = self.created_at {
                self.created_at = ActiveValue::Set(now);
            }
        }

        self.updated_at = ActiveValue::Set(now);

        Ok(self)
    }
}

impl From<Model> for BomLineItem {
    fn from(model: Model) -> Self {
        BomLineItem {
            id: model.id,
            branch_id: model.branch_id,
            parent_product_id: model.parent_product_id,
            component_product_id: model.component_product_id,
            quantity_required: model.quantity_required,
            unit_of_measure: model.unit_of_measure,
            scrap_factor: model.scrap_factor.unwrap_or(Decimal::ZERO),
            production_step: model.production_step,
            bom_version_id: model.bom_version_id,
        }
    }
}
