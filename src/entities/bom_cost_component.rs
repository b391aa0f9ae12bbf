use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BomCostComponent, CostType};

/// Non-material cost (labor, overhead, subcontract) recorded per BOM version
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bom_cost_components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    pub bom_version_id: Uuid,
    pub cost_type: CostType,
    pub description: Option<String>,
    pub rate_per_unit: Decimal,
    pub quantity: Decimal,
    pub total_cost: Decimal,
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

        // total_cost is always derived from rate and quantity
        if let (ActiveValue::Set(rate), ActiveValue::Set(quantity)) =
            (&self.rate_per_unit, &self.quantity)
        {
            self.total_cost = ActiveValue::Set(*rate * *quantity);
        }

        self.updated_at = ActiveValue::Set(now);

        Ok(self)
    }
}

impl From<Model> for BomCostComponent {
    fn from(model: Model) -> Self {
        BomCostComponent {
            id: model.id,
            branch_id: model.branch_id,
            bom_version_id: model.bom_version_id,
            cost_type: model.cost_type,
            description: model.description,
            rate_per_unit: model.rate_per_unit,
            quantity: model.quantity,
            total_cost: model.total_cost,
            created_at: model.created_at,
        }
    }
}
