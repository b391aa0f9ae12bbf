use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Product;

/// Product entity, scoped to a branch
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    /// On-hand quantity
    pub quantity_in_stock: Decimal,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub is_variant: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Product {
            id: model.id,
            branch_id: model.branch_id,
            name: model.name,
            sku: model.sku,
            stock: model.quantity_in_stock,
            purchase_price: model.purchase_price,
            sale_price: model.sale_price,
            is_variant: model.is_variant,
        }
    }
}
