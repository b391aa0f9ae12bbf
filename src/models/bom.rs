use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a BOM version.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VersionStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "archived")]
    Archived,
}

/// Kind of cost recorded against a BOM version.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CostType {
    #[sea_orm(string_value = "material")]
    Material,
    #[sea_orm(string_value = "labor")]
    Labor,
    #[sea_orm(string_value = "overhead")]
    Overhead,
    #[sea_orm(string_value = "subcontract")]
    Subcontract,
}

/// Stock and pricing snapshot of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub stock: Decimal,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub is_variant: bool,
}

/// One component requirement of a parent product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLineItem {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub parent_product_id: Uuid,
    pub component_product_id: Uuid,
    pub quantity_required: Decimal,
    pub unit_of_measure: String,
    /// Expected material loss in percent
    pub scrap_factor: Decimal,
    pub production_step: Option<String>,
    pub bom_version_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBomLineItem {
    pub branch_id: Uuid,
    pub parent_product_id: Uuid,
    pub component_product_id: Uuid,
    pub quantity_required: Decimal,
    pub unit_of_measure: String,
    pub scrap_factor: Decimal,
    pub production_step: Option<String>,
    pub bom_version_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomVersion {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub parent_product_id: Uuid,
    pub version_number: String,
    pub status: VersionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBomVersion {
    pub branch_id: Uuid,
    pub parent_product_id: Uuid,
    pub version_number: String,
    pub status: VersionStatus,
}

/// Labor, overhead or other non-material cost attached to a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomCostComponent {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub bom_version_id: Uuid,
    pub cost_type: CostType,
    pub description: Option<String>,
    pub rate_per_unit: Decimal,
    pub quantity: Decimal,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComponentInput {
    pub cost_type: CostType,
    pub description: Option<String>,
    pub rate_per_unit: Decimal,
    pub quantity: Decimal,
}
