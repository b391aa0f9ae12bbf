//! Pure BOM arithmetic: scope resolution, scrap-adjusted quantities,
//! buildable quantity and material cost rollup.
//!
//! Nothing here touches storage; the service layer resolves line items and
//! stock first and hands them in.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{BomLineItem, BomVersion, Product, VersionStatus};

/// Which line items count as the "current" BOM of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "version_id", rename_all = "snake_case")]
pub enum Scope {
    /// Only line items of this (active) version
    Versioned(Uuid),
    /// Every line item of the parent
    Unversioned,
}

impl Scope {
    /// Picks the active version of a parent, if any.
    ///
    /// When more than one version is marked active the most recently created
    /// one wins; equal timestamps fall back to the greater version number.
    pub fn resolve(versions: &[BomVersion]) -> Scope {
        versions
            .iter()
            .filter(|v| v.status == VersionStatus::Active)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.version_number.cmp(&b.version_number))
            })
            .map(|v| Scope::Versioned(v.id))
            .unwrap_or(Scope::Unversioned)
    }

    pub fn includes(&self, item: &BomLineItem) -> bool {
        match self {
            Scope::Versioned(version_id) => item.bom_version_id == Some(*version_id),
            Scope::Unversioned => true,
        }
    }

    pub fn version_id(&self) -> Option<Uuid> {
        match self {
            Scope::Versioned(id) => Some(*id),
            Scope::Unversioned => None,
        }
    }

    /// Keeps the line items that belong to this scope, preserving order.
    pub fn filter<'a>(&self, items: &'a [BomLineItem]) -> Vec<&'a BomLineItem> {
        items.iter().filter(|item| self.includes(item)).collect()
    }
}

/// Stock and cost of one component as seen by the calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStock {
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub stock: Decimal,
    pub unit_cost: Decimal,
    /// False for the placeholder of a component id with no product row
    pub found: bool,
}

impl ComponentStock {
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Placeholder for a component id with no matching product
    pub fn unknown(product_id: Uuid) -> Self {
        Self {
            product_id,
            name: Self::UNKNOWN_NAME.to_string(),
            sku: None,
            stock: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            found: false,
        }
    }
}

impl From<&Product> for ComponentStock {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            stock: product.stock,
            unit_cost: unit_cost(product.purchase_price, product.sale_price),
            found: true,
        }
    }
}

/// Component id -> stock snapshot.
#[derive(Debug, Clone, Default)]
pub struct StockMap(HashMap<Uuid, ComponentStock>);

impl StockMap {
    pub fn new(entries: HashMap<Uuid, ComponentStock>) -> Self {
        Self(entries)
    }

    /// Looks a component up, falling back to the unknown sentinel.
    pub fn get(&self, component_id: Uuid) -> ComponentStock {
        self.0
            .get(&component_id)
            .cloned()
            .unwrap_or_else(|| ComponentStock::unknown(component_id))
    }
}

/// Purchase price, else sale price, else zero.
pub fn unit_cost(purchase_price: Option<Decimal>, sale_price: Option<Decimal>) -> Decimal {
    purchase_price.or(sale_price).unwrap_or(Decimal::ZERO)
}

/// `quantity × (1 + scrap/100)`, saturating at `Decimal::MAX`
pub fn effective_quantity(quantity_required: Decimal, scrap_factor: Decimal) -> Decimal {
    if scrap_factor.is_zero() {
        return quantity_required;
    }
    let multiplier = Decimal::ONE.saturating_add(scrap_factor / Decimal::ONE_HUNDRED);
    quantity_required.saturating_mul(multiplier)
}

/// `unit_cost × effective_quantity`, saturating at `Decimal::MAX`
pub fn line_cost(unit_cost: Decimal, effective_qty: Decimal) -> Decimal {
    unit_cost.saturating_mul(effective_qty)
}

/// Sum saturating at `Decimal::MAX`
pub fn saturating_total<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

/// Whole parent units one component's stock can cover.
pub fn line_buildable(stock: Decimal, effective_qty: Decimal) -> u64 {
    if effective_qty <= Decimal::ZERO || stock <= Decimal::ZERO {
        return 0;
    }

    match stock.checked_div(effective_qty) {
        Some(ratio) => ratio.floor().to_u64().unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

/// Minimum over the per-line values; an empty BOM builds nothing.
pub fn overall_buildable<I>(per_line: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    per_line.into_iter().min().unwrap_or(0)
}

/// One line item joined with its component's stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLine {
    pub line_id: Uuid,
    pub component_product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub stock: Decimal,
    pub unit_cost: Decimal,
    pub quantity_required: Decimal,
    pub unit_of_measure: String,
    pub scrap_factor: Decimal,
    pub effective_quantity: Decimal,
    pub production_step: Option<String>,
    pub has_sub_assembly: bool,
    pub buildable_quantity: u64,
    /// `unit_cost × effective_quantity`
    pub line_cost: Decimal,
}

impl ComponentLine {
    pub fn compute(item: &BomLineItem, stock: &ComponentStock, has_sub_assembly: bool) -> Self {
        let effective = effective_quantity(item.quantity_required, item.scrap_factor);

        Self {
            line_id: item.id,
            component_product_id: item.component_product_id,
            name: stock.name.clone(),
            sku: stock.sku.clone(),
            stock: stock.stock,
            unit_cost: stock.unit_cost,
            quantity_required: item.quantity_required,
            unit_of_measure: item.unit_of_measure.clone(),
            scrap_factor: item.scrap_factor,
            effective_quantity: effective,
            production_step: item.production_step.clone(),
            has_sub_assembly,
            buildable_quantity: line_buildable(stock.stock, effective),
            line_cost: line_cost(stock.unit_cost, effective),
        }
    }
}

/// Buildable quantity and material cost for one set of line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub lines: Vec<ComponentLine>,
    pub buildable_quantity: u64,
    pub total_cost: Decimal,
}

/// Joins each in-scope line item with stock and reduces to availability.
pub fn compute_availability<'a, I, F>(items: I, stock: &StockMap, has_sub_assembly: F) -> Availability
where
    I: IntoIterator<Item = &'a BomLineItem>,
    F: Fn(Uuid) -> bool,
{
    let lines: Vec<ComponentLine> = items
        .into_iter()
        .map(|item| {
            let component = stock.get(item.component_product_id);
            ComponentLine::compute(item, &component, has_sub_assembly(item.component_product_id))
        })
        .collect();

    let buildable_quantity = overall_buildable(lines.iter().map(|l| l.buildable_quantity));
    let total_cost = saturating_total(lines.iter().map(|l| l.line_cost));

    Availability {
        lines,
        buildable_quantity,
        total_cost,
    }
}

/// Σ unit_cost × effective quantity over the given line items.
pub fn rollup_cost<'a, I>(items: I, stock: &StockMap) -> Decimal
where
    I: IntoIterator<Item = &'a BomLineItem>,
{
    saturating_total(items.into_iter().map(|item| {
        line_cost(
            stock.get(item.component_product_id).unit_cost,
            effective_quantity(item.quantity_required, item.scrap_factor),
        )
    }))
}
