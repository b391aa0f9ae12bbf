use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

use super::calculator::{effective_quantity, ComponentStock};
use super::{active_branch, unique_ids, BomService, BomSummary};
use crate::errors::ServiceError;
use crate::models::{BomLineItem, Product};

/// One parent product that consumes a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereUsedRow {
    pub parent_product_id: Uuid,
    pub parent_name: String,
    pub parent_sku: Option<String>,
    pub line_id: Uuid,
    pub version_id: Option<Uuid>,
    /// Scrap-adjusted quantity per parent unit
    pub quantity_required: Decimal,
    pub unit_of_measure: String,
    /// False when the only referencing line sits outside the parent's current scope
    pub in_current_scope: bool,
    pub parent_buildable_quantity: u64,
}

impl BomService {
    /// Every parent whose BOM references `component_id`.
    #[instrument(skip(self))]
    pub async fn where_used(
        &self,
        branch_id: Option<Uuid>,
        component_id: Uuid,
    ) -> Result<Vec<WhereUsedRow>, ServiceError> {
        self.where_used_with(branch_id, component_id, &[]).await
    }

    /// Same as [`BomService::where_used`], reading parent buildable quantities
    /// from `known` summaries before recomputing.
    #[instrument(skip(self, known), fields(known = known.len()))]
    pub async fn where_used_with(
        &self,
        branch_id: Option<Uuid>,
        component_id: Uuid,
        known: &[BomSummary],
    ) -> Result<Vec<WhereUsedRow>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(Vec::new());
        };
        if component_id.is_nil() {
            return Ok(Vec::new());
        }

        let lines = self
            .components
            .find_by_component(branch_id, component_id)
            .await?;
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        // Parents in first-seen order, each with all its referencing lines
        let parent_ids = unique_ids(lines.iter().map(|line| line.parent_product_id));
        let mut by_parent: HashMap<Uuid, Vec<&BomLineItem>> = HashMap::new();
        for line in &lines {
            by_parent.entry(line.parent_product_id).or_default().push(line);
        }

        let parents: HashMap<Uuid, Product> = self
            .products
            .find_by_ids(branch_id, &parent_ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();
        let known: HashMap<Uuid, u64> = known
            .iter()
            .map(|summary| (summary.product_id, summary.buildable_quantity))
            .collect();

        let mut rows = Vec::with_capacity(parent_ids.len());
        for parent_id in parent_ids {
            let versions = self.versions.find_by_parent(branch_id, parent_id).await?;
            let scope = self.resolve_scope(parent_id, &versions);

            let candidates = by_parent.get(&parent_id).map(Vec::as_slice).unwrap_or(&[]);
            let (line, in_current_scope) =
                match candidates.iter().find(|line| scope.includes(line)) {
                    Some(line) => (*line, true),
                    None => match candidates.first() {
                        Some(line) => (*line, false),
                        None => continue,
                    },
                };

            let parent_buildable_quantity = match known.get(&parent_id) {
                Some(buildable) => *buildable,
                None => {
                    self.summarize(branch_id, parent_id, parents.get(&parent_id))
                        .await?
                        .buildable_quantity
                }
            };

            let (parent_name, parent_sku) = match parents.get(&parent_id) {
                Some(parent) => (parent.name.clone(), parent.sku.clone()),
                None => (ComponentStock::UNKNOWN_NAME.to_string(), None),
            };

            rows.push(WhereUsedRow {
                parent_product_id: parent_id,
                parent_name,
                parent_sku,
                line_id: line.id,
                version_id: line.bom_version_id,
                quantity_required: effective_quantity(line.quantity_required, line.scrap_factor),
                unit_of_measure: line.unit_of_measure.clone(),
                in_current_scope,
                parent_buildable_quantity,
            });
        }

        info!(%component_id, parents = rows.len(), "Where-used report built");
        Ok(rows)
    }
}
