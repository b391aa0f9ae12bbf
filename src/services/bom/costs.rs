use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::calculator::{rollup_cost, saturating_total, Scope};
use super::{active_branch, unique_ids, BomService};
use crate::errors::ServiceError;
use crate::models::{BomCostComponent, CostComponentInput, CostType};

/// Full unit cost of one version.
///
/// `material` is the component rollup plus any manual material entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionCostBreakdown {
    pub version_id: Uuid,
    pub material_rollup: Decimal,
    pub material: Decimal,
    pub labor: Decimal,
    pub overhead: Decimal,
    pub subcontract: Decimal,
    pub total: Decimal,
    pub entries: Vec<BomCostComponent>,
}

/// Largest accepted rate per unit of a cost entry
const MAX_COST_RATE: i64 = 1_000_000_000_000;
/// Largest accepted quantity of a cost entry
const MAX_COST_QUANTITY: i64 = 1_000_000_000;

fn check_cost_input(input: &CostComponentInput) -> Result<(), ServiceError> {
    if input.rate_per_unit < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Rate per unit cannot be negative".to_string(),
        ));
    }
    if input.rate_per_unit > Decimal::from(MAX_COST_RATE) {
        return Err(ServiceError::ValidationError(format!(
            "Rate per unit cannot exceed {}",
            MAX_COST_RATE
        )));
    }
    if input.quantity < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Quantity cannot be negative".to_string(),
        ));
    }
    if input.quantity > Decimal::from(MAX_COST_QUANTITY) {
        return Err(ServiceError::ValidationError(format!(
            "Quantity cannot exceed {}",
            MAX_COST_QUANTITY
        )));
    }
    Ok(())
}

fn sum_of(entries: &[BomCostComponent], cost_type: CostType) -> Decimal {
    saturating_total(
        entries
            .iter()
            .filter(|entry| entry.cost_type == cost_type)
            .map(|entry| entry.total_cost),
    )
}

impl BomService {
    #[instrument(skip(self))]
    pub async fn list_cost_components(
        &self,
        branch_id: Option<Uuid>,
        version_id: Uuid,
    ) -> Result<Vec<BomCostComponent>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(Vec::new());
        };
        self.cost_components
            .find_by_version(branch_id, version_id)
            .await
    }

    /// Adds a cost entry to an existing version
    #[instrument(skip(self, input), fields(cost_type = %input.cost_type))]
    pub async fn add_cost_component(
        &self,
        branch_id: Option<Uuid>,
        version_id: Uuid,
        input: CostComponentInput,
    ) -> Result<Option<BomCostComponent>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };
        check_cost_input(&input)?;
        self.require_version(branch_id, version_id).await?;

        let created = self
            .cost_components
            .create(branch_id, version_id, input)
            .await?;
        info!(id = %created.id, total = %created.total_cost, "Cost component added");
        Ok(Some(created))
    }

    #[instrument(skip(self, input))]
    pub async fn update_cost_component(
        &self,
        branch_id: Option<Uuid>,
        id: Uuid,
        input: CostComponentInput,
    ) -> Result<Option<BomCostComponent>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };
        check_cost_input(&input)?;

        let updated = self.cost_components.update(branch_id, id, input).await?;
        info!(%id, total = %updated.total_cost, "Cost component updated");
        Ok(Some(updated))
    }

    /// Returns `false` when no branch is active
    #[instrument(skip(self))]
    pub async fn delete_cost_component(
        &self,
        branch_id: Option<Uuid>,
        id: Uuid,
    ) -> Result<bool, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(false);
        };
        self.cost_components.delete(branch_id, id).await?;
        info!(%id, "Cost component deleted");
        Ok(true)
    }

    /// Material rollup of the version's own line items plus its cost entries
    #[instrument(skip(self))]
    pub async fn version_cost_breakdown(
        &self,
        branch_id: Option<Uuid>,
        version_id: Uuid,
    ) -> Result<Option<VersionCostBreakdown>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };

        let version = self.require_version(branch_id, version_id).await?;
        let (items, entries) = tokio::try_join!(
            self.components
                .find_by_parent(branch_id, version.parent_product_id),
            self.cost_components.find_by_version(branch_id, version_id),
        )?;

        let in_version = Scope::Versioned(version.id).filter(&items);
        let component_ids = unique_ids(in_version.iter().map(|item| item.component_product_id));
        let stock = self.join_stock(Some(branch_id), &component_ids).await?;

        let material_rollup = rollup_cost(in_version, &stock);
        let material = material_rollup.saturating_add(sum_of(&entries, CostType::Material));
        let labor = sum_of(&entries, CostType::Labor);
        let overhead = sum_of(&entries, CostType::Overhead);
        let subcontract = sum_of(&entries, CostType::Subcontract);

        Ok(Some(VersionCostBreakdown {
            version_id,
            material_rollup,
            material,
            labor,
            overhead,
            subcontract,
            total: saturating_total([material, labor, overhead, subcontract]),
            entries,
        }))
    }
}
