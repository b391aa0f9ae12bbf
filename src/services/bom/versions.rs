use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{active_branch, BomService};
use crate::errors::ServiceError;
use crate::models::{BomLineItem, BomVersion, NewBomLineItem, NewBomVersion, VersionStatus};

/// Largest accepted quantity of one component per parent unit
const MAX_QUANTITY_REQUIRED: i64 = 1_000_000_000;
/// Largest accepted scrap factor, in percent
const MAX_SCRAP_FACTOR: i64 = 10_000;

fn range_error(message: String) -> ValidationError {
    let mut err = ValidationError::new("range");
    err.message = Some(message.into());
    err
}

fn validate_positive_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(range_error("Quantity must be greater than 0".to_string()));
    }
    if *value > Decimal::from(MAX_QUANTITY_REQUIRED) {
        return Err(range_error(format!(
            "Quantity cannot exceed {}",
            MAX_QUANTITY_REQUIRED
        )));
    }
    Ok(())
}

fn validate_scrap_factor(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(range_error("Scrap factor cannot be negative".to_string()));
    }
    if *value > Decimal::from(MAX_SCRAP_FACTOR) {
        return Err(range_error(format!(
            "Scrap factor cannot exceed {}%",
            MAX_SCRAP_FACTOR
        )));
    }
    Ok(())
}

fn default_unit() -> String {
    "pcs".to_string()
}

/// One component of a version being saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ComponentInput {
    pub component_product_id: Uuid,
    #[validate(custom = "validate_positive_quantity")]
    pub quantity_required: Decimal,
    #[serde(default = "default_unit")]
    #[validate(length(min = 1))]
    pub unit_of_measure: String,
    #[serde(default)]
    #[validate(custom = "validate_scrap_factor")]
    pub scrap_factor: Decimal,
    pub production_step: Option<String>,
}

/// Version number plus the full replacement component list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SaveVersionInput {
    #[validate(length(min = 1, max = 32))]
    pub version_number: String,
    pub components: Vec<ComponentInput>,
}

impl SaveVersionInput {
    fn check(&self, parent_id: Uuid) -> Result<(), ServiceError> {
        self.validate()?;
        if self.version_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Version number is required".to_string(),
            ));
        }
        if self.components.is_empty() {
            return Err(ServiceError::ValidationError(
                "Please add at least one component".to_string(),
            ));
        }
        for component in &self.components {
            component.validate()?;
            if component.component_product_id == parent_id {
                return Err(ServiceError::ValidationError(
                    "A product cannot be a component of itself".to_string(),
                ));
            }
            if component.component_product_id.is_nil() {
                return Err(ServiceError::ValidationError(
                    "Component product is required".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateLineInput {
    #[validate(custom = "validate_positive_quantity")]
    pub quantity_required: Decimal,
    #[validate(custom = "validate_scrap_factor")]
    pub scrap_factor: Option<Decimal>,
}

/// Result of saving a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVersion {
    pub version: BomVersion,
    pub line_items: Vec<BomLineItem>,
    /// True when an existing version number had its components replaced
    pub replaced: bool,
    pub archived_versions: u64,
}

impl BomService {
    /// Saves `input` as a version of `parent_id`.
    ///
    /// An existing version number keeps its status and gets its line items
    /// replaced. A new number is created `active` and every other version of
    /// the parent is archived.
    #[instrument(skip(self, input), fields(version_number = %input.version_number))]
    pub async fn save_version(
        &self,
        branch_id: Option<Uuid>,
        parent_id: Uuid,
        input: SaveVersionInput,
    ) -> Result<Option<SavedVersion>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };
        if parent_id.is_nil() {
            return Ok(None);
        }
        input.check(parent_id)?;

        let version_number = input.version_number.trim().to_string();
        let existing = self
            .versions
            .find_by_number(branch_id, parent_id, &version_number)
            .await?;

        let (version, replaced, archived_versions) = match existing {
            Some(version) => {
                let removed = self
                    .components
                    .delete_by_version(branch_id, version.id)
                    .await?;
                info!(version_id = %version.id, removed, "Replacing components of existing version");
                (version, true, 0)
            }
            None => {
                let version = self
                    .versions
                    .create(NewBomVersion {
                        branch_id,
                        parent_product_id: parent_id,
                        version_number,
                        status: VersionStatus::Active,
                    })
                    .await?;
                let archived = self
                    .versions
                    .archive_others(branch_id, parent_id, version.id)
                    .await?;
                (version, false, archived)
            }
        };

        let items = input
            .components
            .into_iter()
            .map(|component| NewBomLineItem {
                branch_id,
                parent_product_id: parent_id,
                component_product_id: component.component_product_id,
                quantity_required: component.quantity_required,
                unit_of_measure: component.unit_of_measure,
                scrap_factor: component.scrap_factor,
                production_step: component.production_step,
                bom_version_id: Some(version.id),
            })
            .collect();
        let line_items = self.components.insert_many(items).await?;

        info!(
            version_id = %version.id,
            components = line_items.len(),
            archived_versions,
            "BOM version saved"
        );

        Ok(Some(SavedVersion {
            version,
            line_items,
            replaced,
            archived_versions,
        }))
    }

    /// Makes `version_id` the active version and archives any other active one.
    #[instrument(skip(self))]
    pub async fn activate_version(
        &self,
        branch_id: Option<Uuid>,
        version_id: Uuid,
    ) -> Result<Option<BomVersion>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };

        let version = self.require_version(branch_id, version_id).await?;
        let siblings = self
            .versions
            .find_by_parent(branch_id, version.parent_product_id)
            .await?;

        for sibling in siblings
            .iter()
            .filter(|v| v.id != version.id && v.status == VersionStatus::Active)
        {
            self.versions
                .set_status(branch_id, sibling.id, VersionStatus::Archived)
                .await?;
            info!(archived = %sibling.id, "Archived previously active version");
        }

        let activated = self
            .versions
            .set_status(branch_id, version.id, VersionStatus::Active)
            .await?;
        info!(%version_id, "BOM version activated");
        Ok(Some(activated))
    }

    #[instrument(skip(self))]
    pub async fn archive_version(
        &self,
        branch_id: Option<Uuid>,
        version_id: Uuid,
    ) -> Result<Option<BomVersion>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };

        let version = self.require_version(branch_id, version_id).await?;
        if version.status == VersionStatus::Active {
            warn!(%version_id, "Archiving the active version; BOM falls back to all line items");
        }

        let archived = self
            .versions
            .set_status(branch_id, version_id, VersionStatus::Archived)
            .await?;
        info!(%version_id, "BOM version archived");
        Ok(Some(archived))
    }

    /// Updates quantity and optionally scrap factor of one line item
    #[instrument(skip(self, input))]
    pub async fn update_line_item(
        &self,
        branch_id: Option<Uuid>,
        line_id: Uuid,
        input: UpdateLineInput,
    ) -> Result<Option<BomLineItem>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };
        input.validate()?;

        if self.components.find_by_id(branch_id, line_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "BOM line item {} not found",
                line_id
            )));
        }

        let updated = self
            .components
            .update_quantity(branch_id, line_id, input.quantity_required, input.scrap_factor)
            .await?;
        info!(%line_id, quantity = %updated.quantity_required, "BOM line item updated");
        Ok(Some(updated))
    }

    pub(crate) async fn require_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<BomVersion, ServiceError> {
        self.versions
            .find_by_id(branch_id, version_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("BOM version {} not found", version_id)))
    }
}
