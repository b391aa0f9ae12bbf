//! Staged BOM deletion: line items, then the versions' cost entries, then
//! the versions themselves.
//!
//! The stages are independent writes with no shared transaction, so a failure
//! part way leaves the later rows behind. Bulk deletion runs the stages per
//! parent in order and stops at the first failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{active_branch, unique_ids, BomService};
use crate::errors::ServiceError;

/// Which stage of a BOM delete failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStage {
    LineItems,
    CostComponents,
    Versions,
}

impl fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteStage::LineItems => write!(f, "line_items"),
            DeleteStage::CostComponents => write!(f, "cost_components"),
            DeleteStage::Versions => write!(f, "versions"),
        }
    }
}

/// Rows removed for one parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomDeletion {
    pub parent_product_id: Uuid,
    pub line_items_deleted: u64,
    pub cost_components_deleted: u64,
    pub versions_deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub parent_product_id: Uuid,
    pub stage: DeleteStage,
    pub reason: String,
}

/// Outcome of a bulk delete.
///
/// `deleted` parents are gone, `failed` (if any) is the parent that stopped
/// the run, and `skipped` were never attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteReport {
    pub requested: usize,
    pub deleted: Vec<BomDeletion>,
    pub failed: Option<DeleteFailure>,
    pub skipped: Vec<Uuid>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && self.skipped.is_empty()
    }
}

struct StageError {
    stage: DeleteStage,
    source: ServiceError,
}

impl BomService {
    /// Deletes the BOM of one parent.
    ///
    /// Returns `Ok(None)` when no branch is active.
    #[instrument(skip(self))]
    pub async fn delete_bom(
        &self,
        branch_id: Option<Uuid>,
        parent_id: Uuid,
    ) -> Result<Option<BomDeletion>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };
        if parent_id.is_nil() {
            return Ok(None);
        }

        match self.delete_stages(branch_id, parent_id).await {
            Ok(deletion) => {
                info!(
                    %parent_id,
                    line_items = deletion.line_items_deleted,
                    cost_components = deletion.cost_components_deleted,
                    versions = deletion.versions_deleted,
                    "BOM deleted"
                );
                Ok(Some(deletion))
            }
            Err(StageError { stage, source }) => {
                error!(%parent_id, %stage, error = %source, "BOM delete failed");
                Err(source)
            }
        }
    }

    /// Deletes several BOMs one after another, stopping at the first failure.
    ///
    /// A partial failure is still `Ok`; the report says what happened.
    #[instrument(skip(self, parent_ids), fields(requested = parent_ids.len()))]
    pub async fn bulk_delete(
        &self,
        branch_id: Option<Uuid>,
        parent_ids: &[Uuid],
    ) -> Result<BulkDeleteReport, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(BulkDeleteReport::default());
        };

        let ids = unique_ids(parent_ids.iter().copied().filter(|id| !id.is_nil()));
        let mut report = BulkDeleteReport {
            requested: ids.len(),
            ..Default::default()
        };

        let mut remaining = ids.into_iter();
        while let Some(parent_id) = remaining.next() {
            match self.delete_stages(branch_id, parent_id).await {
                Ok(deletion) => report.deleted.push(deletion),
                Err(StageError { stage, source }) => {
                    error!(%parent_id, %stage, error = %source, "Bulk BOM delete stopped");
                    report.failed = Some(DeleteFailure {
                        parent_product_id: parent_id,
                        stage,
                        reason: source.response_message(),
                    });
                    report.skipped = remaining.collect();
                    break;
                }
            }
        }

        if report.is_complete() {
            info!(deleted = report.deleted.len(), "Bulk BOM delete finished");
        } else {
            warn!(
                deleted = report.deleted.len(),
                skipped = report.skipped.len(),
                "Bulk BOM delete finished with a failure"
            );
        }

        Ok(report)
    }

    async fn delete_stages(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<BomDeletion, StageError> {
        let line_items_deleted = self
            .components
            .delete_by_parent(branch_id, parent_id)
            .await
            .map_err(|source| StageError {
                stage: DeleteStage::LineItems,
                source,
            })?;

        let cost_components_deleted = self
            .delete_cost_entries(branch_id, parent_id)
            .await
            .map_err(|source| {
                warn!(
                    %parent_id,
                    line_items_deleted,
                    "Line items removed but cost entries and versions remain"
                );
                StageError {
                    stage: DeleteStage::CostComponents,
                    source,
                }
            })?;

        let versions_deleted = self
            .versions
            .delete_by_parent(branch_id, parent_id)
            .await
            .map_err(|source| {
                warn!(
                    %parent_id,
                    line_items_deleted,
                    cost_components_deleted,
                    "Line items and cost entries removed but versions remain"
                );
                StageError {
                    stage: DeleteStage::Versions,
                    source,
                }
            })?;

        Ok(BomDeletion {
            parent_product_id: parent_id,
            line_items_deleted,
            cost_components_deleted,
            versions_deleted,
        })
    }

    async fn delete_cost_entries(&self, branch_id: Uuid, parent_id: Uuid) -> Result<u64, ServiceError> {
        let version_ids: Vec<Uuid> = self
            .versions
            .find_by_parent(branch_id, parent_id)
            .await?
            .into_iter()
            .map(|version| version.id)
            .collect();

        self.cost_components
            .delete_by_versions(branch_id, &version_ids)
            .await
    }
}
