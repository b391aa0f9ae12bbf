//! Bill of Materials service: resolves the current BOM of a parent product,
//! joins component stock, and derives buildable quantity, cost and
//! where-used reports.
//!
//! Every operation takes the active branch as `Option<Uuid>`. Without a
//! branch, reads return empty results and writes do nothing.

pub mod calculator;
pub mod costs;
pub mod deletion;
pub mod versions;
pub mod where_used;

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{BomLineItem, BomVersion, Product, VersionStatus};
use crate::repositories::{
    ComponentRepository, CostComponentRepository, ProductRepository, SeaOrmComponentRepository,
    SeaOrmCostComponentRepository, SeaOrmProductRepository, SeaOrmVersionRepository,
    VersionRepository,
};

pub use calculator::{
    compute_availability, effective_quantity, line_buildable, line_cost, overall_buildable,
    rollup_cost, saturating_total, unit_cost, Availability, ComponentLine, ComponentStock, Scope,
    StockMap,
};
pub use costs::VersionCostBreakdown;
pub use deletion::{BomDeletion, BulkDeleteReport, DeleteFailure, DeleteStage};
pub use versions::{ComponentInput, SaveVersionInput, SavedVersion, UpdateLineInput};
pub use where_used::WhereUsedRow;

/// Version history entry with its own material cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub version_number: String,
    pub status: VersionStatus,
    pub created_at: DateTime<Utc>,
    pub component_count: usize,
    /// Current unit costs applied to this version's line items
    pub total_cost: Decimal,
}

impl VersionSummary {
    fn compute(version: &BomVersion, items: &[BomLineItem], stock: &StockMap) -> Self {
        let version_items = Scope::Versioned(version.id).filter(items);

        Self {
            id: version.id,
            version_number: version.version_number.clone(),
            status: version.status,
            created_at: version.created_at,
            component_count: version_items.len(),
            total_cost: rollup_cost(version_items, stock),
        }
    }
}

/// Current BOM of one parent product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomSummary {
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub scope: Scope,
    pub component_count: usize,
    pub buildable_quantity: u64,
    pub total_estimated_cost: Decimal,
    pub components: Vec<ComponentLine>,
    pub versions: Vec<VersionSummary>,
}

impl BomSummary {
    pub fn has_version_status(&self, status: VersionStatus) -> bool {
        self.versions.iter().any(|v| v.status == status)
    }
}

/// Narrows the BOM list
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BomListFilter {
    /// Case-insensitive match on product name or SKU
    pub search: Option<String>,
    /// Keep BOMs with at least one version in this status
    pub status: Option<VersionStatus>,
}

impl BomListFilter {
    pub fn matches(&self, summary: &BomSummary) -> bool {
        if let Some(search) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let needle = search.to_lowercase();
            let name_hit = summary.name.to_lowercase().contains(&needle);
            let sku_hit = summary
                .sku
                .as_deref()
                .map(|sku| sku.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !name_hit && !sku_hit {
                return false;
            }
        }

        match self.status {
            Some(status) => summary.has_version_status(status),
            None => true,
        }
    }
}

/// Treats a missing or nil branch as "no active branch".
pub(crate) fn active_branch(branch_id: Option<Uuid>) -> Option<Uuid> {
    branch_id.filter(|id| !id.is_nil())
}

fn unique_ids<I: IntoIterator<Item = Uuid>>(ids: I) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// A product a new BOM can be created for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomCandidate {
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    /// Already has line items or versions
    pub has_bom: bool,
}

/// Parents summarized at once by `list_boms` unless configured otherwise
pub const DEFAULT_SUMMARY_CONCURRENCY: usize = 4;

/// Bill of Materials service over the narrow repository traits
#[derive(Clone)]
pub struct BomService {
    components: Arc<dyn ComponentRepository>,
    versions: Arc<dyn VersionRepository>,
    products: Arc<dyn ProductRepository>,
    cost_components: Arc<dyn CostComponentRepository>,
    summary_concurrency: usize,
}

impl BomService {
    pub fn new(
        components: Arc<dyn ComponentRepository>,
        versions: Arc<dyn VersionRepository>,
        products: Arc<dyn ProductRepository>,
        cost_components: Arc<dyn CostComponentRepository>,
    ) -> Self {
        Self {
            components,
            versions,
            products,
            cost_components,
            summary_concurrency: DEFAULT_SUMMARY_CONCURRENCY,
        }
    }

    /// Caps how many parent summaries `list_boms` computes concurrently
    pub fn with_summary_concurrency(mut self, limit: usize) -> Self {
        self.summary_concurrency = limit.max(1);
        self
    }

    /// Wires the sea-orm repositories over one connection pool
    pub fn from_db(db: Arc<DatabaseConnection>) -> Self {
        Self::new(
            Arc::new(SeaOrmComponentRepository::new(db.clone())),
            Arc::new(SeaOrmVersionRepository::new(db.clone())),
            Arc::new(SeaOrmProductRepository::new(db.clone())),
            Arc::new(SeaOrmCostComponentRepository::new(db)),
        )
    }

    /// Line items that make up the current BOM of `parent_id`.
    ///
    /// With an active version only its line items are returned, otherwise
    /// every line item of the parent.
    #[instrument(skip(self))]
    pub async fn resolve_components(
        &self,
        branch_id: Option<Uuid>,
        parent_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(Vec::new());
        };
        if parent_id.is_nil() {
            return Ok(Vec::new());
        }

        let (versions, items) = tokio::try_join!(
            self.versions.find_by_parent(branch_id, parent_id),
            self.components.find_by_parent(branch_id, parent_id),
        )?;

        let scope = self.resolve_scope(parent_id, &versions);
        Ok(items.into_iter().filter(|item| scope.includes(item)).collect())
    }

    /// Stock and unit cost for each distinct component id.
    ///
    /// Ids without a product row are absent from the map and resolve to the
    /// "Unknown" sentinel on lookup.
    #[instrument(skip(self, component_ids), fields(count = component_ids.len()))]
    pub async fn join_stock(
        &self,
        branch_id: Option<Uuid>,
        component_ids: &[Uuid],
    ) -> Result<StockMap, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(StockMap::default());
        };

        let ids = unique_ids(component_ids.iter().copied());
        if ids.is_empty() {
            return Ok(StockMap::default());
        }

        let products = self.products.find_by_ids(branch_id, &ids).await?;
        let found: HashMap<Uuid, ComponentStock> = products
            .iter()
            .map(|product| (product.id, ComponentStock::from(product)))
            .collect();

        let missing = ids.iter().filter(|id| !found.contains_key(id)).count();
        if missing > 0 {
            debug!(missing, "BOM references components with no product row");
        }

        Ok(StockMap::new(found))
    }

    /// Whole units of `parent_id` buildable from current component stock
    #[instrument(skip(self))]
    pub async fn buildable_quantity(
        &self,
        branch_id: Option<Uuid>,
        parent_id: Uuid,
    ) -> Result<u64, ServiceError> {
        Ok(self
            .bom_summary(branch_id, parent_id)
            .await?
            .map(|summary| summary.buildable_quantity)
            .unwrap_or(0))
    }

    /// Full current BOM of one parent, or `None` without an active branch
    #[instrument(skip(self))]
    pub async fn bom_summary(
        &self,
        branch_id: Option<Uuid>,
        parent_id: Uuid,
    ) -> Result<Option<BomSummary>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(None);
        };
        if parent_id.is_nil() {
            return Ok(None);
        }

        let parent = self
            .products
            .find_by_ids(branch_id, &[parent_id])
            .await?
            .into_iter()
            .next();

        self.summarize(branch_id, parent_id, parent.as_ref())
            .await
            .map(Some)
    }

    /// Every BOM in the branch: parents with line items or with versions
    #[instrument(skip(self))]
    pub async fn list_boms(
        &self,
        branch_id: Option<Uuid>,
        filter: &BomListFilter,
    ) -> Result<Vec<BomSummary>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(Vec::new());
        };

        let (with_lines, with_versions) = tokio::try_join!(
            self.components.parent_ids(branch_id),
            self.versions.parent_ids(branch_id),
        )?;
        let parent_ids = unique_ids(with_lines.into_iter().chain(with_versions));
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let parents: HashMap<Uuid, Product> = self
            .products
            .find_by_ids(branch_id, &parent_ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let mut summaries: Vec<BomSummary> = stream::iter(parent_ids.iter().copied())
            .map(|id| self.summarize(branch_id, id, parents.get(&id)))
            .buffer_unordered(self.summary_concurrency)
            .try_collect()
            .await?;

        summaries.retain(|summary| filter.matches(summary));
        summaries.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        debug!(count = summaries.len(), "BOM list built");
        Ok(summaries)
    }

    /// Non-variant products of the branch, by name, flagged when they
    /// already carry a BOM
    #[instrument(skip(self))]
    pub async fn bom_candidates(
        &self,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<BomCandidate>, ServiceError> {
        let Some(branch_id) = active_branch(branch_id) else {
            return Ok(Vec::new());
        };

        let (products, with_lines, with_versions) = tokio::try_join!(
            self.products.find_non_variants(branch_id),
            self.components.parent_ids(branch_id),
            self.versions.parent_ids(branch_id),
        )?;
        let existing: HashSet<Uuid> = with_lines.into_iter().chain(with_versions).collect();

        Ok(products
            .into_iter()
            .map(|product| BomCandidate {
                has_bom: existing.contains(&product.id),
                product_id: product.id,
                name: product.name,
                sku: product.sku,
            })
            .collect())
    }

    pub(crate) fn resolve_scope(&self, parent_id: Uuid, versions: &[BomVersion]) -> Scope {
        let active = versions
            .iter()
            .filter(|v| v.status == VersionStatus::Active)
            .count();
        let scope = Scope::resolve(versions);

        if active > 1 {
            warn!(
                %parent_id,
                active,
                chosen = ?scope.version_id(),
                "Multiple active BOM versions; using the most recently created"
            );
        }

        scope
    }

    pub(crate) async fn summarize(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        parent: Option<&Product>,
    ) -> Result<BomSummary, ServiceError> {
        let (versions, items) = tokio::try_join!(
            self.versions.find_by_parent(branch_id, parent_id),
            self.components.find_by_parent(branch_id, parent_id),
        )?;

        let scope = self.resolve_scope(parent_id, &versions);

        // Every version's items share one stock snapshot
        let component_ids = unique_ids(items.iter().map(|item| item.component_product_id));
        let stock = self.join_stock(Some(branch_id), &component_ids).await?;
        let sub_assemblies = self
            .components
            .parents_among(branch_id, &component_ids)
            .await?;

        let availability = compute_availability(scope.filter(&items), &stock, |id| {
            sub_assemblies.contains(&id)
        });

        let versions = versions
            .iter()
            .map(|version| VersionSummary::compute(version, &items, &stock))
            .collect();

        let (name, sku) = match parent {
            Some(product) => (product.name.clone(), product.sku.clone()),
            None => (ComponentStock::UNKNOWN_NAME.to_string(), None),
        };

        Ok(BomSummary {
            product_id: parent_id,
            name,
            sku,
            scope,
            component_count: availability.lines.len(),
            buildable_quantity: availability.buildable_quantity,
            total_estimated_cost: availability.total_cost,
            components: availability.lines,
            versions,
        })
    }
}
