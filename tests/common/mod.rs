//! In-memory repositories and fixtures shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DbErr;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use stockflow_bom::{
    errors::ServiceError,
    models::{
        BomCostComponent, BomLineItem, BomVersion, CostComponentInput, NewBomLineItem,
        NewBomVersion, Product, VersionStatus,
    },
    repositories::{
        ComponentRepository, CostComponentRepository, ProductRepository, VersionRepository,
    },
    services::BomService,
};

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    lines: Vec<BomLineItem>,
    versions: Vec<BomVersion>,
    cost_components: Vec<BomCostComponent>,
}

/// One store backing every repository trait, with failure switches.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_line_deletes: Mutex<HashSet<Uuid>>,
    fail_version_deletes: Mutex<HashSet<Uuid>>,
    fail_cost_deletes: Mutex<HashSet<Uuid>>,
}

fn storage_error(what: &str) -> ServiceError {
    ServiceError::db_error(DbErr::Custom(format!("connection reset while {}", what)))
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn service(self: &Arc<Self>) -> BomService {
        BomService::new(self.clone(), self.clone(), self.clone(), self.clone())
    }

    pub fn add_product(
        &self,
        branch_id: Uuid,
        name: &str,
        stock: Decimal,
        purchase_price: Option<Decimal>,
        sale_price: Option<Decimal>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().products.push(Product {
            id,
            branch_id,
            name: name.to_string(),
            sku: Some(format!("SKU-{}", name.to_uppercase())),
            stock,
            purchase_price,
            sale_price,
            is_variant: false,
        });
        id
    }

    pub fn mark_variant(&self, product_id: Uuid) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(product) = tables.products.iter_mut().find(|p| p.id == product_id) {
            product.is_variant = true;
        }
    }

    pub fn add_line(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        component_id: Uuid,
        quantity: Decimal,
        scrap: Decimal,
        version_id: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().lines.push(BomLineItem {
            id,
            branch_id,
            parent_product_id: parent_id,
            component_product_id: component_id,
            quantity_required: quantity,
            unit_of_measure: "pcs".to_string(),
            scrap_factor: scrap,
            production_step: None,
            bom_version_id: version_id,
        });
        id
    }

    pub fn add_version(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        number: &str,
        status: VersionStatus,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().versions.push(BomVersion {
            id,
            branch_id,
            parent_product_id: parent_id,
            version_number: number.to_string(),
            status,
            created_at,
        });
        id
    }

    pub fn version(&self, id: Uuid) -> Option<BomVersion> {
        self.tables
            .lock()
            .unwrap()
            .versions
            .iter()
            .find(|v| v.id == id)
            .cloned()
    }

    pub fn lines_of(&self, parent_id: Uuid) -> Vec<BomLineItem> {
        self.tables
            .lock()
            .unwrap()
            .lines
            .iter()
            .filter(|l| l.parent_product_id == parent_id)
            .cloned()
            .collect()
    }

    pub fn versions_of(&self, parent_id: Uuid) -> Vec<BomVersion> {
        self.tables
            .lock()
            .unwrap()
            .versions
            .iter()
            .filter(|v| v.parent_product_id == parent_id)
            .cloned()
            .collect()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_line_delete_for(&self, parent_id: Uuid) {
        self.fail_line_deletes.lock().unwrap().insert(parent_id);
    }

    pub fn fail_version_delete_for(&self, parent_id: Uuid) {
        self.fail_version_deletes.lock().unwrap().insert(parent_id);
    }

    pub fn fail_cost_delete_for(&self, parent_id: Uuid) {
        self.fail_cost_deletes.lock().unwrap().insert(parent_id);
    }

    pub fn cost_components_of(&self, version_id: Uuid) -> Vec<BomCostComponent> {
        self.tables
            .lock()
            .unwrap()
            .cost_components
            .iter()
            .filter(|c| c.bom_version_id == version_id)
            .cloned()
            .collect()
    }

    fn check_reads(&self) -> Result<(), ServiceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(storage_error("reading"))
        } else {
            Ok(())
        }
    }
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

#[async_trait]
impl ComponentRepository for InMemoryStore {
    async fn find_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .lines
            .iter()
            .filter(|l| l.branch_id == branch_id && l.parent_product_id == parent_id)
            .cloned()
            .collect())
    }

    async fn find_by_component(
        &self,
        branch_id: Uuid,
        component_id: Uuid,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .lines
            .iter()
            .filter(|l| l.branch_id == branch_id && l.component_product_id == component_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        branch_id: Uuid,
        line_id: Uuid,
    ) -> Result<Option<BomLineItem>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .lines
            .iter()
            .find(|l| l.branch_id == branch_id && l.id == line_id)
            .cloned())
    }

    async fn parent_ids(&self, branch_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let mut seen = HashSet::new();
        Ok(tables
            .lines
            .iter()
            .filter(|l| l.branch_id == branch_id)
            .map(|l| l.parent_product_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }

    async fn parents_among(
        &self,
        branch_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .lines
            .iter()
            .filter(|l| l.branch_id == branch_id && product_ids.contains(&l.parent_product_id))
            .map(|l| l.parent_product_id)
            .collect())
    }

    async fn insert_many(
        &self,
        items: Vec<NewBomLineItem>,
    ) -> Result<Vec<BomLineItem>, ServiceError> {
        let created: Vec<BomLineItem> = items
            .into_iter()
            .map(|item| BomLineItem {
                id: Uuid::new_v4(),
                branch_id: item.branch_id,
                parent_product_id: item.parent_product_id,
                component_product_id: item.component_product_id,
                quantity_required: item.quantity_required,
                unit_of_measure: item.unit_of_measure,
                scrap_factor: item.scrap_factor,
                production_step: item.production_step,
                bom_version_id: item.bom_version_id,
            })
            .collect();
        self.tables
            .lock()
            .unwrap()
            .lines
            .extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_quantity(
        &self,
        branch_id: Uuid,
        line_id: Uuid,
        quantity_required: Decimal,
        scrap_factor: Option<Decimal>,
    ) -> Result<BomLineItem, ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let line = tables
            .lines
            .iter_mut()
            .find(|l| l.branch_id == branch_id && l.id == line_id)
            .ok_or_else(|| ServiceError::NotFound(format!("line {}", line_id)))?;
        line.quantity_required = quantity_required;
        if let Some(scrap) = scrap_factor {
            line.scrap_factor = scrap;
        }
        Ok(line.clone())
    }

    async fn delete_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<u64, ServiceError> {
        if self.fail_line_deletes.lock().unwrap().contains(&parent_id) {
            return Err(storage_error("deleting line items"));
        }
        let mut tables = self.tables.lock().unwrap();
        let before = tables.lines.len();
        tables
            .lines
            .retain(|l| !(l.branch_id == branch_id && l.parent_product_id == parent_id));
        Ok((before - tables.lines.len()) as u64)
    }

    async fn delete_by_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.lines.len();
        tables
            .lines
            .retain(|l| !(l.branch_id == branch_id && l.bom_version_id == Some(version_id)));
        Ok((before - tables.lines.len()) as u64)
    }
}

#[async_trait]
impl VersionRepository for InMemoryStore {
    async fn find_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<Vec<BomVersion>, ServiceError> {
        self.check_reads()?;
        let mut versions: Vec<BomVersion> = self
            .tables
            .lock()
            .unwrap()
            .versions
            .iter()
            .filter(|v| v.branch_id == branch_id && v.parent_product_id == parent_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn find_by_id(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<BomVersion>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .versions
            .iter()
            .find(|v| v.branch_id == branch_id && v.id == version_id)
            .cloned())
    }

    async fn find_by_number(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        version_number: &str,
    ) -> Result<Option<BomVersion>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .versions
            .iter()
            .find(|v| {
                v.branch_id == branch_id
                    && v.parent_product_id == parent_id
                    && v.version_number == version_number
            })
            .cloned())
    }

    async fn parent_ids(&self, branch_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        self.check_reads()?;
        let tables = self.tables.lock().unwrap();
        let mut seen = HashSet::new();
        Ok(tables
            .versions
            .iter()
            .filter(|v| v.branch_id == branch_id)
            .map(|v| v.parent_product_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }

    async fn create(&self, version: NewBomVersion) -> Result<BomVersion, ServiceError> {
        let created = BomVersion {
            id: Uuid::new_v4(),
            branch_id: version.branch_id,
            parent_product_id: version.parent_product_id,
            version_number: version.version_number,
            status: version.status,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().versions.push(created.clone());
        Ok(created)
    }

    async fn set_status(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
        status: VersionStatus,
    ) -> Result<BomVersion, ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let version = tables
            .versions
            .iter_mut()
            .find(|v| v.branch_id == branch_id && v.id == version_id)
            .ok_or_else(|| ServiceError::NotFound(format!("BOM version {} not found", version_id)))?;
        version.status = status;
        Ok(version.clone())
    }

    async fn archive_others(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
        keep_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let mut archived = 0;
        for version in tables.versions.iter_mut().filter(|v| {
            v.branch_id == branch_id
                && v.parent_product_id == parent_id
                && v.id != keep_id
                && v.status != VersionStatus::Archived
        }) {
            version.status = VersionStatus::Archived;
            archived += 1;
        }
        Ok(archived)
    }

    async fn delete_by_parent(
        &self,
        branch_id: Uuid,
        parent_id: Uuid,
    ) -> Result<u64, ServiceError> {
        if self.fail_version_deletes.lock().unwrap().contains(&parent_id) {
            return Err(storage_error("deleting versions"));
        }
        let mut tables = self.tables.lock().unwrap();
        let before = tables.versions.len();
        tables
            .versions
            .retain(|v| !(v.branch_id == branch_id && v.parent_product_id == parent_id));
        Ok((before - tables.versions.len()) as u64)
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn find_by_ids(
        &self,
        branch_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .filter(|p| p.branch_id == branch_id && ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_non_variants(&self, branch_id: Uuid) -> Result<Vec<Product>, ServiceError> {
        self.check_reads()?;
        let mut products: Vec<Product> = self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .filter(|p| p.branch_id == branch_id && !p.is_variant)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

#[async_trait]
impl CostComponentRepository for InMemoryStore {
    async fn find_by_version(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
    ) -> Result<Vec<BomCostComponent>, ServiceError> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .cost_components
            .iter()
            .filter(|c| c.branch_id == branch_id && c.bom_version_id == version_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        branch_id: Uuid,
        version_id: Uuid,
        input: CostComponentInput,
    ) -> Result<BomCostComponent, ServiceError> {
        let created = BomCostComponent {
            id: Uuid::new_v4(),
            branch_id,
            bom_version_id: version_id,
            cost_type: input.cost_type,
            description: input.description,
            rate_per_unit: input.rate_per_unit,
            quantity: input.quantity,
            total_cost: input.rate_per_unit * input.quantity,
            created_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .cost_components
            .push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        branch_id: Uuid,
        id: Uuid,
        input: CostComponentInput,
    ) -> Result<BomCostComponent, ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .cost_components
            .iter_mut()
            .find(|c| c.branch_id == branch_id && c.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cost component {} not found", id)))?;
        entry.cost_type = input.cost_type;
        entry.description = input.description;
        entry.rate_per_unit = input.rate_per_unit;
        entry.quantity = input.quantity;
        entry.total_cost = input.rate_per_unit * input.quantity;
        Ok(entry.clone())
    }

    async fn delete(&self, branch_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.cost_components.len();
        tables
            .cost_components
            .retain(|c| !(c.branch_id == branch_id && c.id == id));
        if tables.cost_components.len() == before {
            return Err(ServiceError::NotFound(format!(
                "Cost component {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn delete_by_versions(
        &self,
        branch_id: Uuid,
        version_ids: &[Uuid],
    ) -> Result<u64, ServiceError> {
        let failing = self.fail_cost_deletes.lock().unwrap().clone();
        let mut tables = self.tables.lock().unwrap();
        let blocked = tables
            .versions
            .iter()
            .any(|v| version_ids.contains(&v.id) && failing.contains(&v.parent_product_id));
        if blocked {
            return Err(storage_error("deleting cost components"));
        }

        let before = tables.cost_components.len();
        tables
            .cost_components
            .retain(|c| !(c.branch_id == branch_id && version_ids.contains(&c.bom_version_id)));
        Ok((before - tables.cost_components.len()) as u64)
    }
}
