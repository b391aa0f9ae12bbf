use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    ActiveBranch,
};
use crate::{
    errors::ApiError,
    models::{CostComponentInput, CostType, VersionStatus},
    services::bom::{BomListFilter, SaveVersionInput, UpdateLineInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Creates the router for BOM endpoints
pub fn bom_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_boms))
        .route("/candidates", get(list_candidates))
        .route("/bulk-delete", post(bulk_delete_boms))
        .route("/where-used/:component_id", get(where_used))
        .route("/versions/:version_id/activate", post(activate_version))
        .route("/versions/:version_id/archive", post(archive_version))
        .route("/versions/:version_id/cost", get(version_cost))
        .route(
            "/versions/:version_id/cost-components",
            get(list_cost_components).post(add_cost_component),
        )
        .route(
            "/cost-components/:id",
            put(update_cost_component).delete(delete_cost_component),
        )
        .route("/lines/:line_id", put(update_line_item))
        .route("/:parent_id", get(get_bom).delete(delete_bom))
        .route("/:parent_id/versions", post(save_version))
}

// Request DTOs

#[derive(Debug, Default, Deserialize)]
pub struct ListBomsQuery {
    pub search: Option<String>,
    /// `all`, `draft`, `active` or `archived`
    pub status: Option<String>,
}

impl ListBomsQuery {
    fn into_filter(self) -> Result<BomListFilter, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(VersionStatus::from_str(&raw.to_lowercase()).map_err(|_| {
                ApiError::BadRequest(format!("Unknown version status '{}'", raw))
            })?),
        };

        Ok(BomListFilter {
            search: self.search,
            status,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1))]
    pub parent_ids: Vec<Uuid>,
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Value cannot be negative".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CostComponentRequest {
    pub cost_type: CostType,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub rate_per_unit: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub quantity: Decimal,
}

impl From<CostComponentRequest> for CostComponentInput {
    fn from(request: CostComponentRequest) -> Self {
        Self {
            cost_type: request.cost_type,
            description: request.description,
            rate_per_unit: request.rate_per_unit,
            quantity: request.quantity,
        }
    }
}

// Handler functions

/// List BOMs of the active branch
async fn list_boms(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Query(query): Query<ListBomsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;

    let boms = state
        .services
        .bom
        .list_boms(branch_id, &filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(boms))
}

/// Products a new BOM can be created for
async fn list_candidates(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
) -> Result<impl IntoResponse, ApiError> {
    let candidates = state
        .services
        .bom
        .bom_candidates(branch_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(candidates))
}

/// Current BOM of one parent product
async fn get_bom(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(parent_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .bom
        .bom_summary(branch_id, parent_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

async fn delete_bom(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(parent_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deletion = state
        .services
        .bom
        .delete_bom(branch_id, parent_id)
        .await
        .map_err(map_service_error)?;

    match deletion {
        Some(deletion) => Ok(success_response(deletion)),
        None => Ok(no_content_response()),
    }
}

/// Delete several BOMs in order; partial failures come back in the report
async fn bulk_delete_boms(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let report = state
        .services
        .bom
        .bulk_delete(branch_id, &payload.parent_ids)
        .await
        .map_err(map_service_error)?;

    info!(
        deleted = report.deleted.len(),
        failed = report.failed.is_some(),
        "Bulk BOM delete requested"
    );

    Ok(success_response(report))
}

async fn where_used(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(component_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .bom
        .where_used(branch_id, component_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(rows))
}

/// Save a version with its full component list
async fn save_version(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(parent_id): Path<Uuid>,
    Json(payload): Json<SaveVersionInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let saved = state
        .services
        .bom
        .save_version(branch_id, parent_id, payload)
        .await
        .map_err(map_service_error)?;

    match saved {
        Some(saved) if saved.replaced => Ok(success_response(saved)),
        Some(saved) => Ok(created_response(saved)),
        None => Ok(no_content_response()),
    }
}

async fn activate_version(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(version_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .services
        .bom
        .activate_version(branch_id, version_id)
        .await
        .map_err(map_service_error)?;

    match version {
        Some(version) => Ok(success_response(version)),
        None => Ok(no_content_response()),
    }
}

async fn archive_version(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(version_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .services
        .bom
        .archive_version(branch_id, version_id)
        .await
        .map_err(map_service_error)?;

    match version {
        Some(version) => Ok(success_response(version)),
        None => Ok(no_content_response()),
    }
}

async fn version_cost(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(version_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let breakdown = state
        .services
        .bom
        .version_cost_breakdown(branch_id, version_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(breakdown))
}

async fn list_cost_components(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(version_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .services
        .bom
        .list_cost_components(branch_id, version_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(entries))
}

async fn add_cost_component(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(version_id): Path<Uuid>,
    Json(payload): Json<CostComponentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .bom
        .add_cost_component(branch_id, version_id, payload.into())
        .await
        .map_err(map_service_error)?;

    match created {
        Some(created) => Ok(created_response(created)),
        None => Ok(no_content_response()),
    }
}

async fn update_cost_component(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(id): Path<Uuid>,
    Json(payload): Json<CostComponentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .bom
        .update_cost_component(branch_id, id, payload.into())
        .await
        .map_err(map_service_error)?;

    match updated {
        Some(updated) => Ok(success_response(updated)),
        None => Ok(no_content_response()),
    }
}

async fn delete_cost_component(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .bom
        .delete_cost_component(branch_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Edit quantity or scrap factor of one line item
async fn update_line_item(
    State(state): State<AppState>,
    ActiveBranch(branch_id): ActiveBranch,
    Path(line_id): Path<Uuid>,
    Json(payload): Json<UpdateLineInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .bom
        .update_line_item(branch_id, line_id, payload)
        .await
        .map_err(map_service_error)?;

    match updated {
        Some(line) => Ok(success_response(line)),
        None => Ok(no_content_response()),
    }
}
