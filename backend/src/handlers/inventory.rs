//! HTTP handlers for inventory records and their adjustment ledger

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use shared::{AdjustmentEntry, LedgerCheck, PaginatedResponse};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AdjustmentResult, ApplyAdjustmentInput, InventoryListQuery, InventoryView,
    ProvisionInventoryInput, ReversalResult, UpdateAdjustmentInput, UpdateInventoryInput,
};
use crate::services::InventoryService;
use crate::AppState;

/// Provision a product into a warehouse
pub async fn provision_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ProvisionInventoryInput>,
) -> AppResult<impl IntoResponse> {
    current_user.0.require("inventory", "write")?;
    let service = InventoryService::new(state.db);
    let record = service
        .provision(current_user.0.tenant_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<InventoryListQuery>,
) -> AppResult<Json<PaginatedResponse<InventoryView>>> {
    let service = InventoryService::new(state.db);
    let records = service.list(current_user.0.tenant_id, query).await?;
    Ok(Json(records))
}

pub async fn get_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<InventoryView>> {
    let service = InventoryService::new(state.db);
    let record = service.get(current_user.0.tenant_id, inventory_id).await?;
    Ok(Json(record))
}

/// Update thresholds or status of a record
pub async fn update_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
    Json(input): Json<UpdateInventoryInput>,
) -> AppResult<Json<InventoryView>> {
    current_user.0.require("inventory", "write")?;
    let service = InventoryService::new(state.db);
    let record = service
        .update(current_user.0.tenant_id, inventory_id, input)
        .await?;
    Ok(Json(record))
}

/// Compare a record's stored quantity with its ledger
pub async fn verify_ledger(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<LedgerCheck>> {
    let service = InventoryService::new(state.db);
    let check = service
        .verify_ledger(current_user.0.tenant_id, inventory_id)
        .await?;
    Ok(Json(check))
}

pub async fn list_adjustments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<Json<Vec<AdjustmentEntry>>> {
    let service = InventoryService::new(state.db);
    let entries = service
        .list_adjustments(current_user.0.tenant_id, inventory_id)
        .await?;
    Ok(Json(entries))
}

/// Record an adjustment against a record
pub async fn apply_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
    Json(input): Json<ApplyAdjustmentInput>,
) -> AppResult<impl IntoResponse> {
    current_user.0.require("inventory", "adjust")?;
    let service = InventoryService::new(state.db);
    let result: AdjustmentResult = service
        .apply_adjustment(
            current_user.0.tenant_id,
            current_user.0.user_id,
            inventory_id,
            input,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Download a record's ledger as CSV
pub async fn export_adjustments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(inventory_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = InventoryService::new(state.db);
    let csv = service
        .export_adjustments_csv(current_user.0.tenant_id, inventory_id)
        .await?;
    let disposition = format!("attachment; filename=\"inventory_{}_ledger.csv\"", inventory_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

pub async fn get_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((inventory_id, adjustment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<AdjustmentEntry>> {
    let service = InventoryService::new(state.db);
    let entry = service
        .get_adjustment(current_user.0.tenant_id, inventory_id, adjustment_id)
        .await?;
    Ok(Json(entry))
}

/// Edit the metadata of an adjustment
pub async fn update_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((inventory_id, adjustment_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateAdjustmentInput>,
) -> AppResult<Json<AdjustmentEntry>> {
    current_user.0.require("inventory", "adjust")?;
    let service = InventoryService::new(state.db);
    let entry = service
        .update_adjustment_metadata(current_user.0.tenant_id, inventory_id, adjustment_id, input)
        .await?;
    Ok(Json(entry))
}

/// Reverse (delete) an adjustment
pub async fn reverse_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((inventory_id, adjustment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ReversalResult>> {
    current_user.0.require("inventory", "adjust")?;
    let service = InventoryService::new(state.db);
    let result = service
        .reverse_adjustment(current_user.0.tenant_id, inventory_id, adjustment_id)
        .await?;
    Ok(Json(result))
}
