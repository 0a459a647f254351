//! HTTP handlers for sales and payments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{PaginatedResponse, Sale};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::line_items::LineItemPayload;
use crate::services::sale::{CreateSaleInput, RecordPaymentInput, SaleListQuery, UpdateSaleInput};
use crate::services::SaleService;
use crate::AppState;

fn service(state: AppState) -> SaleService {
    SaleService::new(state.db, state.config.documents.clone())
}

pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<impl IntoResponse> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .create(current_user.0.tenant_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let sales = service(state).list(current_user.0.tenant_id, query).await?;
    Ok(Json(sales))
}

pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let sale = service(state).get(current_user.0.tenant_id, sale_id).await?;
    Ok(Json(sale))
}

pub async fn update_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSaleInput>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .update(current_user.0.tenant_id, sale_id, input)
        .await?;
    Ok(Json(sale))
}

pub async fn delete_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require("sales", "write")?;
    service(state)
        .delete(current_user.0.tenant_id, sale_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_sale_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(item): Json<LineItemPayload>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .add_item(current_user.0.tenant_id, sale_id, item)
        .await?;
    Ok(Json(sale))
}

pub async fn update_sale_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((sale_id, item_id)): Path<(Uuid, Uuid)>,
    Json(item): Json<LineItemPayload>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .update_item(current_user.0.tenant_id, sale_id, item_id, item)
        .await?;
    Ok(Json(sale))
}

pub async fn remove_sale_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((sale_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .remove_item(current_user.0.tenant_id, sale_id, item_id)
        .await?;
    Ok(Json(sale))
}

pub async fn confirm_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .confirm(current_user.0.tenant_id, sale_id)
        .await?;
    Ok(Json(sale))
}

pub async fn cancel_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .cancel(current_user.0.tenant_id, sale_id)
        .await?;
    Ok(Json(sale))
}

/// Record a payment against a sale
pub async fn record_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<RecordPaymentInput>,
) -> AppResult<impl IntoResponse> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .record_payment(
            current_user.0.tenant_id,
            current_user.0.user_id,
            sale_id,
            input,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn remove_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((sale_id, payment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Sale>> {
    current_user.0.require("sales", "write")?;
    let sale = service(state)
        .remove_payment(current_user.0.tenant_id, sale_id, payment_id)
        .await?;
    Ok(Json(sale))
}
