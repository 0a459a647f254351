//! HTTP handlers for quotations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::{PaginatedResponse, Quotation, Sale};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::line_items::LineItemPayload;
use crate::services::quotation::{
    ConvertQuotationInput, CreateQuotationInput, QuotationListQuery, UpdateQuotationInput,
};
use crate::services::QuotationService;
use crate::AppState;

fn service(state: AppState) -> QuotationService {
    QuotationService::new(state.db, state.config.documents.clone())
}

pub async fn create_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateQuotationInput>,
) -> AppResult<impl IntoResponse> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .create(current_user.0.tenant_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

pub async fn list_quotations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<QuotationListQuery>,
) -> AppResult<Json<PaginatedResponse<Quotation>>> {
    let quotations = service(state).list(current_user.0.tenant_id, query).await?;
    Ok(Json(quotations))
}

pub async fn get_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<Quotation>> {
    let quotation = service(state)
        .get(current_user.0.tenant_id, quotation_id)
        .await?;
    Ok(Json(quotation))
}

pub async fn update_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
    Json(input): Json<UpdateQuotationInput>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .update(current_user.0.tenant_id, quotation_id, input)
        .await?;
    Ok(Json(quotation))
}

pub async fn delete_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require("quotations", "write")?;
    service(state)
        .delete(current_user.0.tenant_id, quotation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_quotation_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
    Json(item): Json<LineItemPayload>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .add_item(current_user.0.tenant_id, quotation_id, item)
        .await?;
    Ok(Json(quotation))
}

pub async fn update_quotation_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((quotation_id, item_id)): Path<(Uuid, Uuid)>,
    Json(item): Json<LineItemPayload>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .update_item(current_user.0.tenant_id, quotation_id, item_id, item)
        .await?;
    Ok(Json(quotation))
}

pub async fn remove_quotation_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((quotation_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .remove_item(current_user.0.tenant_id, quotation_id, item_id)
        .await?;
    Ok(Json(quotation))
}

pub async fn send_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .send(current_user.0.tenant_id, quotation_id)
        .await?;
    Ok(Json(quotation))
}

pub async fn approve_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .approve(current_user.0.tenant_id, quotation_id)
        .await?;
    Ok(Json(quotation))
}

pub async fn reject_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
) -> AppResult<Json<Quotation>> {
    current_user.0.require("quotations", "write")?;
    let quotation = service(state)
        .reject(current_user.0.tenant_id, quotation_id)
        .await?;
    Ok(Json(quotation))
}

/// Convert a quotation into a draft sale
pub async fn convert_quotation(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(quotation_id): Path<Uuid>,
    input: Option<Json<ConvertQuotationInput>>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    current_user.0.require("sales", "write")?;
    let input = input.map(|Json(input)| input).unwrap_or_default();
    let sale = service(state)
        .convert(
            current_user.0.tenant_id,
            current_user.0.user_id,
            quotation_id,
            input,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
