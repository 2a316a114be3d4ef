use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::bins::{UpsertBinBatchInput, UpsertBinFinishedGoodInput, UpsertBinInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for packout bin endpoints
pub fn bin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bins))
        .route("/", post(upsert_bin))
        .route("/:id", get(get_bin))
        .route("/:id", delete(delete_bin))
        .route("/:id/process", post(process_bin))
        .route("/:id/status", post(update_status))
        .route("/:id/reopen", post(reopen_bin))
}

#[derive(Debug, Deserialize)]
pub struct ListBinsQuery {
    /// Day to list packouts for; defaults to today
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BinBatchRequest {
    #[validate(length(min = 1))]
    pub batch_id: String,
    pub batch_name: String,
    pub batch_location: String,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BinFinishedGoodRequest {
    pub finished_good_id: Uuid,
    #[validate(length(min = 1))]
    pub finished_good_product_id: String,
    pub quantity: Decimal,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertBinRequest {
    pub id: Option<Uuid>,
    pub bom_id: Uuid,
    pub total_bins_used: Decimal,
    #[serde(default)]
    pub batch_id: String,
    #[serde(default)]
    pub batch_name: String,
    #[serde(default)]
    pub batch_location: String,
    #[validate(length(min = 1))]
    pub custom_batch: String,
    pub staff_count: i32,
    pub time_start: DateTime<Utc>,
    pub time_finish: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_goods: Vec<BinFinishedGoodRequest>,
    #[serde(default)]
    pub batches: Vec<BinBatchRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub last_modified_by: Option<String>,
    pub last_modified_on: Option<String>,
}

async fn list_bins(
    State(state): State<AppState>,
    Query(query): Query<ListBinsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let day = query.date.unwrap_or_else(Utc::now);
    let bins = state
        .services
        .bins
        .list_bins(day)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(bins))
}

async fn get_bin(
    State(state): State<AppState>,
    Path(bin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let maybe_bin = state
        .services
        .bins
        .get_bin(&bin_id)
        .await
        .map_err(map_service_error)?;

    match maybe_bin {
        Some(detail) => Ok(success_response(detail)),
        None => Err(ApiError::NotFound(format!("bin {} not found", bin_id))),
    }
}

async fn upsert_bin(
    State(state): State<AppState>,
    Json(payload): Json<UpsertBinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let creating = payload.id.is_none();
    let input = UpsertBinInput {
        id: payload.id,
        bom_id: payload.bom_id,
        total_bins_used: payload.total_bins_used,
        batch_id: payload.batch_id,
        batch_name: payload.batch_name,
        batch_location: payload.batch_location,
        custom_batch: payload.custom_batch,
        staff_count: payload.staff_count,
        time_start: payload.time_start,
        time_finish: payload.time_finish,
        created_at: payload.created_at,
        finished_goods: payload
            .finished_goods
            .into_iter()
            .map(|fg| UpsertBinFinishedGoodInput {
                finished_good_id: fg.finished_good_id,
                finished_good_product_id: fg.finished_good_product_id,
                quantity: fg.quantity,
                comment: fg.comment,
            })
            .collect(),
        batches: payload
            .batches
            .into_iter()
            .map(|b| UpsertBinBatchInput {
                batch_id: b.batch_id,
                batch_name: b.batch_name,
                batch_location: b.batch_location,
                quantity: b.quantity,
            })
            .collect(),
    };

    let bin_id = state
        .services
        .bins
        .upsert_bin(input)
        .await
        .map_err(map_service_error)?;

    let body = serde_json::json!({ "id": bin_id });
    if creating {
        Ok(created_response(body))
    } else {
        Ok(success_response(body))
    }
}

async fn delete_bin(
    State(state): State<AppState>,
    Path(bin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .bins
        .delete_bin(&bin_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Expand the bin through its BOM and post the adjustment batch.
async fn process_bin(
    State(state): State<AppState>,
    Path(bin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .bins
        .process_bin(&bin_id)
        .await
        .map_err(map_service_error)?;

    info!(
        "Bin {} posted as {} ({} lines)",
        bin_id, outcome.adjustment_number, outcome.lines_posted
    );

    Ok(success_response(outcome))
}

async fn update_status(
    State(state): State<AppState>,
    Path(bin_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .bins
        .set_external_status(
            &bin_id,
            &payload.status,
            payload.last_modified_by,
            payload.last_modified_on,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Clears the stored external status so the record is editable again.
async fn reopen_bin(
    State(state): State<AppState>,
    Path(bin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .bins
        .clear_external_status(&bin_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
