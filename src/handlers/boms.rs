use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::boms::{UpsertBomInput, UpsertConsumedProductInput, UpsertFinishedGoodInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for BOM endpoints
pub fn bom_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_boms))
        .route("/", post(upsert_bom))
        .route("/:id", get(get_bom))
        .route("/:id", delete(delete_bom))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConsumedProductRequest {
    pub id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub product_code: String,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinishedGoodRequest {
    pub id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub product_code: String,
    pub quantity: Decimal,
    pub consumed_products: Vec<ConsumedProductRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertBomRequest {
    pub id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub raw_id: String,
    #[validate(length(min = 1))]
    pub product_code: String,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub finished_goods: Vec<FinishedGoodRequest>,
}

async fn list_boms(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (summaries, total) = state
        .services
        .boms
        .list_boms(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        summaries,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_bom(
    State(state): State<AppState>,
    Path(bom_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let maybe_bom = state
        .services
        .boms
        .get_bom(&bom_id)
        .await
        .map_err(map_service_error)?;

    match maybe_bom {
        Some(detail) => Ok(success_response(detail)),
        None => Err(ApiError::NotFound(format!("BOM {} not found", bom_id))),
    }
}

async fn upsert_bom(
    State(state): State<AppState>,
    Json(payload): Json<UpsertBomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let creating = payload.id.is_none();
    let input = UpsertBomInput {
        id: payload.id,
        raw_id: payload.raw_id,
        product_code: payload.product_code,
        name: payload.name,
        quantity: payload.quantity,
        finished_goods: payload
            .finished_goods
            .into_iter()
            .map(|fg| UpsertFinishedGoodInput {
                id: fg.id,
                product_id: fg.product_id,
                product_code: fg.product_code,
                quantity: fg.quantity,
                consumed_products: fg
                    .consumed_products
                    .into_iter()
                    .map(|cp| UpsertConsumedProductInput {
                        id: cp.id,
                        product_id: cp.product_id,
                        product_code: cp.product_code,
                        quantity: cp.quantity,
                    })
                    .collect(),
            })
            .collect(),
    };

    let bom_id = state
        .services
        .boms
        .upsert_bom(input)
        .await
        .map_err(map_service_error)?;

    info!("BOM upserted: {}", bom_id);

    let body = serde_json::json!({ "id": bom_id });
    if creating {
        Ok(created_response(body))
    } else {
        Ok(success_response(body))
    }
}

async fn delete_bom(
    State(state): State<AppState>,
    Path(bom_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .boms
        .delete_bom(&bom_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
