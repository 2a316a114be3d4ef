use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;

/// Creates the router for external stock and adjustment endpoints
pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/bulk", get(list_bulk_products))
        .route("/batches", get(list_batch_stock))
        .route("/on-hand", get(stock_on_hand))
        .route("/adjustments", get(list_adjustments))
        .route("/adjustments/:id", get(get_adjustment))
        .route("/adjustments/poll", post(poll_statuses))
        .route("/automation/:target", post(trigger_automation))
}

#[derive(Debug, Deserialize)]
pub struct BatchStockQuery {
    pub product_code: Option<String>,
}

async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    use crate::unleashed::ProductCatalog;

    let products = state
        .services
        .unleashed
        .all_products()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

async fn list_bulk_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .unleashed
        .bulk_products()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

async fn list_batch_stock(
    State(state): State<AppState>,
    Query(query): Query<BatchStockQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stock = state
        .services
        .unleashed
        .product_stock(query.product_code.as_deref())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(stock))
}

async fn stock_on_hand(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stock = state
        .services
        .unleashed
        .stock_on_hand()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(stock))
}

async fn list_adjustments(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let adjustments = state
        .services
        .unleashed
        .list_adjustments()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(adjustments))
}

async fn get_adjustment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    use crate::unleashed::StockAdjustmentGateway;

    let adjustment = state
        .services
        .unleashed
        .adjustment_status(&id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(adjustment))
}

/// Runs one status poll sweep over posted bins and dispatches.
async fn poll_statuses(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .status_poll
        .sweep()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Manually fires the approval workflow for a target adjustment number.
async fn trigger_automation(
    State(state): State<AppState>,
    Path(target): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .automation
        .manual_trigger(target)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({ "target": target })))
}
