use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::SalesOrderStatus,
    services::sales_orders::{CreateSalesOrderInput, CreateSalesOrderLineInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// Creates the router for sales order endpoints
pub fn sales_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/", post(create_order))
        .route("/:id", get(get_order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SalesOrderLineRequest {
    pub line: i32,
    #[validate(length(min = 1))]
    pub product_code: String,
    #[serde(default)]
    pub product_description: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalesOrderRequest {
    #[validate(length(min = 1))]
    pub order_number: String,
    pub customer_code: String,
    pub customer_name: String,
    pub warehouse: String,
    pub status: SalesOrderStatus,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<SalesOrderLineRequest>,
}

async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (orders, total) = state
        .services
        .sales_orders
        .list_orders(pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        orders,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let maybe_order = state
        .services
        .sales_orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;

    match maybe_order {
        Some(detail) => Ok(success_response(detail)),
        None => Err(ApiError::NotFound(format!("sales order {} not found", id))),
    }
}

async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateSalesOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateSalesOrderInput {
        order_number: payload.order_number,
        customer_code: payload.customer_code,
        customer_name: payload.customer_name,
        warehouse: payload.warehouse,
        status: payload.status,
        order_date: payload.order_date,
        lines: payload
            .lines
            .into_iter()
            .map(|line| CreateSalesOrderLineInput {
                line: line.line,
                product_code: line.product_code,
                product_description: line.product_description,
                quantity: line.quantity,
                price: line.price,
            })
            .collect(),
    };

    let id = state
        .services
        .sales_orders
        .create_order(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(serde_json::json!({ "id": id })))
}
