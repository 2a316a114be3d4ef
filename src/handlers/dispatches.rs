use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    models::{CrateSku, DispatchCustomerType, SalesOrderStatus},
    services::dispatches::{
        UpsertCrateLineInput, UpsertDispatchInput, UpsertDispatchLineInput,
    },
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

/// Creates the router for dispatch endpoints
pub fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_dispatches))
        .route("/", post(upsert_dispatch))
        .route("/customers", get(list_customers))
        .route("/crates", get(list_crate_lines))
        .route("/crates", post(create_crate_line))
        .route("/crates/:id", delete(delete_crate_line))
        .route("/:id", get(get_dispatch))
        .route("/:id", delete(delete_dispatch))
        .route("/:id/process", post(process_dispatch))
        .route("/:id/status", post(update_status))
}

#[derive(Debug, Deserialize)]
pub struct ListDispatchesQuery {
    /// Restrict to dispatches created in the last two days
    #[serde(default)]
    pub recent_only: bool,
    pub customer_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DispatchLineRequest {
    pub id: Option<Uuid>,
    pub line: i32,
    #[validate(length(min = 1))]
    pub product_code: String,
    #[serde(default)]
    pub product_description: String,
    pub ship: Decimal,
    pub weight: Option<Decimal>,
    pub sales_order_line_id: Uuid,
    pub batch_number: String,
    pub batch_location: String,
    pub seal_number: Option<String>,
    pub container_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CrateLineRequest {
    pub id: Option<Uuid>,
    pub line: Option<i32>,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub customer_code: String,
    #[serde(default)]
    pub customer_name: String,
    pub sku: CrateSku,
    pub reference: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertDispatchRequest {
    pub id: Option<i32>,
    pub shipping_company: String,
    pub shipping_company_id: String,
    pub customer_id: String,
    pub customer_code: String,
    pub customer_name: String,
    pub customer_type: DispatchCustomerType,
    pub status: SalesOrderStatus,
    #[serde(default)]
    pub marked_done: bool,
    pub shipment_weight: Decimal,
    #[serde(default)]
    pub tracking_number: String,
    pub dispatch_date: DateTime<Utc>,
    #[serde(default)]
    pub address: String,
    pub number_of_packages: i32,
    #[serde(default)]
    pub dispatch_lines: Vec<DispatchLineRequest>,
    #[serde(default)]
    pub crate_lines: Vec<CrateLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub last_modified_by: Option<String>,
    pub last_modified_on: Option<String>,
}

async fn list_dispatches(
    State(state): State<AppState>,
    Query(query): Query<ListDispatchesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(customer_code) = query.customer_code {
        let dispatches = state
            .services
            .dispatches
            .list_by_customer(&customer_code)
            .await
            .map_err(map_service_error)?;
        return Ok(success_response(dispatches));
    }

    let dispatches = state
        .services
        .dispatches
        .list_dispatches(query.recent_only)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(dispatches))
}

async fn list_customers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let customers = state
        .services
        .dispatches
        .list_customers()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customers))
}

async fn get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let maybe_dispatch = state
        .services
        .dispatches
        .get_dispatch(id)
        .await
        .map_err(map_service_error)?;

    match maybe_dispatch {
        Some(detail) => Ok(success_response(detail)),
        None => Err(ApiError::NotFound(format!("dispatch {} not found", id))),
    }
}

async fn upsert_dispatch(
    State(state): State<AppState>,
    Json(payload): Json<UpsertDispatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let creating = payload.id.is_none();
    let input = UpsertDispatchInput {
        id: payload.id,
        shipping_company: payload.shipping_company,
        shipping_company_id: payload.shipping_company_id,
        customer_id: payload.customer_id,
        customer_code: payload.customer_code,
        customer_name: payload.customer_name,
        customer_type: payload.customer_type,
        status: payload.status,
        marked_done: payload.marked_done,
        shipment_weight: payload.shipment_weight,
        tracking_number: payload.tracking_number,
        dispatch_date: payload.dispatch_date,
        address: payload.address,
        number_of_packages: payload.number_of_packages,
        dispatch_lines: payload
            .dispatch_lines
            .into_iter()
            .map(|line| UpsertDispatchLineInput {
                id: line.id,
                line: line.line,
                product_code: line.product_code,
                product_description: line.product_description,
                ship: line.ship,
                weight: line.weight,
                sales_order_line_id: line.sales_order_line_id,
                batch_number: line.batch_number,
                batch_location: line.batch_location,
                seal_number: line.seal_number,
                container_number: line.container_number,
            })
            .collect(),
        crate_lines: payload
            .crate_lines
            .into_iter()
            .map(|line| UpsertCrateLineInput {
                id: line.id,
                line: line.line,
                customer_id: line.customer_id,
                customer_code: line.customer_code,
                customer_name: line.customer_name,
                sku: line.sku,
                reference: line.reference,
                quantity: line.quantity,
            })
            .collect(),
    };

    let dispatch_id = state
        .services
        .dispatches
        .upsert_dispatch(input)
        .await
        .map_err(map_service_error)?;

    let body = serde_json::json!({ "id": dispatch_id });
    if creating {
        Ok(created_response(body))
    } else {
        Ok(success_response(body))
    }
}

async fn delete_dispatch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .dispatches
        .delete_dispatch(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Aggregate the dispatch lines and post the shipment adjustment.
async fn process_dispatch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .dispatches
        .process_dispatch(id)
        .await
        .map_err(map_service_error)?;

    info!(
        "Dispatch {} posted as {} ({} lines)",
        id, outcome.adjustment_number, outcome.lines_posted
    );

    Ok(success_response(outcome))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .dispatches
        .set_external_status(
            id,
            &payload.status,
            payload.last_modified_by,
            payload.last_modified_on,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

async fn create_crate_line(
    State(state): State<AppState>,
    Json(payload): Json<CrateLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let id = state
        .services
        .dispatches
        .create_crate_line(UpsertCrateLineInput {
            id: payload.id,
            line: payload.line,
            customer_id: payload.customer_id,
            customer_code: payload.customer_code,
            customer_name: payload.customer_name,
            sku: payload.sku,
            reference: payload.reference,
            quantity: payload.quantity,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(serde_json::json!({ "id": id })))
}

async fn delete_crate_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .dispatches
        .delete_crate_line(&id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn list_crate_lines(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let lines = state
        .services
        .dispatches
        .list_crate_lines()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(lines))
}
