use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::shipment::{NewShipment, NewVendor};
use crate::AppState;

pub fn admin_shipment_router() -> Router {
    Router::new()
        .route("/vendor", get(get_vendors).post(create_vendor))
        .route("/shipment", get(get_shipments).post(record_shipment))
        .route("/shipment/:id", get(get_shipment).delete(delete_shipment))
}

async fn get_vendors(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.shipments().vendors().await?))
}

async fn create_vendor(
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewVendor>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.shipments().create_vendor(payload).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

async fn get_shipments(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.shipments().shipments().await?))
}

/// Stores the shipment and adds every line's count to the product's stock.
async fn record_shipment(
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewShipment>,
) -> Result<impl IntoResponse, ApiError> {
    let shipment = state.shipments().record_shipment(payload).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

async fn get_shipment(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.shipments().get_shipment(id).await?))
}

async fn delete_shipment(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.shipments().delete_shipment(id).await?;
    Ok(Json(json!({
        "message": "Shipment deleted successfully."
    })))
}
