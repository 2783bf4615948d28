use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::services::catalog::{validate_payload, ManufacturerPatch, NewManufacturer};
use crate::AppState;

pub fn admin_manufacturer_router() -> Router {
    Router::new()
        .route("/manufacturer", get(get_manufacturers).post(create_manufacturer))
        .route("/manufacturer/:id", put(update_manufacturer).delete(delete_manufacturer))
}

async fn get_manufacturers(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().manufacturers().await?))
}

async fn create_manufacturer(
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewManufacturer>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;
    let manufacturer = state
        .procedures
        .create_manufacturer(&payload.name, &payload.country)
        .await
        .map_err(|err| ApiError::from_write(err, "name", "Manufacturer"))?;
    info!(manufacturer_id = manufacturer.id, "Created manufacturer");
    Ok((StatusCode::CREATED, Json(manufacturer)))
}

async fn update_manufacturer(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ManufacturerPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().update_manufacturer(id, payload).await?))
}

async fn delete_manufacturer(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog().delete_manufacturer(id).await?;
    Ok(Json(json!({
        "message": "Manufacturer deleted successfully."
    })))
}
