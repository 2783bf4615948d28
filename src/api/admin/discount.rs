use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::catalog::{DiscountForm, DiscountPatch};
use crate::AppState;

pub fn admin_discount_router() -> Router {
    Router::new()
        .route("/discount", get(get_discounts).post(create_discount))
        .route("/discount/:id", put(update_discount).delete(delete_discount))
}

async fn get_discounts(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().discounts().await?))
}

async fn create_discount(
    Extension(state): Extension<AppState>,
    Json(payload): Json<DiscountForm>,
) -> Result<impl IntoResponse, ApiError> {
    let discount = state.catalog().create_discount(payload).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

async fn update_discount(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<DiscountPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().update_discount(id, payload).await?))
}

/// Products carrying the discount stay, without a discount.
async fn delete_discount(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog().delete_discount(id).await?;
    Ok(Json(json!({
        "message": "Discount deleted successfully."
    })))
}
