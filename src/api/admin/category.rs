use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::catalog::{CategoryPatch, NewCategory};
use crate::AppState;

pub fn admin_category_router() -> Router {
    Router::new()
        .route("/category", get(get_categories).post(create_category))
        .route("/category/:id", put(update_category).delete(delete_category))
}

async fn get_categories(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().categories(false).await?))
}

async fn create_category(
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.catalog().create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CategoryPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().update_category(id, payload).await?))
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog().delete_category(id).await?;
    Ok(Json(json!({
        "message": "Category deleted successfully."
    })))
}
