use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::catalog::{NewProductType, NewTechnicalData, ProductTypePatch};
use crate::AppState;

pub fn admin_product_type_router() -> Router {
    Router::new()
        .route("/product-type", get(get_product_types).post(create_product_type))
        .route("/product-type/:id", put(update_product_type).delete(delete_product_type))
        .route(
            "/product-type/:id/technical-data",
            get(get_technical_data).post(create_technical_data),
        )
        .route("/technical-data/:id", delete(delete_technical_data))
}

async fn get_product_types(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().product_types().await?))
}

async fn create_product_type(
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewProductType>,
) -> Result<impl IntoResponse, ApiError> {
    let product_type = state.catalog().create_product_type(payload).await?;
    Ok((StatusCode::CREATED, Json(product_type)))
}

async fn update_product_type(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProductTypePatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().update_product_type(id, payload).await?))
}

async fn delete_product_type(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog().delete_product_type(id).await?;
    Ok(Json(json!({
        "message": "Product type deleted successfully."
    })))
}

async fn get_technical_data(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().technical_data(id).await?))
}

async fn create_technical_data(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewTechnicalData>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.catalog().create_technical_data(id, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_technical_data(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog().delete_technical_data(id).await?;
    Ok(Json(json!({
        "message": "Technical data deleted successfully."
    })))
}
