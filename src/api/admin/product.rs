use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::{ColumnTrait, QueryFilter};
use serde_json::json;
use tracing::error;

use crate::api::public::PageQuery;
use crate::entities::product;
use crate::error::ApiError;
use crate::services::edit::{EditOutcome, ProductForm};
use crate::services::listing::ProductDetail;
use crate::services::stock::StockAdjustment;
use crate::AppState;

//ROUTERS
pub fn admin_product_router() -> Router {
    Router::new()
        .route("/product", get(get_products).post(create_product))
        .route(
            "/product/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/product/:id/safe", delete(delete_product_safely))
        .route("/product/:id/stock", post(adjust_stock))
        .route("/product/:id/technical", get(get_technical_values))
}

//ROUTES
/// Every product, inactive ones included.
async fn get_products(
    Query(params): Query<PageQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.listing().list_admin(params.page.as_deref()).await?))
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.listing().get_by_id(id).await?))
}

async fn create_product(
    Extension(state): Extension<AppState>,
    Json(form): Json<ProductForm>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = saved(state.editor().create(form).await?)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(form): Json<ProductForm>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = saved(state.editor().update(id, form).await?)?;
    Ok(Json(detail))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let images = state.catalog().delete_product(id).await?;
    state.images().remove_stored(&images).await;
    Ok(Json(json!({
        "message": "Product deleted successfully."
    })))
}

async fn delete_product_safely(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let images = state.catalog().image_names(id).await?;
    let deleted = state
        .procedures
        .delete_product_safely(id)
        .await
        .map_err(|err| {
            error!(product_id = id, error = %err, "Safe delete failed");
            ApiError::DataUnavailable(err)
        })?;
    if !deleted {
        return Err(ApiError::not_found("product", format!("id {id}")));
    }

    state.images().remove_stored(&images).await;
    Ok(Json(json!({
        "message": "Product deleted successfully."
    })))
}

async fn adjust_stock(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<StockAdjustment>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.stock().adjust_stock(id, payload).await?))
}

async fn get_technical_values(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    product::find_all()
        .filter(product::Column::Id.eq(id))
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("product", format!("id {id}")))?;

    let values = state
        .procedures
        .technical_values_for_product(id)
        .await
        .map_err(|err| {
            error!(product_id = id, error = %err, "Loading technical values failed");
            ApiError::DataUnavailable(err)
        })?;
    Ok(Json(values))
}

fn saved(outcome: EditOutcome) -> Result<ProductDetail, ApiError> {
    match outcome {
        EditOutcome::Saved(detail) => Ok(detail),
        EditOutcome::Rejected(fields) => Err(ApiError::Validation(fields)),
    }
}
