use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::listing::ListFilter;
use crate::AppState;

pub fn product_router() -> Router {
    Router::new()
        .route("/product", get(get_products))
        .route("/product/:slug", get(get_product))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ListFilter {
        discounted: params.discounted,
    };
    let listing = state
        .listing()
        .list_all(filter, params.page.as_deref())
        .await?;
    Ok(Json(listing))
}

async fn get_product(
    Path(slug): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.listing().get_by_slug(&slug).await?))
}

#[derive(Deserialize)]
struct GetProductsQuery {
    page: Option<String>,
    discounted: Option<bool>,
}
