use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::PageQuery;
use crate::error::ApiError;
use crate::AppState;

pub fn manufacturer_router() -> Router {
    Router::new()
        .route("/manufacturer", get(get_manufacturers))
        .route("/manufacturer/:id/product", get(get_manufacturer_products))
}

async fn get_manufacturers(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().manufacturers().await?))
}

async fn get_manufacturer_products(
    Path(id): Path<i32>,
    Query(params): Query<PageQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .listing()
        .list_by_manufacturer(id, params.page.as_deref())
        .await?;
    Ok(Json(listing))
}
