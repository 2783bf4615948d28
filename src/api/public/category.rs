use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::PageQuery;
use crate::error::ApiError;
use crate::AppState;

pub fn category_router() -> Router {
    Router::new()
        .route("/category", get(get_categories))
        .route("/category/:slug", get(get_category))
}

async fn get_categories(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog().categories(true).await?))
}

/// The category with a page of its active products. Inactive categories are
/// not found.
async fn get_category(
    Path(slug): Path<String>,
    Query(params): Query<PageQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .listing()
        .list_by_category(&slug, params.page.as_deref())
        .await?;
    Ok(Json(listing))
}
