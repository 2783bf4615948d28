use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::stock::RecencyWindow;
use crate::AppState;

pub fn admin_report_router() -> Router {
    Router::new()
        .route("/report/stock", get(stock_totals))
        .route("/report/manufacturer/:id", get(manufacturer_stock))
        .route("/report/stale", get(stale_products))
}

async fn stock_totals(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.stock().totals().await?))
}

async fn manufacturer_stock(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.stock().aggregate_by_manufacturer(id).await?))
}

/// Products not updated within the window. Defaults to a week.
async fn stale_products(
    Query(params): Query<StaleQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let window = params.window.unwrap_or(RecencyWindow::Week);
    let listing = state
        .stock()
        .list_by_recency(window, params.page.as_deref())
        .await?;
    Ok(Json(listing))
}

#[derive(Deserialize)]
struct StaleQuery {
    window: Option<RecencyWindow>,
    page: Option<String>,
}
