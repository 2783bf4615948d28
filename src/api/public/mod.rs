pub mod category;
pub mod manufacturer;
pub mod product;
pub mod uploads;

use axum::Router;
use serde::Deserialize;

use category::category_router;
use manufacturer::manufacturer_router;
use product::product_router;
use uploads::uploads_router;

pub fn public_api_router() -> Router {
    Router::new()
        .merge(category_router())
        .merge(manufacturer_router())
        .merge(product_router())
        .merge(uploads_router())
}

/// `?page=` as sent. Kept as text so a malformed value falls back to page one
/// instead of failing the request.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}
