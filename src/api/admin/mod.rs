pub mod category;
pub mod discount;
pub mod image;
pub mod manufacturer;
pub mod product;
pub mod product_type;
pub mod report;
pub mod shipment;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use category::admin_category_router;
use discount::admin_discount_router;
use image::admin_image_router;
use manufacturer::admin_manufacturer_router;
use product::admin_product_router;
use product_type::admin_product_type_router;
use report::admin_report_router;
use shipment::admin_shipment_router;

use crate::middleware::auth::{auth_middleware, AuthState};
use crate::AppState;

/// Staff routes. Every one of them requires a valid bearer token.
pub fn admin_api_router(state: &AppState) -> Router {
    Router::new()
        .merge(admin_category_router())
        .merge(admin_discount_router())
        .merge(admin_image_router(state.config.file_size_limit))
        .merge(admin_manufacturer_router())
        .merge(admin_product_router())
        .merge(admin_product_type_router())
        .merge(admin_report_router())
        .merge(admin_shipment_router())
        .layer(from_fn_with_state(
            AuthState {
                secret: Arc::new(state.config.secret.clone()),
            },
            auth_middleware,
        ))
}
