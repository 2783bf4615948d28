pub mod admin;
pub mod public;

use axum::Router;

use admin::admin_api_router;
use public::public_api_router;

use crate::AppState;

pub fn create_api_router(state: &AppState) -> Router {
    Router::new()
        .nest("/api", public_api_router())
        .nest("/api/admin", admin_api_router(state))
}
