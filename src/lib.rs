pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod services;
pub mod slug;

use axum::{middleware::from_fn, Extension, Router};
use sea_orm::{Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::config::Config;
use crate::middleware::logging::logging_middleware;
use crate::services::{
    catalog::CatalogStore, edit::ProductEditWorkflow, images::ImageService,
    listing::ListingService, procedures::ProcedureGateway, shipment::ShipmentService,
    stock::StockService,
};

/// Shared by every handler through an `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub procedures: Arc<dyn ProcedureGateway>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.db.clone())
    }

    pub fn listing(&self) -> ListingService {
        ListingService::new(self.db.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(self.db.clone(), self.procedures.clone())
    }

    pub fn editor(&self) -> ProductEditWorkflow {
        ProductEditWorkflow::new(self.db.clone())
    }

    pub fn shipments(&self) -> ShipmentService {
        ShipmentService::new(self.db.clone())
    }

    pub fn images(&self) -> ImageService {
        ImageService::new(
            self.db.clone(),
            self.config.upload_dir.clone(),
            self.config.file_size_limit,
        )
    }
}

pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

pub fn app(state: AppState) -> Router {
    create_api_router(&state)
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
