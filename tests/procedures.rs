mod common;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use sea_orm::{Database, DbErr};
use serde_json::{json, Value};
use std::sync::Arc;

use common::spawn_app_with;
use rust_store::entities::manufacturer;
use rust_store::error::ApiError;
use rust_store::services::procedures::{
    ManufacturerStock, ProcedureGateway, StockTotals, TechnicalValueRow,
};
use rust_store::services::stock::StockService;

/// Every routine fails the way a missing stored procedure would.
struct BrokenProcedures;

fn broken() -> DbErr {
    DbErr::Custom("function sum_stock_count_and_value() does not exist".to_string())
}

#[async_trait]
impl ProcedureGateway for BrokenProcedures {
    async fn delete_product_safely(&self, _product_id: i32) -> Result<bool, DbErr> {
        Err(broken())
    }

    async fn sum_stock_count_and_value(&self) -> Result<StockTotals, DbErr> {
        Err(broken())
    }

    async fn sum_stock_value_by_manufacturer(&self, _manufacturer_id: i32) -> Result<ManufacturerStock, DbErr> {
        Err(broken())
    }

    async fn technical_values_for_product(&self, _product_id: i32) -> Result<Vec<TechnicalValueRow>, DbErr> {
        Err(broken())
    }

    async fn create_manufacturer(&self, _name: &str, _country: &str) -> Result<manufacturer::Model, DbErr> {
        Err(broken())
    }
}

/// Answers with canned figures.
struct FixedProcedures;

#[async_trait]
impl ProcedureGateway for FixedProcedures {
    async fn delete_product_safely(&self, _product_id: i32) -> Result<bool, DbErr> {
        Ok(false)
    }

    async fn sum_stock_count_and_value(&self) -> Result<StockTotals, DbErr> {
        Ok(StockTotals {
            count: 7,
            value: dec!(12.50),
        })
    }

    async fn sum_stock_value_by_manufacturer(&self, _manufacturer_id: i32) -> Result<ManufacturerStock, DbErr> {
        Ok(ManufacturerStock::default())
    }

    async fn technical_values_for_product(&self, _product_id: i32) -> Result<Vec<TechnicalValueRow>, DbErr> {
        Ok(Vec::new())
    }

    async fn create_manufacturer(&self, name: &str, country: &str) -> Result<manufacturer::Model, DbErr> {
        Ok(manufacturer::Model {
            id: 41,
            name: name.to_string(),
            country: country.to_string(),
        })
    }
}

#[tokio::test]
async fn test_failed_procedure_is_data_unavailable() {
    let db = Arc::new(Database::connect("sqlite::memory:").await.unwrap());
    let stock = StockService::new(db, Arc::new(BrokenProcedures));

    assert!(matches!(
        stock.total_stock_count().await,
        Err(ApiError::DataUnavailable(_))
    ));
    assert!(matches!(
        stock.total_stock_value().await,
        Err(ApiError::DataUnavailable(_))
    ));
}

#[tokio::test]
async fn test_failed_procedure_hides_the_cause_from_clients() {
    let app = spawn_app_with(|_| Arc::new(BrokenProcedures)).await;

    let response = app.admin_get("/report/stock").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(!message.contains("does not exist"));

    let response = app
        .admin_post("/manufacturer", &json!({ "name": "Acme", "country": "Norway" }))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_reports_come_from_the_gateway() {
    let app = spawn_app_with(|_| Arc::new(FixedProcedures)).await;

    let body: Value = app.admin_get("/report/stock").await.json().await.unwrap();
    assert_eq!(body["count"], 7);
    assert_eq!(body["value"], "12.50");

    let created = app
        .admin_create("/manufacturer", json!({ "name": "Canned", "country": "Fiji" }))
        .await;
    assert_eq!(created["id"], 41);

    // nothing to delete according to the gateway
    let response = app.admin_delete("/product/1/safe").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
