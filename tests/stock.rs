mod common;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};
use std::str::FromStr;

use common::{create_product, seed, spawn_app, TestApp};
use rust_store::entities::product;

fn money(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

async fn count_of(app: &TestApp, id: &Value) -> i64 {
    let detail: Value = app
        .admin_get(&format!("/product/{id}"))
        .await
        .json()
        .await
        .unwrap();
    detail["count"].as_i64().unwrap()
}

#[tokio::test]
async fn test_empty_catalog_reports_zero() {
    let app = spawn_app().await;

    let response = app.admin_get("/report/stock").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(money(&body["value"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_stock_value_is_exact() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    create_product(&app, &seed, "Hammer", "100.00", 3).await;
    create_product(&app, &seed, "Nails", "50.00", 2).await;

    let body: Value = app.admin_get("/report/stock").await.json().await.unwrap();
    assert_eq!(body["count"], 5);
    assert_eq!(body["value"], "400.00");
    assert_eq!(money(&body["value"]), dec!(400.00));
}

#[tokio::test]
async fn test_manufacturer_report() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    create_product(&app, &seed, "Saw", "30.00", 2).await;
    create_product(&app, &seed, "Chisel", "10.00", 4).await;

    let body: Value = app
        .admin_get(&format!("/report/manufacturer/{}", seed.manufacturer_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["manufacturer"]["name"], "Acme");
    assert_eq!(body["stock_count"], 6);
    assert_eq!(body["average_price"], 20.0);
    assert_eq!(money(&body["stock_value"]), dec!(100.00));

    let idle = app
        .admin_create("/manufacturer", json!({ "name": "Idle", "country": "Peru" }))
        .await;
    let body: Value = app
        .admin_get(&format!("/report/manufacturer/{}", idle["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["stock_count"], 0);
    assert_eq!(money(&body["stock_value"]), Decimal::ZERO);

    let response = app.admin_get("/report/manufacturer/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_decrement_never_goes_below_zero() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let product = create_product(&app, &seed, "Glue", "3.00", 3).await;

    let response = app
        .admin_post(
            &format!("/product/{}/stock", product["id"]),
            &json!({ "decrement": 5 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 0);
    assert_eq!(count_of(&app, &product["id"]).await, 0);
}

#[tokio::test]
async fn test_increment_adds_exactly() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let product = create_product(&app, &seed, "Tape", "2.00", 4).await;

    let body: Value = app
        .admin_post(
            &format!("/product/{}/stock", product["id"]),
            &json!({ "increment": 6 }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 10);

    let body: Value = app
        .admin_post(
            &format!("/product/{}/stock", product["id"]),
            &json!({ "increment": 2, "decrement": 5 }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 7);
}

#[tokio::test]
async fn test_concurrent_adjustments_do_not_lose_updates() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let product = create_product(&app, &seed, "Screws", "0.10", 0).await;
    let url = app.admin_url(&format!("/product/{}/stock", product["id"]));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let request = app
            .client
            .post(&url)
            .bearer_auth(&app.token)
            .json(&json!({ "increment": 1 }));
        handles.push(tokio::spawn(async move { request.send().await.unwrap().status() }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(count_of(&app, &product["id"]).await, 10);
}

#[tokio::test]
async fn test_adjustment_rules() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let product = create_product(&app, &seed, "Wire", "1.00", 1).await;
    let path = format!("/product/{}/stock", product["id"]);

    let response = app.admin_post(&path, &json!({ "increment": -1 })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.admin_post(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .admin_post("/product/9999/stock", &json!({ "increment": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(count_of(&app, &product["id"]).await, 1);
}

#[tokio::test]
async fn test_stale_report_lists_untouched_products() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let old = create_product(&app, &seed, "Dusty", "1.00", 1).await;
    create_product(&app, &seed, "Fresh", "1.00", 1).await;

    let body: Value = app
        .admin_get("/report/stale?window=ten_minutes")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "empty");

    product::Entity::update_many()
        .col_expr(product::Column::UpdatedIn, Expr::value(Utc::now() - Duration::days(3)))
        .filter(product::Column::Id.eq(old["id"].as_i64().unwrap() as i32))
        .exec(&*app.state.db)
        .await
        .unwrap();

    let body: Value = app.admin_get("/report/stale?window=day").await.json().await.unwrap();
    assert_eq!(body["page"]["total"], 1);
    assert_eq!(body["page"]["items"][0]["name"], "Dusty");

    let body: Value = app.admin_get("/report/stale?window=week").await.json().await.unwrap();
    assert_eq!(body["status"], "empty");

    let response = app.admin_get("/report/stale?window=fortnight").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recording_a_shipment_adds_stock() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let bolts = create_product(&app, &seed, "Bolts", "0.50", 10).await;
    let nuts = create_product(&app, &seed, "Nuts", "0.20", 0).await;
    let vendor = app.admin_create("/vendor", json!({ "name": "Bulk Supply" })).await;

    let shipment = app
        .admin_create(
            "/shipment",
            json!({
                "name": "March delivery",
                "vendor_id": vendor["id"],
                "shipment_type": "warehouse",
                "lines": [
                    { "product_id": bolts["id"], "count": 15 },
                    { "product_id": nuts["id"], "count": 40 },
                ],
            }),
        )
        .await;
    assert_eq!(shipment["shipment_type"], "warehouse");
    assert_eq!(shipment["lines"].as_array().unwrap().len(), 2);

    assert_eq!(count_of(&app, &bolts["id"]).await, 25);
    assert_eq!(count_of(&app, &nuts["id"]).await, 40);

    let fetched: Value = app
        .admin_get(&format!("/shipment/{}", shipment["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["vendor"]["name"], "Bulk Supply");
}

#[tokio::test]
async fn test_invalid_shipment_changes_no_stock() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let bolts = create_product(&app, &seed, "Bolts", "0.50", 10).await;
    let vendor = app.admin_create("/vendor", json!({ "name": "Bulk Supply" })).await;

    let response = app
        .admin_post(
            "/shipment",
            &json!({
                "name": "Broken",
                "vendor_id": vendor["id"],
                "shipment_type": "store",
                "lines": [
                    { "product_id": bolts["id"], "count": 5 },
                    { "product_id": 9999, "count": 1 },
                ],
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["lines[1].product_id"].is_array(), "{body}");

    assert_eq!(count_of(&app, &bolts["id"]).await, 10);
    let shipments: Value = app.admin_get("/shipment").await.json().await.unwrap();
    assert!(shipments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_increment_past_the_count_limit_is_refused() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let product = create_product(&app, &seed, "Rivets", "0.01", 2_147_483_000).await;
    let path = format!("/product/{}/stock", product["id"]);

    let response = app.admin_post(&path, &json!({ "increment": 1000 })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["increment"].is_array(), "{body}");
    assert_eq!(count_of(&app, &product["id"]).await, 2_147_483_000);

    let response = app.get("/product").await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.admin_get("/report/stock").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = app
        .admin_post(&path, &json!({ "increment": 1000, "decrement": 400 }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2_147_483_600);

    let body: Value = app
        .admin_post(&path, &json!({ "increment": 47 }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], i32::MAX);
}

#[tokio::test]
async fn test_shipment_past_the_count_limit_is_refused() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let bolts = create_product(&app, &seed, "Bolts", "0.50", 10).await;
    let rivets = create_product(&app, &seed, "Rivets", "0.01", 2_147_483_000).await;
    let vendor = app.admin_create("/vendor", json!({ "name": "Bulk Supply" })).await;

    let response = app
        .admin_post(
            "/shipment",
            &json!({
                "name": "Overflow",
                "vendor_id": vendor["id"],
                "shipment_type": "warehouse",
                "lines": [
                    { "product_id": bolts["id"], "count": 5 },
                    { "product_id": rivets["id"], "count": 400 },
                    { "product_id": rivets["id"], "count": 400 },
                ],
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["lines[2].count"].is_array(), "{body}");
    assert!(body["fields"]["lines[1].count"].is_null(), "{body}");

    assert_eq!(count_of(&app, &bolts["id"]).await, 10);
    assert_eq!(count_of(&app, &rivets["id"]).await, 2_147_483_000);
    let shipments: Value = app.admin_get("/shipment").await.json().await.unwrap();
    assert!(shipments.as_array().unwrap().is_empty());

    let response = app.get("/product").await;
    assert_eq!(response.status(), StatusCode::OK);
}
