mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{create_product, seed, spawn_app};

#[tokio::test]
async fn test_category_slug_is_derived_from_name() {
    let app = spawn_app().await;

    let category = app
        .admin_create("/category", json!({ "name": "  Power Tools & Drills!! " }))
        .await;
    assert_eq!(category["slug"], "power-tools-drills");
    assert_eq!(category["is_active"], true);
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let app = spawn_app().await;
    app.admin_create("/category", json!({ "name": "Garden" })).await;

    let response = app
        .admin_post("/category", &json!({ "name": "Garden" }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["name"].is_array());
}

#[tokio::test]
async fn test_public_category_list_hides_inactive() {
    let app = spawn_app().await;
    app.admin_create("/category", json!({ "name": "Visible" })).await;
    app.admin_create("/category", json!({ "name": "Hidden", "is_active": false }))
        .await;

    let body: Value = app.get("/category").await.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Visible"]);

    let all: Value = app.admin_get("/category").await.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_inactive_category_is_not_found() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    create_product(&app, &seed, "Rake", "10.00", 1).await;

    let response = app.get(&format!("/category/{}", seed.category_slug)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["products"]["status"], "found");

    let response = app
        .admin_put(&format!("/category/{}", seed.category_id), &json!({ "is_active": false }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&format!("/category/{}", seed.category_slug)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/category/no-such-thing").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_referenced_manufacturer_is_refused() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let product = create_product(&app, &seed, "Shovel", "25.00", 4).await;

    let response = app
        .admin_delete(&format!("/manufacturer/{}", seed.manufacturer_id))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let manufacturers: Value = app.get("/manufacturer").await.json().await.unwrap();
    assert_eq!(manufacturers.as_array().unwrap().len(), 1);
    let detail: Value = app
        .get(&format!("/product/{}", product["slug"].as_str().unwrap()))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["manufacturer"]["id"], seed.manufacturer_id);
}

#[tokio::test]
async fn test_deleting_referenced_product_type_is_refused() {
    let app = spawn_app().await;
    let seed = seed(&app).await;

    // still has technical data items
    let response = app
        .admin_delete(&format!("/product-type/{}", seed.product_type_id))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let unused = app
        .admin_create("/product-type", json!({ "name": "Unused" }))
        .await;
    let response = app
        .admin_delete(&format!("/product-type/{}", unused["id"]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deleting_unused_manufacturer_and_category() {
    let app = spawn_app().await;
    let category = app.admin_create("/category", json!({ "name": "Spare" })).await;
    let manufacturer = app
        .admin_create("/manufacturer", json!({ "name": "Nobody", "country": "Chile" }))
        .await;

    let response = app.admin_delete(&format!("/category/{}", category["id"])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .admin_delete(&format!("/manufacturer/{}", manufacturer["id"]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.admin_delete(&format!("/category/{}", category["id"])).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_discount_keeps_its_products() {
    let app = spawn_app().await;
    let seed = seed(&app).await;
    let discount = app
        .admin_create("/discount", json!({ "amount": 15, "reason": "Spring sale" }))
        .await;

    let mut form = common::product_form(&seed, "Hoe", "30.00", 2);
    form["discount_id"] = discount["id"].clone();
    let product = app.admin_create("/product", form).await;
    assert_eq!(product["discount"]["amount"], 15);

    let response = app.admin_delete(&format!("/discount/{}", discount["id"])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail: Value = app
        .admin_get(&format!("/product/{}", product["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["discount_id"], Value::Null);
    assert_eq!(detail["discount"], Value::Null);
}

#[tokio::test]
async fn test_negative_discount_is_rejected() {
    let app = spawn_app().await;
    let response = app
        .admin_post("/discount", &json!({ "amount": -5, "reason": "oops" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["amount"].is_array());
}

#[tokio::test]
async fn test_admin_routes_require_a_valid_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.admin_url("/category"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .get(app.admin_url("/category"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = rust_store::middleware::auth::generate_token(
        "staff",
        "another-secret",
        chrono::Duration::hours(1),
    )
    .unwrap();
    let response = app
        .client
        .get(app.admin_url("/category"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // public routes stay open
    assert_eq!(app.get("/category").await.status(), StatusCode::OK);
}
