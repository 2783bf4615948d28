#![allow(dead_code)]

use chrono::Duration;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use rust_store::config::Config;
use rust_store::entities::setup_schema;
use rust_store::middleware::auth::generate_token;
use rust_store::services::procedures::{ProcedureGateway, SqlProcedures};
use rust_store::{app, connect, AppState};

pub const SECRET: &str = "test-secret";
pub const FILE_SIZE_LIMIT: usize = 1024;

pub struct TestApp {
    pub base: String,
    pub client: Client,
    pub token: String,
    pub state: AppState,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|db| Arc::new(SqlProcedures::new(db))).await
}

/// Same as `spawn_app`, with the procedure layer swapped for whatever
/// `procedures` builds.
pub async fn spawn_app_with<F>(procedures: F) -> TestApp
where
    F: FnOnce(Arc<sea_orm::DatabaseConnection>) -> Arc<dyn ProcedureGateway>,
{
    let dir = tempfile::tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).unwrap();

    let config = Config {
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("store.db").display()),
        secret: SECRET.to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        upload_dir,
        file_size_limit: FILE_SIZE_LIMIT,
    };

    let db = connect(&config).await.unwrap();
    setup_schema(&db).await.unwrap();
    let db = Arc::new(db);

    let state = AppState {
        procedures: procedures(db.clone()),
        db,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}/api"),
        client: Client::new(),
        token: generate_token("staff", SECRET, Duration::hours(1)).unwrap(),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("{}/admin{}", self.base, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn admin_get(&self, path: &str) -> Response {
        self.authed(self.client.get(self.admin_url(path)))
            .send()
            .await
            .unwrap()
    }

    pub async fn admin_post(&self, path: &str, body: &Value) -> Response {
        self.authed(self.client.post(self.admin_url(path)))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn admin_put(&self, path: &str, body: &Value) -> Response {
        self.authed(self.client.put(self.admin_url(path)))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    pub async fn admin_delete(&self, path: &str) -> Response {
        self.authed(self.client.delete(self.admin_url(path)))
            .send()
            .await
            .unwrap()
    }

    /// POSTs and expects `201 Created`, returning the body.
    pub async fn admin_create(&self, path: &str, body: Value) -> Value {
        let response = self.admin_post(path, &body).await;
        let status = response.status();
        let body: Value = response.json().await.unwrap();
        assert_eq!(status, StatusCode::CREATED, "POST {path} answered {body}");
        body
    }
}

/// Reference data most product tests need.
pub struct Seed {
    pub category_id: i64,
    pub category_slug: String,
    pub manufacturer_id: i64,
    pub product_type_id: i64,
    pub color_id: i64,
    pub finish_id: i64,
    pub weight_id: i64,
}

pub async fn seed(app: &TestApp) -> Seed {
    let category = app
        .admin_create("/category", json!({ "name": "Garden Tools" }))
        .await;
    let manufacturer = app
        .admin_create("/manufacturer", json!({ "name": "Acme", "country": "Norway" }))
        .await;
    let product_type = app
        .admin_create("/product-type", json!({ "name": "Paint" }))
        .await;
    let type_path = format!("/product-type/{}/technical-data", product_type["id"]);
    let color = app.admin_create(&type_path, json!({ "name": "color" })).await;
    let finish = app.admin_create(&type_path, json!({ "name": "finish" })).await;
    let weight = app.admin_create(&type_path, json!({ "name": "weight" })).await;

    Seed {
        category_id: category["id"].as_i64().unwrap(),
        category_slug: category["slug"].as_str().unwrap().to_string(),
        manufacturer_id: manufacturer["id"].as_i64().unwrap(),
        product_type_id: product_type["id"].as_i64().unwrap(),
        color_id: color["id"].as_i64().unwrap(),
        finish_id: finish["id"].as_i64().unwrap(),
        weight_id: weight["id"].as_i64().unwrap(),
    }
}

pub fn product_form(seed: &Seed, name: &str, price: &str, count: i64) -> Value {
    json!({
        "name": name,
        "description": "",
        "price": price,
        "warranty": 12,
        "count": count,
        "category_id": seed.category_id,
        "manufacturer_id": seed.manufacturer_id,
        "product_type_id": seed.product_type_id,
    })
}

pub async fn create_product(app: &TestApp, seed: &Seed, name: &str, price: &str, count: i64) -> Value {
    app.admin_create("/product", product_form(seed, name, price, count))
        .await
}
