use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_store::config::Config;
use rust_store::entities::setup_schema;
use rust_store::services::procedures::SqlProcedures;
use rust_store::{app, connect, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let db = connect(&config).await?;
    setup_schema(&db).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let db = Arc::new(db);
    let state = AppState {
        procedures: Arc::new(SqlProcedures::new(db.clone())),
        db,
        config: Arc::new(config.clone()),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
