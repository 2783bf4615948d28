use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::images::ImageUpload;
use crate::AppState;

/// Room for the text fields that travel with the file.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn admin_image_router(file_size_limit: usize) -> Router {
    Router::new()
        .route(
            "/product/:id/image",
            post(upload).layer(DefaultBodyLimit::max(file_size_limit + FORM_OVERHEAD)),
        )
        .route("/image/:id", delete(delete_image))
}

/// Multipart form: `file` (the image), optional `desc_image` and `main_image`.
async fn upload(
    Path(product_id): Path<i32>,
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file = None;
    let mut description = String::new();
    let mut main = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(str::to_owned)
                    .ok_or_else(|| ApiError::BadRequest("Content type is not set.".to_string()))?;
                let file_name = field.file_name().unwrap_or("image").to_owned();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            "desc_image" => description = field.text().await.map_err(multipart_error)?,
            "main_image" => {
                let raw = field.text().await.map_err(multipart_error)?;
                main = matches!(raw.trim(), "true" | "1" | "on");
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file was sent.".to_string()))?;

    let image = state
        .images()
        .attach(
            product_id,
            ImageUpload {
                file_name,
                content_type,
                data,
                description,
                main,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_image(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state.images().delete(id).await?;
    Ok(Json(json!({
        "message": "Image deleted successfully."
    })))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
