use axum::routing::get;
use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Router,
};
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

pub fn uploads_router() -> Router {
    Router::new().route("/image/:id", get(print_image))
}

pub async fn print_image(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let (image, path) = state.images().locate(id).await?;

    let file = tokio::fs::File::open(&path).await.map_err(|err| {
        warn!(image_id = id, path = %path.display(), error = %err, "Image file is missing");
        ApiError::not_found("image", format!("id {id}"))
    })?;

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = format!("inline; filename=\"{}\"", image.file_name.replace('"', ""));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).unwrap_or(HeaderValue::from_static("inline")),
    );

    Ok((headers, body))
}
