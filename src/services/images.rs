use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::product;
use crate::entities::product_image::{self, FileExtension};
use crate::error::{push_field_error, ApiError, FieldErrors};

/// A file taken off a multipart request, not yet stored.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub description: String,
    pub main: bool,
}

#[derive(Clone)]
pub struct ImageService {
    db: Arc<DatabaseConnection>,
    upload_dir: PathBuf,
    file_size_limit: usize,
}

impl ImageService {
    pub fn new(db: Arc<DatabaseConnection>, upload_dir: PathBuf, file_size_limit: usize) -> Self {
        Self {
            db,
            upload_dir,
            file_size_limit,
        }
    }

    /// Stores the blob under a fresh uuid and records it. A main image takes the
    /// flag away from the product's other images.
    pub async fn attach(&self, product_id: i32, upload: ImageUpload) -> Result<product_image::Model, ApiError> {
        let extension = FileExtension::from_content_type(&upload.content_type)
            .ok_or_else(|| ApiError::BadRequest("Unsupported content type.".to_string()))?;
        if upload.data.len() > self.file_size_limit {
            return Err(ApiError::PayloadTooLarge);
        }
        if upload.description.chars().count() > 255 {
            let mut errors = FieldErrors::new();
            push_field_error(&mut errors, "desc_image", "Description must be at most 255 characters long");
            return Err(ApiError::Validation(errors));
        }

        let txn = self.db.begin().await?;
        product::find_all()
            .filter(product::Column::Id.eq(product_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("product", format!("id {product_id}")))?;

        if upload.main {
            product_image::Entity::update_many()
                .col_expr(product_image::Column::MainImage, Expr::value(false))
                .filter(product_image::Column::ProductId.eq(product_id))
                .exec(&txn)
                .await?;
        }

        let path_name = Uuid::new_v4().to_string();
        let model = product_image::ActiveModel {
            product_id: Set(product_id),
            path_name: Set(path_name),
            extension: Set(extension),
            file_name: Set(upload.file_name),
            desc_image: Set(upload.description),
            main_image: Set(upload.main),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let path = self.upload_dir.join(model.stored_name());
        if let Err(err) = tokio::fs::write(&path, &upload.data).await {
            txn.rollback().await?;
            warn!(path = %path.display(), error = %err, "Failed to write image");
            return Err(ApiError::BadRequest("Failed to store the file.".to_string()));
        }
        txn.commit().await?;

        info!(image_id = model.id, product_id, main = model.main_image, "Stored image");
        Ok(model)
    }

    /// The image row and where its blob lives.
    pub async fn locate(&self, id: i32) -> Result<(product_image::Model, PathBuf), ApiError> {
        let model = product_image::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("image", format!("id {id}")))?;
        let path = self.upload_dir.join(model.stored_name());
        Ok((model, path))
    }

    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let (model, path) = self.locate(id).await?;
        product_image::Entity::delete_by_id(model.id)
            .exec(&*self.db)
            .await?;
        remove_file(&path).await;
        Ok(())
    }

    /// Drops blobs whose rows are already gone.
    pub async fn remove_stored(&self, names: &[String]) {
        for name in names {
            remove_file(&self.upload_dir.join(name)).await;
        }
    }
}

async fn remove_file(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %err, "Failed to remove image file");
    }
}
