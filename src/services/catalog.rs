//! Administrative CRUD over the catalog reference data.
//!
//! Uniqueness is checked up front so the caller gets a field-level error, and the
//! database constraint is still mapped in case two writers race. Deletes of rows
//! that products still point at are refused.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, Value,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::entities::{
    category, discount, manufacturer, product, product_image, product_type, technical_data,
};
use crate::error::{field_errors, push_field_error, ApiError, FieldErrors};
use crate::slug::slugify;

#[derive(Deserialize, Validate, Debug)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Validate, Debug)]
pub struct CategoryPatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Validate, Debug)]
pub struct NewManufacturer {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub country: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct ManufacturerPatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub country: Option<String>,
}

#[derive(Deserialize, Validate, Debug)]
pub struct NewProductType {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Validate, Debug)]
pub struct ProductTypePatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Validate, Debug)]
pub struct NewTechnicalData {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct DiscountForm {
    #[validate(range(min = 0, message = "Discount amount cannot be negative"))]
    pub amount: i32,
    pub reason: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct DiscountPatch {
    #[validate(range(min = 0, message = "Discount amount cannot be negative"))]
    pub amount: Option<i32>,
    pub reason: Option<String>,
}

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|errors| ApiError::Validation(field_errors(&errors)))
}

#[derive(Clone)]
pub struct CatalogStore {
    db: Arc<DatabaseConnection>,
}

impl CatalogStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // Categories

    pub async fn categories(&self, only_active: bool) -> Result<Vec<category::Model>, ApiError> {
        let mut query = category::Entity::find().order_by_asc(category::Column::Name);
        if only_active {
            query = query.filter(category::Column::IsActive.eq(true));
        }
        Ok(query.all(&*self.db).await?)
    }

    pub async fn create_category(&self, payload: NewCategory) -> Result<category::Model, ApiError> {
        validate_payload(&payload)?;
        let slug = category_slug(payload.slug.as_deref(), &payload.name)?;

        let txn = self.db.begin().await?;
        ensure_category_free(&txn, &payload.name, &slug, None).await?;

        let model = category::ActiveModel {
            name: Set(payload.name),
            slug: Set(slug),
            is_active: Set(payload.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|err| ApiError::from_write(err, "name", "Category"))?;
        txn.commit().await?;

        info!(category_id = model.id, slug = %model.slug, "Created category");
        Ok(model)
    }

    pub async fn update_category(&self, id: i32, payload: CategoryPatch) -> Result<category::Model, ApiError> {
        validate_payload(&payload)?;
        let txn = self.db.begin().await?;
        let current = category::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("category", format!("id {id}")))?;

        let name = payload.name.unwrap_or_else(|| current.name.clone());
        let slug = match payload.slug.as_deref() {
            Some(slug) => category_slug(Some(slug), &name)?,
            None => current.slug.clone(),
        };
        ensure_category_free(&txn, &name, &slug, Some(id)).await?;

        let mut active: category::ActiveModel = current.into();
        active.name = Set(name);
        active.slug = Set(slug);
        if let Some(is_active) = payload.is_active {
            active.is_active = Set(is_active);
        }
        let model = active
            .update(&txn)
            .await
            .map_err(|err| ApiError::from_write(err, "name", "Category"))?;
        txn.commit().await?;
        Ok(model)
    }

    pub async fn delete_category(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;
        let current = category::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("category", format!("id {id}")))?;

        let products = product::find_all()
            .filter(product::Column::CategoryId.eq(id))
            .count(&txn)
            .await?;
        ensure_unreferenced(products, "Category", "products")?;

        category::Entity::delete_by_id(current.id)
            .exec(&txn)
            .await
            .map_err(|err| ApiError::from_write(err, "id", "Category"))?;
        txn.commit().await?;
        info!(category_id = id, "Deleted category");
        Ok(())
    }

    // Manufacturers. Creation goes through the procedure gateway.

    pub async fn manufacturers(&self) -> Result<Vec<manufacturer::Model>, ApiError> {
        Ok(manufacturer::Entity::find()
            .order_by_asc(manufacturer::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn update_manufacturer(
        &self,
        id: i32,
        payload: ManufacturerPatch,
    ) -> Result<manufacturer::Model, ApiError> {
        validate_payload(&payload)?;
        let current = manufacturer::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("manufacturer", format!("id {id}")))?;

        let mut active: manufacturer::ActiveModel = current.into();
        if let Some(name) = payload.name {
            active.name = Set(name);
        }
        if let Some(country) = payload.country {
            active.country = Set(country);
        }
        Ok(active.update(&*self.db).await?)
    }

    pub async fn delete_manufacturer(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;
        manufacturer::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("manufacturer", format!("id {id}")))?;

        let products = product::find_all()
            .filter(product::Column::ManufacturerId.eq(id))
            .count(&txn)
            .await?;
        ensure_unreferenced(products, "Manufacturer", "products")?;

        manufacturer::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|err| ApiError::from_write(err, "id", "Manufacturer"))?;
        txn.commit().await?;
        info!(manufacturer_id = id, "Deleted manufacturer");
        Ok(())
    }

    // Product types and their technical data items

    pub async fn product_types(&self) -> Result<Vec<product_type::Model>, ApiError> {
        Ok(product_type::Entity::find()
            .order_by_asc(product_type::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn create_product_type(&self, payload: NewProductType) -> Result<product_type::Model, ApiError> {
        validate_payload(&payload)?;
        let txn = self.db.begin().await?;
        ensure_product_type_free(&txn, &payload.name, None).await?;
        let model = product_type::ActiveModel {
            name: Set(payload.name),
            is_active: Set(payload.is_active.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|err| ApiError::from_write(err, "name", "Product type"))?;
        txn.commit().await?;
        Ok(model)
    }

    pub async fn update_product_type(
        &self,
        id: i32,
        payload: ProductTypePatch,
    ) -> Result<product_type::Model, ApiError> {
        validate_payload(&payload)?;
        let txn = self.db.begin().await?;
        let current = product_type::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("product type", format!("id {id}")))?;

        let mut active: product_type::ActiveModel = current.into();
        if let Some(name) = payload.name {
            ensure_product_type_free(&txn, &name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(is_active) = payload.is_active {
            active.is_active = Set(is_active);
        }
        let model = active
            .update(&txn)
            .await
            .map_err(|err| ApiError::from_write(err, "name", "Product type"))?;
        txn.commit().await?;
        Ok(model)
    }

    pub async fn delete_product_type(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;
        product_type::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("product type", format!("id {id}")))?;

        let products = product::find_all()
            .filter(product::Column::ProductTypeId.eq(id))
            .count(&txn)
            .await?;
        ensure_unreferenced(products, "Product type", "products")?;

        let items = technical_data::Entity::find()
            .filter(technical_data::Column::ProductTypeId.eq(id))
            .count(&txn)
            .await?;
        ensure_unreferenced(items, "Product type", "technical data items")?;

        product_type::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|err| ApiError::from_write(err, "id", "Product type"))?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn technical_data(&self, product_type_id: i32) -> Result<Vec<technical_data::Model>, ApiError> {
        product_type::Entity::find_by_id(product_type_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("product type", format!("id {product_type_id}")))?;

        Ok(technical_data::Entity::find()
            .filter(technical_data::Column::ProductTypeId.eq(product_type_id))
            .order_by_asc(technical_data::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn create_technical_data(
        &self,
        product_type_id: i32,
        payload: NewTechnicalData,
    ) -> Result<technical_data::Model, ApiError> {
        validate_payload(&payload)?;
        product_type::Entity::find_by_id(product_type_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("product type", format!("id {product_type_id}")))?;

        Ok(technical_data::ActiveModel {
            name: Set(payload.name),
            product_type_id: Set(product_type_id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?)
    }

    /// Values recorded against the item go with it.
    pub async fn delete_technical_data(&self, id: i32) -> Result<(), ApiError> {
        let result = technical_data::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ApiError::not_found("technical data item", format!("id {id}")));
        }
        Ok(())
    }

    // Discounts

    pub async fn discounts(&self) -> Result<Vec<discount::Model>, ApiError> {
        Ok(discount::Entity::find()
            .order_by_asc(discount::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn create_discount(&self, payload: DiscountForm) -> Result<discount::Model, ApiError> {
        validate_payload(&payload)?;
        Ok(discount::ActiveModel {
            amount: Set(payload.amount),
            reason: Set(payload.reason),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?)
    }

    pub async fn update_discount(&self, id: i32, payload: DiscountPatch) -> Result<discount::Model, ApiError> {
        validate_payload(&payload)?;
        let current = discount::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("discount", format!("id {id}")))?;

        let mut active: discount::ActiveModel = current.into();
        if let Some(amount) = payload.amount {
            active.amount = Set(amount);
        }
        if let Some(reason) = payload.reason {
            active.reason = Set(reason);
        }
        Ok(active.update(&*self.db).await?)
    }

    /// Products that carried the discount keep existing without one.
    pub async fn delete_discount(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;
        discount::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("discount", format!("id {id}")))?;

        product::Entity::update_many()
            .col_expr(product::Column::DiscountId, Expr::value(Value::Int(None)))
            .filter(product::Column::DiscountId.eq(id))
            .exec(&txn)
            .await?;
        discount::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    // Products

    /// Deletes the product with its values, images and shipment lines. Returns the
    /// stored image names so the caller can drop the files.
    pub async fn delete_product(&self, id: i32) -> Result<Vec<String>, ApiError> {
        let txn = self.db.begin().await?;
        product::find_all()
            .filter(product::Column::Id.eq(id))
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("product", format!("id {id}")))?;

        let images = product_image_names(&txn, id).await?;
        product::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(product_id = id, images = images.len(), "Deleted product");
        Ok(images)
    }

    pub async fn image_names(&self, product_id: i32) -> Result<Vec<String>, ApiError> {
        Ok(product_image_names(&*self.db, product_id).await?)
    }
}

async fn product_image_names<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<Vec<String>, sea_orm::DbErr> {
    Ok(product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .all(db)
        .await?
        .iter()
        .map(product_image::Model::stored_name)
        .collect())
}

fn category_slug(requested: Option<&str>, name: &str) -> Result<String, ApiError> {
    let slug = slugify(requested.unwrap_or(name));
    if slug.is_empty() {
        let mut errors = FieldErrors::new();
        push_field_error(&mut errors, "slug", "Slug must contain letters or digits");
        return Err(ApiError::Validation(errors));
    }
    Ok(slug)
}

async fn ensure_category_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    slug: &str,
    exclude: Option<i32>,
) -> Result<(), ApiError> {
    let mut by_name = category::Entity::find().filter(category::Column::Name.eq(name));
    let mut by_slug = category::Entity::find().filter(category::Column::Slug.eq(slug));
    if let Some(id) = exclude {
        by_name = by_name.filter(category::Column::Id.ne(id));
        by_slug = by_slug.filter(category::Column::Id.ne(id));
    }
    if by_name.one(db).await?.is_some() {
        return Err(ApiError::unique("name", "Category with this name already exists"));
    }
    if by_slug.one(db).await?.is_some() {
        return Err(ApiError::unique("slug", "Category with this slug already exists"));
    }
    Ok(())
}

async fn ensure_product_type_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude: Option<i32>,
) -> Result<(), ApiError> {
    let mut query = product_type::Entity::find().filter(product_type::Column::Name.eq(name));
    if let Some(id) = exclude {
        query = query.filter(product_type::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(ApiError::unique("name", "Product type with this name already exists"));
    }
    Ok(())
}

fn ensure_unreferenced(references: u64, what: &str, by: &str) -> Result<(), ApiError> {
    if references > 0 {
        return Err(ApiError::ReferentialIntegrity(format!(
            "{what} is still used by {references} {by}"
        )));
    }
    Ok(())
}
