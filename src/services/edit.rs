//! Create and update of a product together with its technical values.
//!
//! Everything is validated before the first write. The product row and the value
//! rows are then written in one transaction: either the whole submission lands or
//! none of it does.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::entities::{
    category, discount, manufacturer, product, product_type, technical_data, technical_data_value,
};
use crate::error::{field_errors, push_field_error, ApiError, FieldErrors};
use crate::services::listing::{load_detail, ProductDetail};
use crate::slug::slugify;

/// Largest price a `decimal(8, 2)` column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

#[derive(Debug, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters long"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Warranty cannot be negative"))]
    pub warranty: i32,
    #[validate(range(min = 0, message = "Count cannot be negative"))]
    pub count: i32,
    pub category_id: i32,
    pub manufacturer_id: i32,
    pub product_type_id: i32,
    pub discount_id: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub technical_values: Vec<TechnicalValueLine>,
}

/// One row of the technical values table. No `id` means a new row; `delete`
/// removes an existing one.
#[derive(Debug, Deserialize, Validate)]
pub struct TechnicalValueLine {
    pub id: Option<i32>,
    pub technical_data_id: i32,
    #[validate(length(max = 255, message = "Value must be at most 255 characters long"))]
    pub value: String,
    #[serde(default)]
    pub delete: bool,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("price").with_message("Price cannot be negative".into()));
    }
    if *price > MAX_PRICE {
        return Err(ValidationError::new("price").with_message("Price cannot exceed 999999.99".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new("price").with_message("Price has at most two decimal places".into()));
    }
    Ok(())
}

#[derive(Debug)]
pub enum EditOutcome {
    Saved(ProductDetail),
    Rejected(FieldErrors),
}

#[derive(Clone)]
pub struct ProductEditWorkflow {
    db: Arc<DatabaseConnection>,
}

impl ProductEditWorkflow {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, form: ProductForm) -> Result<EditOutcome, ApiError> {
        self.run(None, form).await
    }

    pub async fn update(&self, id: i32, form: ProductForm) -> Result<EditOutcome, ApiError> {
        self.run(Some(id), form).await
    }

    async fn run(&self, id: Option<i32>, form: ProductForm) -> Result<EditOutcome, ApiError> {
        let txn = self.db.begin().await?;

        let shell = match id {
            Some(id) => Some(
                product::find_all()
                    .filter(product::Column::Id.eq(id))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ApiError::not_found("product", format!("id {id}")))?,
            ),
            None => None,
        };

        let existing = match &shell {
            Some(product) => technical_data_value::Entity::find()
                .filter(technical_data_value::Column::ProductId.eq(product.id))
                .all(&txn)
                .await?,
            None => Vec::new(),
        };

        let errors = validate(&txn, &form, &existing).await?;
        if !errors.is_empty() {
            txn.rollback().await?;
            return Ok(EditOutcome::Rejected(errors));
        }

        let slug = slugify(&form.name);
        let mut taken = product::find_all().filter(product::Column::Slug.eq(slug.as_str()));
        if let Some(product) = &shell {
            taken = taken.filter(product::Column::Id.ne(product.id));
        }
        if taken.one(&txn).await?.is_some() {
            txn.rollback().await?;
            return Err(ApiError::unique(
                "name",
                format!("Product with slug '{slug}' already exists"),
            ));
        }

        let inserting = shell.is_none();
        let mut active: product::ActiveModel = match shell {
            Some(product) => product.into(),
            None => Default::default(),
        };
        active.name = Set(form.name);
        active.description = Set(form.description);
        active.price = Set(form.price);
        active.warranty = Set(form.warranty);
        active.count = Set(form.count);
        active.category_id = Set(form.category_id);
        active.manufacturer_id = Set(form.manufacturer_id);
        active.product_type_id = Set(form.product_type_id);
        active.discount_id = Set(form.discount_id);
        if let Some(is_active) = form.is_active {
            active.is_active = Set(is_active);
        }

        let saved = if inserting {
            active.insert(&txn).await
        } else {
            active.update(&txn).await
        }
        .map_err(|err| ApiError::from_write(err, "name", "Product"))?;

        reconcile(&txn, saved.id, &form.technical_values, &existing).await?;

        let detail = load_detail(&txn, saved).await?;
        txn.commit().await?;

        info!(
            product_id = detail.product.id,
            slug = %detail.product.slug,
            created = inserting,
            values = detail.technical_values.len(),
            "Saved product"
        );
        Ok(EditOutcome::Saved(detail))
    }
}

/// Field checks plus every reference the form makes. Collects all problems
/// instead of stopping at the first.
async fn validate(
    txn: &DatabaseTransaction,
    form: &ProductForm,
    existing: &[technical_data_value::Model],
) -> Result<FieldErrors, ApiError> {
    let mut errors = match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errs) => field_errors(&errs),
    };

    if !errors.contains_key("name") && slugify(&form.name).is_empty() {
        push_field_error(&mut errors, "name", "Name must contain letters or digits");
    }

    if category::Entity::find_by_id(form.category_id).one(txn).await?.is_none() {
        push_field_error(&mut errors, "category_id", "Unknown category");
    }
    if manufacturer::Entity::find_by_id(form.manufacturer_id)
        .one(txn)
        .await?
        .is_none()
    {
        push_field_error(&mut errors, "manufacturer_id", "Unknown manufacturer");
    }
    if product_type::Entity::find_by_id(form.product_type_id)
        .one(txn)
        .await?
        .is_none()
    {
        push_field_error(&mut errors, "product_type_id", "Unknown product type");
    }
    if let Some(discount_id) = form.discount_id {
        if discount::Entity::find_by_id(discount_id).one(txn).await?.is_none() {
            push_field_error(&mut errors, "discount_id", "Unknown discount");
        }
    }

    let wanted: Vec<i32> = form
        .technical_values
        .iter()
        .filter(|line| !line.delete)
        .map(|line| line.technical_data_id)
        .collect();
    let items: HashMap<i32, technical_data::Model> = if wanted.is_empty() {
        HashMap::new()
    } else {
        technical_data::Entity::find()
            .filter(technical_data::Column::Id.is_in(wanted))
            .all(txn)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect()
    };

    let owned: HashSet<i32> = existing.iter().map(|row| row.id).collect();
    let mut seen = HashSet::new();

    for (index, line) in form.technical_values.iter().enumerate() {
        let field = |name: &str| format!("technical_values[{index}].{name}");

        if let Some(id) = line.id {
            if !owned.contains(&id) {
                push_field_error(&mut errors, field("id"), "Value does not belong to this product");
            } else if !seen.insert(id) {
                push_field_error(&mut errors, field("id"), "Value is listed more than once");
            }
        }
        if line.delete {
            continue;
        }

        if line.value.trim().is_empty() {
            push_field_error(&mut errors, field("value"), "Value is required");
        }
        match items.get(&line.technical_data_id) {
            None => push_field_error(&mut errors, field("technical_data_id"), "Unknown technical data item"),
            Some(item) if item.product_type_id != form.product_type_id => push_field_error(
                &mut errors,
                field("technical_data_id"),
                format!("'{}' does not belong to the product's type", item.name),
            ),
            Some(_) => {}
        }
    }

    Ok(errors)
}

/// Makes the stored values match the submission: listed rows are updated,
/// new rows inserted, everything else removed.
async fn reconcile(
    txn: &DatabaseTransaction,
    product_id: i32,
    lines: &[TechnicalValueLine],
    existing: &[technical_data_value::Model],
) -> Result<(), ApiError> {
    let mut kept = HashSet::new();

    for line in lines.iter().filter(|line| !line.delete) {
        match line.id {
            Some(id) => {
                technical_data_value::ActiveModel {
                    id: sea_orm::ActiveValue::Unchanged(id),
                    product_id: Set(product_id),
                    technical_data_id: Set(line.technical_data_id),
                    value: Set(line.value.clone()),
                }
                .update(txn)
                .await?;
                kept.insert(id);
            }
            None => {
                technical_data_value::ActiveModel {
                    product_id: Set(product_id),
                    technical_data_id: Set(line.technical_data_id),
                    value: Set(line.value.clone()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }
    }

    let stale: Vec<i32> = existing
        .iter()
        .map(|row| row.id)
        .filter(|id| !kept.contains(id))
        .collect();
    if !stale.is_empty() {
        technical_data_value::Entity::delete_many()
            .filter(technical_data_value::Column::Id.is_in(stale))
            .exec(txn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn price(raw: &str) -> Result<(), ValidationError> {
        validate_price(&Decimal::from_str(raw).unwrap())
    }

    #[test]
    fn max_price_is_six_digits_and_cents() {
        assert_eq!(MAX_PRICE.to_string(), "999999.99");
    }

    #[test]
    fn accepts_prices_in_range() {
        assert!(price("0").is_ok());
        assert!(price("19.99").is_ok());
        assert!(price("999999.99").is_ok());
        assert!(price("5.50").is_ok());
    }

    #[test]
    fn rejects_prices_out_of_range() {
        assert!(price("-0.01").is_err());
        assert!(price("1000000").is_err());
        assert!(price("1.999").is_err());
    }
}
