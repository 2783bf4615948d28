use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::Serialize;
use std::sync::Arc;

use crate::entities::{
    category, discount, manufacturer, product, product_image, product_type, technical_data,
    technical_data_value,
};
use crate::error::ApiError;

pub const PAGE_SIZE: u64 = 10;

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// What a listing screen gets back: a page of results, or nothing to show.
#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "page", rename_all = "snake_case")]
pub enum Listing<T> {
    Found(Page<T>),
    Empty,
}

impl<T> Listing<T> {
    pub fn page(&self) -> Option<&Page<T>> {
        match self {
            Listing::Found(page) => Some(page),
            Listing::Empty => None,
        }
    }
}

/// Page number to serve. Anything that is not an integer gives the first page,
/// anything outside `1..=num_pages` gives the last one.
pub fn resolve_page(requested: Option<&str>, num_pages: u64) -> u64 {
    let last = num_pages.max(1);
    let Some(raw) = requested else {
        return 1;
    };
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(number) if number < 1 || number as u64 > last => last,
        Ok(number) => number as u64,
        Err(_) if is_integer(raw) => last,
        Err(_) => 1,
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub warranty: i32,
    pub count: i32,
    pub is_active: bool,
    pub category_id: i32,
    pub manufacturer_id: i32,
    pub discount_id: Option<i32>,
    pub updated_in: DateTime<Utc>,
}

impl From<product::Model> for ProductCard {
    fn from(value: product::Model) -> Self {
        ProductCard {
            id: value.id,
            name: value.name,
            slug: value.slug,
            price: value.price,
            warranty: value.warranty,
            count: value.count,
            is_active: value.is_active,
            category_id: value.category_id,
            manufacturer_id: value.manufacturer_id,
            discount_id: value.discount_id,
            updated_in: value.updated_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TechnicalValue {
    pub id: i32,
    pub technical_data_id: i32,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub category: category::Model,
    pub manufacturer: manufacturer::Model,
    pub product_type: product_type::Model,
    pub discount: Option<discount::Model>,
    pub technical_values: Vec<TechnicalValue>,
    pub images: Vec<product_image::Model>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListing {
    pub category: category::Model,
    pub products: Listing<ProductCard>,
}

#[derive(Debug, Serialize)]
pub struct ManufacturerListing {
    pub manufacturer: manufacturer::Model,
    pub products: Listing<ProductCard>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ListFilter {
    pub discounted: Option<bool>,
}

pub fn newest_first(query: Select<product::Entity>) -> Select<product::Entity> {
    query
        .order_by_desc(product::Column::CreatedIn)
        .order_by_desc(product::Column::Id)
}

/// Runs `query` through a paginator of `PAGE_SIZE` rows.
pub async fn paginate<C: ConnectionTrait>(
    db: &C,
    query: Select<product::Entity>,
    page: Option<&str>,
) -> Result<Listing<ProductCard>, DbErr> {
    let paginator = query.paginate(db, PAGE_SIZE);
    let counts = paginator.num_items_and_pages().await?;
    if counts.number_of_items == 0 {
        return Ok(Listing::Empty);
    }

    let number = resolve_page(page, counts.number_of_pages);
    let items = paginator
        .fetch_page(number - 1)
        .await?
        .into_iter()
        .map(ProductCard::from)
        .collect();

    Ok(Listing::Found(Page {
        items,
        number,
        num_pages: counts.number_of_pages,
        total: counts.number_of_items,
        has_next: number < counts.number_of_pages,
        has_previous: number > 1,
    }))
}

/// Loads everything the product page shows.
pub async fn load_detail<C: ConnectionTrait>(db: &C, product: product::Model) -> Result<ProductDetail, DbErr> {
    let category = product
        .find_related(category::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("category {}", product.category_id)))?;
    let manufacturer = product
        .find_related(manufacturer::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("manufacturer {}", product.manufacturer_id)))?;
    let product_type = product
        .find_related(product_type::Entity)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("product type {}", product.product_type_id)))?;
    let discount = match product.discount_id {
        Some(id) => discount::Entity::find_by_id(id).one(db).await?,
        None => None,
    };

    let technical_values = technical_data_value::Entity::find()
        .filter(technical_data_value::Column::ProductId.eq(product.id))
        .find_also_related(technical_data::Entity)
        .order_by_asc(technical_data_value::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(value, data)| TechnicalValue {
            id: value.id,
            technical_data_id: value.technical_data_id,
            name: data.map(|d| d.name).unwrap_or_default(),
            value: value.value,
        })
        .collect();

    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product.id))
        .order_by_desc(product_image::Column::MainImage)
        .order_by_asc(product_image::Column::Id)
        .all(db)
        .await?;

    Ok(ProductDetail {
        product,
        category,
        manufacturer,
        product_type,
        discount,
        technical_values,
        images,
    })
}

#[derive(Clone)]
pub struct ListingService {
    db: Arc<DatabaseConnection>,
}

impl ListingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active products, newest first.
    pub async fn list_all(&self, filter: ListFilter, page: Option<&str>) -> Result<Listing<ProductCard>, ApiError> {
        let mut query = product::find_active();
        match filter.discounted {
            Some(true) => query = query.filter(product::Column::DiscountId.is_not_null()),
            Some(false) => query = query.filter(product::Column::DiscountId.is_null()),
            None => {}
        }
        Ok(paginate(&*self.db, newest_first(query), page).await?)
    }

    /// Every product regardless of its active flag.
    pub async fn list_admin(&self, page: Option<&str>) -> Result<Listing<ProductCard>, ApiError> {
        Ok(paginate(&*self.db, newest_first(product::find_all()), page).await?)
    }

    pub async fn list_by_category(&self, slug: &str, page: Option<&str>) -> Result<CategoryListing, ApiError> {
        let category = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("category", format!("slug {slug}")))?;

        let query = product::find_active().filter(product::Column::CategoryId.eq(category.id));
        let products = paginate(&*self.db, newest_first(query), page).await?;
        Ok(CategoryListing { category, products })
    }

    pub async fn list_by_manufacturer(&self, id: i32, page: Option<&str>) -> Result<ManufacturerListing, ApiError> {
        let manufacturer = manufacturer::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("manufacturer", format!("id {id}")))?;

        let query = product::find_active().filter(product::Column::ManufacturerId.eq(id));
        let products = paginate(&*self.db, newest_first(query), page).await?;
        Ok(ManufacturerListing { manufacturer, products })
    }

    /// Product page lookup. Looks across all products, not only active ones.
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductDetail, ApiError> {
        let product = product::find_all()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("product", format!("slug {slug}")))?;
        Ok(load_detail(&*self.db, product).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<ProductDetail, ApiError> {
        let product = product::find_all()
            .filter(product::Column::Id.eq(id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("product", format!("id {id}")))?;
        Ok(load_detail(&*self.db, product).await?)
    }
}
