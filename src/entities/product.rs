use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, Set};
use serde::Serialize;

use crate::slug::slugify;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_type_id: i32,
    pub category_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))")]
    pub price: Decimal,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    pub manufacturer_id: i32,
    pub warranty: i32,
    pub created_in: DateTimeUtc,
    pub updated_in: DateTimeUtc,
    pub discount_id: Option<i32>,
    pub count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::product_type::Entity",
        from = "crate::entities::product::Column::ProductTypeId",
        to = "crate::entities::product_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductType,
    #[sea_orm(
        belongs_to = "crate::entities::category::Entity",
        from = "crate::entities::product::Column::CategoryId",
        to = "crate::entities::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(
        belongs_to = "crate::entities::manufacturer::Entity",
        from = "crate::entities::product::Column::ManufacturerId",
        to = "crate::entities::manufacturer::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Manufacturer,
    #[sea_orm(
        belongs_to = "crate::entities::discount::Entity",
        from = "crate::entities::product::Column::DiscountId",
        to = "crate::entities::discount::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Discount,
    #[sea_orm(has_many = "crate::entities::technical_data_value::Entity")]
    TechnicalDataValue,
    #[sea_orm(has_many = "crate::entities::product_image::Entity")]
    Image,
}

impl Related<crate::entities::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl Related<crate::entities::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<crate::entities::manufacturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturer.def()
    }
}

impl Related<crate::entities::discount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discount.def()
    }
}

impl Related<crate::entities::technical_data_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TechnicalDataValue.def()
    }
}

impl Related<crate::entities::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

/// Browsable products only.
pub fn find_active() -> Select<Entity> {
    Entity::find().filter(Column::IsActive.eq(true))
}

/// Every product, active or not. Administrative views only.
pub fn find_all() -> Select<Entity> {
    Entity::find()
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        // slug always follows the current name
        let slug = match &active_model.name {
            ActiveValue::Set(name) | ActiveValue::Unchanged(name) => Some(slugify(name)),
            ActiveValue::NotSet => None,
        };
        if let Some(slug) = slug {
            active_model.slug = Set(slug);
        }

        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }
            active_model.created_in = Set(now);
        }
        active_model.updated_in = Set(now);

        Ok(active_model)
    }
}
