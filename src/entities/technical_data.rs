use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "product_technical_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub product_type_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::product_type::Entity",
        from = "crate::entities::technical_data::Column::ProductTypeId",
        to = "crate::entities::product_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductType,
    #[sea_orm(has_many = "crate::entities::technical_data_value::Entity")]
    Value,
}

impl Related<crate::entities::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl Related<crate::entities::technical_data_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Value.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
