use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "product_technical_data_value")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: i32,
    pub technical_data_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::product::Entity",
        from = "crate::entities::technical_data_value::Column::ProductId",
        to = "crate::entities::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "crate::entities::technical_data::Entity",
        from = "crate::entities::technical_data_value::Column::TechnicalDataId",
        to = "crate::entities::technical_data::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    TechnicalData,
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<crate::entities::technical_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TechnicalData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
