use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "shipment_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub vendor_id: i32,
    pub shipment_type: ShipmentType,
    pub date_shipment: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::vendor::Entity",
        from = "crate::entities::shipment::Column::VendorId",
        to = "crate::entities::vendor::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Vendor,
    #[sea_orm(has_many = "crate::entities::shipment_line::Entity")]
    Line,
}

impl Related<crate::entities::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<crate::entities::shipment_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Line.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "shipment_type_enum",
    db_type = "String(StringLen::N(255))",
    rs_type = "String"
)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentType {
    #[sea_orm(string_value = "store")]
    Store,
    #[sea_orm(string_value = "warehouse")]
    Warehouse,
}
