use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, Set};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "product_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: i32,
    #[sea_orm(unique)]
    pub path_name: String,
    pub extension: FileExtension,
    pub file_name: String,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub desc_image: String,
    #[sea_orm(default_value = false)]
    pub main_image: bool,
    pub created_in: DateTimeUtc,
    pub updated_in: DateTimeUtc,
}

impl Model {
    /// Name of the stored blob inside the upload directory.
    pub fn stored_name(&self) -> String {
        format!("{}.{}", self.path_name, self.extension)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::product::Entity",
        from = "crate::entities::product_image::Column::ProductId",
        to = "crate::entities::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = chrono::Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.main_image {
                active_model.main_image = Set(false);
            }
            active_model.created_in = Set(now);
        }
        active_model.updated_in = Set(now);
        Ok(active_model)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(
    enum_name = "extension_enum",
    db_type = "String(StringLen::N(255))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum FileExtension {
    #[sea_orm(string_value = "jpg")]
    Jpg,
    #[sea_orm(string_value = "png")]
    Png,
    #[sea_orm(string_value = "webp")]
    Webp,
}

impl FileExtension {
    pub fn from_content_type(content_type: &str) -> Option<FileExtension> {
        match content_type {
            "image/jpeg" => Some(FileExtension::Jpg),
            "image/png" => Some(FileExtension::Png),
            "image/webp" => Some(FileExtension::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for FileExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ext = match self {
            FileExtension::Jpg => "jpg",
            FileExtension::Png => "png",
            FileExtension::Webp => "webp",
        };
        f.write_str(ext)
    }
}
