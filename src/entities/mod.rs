pub mod category;
pub mod discount;
pub mod manufacturer;
pub mod product;
pub mod product_image;
pub mod product_type;
pub mod shipment;
pub mod shipment_line;
pub mod technical_data;
pub mod technical_data_value;
pub mod vendor;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

/// Creates every table that does not exist yet. Referenced tables go first.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, category::Entity).await?;
    create_table(db, manufacturer::Entity).await?;
    create_table(db, product_type::Entity).await?;
    create_table(db, discount::Entity).await?;
    create_table(db, technical_data::Entity).await?;
    create_table(db, product::Entity).await?;
    create_table(db, technical_data_value::Entity).await?;
    create_table(db, product_image::Entity).await?;
    create_table(db, vendor::Entity).await?;
    create_table(db, shipment::Entity).await?;
    create_table(db, shipment_line::Entity).await?;
    info!("Database schema is ready");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}
