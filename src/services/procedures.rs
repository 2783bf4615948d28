//! The database routines the catalog calls as opaque operations.
//!
//! `ProcedureGateway` is what the services depend on; `SqlProcedures` runs the
//! routines as plain statements through sea-orm so every backend the crate
//! connects to can serve them.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use crate::entities::{
    manufacturer, product, product_image, shipment_line, technical_data, technical_data_value,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StockTotals {
    pub count: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ManufacturerStock {
    pub stock_count: i64,
    pub average_price: f64,
    pub stock_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalValueRow {
    pub technical_data_id: i32,
    pub name: String,
    pub value: String,
}

#[async_trait]
pub trait ProcedureGateway: Send + Sync {
    /// Removes the product and everything hanging off it in one transaction.
    /// `false` when there was nothing to delete.
    async fn delete_product_safely(&self, product_id: i32) -> Result<bool, DbErr>;

    async fn sum_stock_count_and_value(&self) -> Result<StockTotals, DbErr>;

    async fn sum_stock_value_by_manufacturer(&self, manufacturer_id: i32) -> Result<ManufacturerStock, DbErr>;

    async fn technical_values_for_product(&self, product_id: i32) -> Result<Vec<TechnicalValueRow>, DbErr>;

    async fn create_manufacturer(&self, name: &str, country: &str) -> Result<manufacturer::Model, DbErr>;
}

#[derive(Clone)]
pub struct SqlProcedures {
    db: Arc<DatabaseConnection>,
}

impl SqlProcedures {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn price_and_count(&self, manufacturer_id: Option<i32>) -> Result<Vec<(Decimal, i32)>, DbErr> {
        let mut query = product::Entity::find()
            .select_only()
            .column(product::Column::Price)
            .column(product::Column::Count);
        if let Some(id) = manufacturer_id {
            query = query.filter(product::Column::ManufacturerId.eq(id));
        }
        query.into_tuple::<(Decimal, i32)>().all(&*self.db).await
    }
}

/// Σ price × count in fixed point, scaled to cents.
fn stock_value(rows: &[(Decimal, i32)]) -> Decimal {
    let mut total = rows
        .iter()
        .fold(Decimal::ZERO, |acc, (price, count)| acc + *price * Decimal::from(*count));
    total.rescale(2);
    total
}

#[async_trait]
impl ProcedureGateway for SqlProcedures {
    async fn delete_product_safely(&self, product_id: i32) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;
        technical_data_value::Entity::delete_many()
            .filter(technical_data_value::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        shipment_line::Entity::delete_many()
            .filter(shipment_line::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        let deleted = product::Entity::delete_by_id(product_id).exec(&txn).await?;
        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }

    async fn sum_stock_count_and_value(&self) -> Result<StockTotals, DbErr> {
        let rows = self.price_and_count(None).await?;
        Ok(StockTotals {
            count: rows.iter().map(|(_, count)| i64::from(*count)).sum(),
            value: stock_value(&rows),
        })
    }

    async fn sum_stock_value_by_manufacturer(&self, manufacturer_id: i32) -> Result<ManufacturerStock, DbErr> {
        let rows = self.price_and_count(Some(manufacturer_id)).await?;
        if rows.is_empty() {
            return Ok(ManufacturerStock::default());
        }

        let price_sum: Decimal = rows.iter().map(|(price, _)| *price).sum();
        let average = price_sum / Decimal::from(rows.len() as i64);
        Ok(ManufacturerStock {
            stock_count: rows.iter().map(|(_, count)| i64::from(*count)).sum(),
            average_price: average.to_f64().unwrap_or_default(),
            stock_value: stock_value(&rows),
        })
    }

    async fn technical_values_for_product(&self, product_id: i32) -> Result<Vec<TechnicalValueRow>, DbErr> {
        let rows = technical_data_value::Entity::find()
            .filter(technical_data_value::Column::ProductId.eq(product_id))
            .find_also_related(technical_data::Entity)
            .order_by_asc(technical_data_value::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(value, data)| TechnicalValueRow {
                technical_data_id: value.technical_data_id,
                name: data.map(|d| d.name).unwrap_or_default(),
                value: value.value,
            })
            .collect())
    }

    async fn create_manufacturer(&self, name: &str, country: &str) -> Result<manufacturer::Model, DbErr> {
        manufacturer::ActiveModel {
            name: Set(name.to_string()),
            country: Set(country.to_string()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
    }
}
