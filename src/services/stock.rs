use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

use crate::entities::{manufacturer, product};
use crate::error::{push_field_error, ApiError, FieldErrors};
use crate::services::catalog::validate_payload;
use crate::services::listing::{paginate, Listing, ProductCard};
use crate::services::procedures::{ManufacturerStock, ProcedureGateway, StockTotals};

/// Largest count a product row can hold.
pub const MAX_STOCK: i32 = i32::MAX;

pub fn stock_limit_message() -> String {
    format!("Stock count cannot exceed {MAX_STOCK}")
}

/// How long a product must have gone untouched to show up as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyWindow {
    TenMinutes,
    Day,
    Week,
    Year,
}

impl RecencyWindow {
    pub fn duration(self) -> Duration {
        match self {
            RecencyWindow::TenMinutes => Duration::minutes(10),
            RecencyWindow::Day => Duration::days(1),
            RecencyWindow::Week => Duration::weeks(1),
            RecencyWindow::Year => Duration::days(365),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockAdjustment {
    #[validate(range(min = 0, message = "Increment cannot be negative"))]
    pub increment: Option<i32>,
    #[validate(range(min = 0, message = "Decrement cannot be negative"))]
    pub decrement: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct StockLevel {
    pub product_id: i32,
    pub count: i32,
}

#[derive(Debug, Serialize)]
pub struct ManufacturerReport {
    pub manufacturer: manufacturer::Model,
    #[serde(flatten)]
    pub stock: ManufacturerStock,
}

#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    procedures: Arc<dyn ProcedureGateway>,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>, procedures: Arc<dyn ProcedureGateway>) -> Self {
        Self { db, procedures }
    }

    pub async fn totals(&self) -> Result<StockTotals, ApiError> {
        self.procedures
            .sum_stock_count_and_value()
            .await
            .map_err(|err| unavailable("sum_stock_count_and_value", err))
    }

    pub async fn total_stock_count(&self) -> Result<i64, ApiError> {
        Ok(self.totals().await?.count)
    }

    pub async fn total_stock_value(&self) -> Result<Decimal, ApiError> {
        Ok(self.totals().await?.value)
    }

    pub async fn aggregate_by_manufacturer(&self, manufacturer_id: i32) -> Result<ManufacturerReport, ApiError> {
        let manufacturer = manufacturer::Entity::find_by_id(manufacturer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("manufacturer", format!("id {manufacturer_id}")))?;

        let stock = self
            .procedures
            .sum_stock_value_by_manufacturer(manufacturer_id)
            .await
            .map_err(|err| unavailable("sum_stock_value_by_manufacturer", err))?;

        Ok(ManufacturerReport { manufacturer, stock })
    }

    /// Products nobody has touched within `window`, longest untouched first.
    pub async fn list_by_recency(
        &self,
        window: RecencyWindow,
        page: Option<&str>,
    ) -> Result<Listing<ProductCard>, ApiError> {
        let cutoff = Utc::now() - window.duration();
        let query = product::find_all()
            .filter(product::Column::UpdatedIn.lt(cutoff))
            .order_by_asc(product::Column::UpdatedIn)
            .order_by_asc(product::Column::Id);
        Ok(paginate(&*self.db, query, page).await?)
    }

    /// Applies the adjustment in a single UPDATE so concurrent adjustments of the
    /// same product cannot overwrite each other. The count never drops below zero,
    /// and an adjustment that would take it past `MAX_STOCK` is refused unwritten.
    pub async fn adjust_stock(&self, product_id: i32, adjustment: StockAdjustment) -> Result<StockLevel, ApiError> {
        validate_payload(&adjustment)?;
        if adjustment.increment.is_none() && adjustment.decrement.is_none() {
            let mut errors = FieldErrors::new();
            push_field_error(&mut errors, "increment", "Specify an increment or a decrement");
            return Err(ApiError::Validation(errors));
        }

        let increment = adjustment.increment.unwrap_or(0);
        let decrement = adjustment.decrement.unwrap_or(0);

        let raised = Expr::col(product::Column::Count).add(increment);
        let next = Expr::case(
            Expr::expr(raised.clone()).gt(decrement),
            raised.clone().sub(decrement),
        )
        .finally(0);

        let result = product::Entity::update_many()
            .col_expr(product::Column::Count, next.into())
            .col_expr(product::Column::UpdatedIn, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .filter(Expr::expr(raised.sub(decrement)).lte(MAX_STOCK))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            product::Entity::find_by_id(product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ApiError::not_found("product", format!("id {product_id}")))?;
            let mut errors = FieldErrors::new();
            push_field_error(&mut errors, "increment", stock_limit_message());
            return Err(ApiError::Validation(errors));
        }

        let count = product::Entity::find_by_id(product_id)
            .select_only()
            .column(product::Column::Count)
            .into_tuple::<i32>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("product", format!("id {product_id}")))?;

        info!(product_id, increment, decrement, count, "Adjusted stock");
        Ok(StockLevel { product_id, count })
    }
}

fn unavailable(procedure: &str, err: DbErr) -> ApiError {
    error!(procedure, error = %err, "Stock procedure failed");
    ApiError::DataUnavailable(err)
}

#[cfg(test)]
mod tests {
    use super::RecencyWindow;
    use chrono::Duration;

    #[test]
    fn windows_have_the_expected_length() {
        assert_eq!(RecencyWindow::TenMinutes.duration(), Duration::minutes(10));
        assert_eq!(RecencyWindow::Day.duration(), Duration::hours(24));
        assert_eq!(RecencyWindow::Week.duration(), Duration::days(7));
        assert_eq!(RecencyWindow::Year.duration(), Duration::days(365));
    }

    #[test]
    fn windows_parse_from_query_values() {
        let window: RecencyWindow = serde_json::from_str("\"ten_minutes\"").unwrap();
        assert_eq!(window, RecencyWindow::TenMinutes);
        assert!(serde_json::from_str::<RecencyWindow>("\"fortnight\"").is_err());
    }
}
