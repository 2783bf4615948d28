//! Vendors and the shipments they deliver. Recording a shipment puts its
//! quantities into stock in the same transaction that stores it.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::entities::shipment::ShipmentType;
use crate::entities::{product, shipment, shipment_line, vendor};
use crate::error::{push_field_error, ApiError, FieldErrors};
use crate::services::catalog::validate_payload;
use crate::services::stock::{stock_limit_message, MAX_STOCK};

#[derive(Debug, Deserialize, Validate)]
pub struct NewVendor {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewShipment {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub vendor_id: i32,
    pub shipment_type: ShipmentType,
    pub date_shipment: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub lines: Vec<ShipmentLineForm>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShipmentLineForm {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Count must be at least 1"))]
    pub count: i32,
}

#[derive(Debug, Serialize)]
pub struct ShipmentView {
    #[serde(flatten)]
    pub shipment: shipment::Model,
    pub vendor: Option<vendor::Model>,
    pub lines: Vec<shipment_line::Model>,
}

#[derive(Clone)]
pub struct ShipmentService {
    db: Arc<DatabaseConnection>,
}

impl ShipmentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn vendors(&self) -> Result<Vec<vendor::Model>, ApiError> {
        Ok(vendor::Entity::find()
            .order_by_asc(vendor::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn create_vendor(&self, payload: NewVendor) -> Result<vendor::Model, ApiError> {
        validate_payload(&payload)?;
        Ok(vendor::ActiveModel {
            name: Set(payload.name),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?)
    }

    pub async fn shipments(&self) -> Result<Vec<shipment::Model>, ApiError> {
        Ok(shipment::Entity::find()
            .order_by_desc(shipment::Column::DateShipment)
            .order_by_desc(shipment::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_shipment(&self, id: i32) -> Result<ShipmentView, ApiError> {
        let shipment = shipment::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("shipment", format!("id {id}")))?;
        let vendor = shipment.find_related(vendor::Entity).one(&*self.db).await?;
        let lines = shipment
            .find_related(shipment_line::Entity)
            .order_by_asc(shipment_line::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(ShipmentView {
            shipment,
            vendor,
            lines,
        })
    }

    pub async fn record_shipment(&self, payload: NewShipment) -> Result<ShipmentView, ApiError> {
        validate_payload(&payload)?;
        if payload.lines.is_empty() {
            let mut errors = FieldErrors::new();
            push_field_error(&mut errors, "lines", "A shipment needs at least one line");
            return Err(ApiError::Validation(errors));
        }

        let txn = self.db.begin().await?;
        let mut errors = FieldErrors::new();

        let vendor = vendor::Entity::find_by_id(payload.vendor_id).one(&txn).await?;
        if vendor.is_none() {
            push_field_error(&mut errors, "vendor_id", "Unknown vendor");
        }

        let ids: Vec<i32> = payload.lines.iter().map(|line| line.product_id).collect();
        let known: HashSet<i32> = product::find_all()
            .filter(product::Column::Id.is_in(ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|product| product.id)
            .collect();
        for (index, line) in payload.lines.iter().enumerate() {
            if !known.contains(&line.product_id) {
                push_field_error(&mut errors, format!("lines[{index}].product_id"), "Unknown product");
            }
        }

        if !errors.is_empty() {
            txn.rollback().await?;
            return Err(ApiError::Validation(errors));
        }

        let shipment = shipment::ActiveModel {
            name: Set(payload.name),
            vendor_id: Set(payload.vendor_id),
            shipment_type: Set(payload.shipment_type),
            date_shipment: Set(payload.date_shipment.unwrap_or_else(Utc::now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let now = Utc::now();
        let mut lines = Vec::with_capacity(payload.lines.len());
        for (index, line) in payload.lines.iter().enumerate() {
            lines.push(
                shipment_line::ActiveModel {
                    shipment_id: Set(shipment.id),
                    product_id: Set(line.product_id),
                    count: Set(line.count),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            );

            let raised = Expr::col(product::Column::Count).add(line.count);
            let result = product::Entity::update_many()
                .col_expr(product::Column::Count, raised.clone())
                .col_expr(product::Column::UpdatedIn, Expr::value(now))
                .filter(product::Column::Id.eq(line.product_id))
                .filter(Expr::expr(raised).lte(MAX_STOCK))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                push_field_error(&mut errors, format!("lines[{index}].count"), stock_limit_message());
            }
        }

        if !errors.is_empty() {
            txn.rollback().await?;
            return Err(ApiError::Validation(errors));
        }
        txn.commit().await?;

        info!(
            shipment_id = shipment.id,
            vendor_id = shipment.vendor_id,
            lines = lines.len(),
            "Recorded shipment"
        );
        Ok(ShipmentView {
            shipment,
            vendor,
            lines,
        })
    }

    pub async fn delete_shipment(&self, id: i32) -> Result<(), ApiError> {
        let result = shipment::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ApiError::not_found("shipment", format!("id {id}")));
        }
        Ok(())
    }
}
