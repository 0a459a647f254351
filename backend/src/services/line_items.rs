//! Line item persistence shared by quotations and sales
//!
//! Items are always written with amounts computed by `calculate_line_item`;
//! the stored subtotal/discount/tax/total columns are never taken from input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{calculate_line_item, validate_line_item, LineItem, LineItemAmounts, LineItemInput};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Which document an item table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTable {
    Quotation,
    Sale,
}

impl ItemTable {
    fn table(&self) -> &'static str {
        match self {
            ItemTable::Quotation => "quotation_items",
            ItemTable::Sale => "sale_items",
        }
    }

    fn owner_column(&self) -> &'static str {
        match self {
            ItemTable::Quotation => "quotation_id",
            ItemTable::Sale => "sale_id",
        }
    }
}

/// Line item as supplied by clients
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LineItemPayload {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    #[validate(length(max = 255, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(length(max = 20, message = "Unit is too long"))]
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
}

impl LineItemPayload {
    pub fn pricing(&self) -> LineItemInput {
        LineItemInput {
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_percentage: self.discount_percentage,
            discount_amount: self.discount_amount,
            tax_percentage: self.tax_percentage,
        }
    }

    /// Field-level checks followed by the pricing rules
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        validate_line_item(&self.pricing()).map_err(|msg| AppError::validation("items", msg))
    }
}

impl From<&LineItem> for LineItemPayload {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            color_id: item.color_id,
            size_id: item.size_id,
            warehouse_id: item.warehouse_id,
            description: item.description.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount_percentage: item.discount_percentage,
            discount_amount: item.discount_amount,
            tax_percentage: item.tax_percentage,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    document_id: Uuid,
    product_id: Option<Uuid>,
    variant_id: Option<Uuid>,
    color_id: Option<Uuid>,
    size_id: Option<Uuid>,
    warehouse_id: Option<Uuid>,
    description: Option<String>,
    unit: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
    discount_percentage: Decimal,
    discount_amount: Decimal,
    tax_percentage: Decimal,
    tax_amount: Decimal,
    subtotal: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for LineItem {
    fn from(row: ItemRow) -> Self {
        LineItem {
            id: row.id,
            document_id: row.document_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            color_id: row.color_id,
            size_id: row.size_id,
            warehouse_id: row.warehouse_id,
            description: row.description,
            unit: row.unit,
            quantity: row.quantity,
            unit_price: row.unit_price,
            discount_percentage: row.discount_percentage,
            discount_amount: row.discount_amount,
            tax_percentage: row.tax_percentage,
            tax_amount: row.tax_amount,
            subtotal: row.subtotal,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn item_columns(table: ItemTable) -> String {
    format!(
        "id, {} AS document_id, product_id, variant_id, color_id, size_id, warehouse_id, \
         description, unit, quantity, unit_price, discount_percentage, discount_amount, \
         tax_percentage, tax_amount, subtotal, total, created_at, updated_at",
        table.owner_column()
    )
}

/// Items of a document in insertion order
pub async fn fetch_items(
    conn: &mut PgConnection,
    table: ItemTable,
    document_id: Uuid,
) -> AppResult<Vec<LineItem>> {
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {} FROM {} WHERE {} = $1 ORDER BY created_at, id",
        item_columns(table),
        table.table(),
        table.owner_column()
    ))
    .bind(document_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(LineItem::from).collect())
}

/// Stored amounts of every item, for totals recalculation
pub async fn fetch_amounts(
    conn: &mut PgConnection,
    table: ItemTable,
    document_id: Uuid,
) -> AppResult<Vec<LineItemAmounts>> {
    let rows = sqlx::query_as::<_, (Decimal, Decimal, Decimal, Decimal)>(&format!(
        "SELECT subtotal, discount_amount, tax_amount, total FROM {} WHERE {} = $1",
        table.table(),
        table.owner_column()
    ))
    .bind(document_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(subtotal, discount_amount, tax_amount, total)| LineItemAmounts {
            subtotal,
            discount_amount,
            tax_amount,
            total,
        })
        .collect())
}

pub async fn insert_item(
    conn: &mut PgConnection,
    table: ItemTable,
    document_id: Uuid,
    payload: &LineItemPayload,
) -> AppResult<LineItem> {
    let amounts = calculate_line_item(&payload.pricing());

    let row = sqlx::query_as::<_, ItemRow>(&format!(
        r#"
        INSERT INTO {} ({}, product_id, variant_id, color_id, size_id, warehouse_id,
                        description, unit, quantity, unit_price, discount_percentage,
                        discount_amount, tax_percentage, tax_amount, subtotal, total)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING {}
        "#,
        table.table(),
        table.owner_column(),
        item_columns(table)
    ))
    .bind(document_id)
    .bind(payload.product_id)
    .bind(payload.variant_id)
    .bind(payload.color_id)
    .bind(payload.size_id)
    .bind(payload.warehouse_id)
    .bind(&payload.description)
    .bind(&payload.unit)
    .bind(payload.quantity)
    .bind(payload.unit_price)
    .bind(payload.discount_percentage)
    .bind(amounts.discount_amount)
    .bind(payload.tax_percentage)
    .bind(amounts.tax_amount)
    .bind(amounts.subtotal)
    .bind(amounts.total)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Overwrite an item of the document with new inputs and recomputed amounts
pub async fn replace_item(
    conn: &mut PgConnection,
    table: ItemTable,
    document_id: Uuid,
    item_id: Uuid,
    payload: &LineItemPayload,
) -> AppResult<LineItem> {
    let amounts = calculate_line_item(&payload.pricing());

    let row = sqlx::query_as::<_, ItemRow>(&format!(
        r#"
        UPDATE {}
        SET product_id = $3, variant_id = $4, color_id = $5, size_id = $6, warehouse_id = $7,
            description = $8, unit = $9, quantity = $10, unit_price = $11,
            discount_percentage = $12, discount_amount = $13, tax_percentage = $14,
            tax_amount = $15, subtotal = $16, total = $17
        WHERE id = $1 AND {} = $2
        RETURNING {}
        "#,
        table.table(),
        table.owner_column(),
        item_columns(table)
    ))
    .bind(item_id)
    .bind(document_id)
    .bind(payload.product_id)
    .bind(payload.variant_id)
    .bind(payload.color_id)
    .bind(payload.size_id)
    .bind(payload.warehouse_id)
    .bind(&payload.description)
    .bind(&payload.unit)
    .bind(payload.quantity)
    .bind(payload.unit_price)
    .bind(payload.discount_percentage)
    .bind(amounts.discount_amount)
    .bind(payload.tax_percentage)
    .bind(amounts.tax_amount)
    .bind(amounts.subtotal)
    .bind(amounts.total)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Line item".to_string()))?;

    Ok(row.into())
}

pub async fn delete_item(
    conn: &mut PgConnection,
    table: ItemTable,
    document_id: Uuid,
    item_id: Uuid,
) -> AppResult<()> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1 AND {} = $2",
        table.table(),
        table.owner_column()
    ))
    .bind(item_id)
    .bind(document_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Line item".to_string()));
    }
    Ok(())
}
