//! Helpers shared by quotations and sales
//!
//! Document numbers come from a per-tenant, per-prefix counter row that is
//! incremented with a single upsert. The row stays locked until the
//! surrounding transaction ends, so two concurrent creations can never read
//! the same value and a rolled-back creation gives its number back.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    format_document_number, validate_currency_code, validate_exchange_rate, DocumentKind,
};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Calendar date used for expiry and due date checks
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Validate the currency snapshot of a document
pub fn check_currency(currency_code: &str, exchange_rate: Decimal) -> AppResult<()> {
    validate_currency_code(currency_code)
        .map_err(|msg| AppError::validation("currency_code", msg))?;
    validate_exchange_rate(exchange_rate).map_err(|msg| AppError::validation("exchange_rate", msg))
}

/// Allocate the next number for `kind`, e.g. `QUO-2024-00001`
pub async fn next_document_number(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    kind: DocumentKind,
) -> AppResult<String> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_sequences (tenant_id, prefix, last_value)
        VALUES ($1, $2, 1)
        ON CONFLICT (tenant_id, prefix)
        DO UPDATE SET last_value = document_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(tenant_id)
    .bind(kind.prefix())
    .fetch_one(&mut *conn)
    .await?;

    let number = format_document_number(kind.prefix(), Utc::now().year(), sequence);
    tracing::debug!(tenant_id = %tenant_id, number = %number, "Allocated document number");

    Ok(number)
}
