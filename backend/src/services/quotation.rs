//! Quotation service

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    calculate_order_totals, to_base_currency, DocumentKind, OrderTotals, PaginatedResponse,
    Pagination, Quotation, QuotationEvent, QuotationStatus, Sale,
};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::config::DocumentsConfig;
use crate::error::{AppError, AppResult};
use crate::services::documents::{check_currency, next_document_number, today};
use crate::services::line_items::{self, ItemTable, LineItemPayload};
use crate::services::sale::{NewSale, SaleService};

#[derive(Clone)]
pub struct QuotationService {
    db: PgPool,
    defaults: DocumentsConfig,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationInput {
    pub customer_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    /// Defaults to the issue date plus the configured validity period
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(equal = 3, message = "Currency code must be three letters"))]
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub include_tax: Option<bool>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuotationInput {
    pub customer_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub include_tax: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuotationListQuery {
    pub status: Option<QuotationStatus>,
    pub customer_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Options for turning a quotation into a sale
#[derive(Debug, Default, Deserialize)]
pub struct ConvertQuotationInput {
    pub sale_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub shipping_amount: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct QuotationRow {
    id: Uuid,
    tenant_id: Uuid,
    number: String,
    customer_id: Option<Uuid>,
    status: String,
    issue_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    currency_code: String,
    exchange_rate: Decimal,
    include_tax: bool,
    subtotal: Decimal,
    discount_amount: Decimal,
    tax_amount: Decimal,
    total: Decimal,
    notes: Option<String>,
    converted_sale_id: Option<Uuid>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuotationRow> for Quotation {
    type Error = AppError;

    fn try_from(row: QuotationRow) -> Result<Self, Self::Error> {
        let status = QuotationStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown quotation status '{}'", row.status))
        })?;

        Ok(Quotation {
            id: row.id,
            tenant_id: row.tenant_id,
            number: row.number,
            customer_id: row.customer_id,
            status,
            issue_date: row.issue_date,
            expiry_date: row.expiry_date,
            currency_code: row.currency_code,
            exchange_rate: row.exchange_rate,
            include_tax: row.include_tax,
            totals: OrderTotals {
                subtotal: row.subtotal,
                discount_amount: row.discount_amount,
                tax_amount: row.tax_amount,
                total: row.total,
            },
            base_total: to_base_currency(row.total, row.exchange_rate),
            notes: row.notes,
            converted_sale_id: row.converted_sale_id,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            items: Vec::new(),
        })
    }
}

const QUOTATION_COLUMNS: &str = "id, tenant_id, number, customer_id, status, issue_date, \
     expiry_date, currency_code, exchange_rate, include_tax, subtotal, discount_amount, \
     tax_amount, total, notes, converted_sale_id, created_by, created_at, updated_at";

fn check_dates(issue_date: NaiveDate, expiry_date: Option<NaiveDate>) -> AppResult<()> {
    match expiry_date {
        Some(expiry) if expiry < issue_date => Err(AppError::validation(
            "expiry_date",
            "Expiry date cannot be before the issue date",
        )),
        _ => Ok(()),
    }
}

impl QuotationService {
    pub fn new(db: PgPool, defaults: DocumentsConfig) -> Self {
        Self { db, defaults }
    }

    /// Create a draft quotation with a fresh `QUO` number
    pub async fn create(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        input: CreateQuotationInput,
    ) -> AppResult<Quotation> {
        input.validate()?;
        for item in &input.items {
            item.check()?;
        }

        let issue_date = input.issue_date.unwrap_or_else(today);
        let expiry_date = input
            .expiry_date
            .unwrap_or(issue_date + Duration::days(self.defaults.quotation_validity_days));
        check_dates(issue_date, Some(expiry_date))?;

        let currency_code = input
            .currency_code
            .unwrap_or_else(|| self.defaults.default_currency.clone());
        let exchange_rate = input
            .exchange_rate
            .unwrap_or(self.defaults.default_exchange_rate);
        check_currency(&currency_code, exchange_rate)?;

        let mut tx = self.db.begin().await?;

        let number = next_document_number(&mut tx, tenant_id, DocumentKind::Quotation).await?;

        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            r#"
            INSERT INTO quotations (tenant_id, number, customer_id, issue_date, expiry_date,
                                    currency_code, exchange_rate, include_tax, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {QUOTATION_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(&number)
        .bind(input.customer_id)
        .bind(issue_date)
        .bind(expiry_date)
        .bind(&currency_code)
        .bind(exchange_rate)
        .bind(input.include_tax.unwrap_or(true))
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let quotation = Quotation::try_from(row)?;
        for item in &input.items {
            line_items::insert_item(&mut tx, ItemTable::Quotation, quotation.id, item).await?;
        }
        Self::recalculate(&mut tx, &quotation).await?;

        tx.commit().await?;

        tracing::info!(quotation_id = %quotation.id, number = %number, "Quotation created");

        self.get(tenant_id, quotation.id).await
    }

    /// Get a quotation with its items, expiring it first if its date has passed
    pub async fn get(&self, tenant_id: Uuid, quotation_id: Uuid) -> AppResult<Quotation> {
        let mut tx = self.db.begin().await?;

        let mut quotation = Self::lock(&mut tx, tenant_id, quotation_id).await?;
        Self::reconcile(&mut tx, &mut quotation).await?;
        quotation.items =
            line_items::fetch_items(&mut tx, ItemTable::Quotation, quotation_id).await?;

        tx.commit().await?;

        Ok(quotation)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        query: QuotationListQuery,
    ) -> AppResult<PaginatedResponse<Quotation>> {
        self.sweep_expired(tenant_id).await?;

        let pagination = Pagination {
            page: query.page.unwrap_or(1),
            per_page: query.per_page.unwrap_or(20),
        };
        let status = query.status.map(|s| s.as_str());

        const FILTER: &str = r#"
            WHERE tenant_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR customer_id = $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM quotations {FILTER}"))
            .bind(tenant_id)
            .bind(status)
            .bind(query.customer_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations {FILTER} \
             ORDER BY issue_date DESC, created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(tenant_id)
        .bind(status)
        .bind(query.customer_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let quotations = rows
            .into_iter()
            .map(Quotation::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse::new(quotations, &pagination, total.max(0) as u64))
    }

    /// Update the header of a draft quotation
    pub async fn update(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        input: UpdateQuotationInput,
    ) -> AppResult<Quotation> {
        let (mut tx, quotation) = self.begin_editable(tenant_id, quotation_id).await?;

        let issue_date = input.issue_date.unwrap_or(quotation.issue_date);
        let expiry_date = input.expiry_date.or(quotation.expiry_date);
        check_dates(issue_date, expiry_date)?;

        let currency_code = input.currency_code.unwrap_or(quotation.currency_code);
        let exchange_rate = input.exchange_rate.unwrap_or(quotation.exchange_rate);
        check_currency(&currency_code, exchange_rate)?;

        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            r#"
            UPDATE quotations
            SET customer_id = $2, issue_date = $3, expiry_date = $4, currency_code = $5,
                exchange_rate = $6, include_tax = $7, notes = $8
            WHERE id = $1
            RETURNING {QUOTATION_COLUMNS}
            "#
        ))
        .bind(quotation_id)
        .bind(input.customer_id.or(quotation.customer_id))
        .bind(issue_date)
        .bind(expiry_date)
        .bind(&currency_code)
        .bind(exchange_rate)
        .bind(input.include_tax.unwrap_or(quotation.include_tax))
        .bind(input.notes.or(quotation.notes))
        .fetch_one(&mut *tx)
        .await?;

        let updated = Quotation::try_from(row)?;
        Self::recalculate(&mut tx, &updated).await?;

        tx.commit().await?;

        self.get(tenant_id, quotation_id).await
    }

    pub async fn add_item(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        item: LineItemPayload,
    ) -> AppResult<Quotation> {
        item.check()?;

        let (mut tx, quotation) = self.begin_editable(tenant_id, quotation_id).await?;
        line_items::insert_item(&mut tx, ItemTable::Quotation, quotation_id, &item).await?;
        Self::recalculate(&mut tx, &quotation).await?;
        tx.commit().await?;

        self.get(tenant_id, quotation_id).await
    }

    pub async fn update_item(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        item_id: Uuid,
        item: LineItemPayload,
    ) -> AppResult<Quotation> {
        item.check()?;

        let (mut tx, quotation) = self.begin_editable(tenant_id, quotation_id).await?;
        line_items::replace_item(&mut tx, ItemTable::Quotation, quotation_id, item_id, &item)
            .await?;
        Self::recalculate(&mut tx, &quotation).await?;
        tx.commit().await?;

        self.get(tenant_id, quotation_id).await
    }

    pub async fn remove_item(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Quotation> {
        let (mut tx, quotation) = self.begin_editable(tenant_id, quotation_id).await?;
        line_items::delete_item(&mut tx, ItemTable::Quotation, quotation_id, item_id).await?;
        Self::recalculate(&mut tx, &quotation).await?;
        tx.commit().await?;

        self.get(tenant_id, quotation_id).await
    }

    pub async fn send(&self, tenant_id: Uuid, quotation_id: Uuid) -> AppResult<Quotation> {
        self.apply_event(tenant_id, quotation_id, QuotationEvent::Send)
            .await
    }

    pub async fn approve(&self, tenant_id: Uuid, quotation_id: Uuid) -> AppResult<Quotation> {
        self.apply_event(tenant_id, quotation_id, QuotationEvent::Approve)
            .await
    }

    pub async fn reject(&self, tenant_id: Uuid, quotation_id: Uuid) -> AppResult<Quotation> {
        self.apply_event(tenant_id, quotation_id, QuotationEvent::Reject)
            .await
    }

    /// Turn a sent or approved quotation into a draft sale carrying the same
    /// items, and link both documents.
    pub async fn convert(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        quotation_id: Uuid,
        input: ConvertQuotationInput,
    ) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;

        let mut quotation = Self::lock(&mut tx, tenant_id, quotation_id).await?;
        Self::reconcile(&mut tx, &mut quotation).await?;
        let status = quotation.status.transition(QuotationEvent::Convert)?;

        let items = line_items::fetch_items(&mut tx, ItemTable::Quotation, quotation_id).await?;
        if items.is_empty() {
            return Err(AppError::validation(
                "items",
                "A quotation needs at least one item to be converted",
            ));
        }

        let header = NewSale {
            customer_id: quotation.customer_id,
            quotation_id: Some(quotation_id),
            sale_date: input.sale_date.unwrap_or_else(today),
            due_date: input.due_date,
            currency_code: quotation.currency_code.clone(),
            exchange_rate: quotation.exchange_rate,
            include_tax: quotation.include_tax,
            shipping_amount: input.shipping_amount.unwrap_or(Decimal::ZERO),
            notes: quotation.notes.clone(),
        };
        let sale_id = SaleService::insert_sale(&mut tx, tenant_id, user_id, &header).await?;

        for item in &items {
            let payload = LineItemPayload::from(item);
            line_items::insert_item(&mut tx, ItemTable::Sale, sale_id, &payload).await?;
        }

        sqlx::query("UPDATE quotations SET status = $2, converted_sale_id = $3 WHERE id = $1")
            .bind(quotation_id)
            .bind(status.as_str())
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let sale_number = SaleService::refresh_totals(&mut tx, tenant_id, sale_id).await?;

        tx.commit().await?;

        tracing::info!(
            quotation_id = %quotation_id,
            quotation = %quotation.number,
            sale_id = %sale_id,
            sale = %sale_number,
            "Quotation converted to sale"
        );

        SaleService::new(self.db.clone(), self.defaults.clone())
            .get(tenant_id, sale_id)
            .await
    }

    /// Soft-delete a draft quotation. Its number is not reused.
    pub async fn delete(&self, tenant_id: Uuid, quotation_id: Uuid) -> AppResult<()> {
        let (mut tx, _) = self.begin_editable(tenant_id, quotation_id).await?;

        sqlx::query("UPDATE quotations SET deleted_at = NOW() WHERE id = $1")
            .bind(quotation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn apply_event(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
        event: QuotationEvent,
    ) -> AppResult<Quotation> {
        let mut tx = self.db.begin().await?;

        let mut quotation = Self::lock(&mut tx, tenant_id, quotation_id).await?;
        Self::reconcile(&mut tx, &mut quotation).await?;
        let status = match quotation.status.transition(event) {
            Ok(status) => status,
            Err(err) => {
                // Keep a reconciled expiry even though the action is refused
                tx.commit().await?;
                return Err(err.into());
            }
        };
        Self::set_status(&mut tx, quotation_id, status).await?;

        tx.commit().await?;

        tracing::info!(
            quotation_id = %quotation_id,
            from = quotation.status.as_str(),
            to = status.as_str(),
            "Quotation status changed"
        );

        self.get(tenant_id, quotation_id).await
    }

    /// Recompute and store the aggregates of a quotation from its items
    async fn recalculate(conn: &mut PgConnection, quotation: &Quotation) -> AppResult<OrderTotals> {
        let amounts = line_items::fetch_amounts(conn, ItemTable::Quotation, quotation.id).await?;
        let totals = calculate_order_totals(&amounts, quotation.include_tax);

        sqlx::query(
            r#"
            UPDATE quotations
            SET subtotal = $2, discount_amount = $3, tax_amount = $4, total = $5
            WHERE id = $1
            "#,
        )
        .bind(quotation.id)
        .bind(totals.subtotal)
        .bind(totals.discount_amount)
        .bind(totals.tax_amount)
        .bind(totals.total)
        .execute(&mut *conn)
        .await?;

        Ok(totals)
    }

    /// Persist a calendar-driven move to `expired`
    async fn reconcile(conn: &mut PgConnection, quotation: &mut Quotation) -> AppResult<()> {
        let status = quotation.status.reconcile(quotation.expiry_date, today());

        if status != quotation.status {
            Self::set_status(conn, quotation.id, status).await?;
            tracing::info!(
                quotation_id = %quotation.id,
                from = quotation.status.as_str(),
                to = status.as_str(),
                "Quotation status reconciled"
            );
            quotation.status = status;
        }
        Ok(())
    }

    /// Reconcile every quotation of the tenant whose expiry date has passed
    async fn sweep_expired(&self, tenant_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let rows = sqlx::query_as::<_, QuotationRow>(&format!(
            r#"
            SELECT {QUOTATION_COLUMNS} FROM quotations
            WHERE tenant_id = $1 AND deleted_at IS NULL
              AND status IN ('draft', 'sent')
              AND expiry_date < $2
            FOR UPDATE
            "#
        ))
        .bind(tenant_id)
        .bind(today())
        .fetch_all(&mut *tx)
        .await?;

        for row in rows {
            let mut quotation = Quotation::try_from(row)?;
            Self::reconcile(&mut tx, &mut quotation).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_status(
        conn: &mut PgConnection,
        quotation_id: Uuid,
        status: QuotationStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE quotations SET status = $2 WHERE id = $1")
            .bind(quotation_id)
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Load a quotation and hold its row lock until the transaction ends
    async fn lock(
        conn: &mut PgConnection,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> AppResult<Quotation> {
        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations \
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(quotation_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Quotation".to_string()))?;

        Quotation::try_from(row)
    }

    /// Open a transaction locking a quotation that must still be in `draft`.
    ///
    /// Expiry is applied first. A quotation found expired is committed as
    /// such before `NotEditable` is returned, as `apply_event` does.
    async fn begin_editable(
        &self,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> AppResult<(Transaction<'static, Postgres>, Quotation)> {
        let mut tx = self.db.begin().await?;
        let mut quotation = Self::lock(&mut tx, tenant_id, quotation_id).await?;
        Self::reconcile(&mut tx, &mut quotation).await?;
        if !quotation.status.is_editable() {
            tx.commit().await?;
            return Err(AppError::NotEditable(format!("Quotation {}", quotation.number)));
        }
        Ok((tx, quotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(total: Decimal, exchange_rate: Decimal) -> QuotationRow {
        QuotationRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            number: "QUO-2024-00001".to_string(),
            customer_id: None,
            status: "draft".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            expiry_date: None,
            currency_code: "EUR".to_string(),
            exchange_rate,
            include_tax: true,
            subtotal: total,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total,
            notes: None,
            converted_sale_id: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_total_uses_snapshot_rate() {
        let quotation = Quotation::try_from(row(dec!(328), dec!(0.052))).unwrap();
        assert_eq!(quotation.base_total, dec!(17.06));

        let json = serde_json::to_value(&quotation).unwrap();
        assert!(json.get("base_total").is_some());
        assert!(json.get("total").is_some());
    }

    #[test]
    fn test_unknown_status_is_internal_error() {
        let bad = QuotationRow {
            status: "archived".to_string(),
            ..row(Decimal::ZERO, Decimal::ONE)
        };
        assert!(matches!(Quotation::try_from(bad), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_expiry_before_issue_rejected() {
        let issue = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert!(matches!(
            check_dates(issue, Some(expiry)),
            Err(AppError::Validation { ref field, .. }) if field == "expiry_date"
        ));
        assert!(check_dates(issue, Some(issue)).is_ok());
        assert!(check_dates(issue, None).is_ok());
    }

    // Database-backed tests; run with `cargo test -- --ignored` and DATABASE_URL set

    fn service(pool: PgPool) -> QuotationService {
        QuotationService::new(
            pool,
            DocumentsConfig {
                quotation_validity_days: 30,
                default_currency: "USD".to_string(),
                default_exchange_rate: Decimal::ONE,
            },
        )
    }

    fn create_input(issue_date: NaiveDate, expiry_date: NaiveDate) -> CreateQuotationInput {
        CreateQuotationInput {
            customer_id: None,
            issue_date: Some(issue_date),
            expiry_date: Some(expiry_date),
            currency_code: Some("EUR".to_string()),
            exchange_rate: Some(dec!(1.1)),
            include_tax: Some(true),
            notes: None,
            items: Vec::new(),
        }
    }

    fn shirt() -> LineItemPayload {
        LineItemPayload {
            product_id: None,
            variant_id: None,
            color_id: None,
            size_id: None,
            warehouse_id: None,
            description: Some("Linen shirt".to_string()),
            unit: None,
            quantity: dec!(2),
            unit_price: dec!(45),
            discount_percentage: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_percentage: dec!(16),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
    async fn test_item_commands_recalculate_totals(pool: PgPool) {
        let service = service(pool);
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());
        let quotation = service
            .create(tenant, user, create_input(today(), today() + Duration::days(7)))
            .await
            .unwrap();
        assert_eq!(quotation.totals.total, Decimal::ZERO);

        let with_item = service.add_item(tenant, quotation.id, shirt()).await.unwrap();
        assert_eq!(with_item.totals.subtotal, dec!(90));
        assert_eq!(with_item.totals.tax_amount, dec!(14.40));
        assert_eq!(with_item.totals.total, dec!(104.40));
        assert_eq!(with_item.base_total, dec!(114.84));

        let item_id = with_item.items[0].id;
        let emptied = service.remove_item(tenant, quotation.id, item_id).await.unwrap();
        assert_eq!(emptied.totals.subtotal, Decimal::ZERO);
        assert_eq!(emptied.totals.total, Decimal::ZERO);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
    async fn test_refused_edit_keeps_reconciled_expiry(pool: PgPool) {
        let service = service(pool.clone());
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());
        let quotation = service
            .create(tenant, user, create_input(today() - Duration::days(10), today()))
            .await
            .unwrap();
        let id = quotation.id;

        // the validity period runs out while the quotation is still a draft
        sqlx::query("UPDATE quotations SET expiry_date = $2 WHERE id = $1")
            .bind(id)
            .bind(today() - Duration::days(1))
            .execute(&pool)
            .await
            .unwrap();

        let result = service.add_item(tenant, id, shirt()).await;
        assert!(matches!(result, Err(AppError::NotEditable(_))));

        let status: String = sqlx::query_scalar("SELECT status FROM quotations WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, "expired");
    }
}
