//! Sale service
//!
//! Sales are edited in `draft`, confirmed into `pending`, and then driven by
//! payments and the calendar. Totals are recomputed inside every command that
//! changes items, shipping, tax mode or payments, in the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    calculate_sale_totals, to_base_currency, validate_non_negative_amount,
    validate_payment_amount, DocumentKind, OrderTotals, PaginatedResponse, Pagination, Payment,
    PaymentMethod, Sale, SaleEvent, SaleStatus, SaleTotals,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::DocumentsConfig;
use crate::error::{AppError, AppResult};
use crate::services::documents::{check_currency, next_document_number, today};
use crate::services::line_items::{self, ItemTable, LineItemPayload};

#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    defaults: DocumentsConfig,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleInput {
    pub customer_id: Option<Uuid>,
    pub sale_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(equal = 3, message = "Currency code must be three letters"))]
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub include_tax: Option<bool>,
    pub shipping_amount: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemPayload>,
}

/// Header changes; totals follow automatically
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSaleInput {
    pub customer_id: Option<Uuid>,
    pub sale_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub include_tax: Option<bool>,
    pub shipping_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    pub status: Option<SaleStatus>,
    pub customer_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[validate(length(max = 100, message = "Reference is too long"))]
    pub reference: Option<String>,
    pub paid_at: Option<NaiveDate>,
}

/// Header of a sale about to be inserted
pub(crate) struct NewSale {
    pub customer_id: Option<Uuid>,
    pub quotation_id: Option<Uuid>,
    pub sale_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    pub include_tax: bool,
    pub shipping_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    tenant_id: Uuid,
    number: String,
    customer_id: Option<Uuid>,
    quotation_id: Option<Uuid>,
    status: String,
    sale_date: NaiveDate,
    due_date: Option<NaiveDate>,
    currency_code: String,
    exchange_rate: Decimal,
    include_tax: bool,
    subtotal: Decimal,
    discount_amount: Decimal,
    tax_amount: Decimal,
    shipping_amount: Decimal,
    total: Decimal,
    amount_paid: Decimal,
    amount_due: Decimal,
    notes: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let status = SaleStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown sale status '{}'", row.status)))?;

        Ok(Sale {
            id: row.id,
            tenant_id: row.tenant_id,
            number: row.number,
            customer_id: row.customer_id,
            quotation_id: row.quotation_id,
            status,
            sale_date: row.sale_date,
            due_date: row.due_date,
            currency_code: row.currency_code,
            exchange_rate: row.exchange_rate,
            include_tax: row.include_tax,
            totals: SaleTotals {
                order: OrderTotals {
                    subtotal: row.subtotal,
                    discount_amount: row.discount_amount,
                    tax_amount: row.tax_amount,
                    total: row.total,
                },
                shipping_amount: row.shipping_amount,
                amount_paid: row.amount_paid,
                amount_due: row.amount_due,
            },
            base_total: to_base_currency(row.total, row.exchange_rate),
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            items: Vec::new(),
            payments: Vec::new(),
        })
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    sale_id: Uuid,
    number: String,
    amount: Decimal,
    method: String,
    reference: Option<String>,
    paid_at: NaiveDate,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method = PaymentMethod::parse(&row.method)
            .ok_or_else(|| AppError::Internal(format!("Unknown payment method '{}'", row.method)))?;

        Ok(Payment {
            id: row.id,
            sale_id: row.sale_id,
            number: row.number,
            amount: row.amount,
            method,
            reference: row.reference,
            paid_at: row.paid_at,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

const SALE_COLUMNS: &str = "id, tenant_id, number, customer_id, quotation_id, status, sale_date, \
     due_date, currency_code, exchange_rate, include_tax, subtotal, discount_amount, tax_amount, \
     shipping_amount, total, amount_paid, amount_due, notes, created_by, created_at, updated_at";

const PAYMENT_COLUMNS: &str =
    "id, sale_id, number, amount, method, reference, paid_at, created_by, created_at";

fn check_shipping(amount: Decimal) -> AppResult<()> {
    validate_non_negative_amount(amount).map_err(|msg| AppError::validation("shipping_amount", msg))
}

impl SaleService {
    pub fn new(db: PgPool, defaults: DocumentsConfig) -> Self {
        Self { db, defaults }
    }

    /// Create a draft sale, optionally with its first items
    pub async fn create(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<Sale> {
        input.validate()?;
        for item in &input.items {
            item.check()?;
        }

        let header = NewSale {
            customer_id: input.customer_id,
            quotation_id: None,
            sale_date: input.sale_date.unwrap_or_else(today),
            due_date: input.due_date,
            currency_code: input
                .currency_code
                .unwrap_or_else(|| self.defaults.default_currency.clone()),
            exchange_rate: input
                .exchange_rate
                .unwrap_or(self.defaults.default_exchange_rate),
            include_tax: input.include_tax.unwrap_or(true),
            shipping_amount: input.shipping_amount.unwrap_or(Decimal::ZERO),
            notes: input.notes,
        };

        let mut tx = self.db.begin().await?;

        let sale_id = Self::insert_sale(&mut tx, tenant_id, user_id, &header).await?;
        for item in &input.items {
            line_items::insert_item(&mut tx, ItemTable::Sale, sale_id, item).await?;
        }
        let sale = Self::lock(&mut tx, tenant_id, sale_id).await?;
        Self::recalculate(&mut tx, &sale).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale_id, number = %sale.number, "Sale created");

        self.get(tenant_id, sale_id).await
    }

    /// Get a sale with its items and payments
    pub async fn get(&self, tenant_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;

        let mut sale = Self::lock(&mut tx, tenant_id, sale_id).await?;
        Self::reconcile(&mut tx, &mut sale).await?;
        sale.items = line_items::fetch_items(&mut tx, ItemTable::Sale, sale_id).await?;
        sale.payments = Self::fetch_payments(&mut tx, sale_id).await?;

        tx.commit().await?;

        Ok(sale)
    }

    /// List sales, newest first
    pub async fn list(
        &self,
        tenant_id: Uuid,
        query: SaleListQuery,
    ) -> AppResult<PaginatedResponse<Sale>> {
        self.sweep_overdue(tenant_id).await?;

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

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales {FILTER}"))
            .bind(tenant_id)
            .bind(status)
            .bind(query.customer_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales {FILTER} \
             ORDER BY sale_date DESC, created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(tenant_id)
        .bind(status)
        .bind(query.customer_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let sales = rows
            .into_iter()
            .map(Sale::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse::new(sales, &pagination, total.max(0) as u64))
    }

    /// Update the header of a draft sale
    pub async fn update(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
        input: UpdateSaleInput,
    ) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;
        let sale = Self::lock_editable(&mut tx, tenant_id, sale_id).await?;

        let currency_code = input.currency_code.unwrap_or(sale.currency_code);
        let exchange_rate = input.exchange_rate.unwrap_or(sale.exchange_rate);
        check_currency(&currency_code, exchange_rate)?;
        let shipping_amount = input.shipping_amount.unwrap_or(sale.totals.shipping_amount);
        check_shipping(shipping_amount)?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            UPDATE sales
            SET customer_id = $2, sale_date = $3, due_date = $4, currency_code = $5,
                exchange_rate = $6, include_tax = $7, shipping_amount = $8, notes = $9
            WHERE id = $1
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(sale_id)
        .bind(input.customer_id.or(sale.customer_id))
        .bind(input.sale_date.unwrap_or(sale.sale_date))
        .bind(input.due_date.or(sale.due_date))
        .bind(&currency_code)
        .bind(exchange_rate)
        .bind(input.include_tax.unwrap_or(sale.include_tax))
        .bind(shipping_amount)
        .bind(input.notes.or(sale.notes))
        .fetch_one(&mut *tx)
        .await?;

        let updated = Sale::try_from(row)?;
        Self::recalculate(&mut tx, &updated).await?;

        tx.commit().await?;

        self.get(tenant_id, sale_id).await
    }

    pub async fn add_item(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
        item: LineItemPayload,
    ) -> AppResult<Sale> {
        item.check()?;

        let mut tx = self.db.begin().await?;
        let sale = Self::lock_editable(&mut tx, tenant_id, sale_id).await?;
        line_items::insert_item(&mut tx, ItemTable::Sale, sale_id, &item).await?;
        Self::recalculate(&mut tx, &sale).await?;
        tx.commit().await?;

        self.get(tenant_id, sale_id).await
    }

    pub async fn update_item(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
        item_id: Uuid,
        item: LineItemPayload,
    ) -> AppResult<Sale> {
        item.check()?;

        let mut tx = self.db.begin().await?;
        let sale = Self::lock_editable(&mut tx, tenant_id, sale_id).await?;
        line_items::replace_item(&mut tx, ItemTable::Sale, sale_id, item_id, &item).await?;
        Self::recalculate(&mut tx, &sale).await?;
        tx.commit().await?;

        self.get(tenant_id, sale_id).await
    }

    pub async fn remove_item(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;
        let sale = Self::lock_editable(&mut tx, tenant_id, sale_id).await?;
        line_items::delete_item(&mut tx, ItemTable::Sale, sale_id, item_id).await?;
        Self::recalculate(&mut tx, &sale).await?;
        tx.commit().await?;

        self.get(tenant_id, sale_id).await
    }

    /// Move a draft sale to `pending`
    pub async fn confirm(&self, tenant_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;
        let mut sale = Self::lock(&mut tx, tenant_id, sale_id).await?;

        let status = sale.status.transition(SaleEvent::Confirm)?;

        let item_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE sale_id = $1")
                .bind(sale_id)
                .fetch_one(&mut *tx)
                .await?;
        if item_count == 0 {
            return Err(AppError::validation("items", "A sale needs at least one item"));
        }

        Self::set_status(&mut tx, sale_id, status).await?;
        sale.status = status;
        Self::reconcile(&mut tx, &mut sale).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale_id, number = %sale.number, "Sale confirmed");

        self.get(tenant_id, sale_id).await
    }

    /// Record a payment and move the sale along the payment lifecycle
    pub async fn record_payment(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        sale_id: Uuid,
        input: RecordPaymentInput,
    ) -> AppResult<Sale> {
        input.validate()?;
        validate_payment_amount(input.amount).map_err(|msg| AppError::validation("amount", msg))?;

        let mut tx = self.db.begin().await?;
        let mut sale = Self::lock(&mut tx, tenant_id, sale_id).await?;
        Self::reconcile(&mut tx, &mut sale).await?;

        // Rejects draft and canceled sales before anything is written
        sale.status.transition(SaleEvent::PaymentsChanged {
            amount_paid: sale.totals.amount_paid + input.amount,
            total: sale.totals.total(),
        })?;

        if input.amount > sale.totals.amount_due {
            return Err(AppError::validation(
                "amount",
                format!("Payment exceeds the amount due of {}", sale.totals.amount_due),
            ));
        }

        let number = next_document_number(&mut tx, tenant_id, DocumentKind::Payment).await?;

        let payment = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO sale_payments (sale_id, number, amount, method, reference, paid_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(sale_id)
        .bind(&number)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(&input.reference)
        .bind(input.paid_at.unwrap_or_else(today))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let payment = Payment::try_from(payment)?;
        let totals = Self::recalculate(&mut tx, &sale).await?;
        Self::apply_payments(&mut tx, &mut sale, &totals).await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale_id,
            payment = %payment.number,
            amount = %payment.amount,
            amount_due = %totals.amount_due,
            status = sale.status.as_str(),
            "Payment recorded"
        );

        self.get(tenant_id, sale_id).await
    }

    /// Remove a payment; the sale may fall back from `paid`
    pub async fn remove_payment(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
        payment_id: Uuid,
    ) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;
        let mut sale = Self::lock(&mut tx, tenant_id, sale_id).await?;

        if !sale.status.accepts_payments() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot remove payments from a sale in status '{}'",
                sale.status.as_str()
            )));
        }

        let removed: Option<Decimal> = sqlx::query_scalar(
            "DELETE FROM sale_payments WHERE id = $1 AND sale_id = $2 RETURNING amount",
        )
        .bind(payment_id)
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?;

        let amount = removed.ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

        let totals = Self::recalculate(&mut tx, &sale).await?;
        Self::apply_payments(&mut tx, &mut sale, &totals).await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale_id,
            payment_id = %payment_id,
            amount = %amount,
            status = sale.status.as_str(),
            "Payment removed"
        );

        self.get(tenant_id, sale_id).await
    }

    pub async fn cancel(&self, tenant_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;
        let sale = Self::lock(&mut tx, tenant_id, sale_id).await?;

        let status = sale.status.transition(SaleEvent::Cancel)?;
        Self::set_status(&mut tx, sale_id, status).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale_id, number = %sale.number, "Sale canceled");

        self.get(tenant_id, sale_id).await
    }

    /// Soft-delete a draft sale. Its number is not reused.
    pub async fn delete(&self, tenant_id: Uuid, sale_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        Self::lock_editable(&mut tx, tenant_id, sale_id).await?;

        sqlx::query("UPDATE sales SET deleted_at = NOW() WHERE id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    pub(crate) async fn insert_sale(
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        header: &NewSale,
    ) -> AppResult<Uuid> {
        check_currency(&header.currency_code, header.exchange_rate)?;
        check_shipping(header.shipping_amount)?;

        let number = next_document_number(conn, tenant_id, DocumentKind::Sale).await?;

        let sale_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO sales (tenant_id, number, customer_id, quotation_id, sale_date, due_date,
                               currency_code, exchange_rate, include_tax, shipping_amount,
                               total, amount_due, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(&number)
        .bind(header.customer_id)
        .bind(header.quotation_id)
        .bind(header.sale_date)
        .bind(header.due_date)
        .bind(&header.currency_code)
        .bind(header.exchange_rate)
        .bind(header.include_tax)
        .bind(header.shipping_amount)
        .bind(&header.notes)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(sale_id)
    }

    /// Recompute the totals of a sale written within the same transaction;
    /// returns its number
    pub(crate) async fn refresh_totals(
        conn: &mut PgConnection,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> AppResult<String> {
        let sale = Self::lock(conn, tenant_id, sale_id).await?;
        Self::recalculate(conn, &sale).await?;
        Ok(sale.number)
    }

    /// Recompute and store the aggregates of a sale from its items and payments
    async fn recalculate(conn: &mut PgConnection, sale: &Sale) -> AppResult<SaleTotals> {
        let amounts = line_items::fetch_amounts(conn, ItemTable::Sale, sale.id).await?;
        let amount_paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM sale_payments WHERE sale_id = $1",
        )
        .bind(sale.id)
        .fetch_one(&mut *conn)
        .await?;

        let totals = calculate_sale_totals(
            &amounts,
            sale.include_tax,
            sale.totals.shipping_amount,
            amount_paid,
        );

        sqlx::query(
            r#"
            UPDATE sales
            SET subtotal = $2, discount_amount = $3, tax_amount = $4, total = $5,
                amount_paid = $6, amount_due = $7
            WHERE id = $1
            "#,
        )
        .bind(sale.id)
        .bind(totals.order.subtotal)
        .bind(totals.order.discount_amount)
        .bind(totals.order.tax_amount)
        .bind(totals.order.total)
        .bind(totals.amount_paid)
        .bind(totals.amount_due)
        .execute(&mut *conn)
        .await?;

        Ok(totals)
    }

    /// Derive the status from new payment totals, then re-check the due date
    async fn apply_payments(
        conn: &mut PgConnection,
        sale: &mut Sale,
        totals: &SaleTotals,
    ) -> AppResult<()> {
        let status = sale.status.transition(SaleEvent::PaymentsChanged {
            amount_paid: totals.amount_paid,
            total: totals.total(),
        })?;
        let status = status.reconcile(sale.due_date, today(), totals.amount_due);

        if status != sale.status {
            Self::set_status(conn, sale.id, status).await?;
            sale.status = status;
        }
        sale.totals = *totals;
        sale.base_total = to_base_currency(totals.total(), sale.exchange_rate);
        Ok(())
    }

    /// Persist a calendar-driven move to `overdue`
    async fn reconcile(conn: &mut PgConnection, sale: &mut Sale) -> AppResult<()> {
        let status = sale
            .status
            .reconcile(sale.due_date, today(), sale.totals.amount_due);

        if status != sale.status {
            Self::set_status(conn, sale.id, status).await?;
            tracing::info!(
                sale_id = %sale.id,
                from = sale.status.as_str(),
                to = status.as_str(),
                "Sale status reconciled"
            );
            sale.status = status;
        }
        Ok(())
    }

    /// Reconcile every sale of the tenant whose due date has passed
    async fn sweep_overdue(&self, tenant_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE tenant_id = $1 AND deleted_at IS NULL
              AND status IN ('pending', 'partial')
              AND due_date < $2 AND amount_due > 0
            FOR UPDATE
            "#
        ))
        .bind(tenant_id)
        .bind(today())
        .fetch_all(&mut *tx)
        .await?;

        for row in rows {
            let mut sale = Sale::try_from(row)?;
            Self::reconcile(&mut tx, &mut sale).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_status(conn: &mut PgConnection, sale_id: Uuid, status: SaleStatus) -> AppResult<()> {
        sqlx::query("UPDATE sales SET status = $2 WHERE id = $1")
            .bind(sale_id)
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Load a sale and hold its row lock until the transaction ends
    async fn lock(conn: &mut PgConnection, tenant_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL FOR UPDATE"
        ))
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        Sale::try_from(row)
    }

    async fn lock_editable(
        conn: &mut PgConnection,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> AppResult<Sale> {
        let sale = Self::lock(conn, tenant_id, sale_id).await?;
        if !sale.status.is_editable() {
            return Err(AppError::NotEditable(format!("Sale {}", sale.number)));
        }
        Ok(sale)
    }

    async fn fetch_payments(conn: &mut PgConnection, sale_id: Uuid) -> AppResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM sale_payments WHERE sale_id = $1 ORDER BY paid_at, created_at"
        ))
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
