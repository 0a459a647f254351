//! Inventory ledger service
//!
//! Every quantity change is an adjustment entry written in the same
//! transaction as the update of the record's running quantity. The record row
//! is locked (`FOR UPDATE`) before it is read, so concurrent adjustments to
//! the same record serialize instead of overwriting each other.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    fits_scale, plan_adjustment, plan_reversal, validate_adjustment_magnitude,
    validate_max_quantity, validate_min_quantity, AdjustmentEntry, AdjustmentKind,
    AdjustmentMetadata, AdjustmentMetadataPatch, InventoryRecord, InventoryStatus, LedgerCheck,
    PaginatedResponse, Pagination, StockLevel, QUANTITY_SCALE,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::export::export_to_csv;

/// Inventory service for stock records and their adjustment ledger
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Inventory record as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct InventoryView {
    #[serde(flatten)]
    pub record: InventoryRecord,
    pub stock_level: StockLevel,
}

impl From<InventoryRecord> for InventoryView {
    fn from(record: InventoryRecord) -> Self {
        let stock_level = record.stock_level();
        Self {
            record,
            stock_level,
        }
    }
}

/// Input for provisioning a product into a warehouse
#[derive(Debug, Deserialize, Validate)]
pub struct ProvisionInventoryInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub warehouse_id: Uuid,
    pub min_quantity: Option<Decimal>,
    pub max_quantity: Option<Decimal>,
    pub status: Option<InventoryStatus>,
    /// Opening stock, recorded as an `initial` adjustment
    pub initial_quantity: Option<Decimal>,
}

/// Input for updating thresholds and status; quantity is ledger-only.
/// `"max_quantity": null` removes the overstock threshold.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInventoryInput {
    pub min_quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "shared::nullable")]
    pub max_quantity: Option<Option<Decimal>>,
    pub status: Option<InventoryStatus>,
}

/// Filters for listing inventory records
#[derive(Debug, Default, Deserialize)]
pub struct InventoryListQuery {
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub status: Option<InventoryStatus>,
    /// Only records at or below their minimum quantity
    pub low_stock: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Input for recording an adjustment
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyAdjustmentInput {
    pub kind: AdjustmentKind,
    /// Always positive; the kind decides the sign
    pub quantity: Decimal,
    #[validate(length(max = 100, message = "Reference number is too long"))]
    pub reference_number: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[validate(length(max = 255, message = "Reason is too long"))]
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Input for editing adjustment metadata. Quantity and kind are immutable.
///
/// A missing field is left as it is; an explicit `null` clears it.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateAdjustmentInput {
    #[serde(default, deserialize_with = "shared::nullable")]
    #[validate(length(max = 100, message = "Reference number is too long"))]
    pub reference_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "shared::nullable")]
    pub supplier_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "shared::nullable")]
    #[validate(length(max = 255, message = "Reason is too long"))]
    pub reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "shared::nullable")]
    pub notes: Option<Option<String>>,
}

impl From<UpdateAdjustmentInput> for AdjustmentMetadataPatch {
    fn from(input: UpdateAdjustmentInput) -> Self {
        AdjustmentMetadataPatch {
            reference_number: input.reference_number,
            supplier_id: input.supplier_id,
            reason: input.reason,
            notes: input.notes,
        }
    }
}

/// A recorded adjustment and the quantity it produced
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentResult {
    pub adjustment: AdjustmentEntry,
    pub quantity: Decimal,
}

/// The quantity restored by reversing an adjustment
#[derive(Debug, Clone, Serialize)]
pub struct ReversalResult {
    pub inventory_id: Uuid,
    pub reversed_adjustment_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct InventoryRow {
    id: Uuid,
    tenant_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    warehouse_id: Uuid,
    quantity: Decimal,
    min_quantity: Decimal,
    max_quantity: Option<Decimal>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = AppError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let status = InventoryStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown inventory status '{}'", row.status)))?;

        Ok(InventoryRecord {
            id: row.id,
            tenant_id: row.tenant_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            warehouse_id: row.warehouse_id,
            quantity: row.quantity,
            min_quantity: row.min_quantity,
            max_quantity: row.max_quantity,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AdjustmentRow {
    id: Uuid,
    inventory_id: Uuid,
    kind: String,
    delta: Decimal,
    reference_number: Option<String>,
    supplier_id: Option<Uuid>,
    reason: Option<String>,
    notes: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdjustmentRow> for AdjustmentEntry {
    type Error = AppError;

    fn try_from(row: AdjustmentRow) -> Result<Self, Self::Error> {
        let kind = AdjustmentKind::parse(&row.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown adjustment kind '{}'", row.kind)))?;

        Ok(AdjustmentEntry {
            id: row.id,
            inventory_id: row.inventory_id,
            kind,
            delta: row.delta,
            reference_number: row.reference_number,
            supplier_id: row.supplier_id,
            reason: row.reason,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// Ledger export row
#[derive(Debug, Serialize)]
struct AdjustmentCsvRow {
    created_at: DateTime<Utc>,
    kind: &'static str,
    delta: Decimal,
    balance: Decimal,
    reference_number: Option<String>,
    supplier_id: Option<Uuid>,
    reason: Option<String>,
    notes: Option<String>,
    created_by: Uuid,
}

const INVENTORY_COLUMNS: &str = "id, tenant_id, product_id, variant_id, warehouse_id, quantity, \
     min_quantity, max_quantity, status, created_at, updated_at";

const ADJUSTMENT_COLUMNS: &str = "id, inventory_id, kind, delta, reference_number, supplier_id, \
     reason, notes, created_by, created_at";

/// Check both thresholds, naming whichever one is at fault
fn check_thresholds(min_quantity: Decimal, max_quantity: Option<Decimal>) -> AppResult<()> {
    validate_min_quantity(min_quantity)
        .map_err(|msg| AppError::validation("min_quantity", msg))?;
    validate_max_quantity(min_quantity, max_quantity)
        .map_err(|msg| AppError::validation("max_quantity", msg))
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Provision a product (and optional variant) into a warehouse
    pub async fn provision(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        input: ProvisionInventoryInput,
    ) -> AppResult<InventoryView> {
        input.validate()?;

        let min_quantity = input.min_quantity.unwrap_or(Decimal::ZERO);
        check_thresholds(min_quantity, input.max_quantity)?;

        if let Some(initial) = input.initial_quantity {
            if initial < Decimal::ZERO {
                return Err(AppError::validation(
                    "initial_quantity",
                    "Initial quantity cannot be negative",
                ));
            }
            if !fits_scale(initial, QUANTITY_SCALE) {
                return Err(AppError::validation(
                    "initial_quantity",
                    "Initial quantity cannot have more than 3 decimal places",
                ));
            }
        }

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO inventories (tenant_id, product_id, variant_id, warehouse_id,
                                     min_quantity, max_quantity, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(input.product_id)
        .bind(input.variant_id)
        .bind(input.warehouse_id)
        .bind(min_quantity)
        .bind(input.max_quantity)
        .bind(input.status.unwrap_or_default().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::Conflict(
                "This product is already provisioned in the warehouse".to_string(),
            ),
            other => AppError::DatabaseError(other),
        })?;

        let mut record = InventoryRecord::try_from(row)?;

        if let Some(initial) = input.initial_quantity.filter(|q| *q > Decimal::ZERO) {
            let plan = plan_adjustment(record.quantity, AdjustmentKind::Initial, initial)?;
            Self::insert_adjustment(
                &mut tx,
                record.id,
                plan.kind,
                plan.delta,
                &AdjustmentMetadata {
                    reason: Some("Opening stock".to_string()),
                    ..Default::default()
                },
                user_id,
            )
            .await?;
            record.quantity = Self::apply_delta(&mut tx, record.id, plan.delta).await?;
        }

        tx.commit().await?;

        tracing::info!(
            inventory_id = %record.id,
            product_id = %record.product_id,
            warehouse_id = %record.warehouse_id,
            quantity = %record.quantity,
            "Inventory record provisioned"
        );

        Ok(record.into())
    }

    /// Get an inventory record
    pub async fn get(&self, tenant_id: Uuid, inventory_id: Uuid) -> AppResult<InventoryView> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(inventory_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))?;

        Ok(InventoryRecord::try_from(row)?.into())
    }

    /// List inventory records with optional filters
    pub async fn list(
        &self,
        tenant_id: Uuid,
        query: InventoryListQuery,
    ) -> AppResult<PaginatedResponse<InventoryView>> {
        let pagination = Pagination {
            page: query.page.unwrap_or(1),
            per_page: query.per_page.unwrap_or(20),
        };
        let status = query.status.map(|s| s.as_str());
        let low_stock = query.low_stock.unwrap_or(false);

        const FILTER: &str = r#"
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR warehouse_id = $2)
              AND ($3::uuid IS NULL OR product_id = $3)
              AND ($4::text IS NULL OR status = $4)
              AND (NOT $5 OR quantity <= min_quantity)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM inventories {FILTER}"))
            .bind(tenant_id)
            .bind(query.warehouse_id)
            .bind(query.product_id)
            .bind(status)
            .bind(low_stock)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories {FILTER} \
             ORDER BY created_at DESC LIMIT $6 OFFSET $7"
        ))
        .bind(tenant_id)
        .bind(query.warehouse_id)
        .bind(query.product_id)
        .bind(status)
        .bind(low_stock)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| InventoryRecord::try_from(row).map(InventoryView::from))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse::new(records, &pagination, total.max(0) as u64))
    }

    /// Update thresholds and status of a record
    pub async fn update(
        &self,
        tenant_id: Uuid,
        inventory_id: Uuid,
        input: UpdateInventoryInput,
    ) -> AppResult<InventoryView> {
        let mut tx = self.db.begin().await?;
        let existing = Self::lock_record(&mut tx, tenant_id, inventory_id).await?;

        let min_quantity = input.min_quantity.unwrap_or(existing.min_quantity);
        let max_quantity = input.max_quantity.unwrap_or(existing.max_quantity);
        let status = input.status.unwrap_or(existing.status);
        check_thresholds(min_quantity, max_quantity)?;

        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            UPDATE inventories
            SET min_quantity = $1, max_quantity = $2, status = $3
            WHERE id = $4
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(min_quantity)
        .bind(max_quantity)
        .bind(status.as_str())
        .bind(inventory_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(InventoryRecord::try_from(row)?.into())
    }

    /// Record an adjustment and move the record's quantity by its delta
    pub async fn apply_adjustment(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        inventory_id: Uuid,
        input: ApplyAdjustmentInput,
    ) -> AppResult<AdjustmentResult> {
        input.validate()?;
        validate_adjustment_magnitude(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;

        let mut tx = self.db.begin().await?;
        let record = Self::lock_record(&mut tx, tenant_id, inventory_id).await?;

        // Dropping `tx` on error rolls back; nothing has been written yet
        let plan = plan_adjustment(record.quantity, input.kind, input.quantity)?;

        let metadata = AdjustmentMetadata {
            reference_number: input.reference_number,
            supplier_id: input.supplier_id,
            reason: input.reason,
            notes: input.notes,
        };

        let adjustment =
            Self::insert_adjustment(&mut tx, inventory_id, plan.kind, plan.delta, &metadata, user_id)
                .await?;
        let quantity = Self::apply_delta(&mut tx, inventory_id, plan.delta).await?;

        tx.commit().await?;

        tracing::info!(
            inventory_id = %inventory_id,
            adjustment_id = %adjustment.id,
            kind = %plan.kind,
            delta = %plan.delta,
            quantity_before = %plan.quantity_before,
            quantity_after = %quantity,
            "Inventory adjusted"
        );

        Ok(AdjustmentResult {
            adjustment,
            quantity,
        })
    }

    /// Remove an adjustment, taking its delta back out of the quantity
    pub async fn reverse_adjustment(
        &self,
        tenant_id: Uuid,
        inventory_id: Uuid,
        adjustment_id: Uuid,
    ) -> AppResult<ReversalResult> {
        let mut tx = self.db.begin().await?;
        let record = Self::lock_record(&mut tx, tenant_id, inventory_id).await?;

        let entry = Self::fetch_adjustment(&mut tx, inventory_id, adjustment_id).await?;

        let restored = plan_reversal(record.quantity, entry.delta);
        if restored < Decimal::ZERO {
            tracing::warn!(
                inventory_id = %inventory_id,
                adjustment_id = %adjustment_id,
                quantity = %restored,
                "Reversal leaves inventory below zero"
            );
        }

        let quantity = Self::apply_delta(&mut tx, inventory_id, -entry.delta).await?;

        sqlx::query("DELETE FROM inventory_adjustments WHERE id = $1")
            .bind(adjustment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        // The ledger row is gone; the log keeps the only trace of it
        tracing::info!(
            inventory_id = %inventory_id,
            adjustment_id = %adjustment_id,
            kind = %entry.kind,
            delta = %entry.delta,
            reference_number = ?entry.reference_number,
            created_by = %entry.created_by,
            created_at = %entry.created_at,
            quantity_after = %quantity,
            "Inventory adjustment reversed"
        );

        Ok(ReversalResult {
            inventory_id,
            reversed_adjustment_id: adjustment_id,
            quantity,
        })
    }

    /// Edit reference number, supplier, reason and notes of an adjustment
    pub async fn update_adjustment_metadata(
        &self,
        tenant_id: Uuid,
        inventory_id: Uuid,
        adjustment_id: Uuid,
        input: UpdateAdjustmentInput,
    ) -> AppResult<AdjustmentEntry> {
        input.validate()?;

        let mut tx = self.db.begin().await?;
        Self::lock_record(&mut tx, tenant_id, inventory_id).await?;
        let entry = Self::fetch_adjustment(&mut tx, inventory_id, adjustment_id).await?;

        let current = AdjustmentMetadata {
            reference_number: entry.reference_number,
            supplier_id: entry.supplier_id,
            reason: entry.reason,
            notes: entry.notes,
        };
        let metadata = current.merged(input.into());

        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r#"
            UPDATE inventory_adjustments
            SET reference_number = $1, supplier_id = $2, reason = $3, notes = $4
            WHERE id = $5
            RETURNING {ADJUSTMENT_COLUMNS}
            "#
        ))
        .bind(&metadata.reference_number)
        .bind(metadata.supplier_id)
        .bind(&metadata.reason)
        .bind(&metadata.notes)
        .bind(adjustment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        AdjustmentEntry::try_from(row)
    }

    /// Get one adjustment of a record
    pub async fn get_adjustment(
        &self,
        tenant_id: Uuid,
        inventory_id: Uuid,
        adjustment_id: Uuid,
    ) -> AppResult<AdjustmentEntry> {
        self.ensure_record(tenant_id, inventory_id).await?;
        let mut conn = self.db.acquire().await?;
        Self::fetch_adjustment(&mut conn, inventory_id, adjustment_id).await
    }

    /// List a record's adjustments in creation order
    pub async fn list_adjustments(
        &self,
        tenant_id: Uuid,
        inventory_id: Uuid,
    ) -> AppResult<Vec<AdjustmentEntry>> {
        self.ensure_record(tenant_id, inventory_id).await?;

        let rows = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r#"
            SELECT {ADJUSTMENT_COLUMNS}
            FROM inventory_adjustments
            WHERE inventory_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(inventory_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AdjustmentEntry::try_from).collect()
    }

    /// Compare the stored quantity with the sum of the ledger
    pub async fn verify_ledger(&self, tenant_id: Uuid, inventory_id: Uuid) -> AppResult<LedgerCheck> {
        let record = self.get(tenant_id, inventory_id).await?.record;

        let deltas: Vec<Decimal> = sqlx::query_scalar(
            "SELECT delta FROM inventory_adjustments WHERE inventory_id = $1 ORDER BY created_at, id",
        )
        .bind(inventory_id)
        .fetch_all(&self.db)
        .await?;

        let check = LedgerCheck::new(inventory_id, record.quantity, &deltas);
        if !check.balanced {
            tracing::error!(
                inventory_id = %inventory_id,
                stored = %check.stored_quantity,
                ledger = %check.ledger_quantity,
                "Inventory quantity does not match its ledger"
            );
        }

        Ok(check)
    }

    /// Export a record's ledger as CSV with a running balance column
    pub async fn export_adjustments_csv(
        &self,
        tenant_id: Uuid,
        inventory_id: Uuid,
    ) -> AppResult<String> {
        let entries = self.list_adjustments(tenant_id, inventory_id).await?;

        let mut balance = Decimal::ZERO;
        let rows: Vec<AdjustmentCsvRow> = entries
            .into_iter()
            .map(|entry| {
                balance += entry.delta;
                AdjustmentCsvRow {
                    created_at: entry.created_at,
                    kind: entry.kind.as_str(),
                    delta: entry.delta,
                    balance,
                    reference_number: entry.reference_number,
                    supplier_id: entry.supplier_id,
                    reason: entry.reason,
                    notes: entry.notes,
                    created_by: entry.created_by,
                }
            })
            .collect();

        export_to_csv(&rows)
    }

    async fn ensure_record(&self, tenant_id: Uuid, inventory_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventories WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(inventory_id)
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Inventory record".to_string()));
        }
        Ok(())
    }

    /// Load a record and hold its row lock until the transaction ends
    async fn lock_record(
        conn: &mut PgConnection,
        tenant_id: Uuid,
        inventory_id: Uuid,
    ) -> AppResult<InventoryRecord> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE id = $1 AND tenant_id = $2 FOR UPDATE"
        ))
        .bind(inventory_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))?;

        InventoryRecord::try_from(row)
    }

    /// Fetch an adjustment only if it belongs to the given record
    async fn fetch_adjustment(
        conn: &mut PgConnection,
        inventory_id: Uuid,
        adjustment_id: Uuid,
    ) -> AppResult<AdjustmentEntry> {
        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            "SELECT {ADJUSTMENT_COLUMNS} FROM inventory_adjustments WHERE id = $1 AND inventory_id = $2"
        ))
        .bind(adjustment_id)
        .bind(inventory_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Adjustment".to_string()))?;

        AdjustmentEntry::try_from(row)
    }

    async fn insert_adjustment(
        conn: &mut PgConnection,
        inventory_id: Uuid,
        kind: AdjustmentKind,
        delta: Decimal,
        metadata: &AdjustmentMetadata,
        user_id: Uuid,
    ) -> AppResult<AdjustmentEntry> {
        let row = sqlx::query_as::<_, AdjustmentRow>(&format!(
            r#"
            INSERT INTO inventory_adjustments (inventory_id, kind, delta, reference_number,
                                               supplier_id, reason, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADJUSTMENT_COLUMNS}
            "#
        ))
        .bind(inventory_id)
        .bind(kind.as_str())
        .bind(delta)
        .bind(&metadata.reference_number)
        .bind(metadata.supplier_id)
        .bind(&metadata.reason)
        .bind(&metadata.notes)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        AdjustmentEntry::try_from(row)
    }

    async fn apply_delta(
        conn: &mut PgConnection,
        inventory_id: Uuid,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        let quantity = sqlx::query_scalar::<_, Decimal>(
            "UPDATE inventories SET quantity = quantity + $1 WHERE id = $2 RETURNING quantity",
        )
        .bind(delta)
        .bind(inventory_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(quantity)
    }
}
