//! Inventory ledger models
//!
//! An inventory record carries a denormalized `quantity` that must always
//! equal the sum of the signed deltas of its adjustment entries. Everything
//! in this module is pure: the backend wraps these plans in a transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::{fits_scale, QUANTITY_SCALE};

/// Stock held for one product (and optional variant) in one warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub max_quantity: Option<Decimal>,
    pub status: InventoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    pub fn stock_level(&self) -> StockLevel {
        classify_stock(self.quantity, self.min_quantity, self.max_quantity)
    }
}

/// Availability status of an inventory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    #[default]
    Active,
    Reserved,
    Damaged,
    Expired,
}

impl InventoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryStatus::Active => "active",
            InventoryStatus::Reserved => "reserved",
            InventoryStatus::Damaged => "damaged",
            InventoryStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(InventoryStatus::Active),
            "reserved" => Some(InventoryStatus::Reserved),
            "damaged" => Some(InventoryStatus::Damaged),
            "expired" => Some(InventoryStatus::Expired),
            _ => None,
        }
    }
}

/// Kind of an adjustment entry. The kind fixes the sign of the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Addition,
    Subtraction,
    Correction,
    Transfer,
    Loss,
    Damaged,
    Expired,
    Initial,
}

/// Direction a kind moves stock in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Increase,
    Decrease,
}

impl AdjustmentKind {
    pub const ALL: [AdjustmentKind; 8] = [
        AdjustmentKind::Addition,
        AdjustmentKind::Subtraction,
        AdjustmentKind::Correction,
        AdjustmentKind::Transfer,
        AdjustmentKind::Loss,
        AdjustmentKind::Damaged,
        AdjustmentKind::Expired,
        AdjustmentKind::Initial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::Addition => "addition",
            AdjustmentKind::Subtraction => "subtraction",
            AdjustmentKind::Correction => "correction",
            AdjustmentKind::Transfer => "transfer",
            AdjustmentKind::Loss => "loss",
            AdjustmentKind::Damaged => "damaged",
            AdjustmentKind::Expired => "expired",
            AdjustmentKind::Initial => "initial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            AdjustmentKind::Addition | AdjustmentKind::Correction | AdjustmentKind::Initial => {
                Polarity::Increase
            }
            AdjustmentKind::Subtraction
            | AdjustmentKind::Transfer
            | AdjustmentKind::Loss
            | AdjustmentKind::Damaged
            | AdjustmentKind::Expired => Polarity::Decrease,
        }
    }

    /// True for kinds that remove stock and therefore need availability
    pub fn is_reducing(&self) -> bool {
        self.polarity() == Polarity::Decrease
    }
}

impl std::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable change to an inventory record's quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub kind: AdjustmentKind,
    /// Signed: negative for reducing kinds
    pub delta: Decimal,
    pub reference_number: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The only fields of an adjustment that may change after it is recorded
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdjustmentMetadata {
    pub reference_number: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Metadata changes: `None` keeps a field, `Some(None)` clears it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdjustmentMetadataPatch {
    #[serde(default, deserialize_with = "crate::nullable")]
    pub reference_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::nullable")]
    pub supplier_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::nullable")]
    pub reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::nullable")]
    pub notes: Option<Option<String>>,
}

impl AdjustmentMetadata {
    /// Overlay `patch` on top of `self`
    pub fn merged(&self, patch: AdjustmentMetadataPatch) -> AdjustmentMetadata {
        AdjustmentMetadata {
            reference_number: patch
                .reference_number
                .unwrap_or_else(|| self.reference_number.clone()),
            supplier_id: patch.supplier_id.unwrap_or(self.supplier_id),
            reason: patch.reason.unwrap_or_else(|| self.reason.clone()),
            notes: patch.notes.unwrap_or_else(|| self.notes.clone()),
        }
    }
}

/// Ledger rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Adjustment quantity must be positive, got {0}")]
    NonPositiveMagnitude(Decimal),

    #[error("Adjustment quantity {0} has more than 3 decimal places")]
    ExcessPrecision(Decimal),

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },
}

/// The outcome of an adjustment before it is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdjustmentPlan {
    pub kind: AdjustmentKind,
    pub delta: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
}

/// Signed delta for a kind and a positive magnitude
pub fn signed_delta(kind: AdjustmentKind, magnitude: Decimal) -> Result<Decimal, LedgerError> {
    if magnitude <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveMagnitude(magnitude));
    }
    if !fits_scale(magnitude, QUANTITY_SCALE) {
        return Err(LedgerError::ExcessPrecision(magnitude));
    }

    Ok(match kind.polarity() {
        Polarity::Increase => magnitude,
        Polarity::Decrease => -magnitude,
    })
}

/// Plan an adjustment against the current quantity.
///
/// Reducing kinds require `current >= magnitude`; the plan never drives a
/// record below zero.
pub fn plan_adjustment(
    current: Decimal,
    kind: AdjustmentKind,
    magnitude: Decimal,
) -> Result<AdjustmentPlan, LedgerError> {
    let delta = signed_delta(kind, magnitude)?;

    if kind.is_reducing() && current < magnitude {
        return Err(LedgerError::InsufficientStock {
            available: current,
            requested: magnitude,
        });
    }

    Ok(AdjustmentPlan {
        kind,
        delta,
        quantity_before: current,
        quantity_after: current + delta,
    })
}

/// Quantity after removing an entry from the ledger
pub fn plan_reversal(current: Decimal, entry_delta: Decimal) -> Decimal {
    current - entry_delta
}

/// Rebuild the quantity from the ledger
pub fn replay_ledger<I>(deltas: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    deltas.into_iter().fold(Decimal::ZERO, |acc, delta| acc + delta)
}

/// Stock level relative to configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    Normal,
    Over,
}

pub fn classify_stock(quantity: Decimal, min: Decimal, max: Option<Decimal>) -> StockLevel {
    if quantity <= Decimal::ZERO {
        StockLevel::OutOfStock
    } else if quantity <= min {
        StockLevel::Low
    } else if max.is_some_and(|max| quantity > max) {
        StockLevel::Over
    } else {
        StockLevel::Normal
    }
}

/// Result of comparing a record's stored quantity with its replayed ledger
#[derive(Debug, Clone, Serialize)]
pub struct LedgerCheck {
    pub inventory_id: Uuid,
    pub stored_quantity: Decimal,
    pub ledger_quantity: Decimal,
    pub entry_count: usize,
    pub balanced: bool,
}

impl LedgerCheck {
    pub fn new(inventory_id: Uuid, stored_quantity: Decimal, deltas: &[Decimal]) -> Self {
        let ledger_quantity = replay_ledger(deltas.iter().copied());
        Self {
            inventory_id,
            stored_quantity,
            ledger_quantity,
            entry_count: deltas.len(),
            balanced: ledger_quantity == stored_quantity,
        }
    }
}
