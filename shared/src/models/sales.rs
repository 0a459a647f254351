//! Quotation, sale and payment documents

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{LineItemAmounts, LineItemInput, OrderTotals, SaleTotals};
use super::status::{QuotationStatus, SaleStatus};

/// A priced line of a quotation or sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    /// Owning quotation or sale
    pub document_id: Uuid,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    pub fn pricing(&self) -> LineItemInput {
        LineItemInput {
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_percentage: self.discount_percentage,
            discount_amount: self.discount_amount,
            tax_percentage: self.tax_percentage,
        }
    }

    pub fn amounts(&self) -> LineItemAmounts {
        LineItemAmounts {
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            tax_amount: self.tax_amount,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub number: String,
    pub customer_id: Option<Uuid>,
    pub status: QuotationStatus,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    pub include_tax: bool,
    #[serde(flatten)]
    pub totals: OrderTotals,
    /// `total` converted at `exchange_rate`
    pub base_total: Decimal,
    pub notes: Option<String>,
    pub converted_sale_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Left empty in list responses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub number: String,
    pub customer_id: Option<Uuid>,
    pub quotation_id: Option<Uuid>,
    pub status: SaleStatus,
    pub sale_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    pub include_tax: bool,
    #[serde(flatten)]
    pub totals: SaleTotals,
    /// `total` converted at `exchange_rate`
    pub base_total: Decimal,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<Payment>,
}

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "transfer" => Some(PaymentMethod::Transfer),
            "check" => Some(PaymentMethod::Check),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

/// Money received against a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub number: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub paid_at: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
