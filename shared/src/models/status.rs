//! Quotation and sale lifecycles
//!
//! Each document type has one transition function. Every mutation that can
//! move a document (user action, payment, calendar) goes through it, so the
//! stored status is never stale.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected status transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {event} a {document} in status '{from}'")]
pub struct TransitionError {
    pub document: &'static str,
    pub from: &'static str,
    pub event: &'static str,
}

// ============================================================================
// Quotations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Rejected,
    Expired,
    Converted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotationEvent {
    Send,
    Approve,
    Reject,
    Convert,
    ExpiryPassed,
}

impl QuotationEvent {
    fn as_str(&self) -> &'static str {
        match self {
            QuotationEvent::Send => "send",
            QuotationEvent::Approve => "approve",
            QuotationEvent::Reject => "reject",
            QuotationEvent::Convert => "convert",
            QuotationEvent::ExpiryPassed => "expire",
        }
    }
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "draft",
            QuotationStatus::Sent => "sent",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Expired => "expired",
            QuotationStatus::Converted => "converted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(QuotationStatus::Draft),
            "sent" => Some(QuotationStatus::Sent),
            "approved" => Some(QuotationStatus::Approved),
            "rejected" => Some(QuotationStatus::Rejected),
            "expired" => Some(QuotationStatus::Expired),
            "converted" => Some(QuotationStatus::Converted),
            _ => None,
        }
    }

    /// Only drafts accept header and line item changes
    pub fn is_editable(&self) -> bool {
        matches!(self, QuotationStatus::Draft)
    }

    pub fn transition(self, event: QuotationEvent) -> Result<Self, TransitionError> {
        use QuotationEvent as E;
        use QuotationStatus as S;

        match (self, event) {
            (S::Draft, E::Send) => Ok(S::Sent),
            (S::Sent, E::Approve) => Ok(S::Approved),
            (S::Sent, E::Reject) => Ok(S::Rejected),
            (S::Sent | S::Approved, E::Convert) => Ok(S::Converted),
            (S::Draft | S::Sent, E::ExpiryPassed) => Ok(S::Expired),
            (from, event) => Err(TransitionError {
                document: "quotation",
                from: from.as_str(),
                event: event.as_str(),
            }),
        }
    }

    /// Apply calendar-driven transitions.
    ///
    /// An open quotation (draft or sent) whose expiry date is before `today`
    /// becomes expired. The expiry day itself is still valid.
    pub fn reconcile(self, expiry_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        match expiry_date {
            Some(expiry) if expiry < today => {
                self.transition(QuotationEvent::ExpiryPassed).unwrap_or(self)
            }
            _ => self,
        }
    }
}

// ============================================================================
// Sales
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Draft,
    Pending,
    Partial,
    Paid,
    Canceled,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleEvent {
    Confirm,
    /// Payments were recorded or removed; carries the new balance
    PaymentsChanged { amount_paid: Decimal, total: Decimal },
    Cancel,
    DueDatePassed,
}

impl SaleEvent {
    fn as_str(&self) -> &'static str {
        match self {
            SaleEvent::Confirm => "confirm",
            SaleEvent::PaymentsChanged { .. } => "record payments on",
            SaleEvent::Cancel => "cancel",
            SaleEvent::DueDatePassed => "mark overdue",
        }
    }
}

/// Status implied by the payment balance alone
pub fn payment_status(amount_paid: Decimal, total: Decimal) -> SaleStatus {
    if amount_paid >= total {
        SaleStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        SaleStatus::Partial
    } else {
        SaleStatus::Pending
    }
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Pending => "pending",
            SaleStatus::Partial => "partial",
            SaleStatus::Paid => "paid",
            SaleStatus::Canceled => "canceled",
            SaleStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(SaleStatus::Draft),
            "pending" => Some(SaleStatus::Pending),
            "partial" => Some(SaleStatus::Partial),
            "paid" => Some(SaleStatus::Paid),
            "canceled" => Some(SaleStatus::Canceled),
            "overdue" => Some(SaleStatus::Overdue),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, SaleStatus::Draft)
    }

    /// Whether payments may be recorded against a sale in this status
    pub fn accepts_payments(&self) -> bool {
        !matches!(self, SaleStatus::Draft | SaleStatus::Canceled)
    }

    pub fn transition(self, event: SaleEvent) -> Result<Self, TransitionError> {
        use SaleEvent as E;
        use SaleStatus as S;

        match (self, event) {
            (S::Draft, E::Confirm) => Ok(S::Pending),
            (from, E::PaymentsChanged { amount_paid, total }) if from.accepts_payments() => {
                match payment_status(amount_paid, total) {
                    // A sale past its due date stays overdue until settled
                    S::Paid => Ok(S::Paid),
                    _ if from == S::Overdue => Ok(S::Overdue),
                    derived => Ok(derived),
                }
            }
            (S::Draft | S::Pending | S::Partial | S::Overdue, E::Cancel) => Ok(S::Canceled),
            (S::Pending | S::Partial, E::DueDatePassed) => Ok(S::Overdue),
            (from, event) => Err(TransitionError {
                document: "sale",
                from: from.as_str(),
                event: event.as_str(),
            }),
        }
    }

    /// Apply calendar-driven transitions: an unsettled sale whose due date
    /// is before `today` becomes overdue.
    pub fn reconcile(
        self,
        due_date: Option<NaiveDate>,
        today: NaiveDate,
        amount_due: Decimal,
    ) -> Self {
        match due_date {
            Some(due) if due < today && amount_due > Decimal::ZERO => {
                self.transition(SaleEvent::DueDatePassed).unwrap_or(self)
            }
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_quotation_happy_path() {
        let status = QuotationStatus::Draft
            .transition(QuotationEvent::Send)
            .and_then(|s| s.transition(QuotationEvent::Approve))
            .and_then(|s| s.transition(QuotationEvent::Convert))
            .unwrap();
        assert_eq!(status, QuotationStatus::Converted);
    }

    #[test]
    fn test_quotation_cannot_approve_draft() {
        let err = QuotationStatus::Draft
            .transition(QuotationEvent::Approve)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot approve a quotation in status 'draft'");
    }

    #[test]
    fn test_only_draft_quotation_is_editable() {
        assert!(QuotationStatus::Draft.is_editable());
        assert!(!QuotationStatus::Sent.is_editable());
        assert!(!QuotationStatus::Converted.is_editable());
    }

    #[test]
    fn test_quotation_expires_after_expiry_day() {
        let expiry = Some(date(2024, 3, 10));
        assert_eq!(
            QuotationStatus::Sent.reconcile(expiry, date(2024, 3, 10)),
            QuotationStatus::Sent
        );
        assert_eq!(
            QuotationStatus::Sent.reconcile(expiry, date(2024, 3, 11)),
            QuotationStatus::Expired
        );
    }

    #[test]
    fn test_closed_quotation_does_not_expire() {
        let expiry = Some(date(2024, 1, 1));
        let today = date(2024, 6, 1);
        assert_eq!(
            QuotationStatus::Converted.reconcile(expiry, today),
            QuotationStatus::Converted
        );
        assert_eq!(
            QuotationStatus::Approved.reconcile(expiry, today),
            QuotationStatus::Approved
        );
        assert_eq!(QuotationStatus::Draft.reconcile(None, today), QuotationStatus::Draft);
    }

    #[test]
    fn test_payment_status_derivation() {
        assert_eq!(payment_status(dec!(0), dec!(100)), SaleStatus::Pending);
        assert_eq!(payment_status(dec!(40), dec!(100)), SaleStatus::Partial);
        assert_eq!(payment_status(dec!(100), dec!(100)), SaleStatus::Paid);
        assert_eq!(payment_status(dec!(120), dec!(100)), SaleStatus::Paid);
    }

    #[test]
    fn test_payment_removal_reverts_to_pending() {
        let status = SaleStatus::Partial
            .transition(SaleEvent::PaymentsChanged {
                amount_paid: Decimal::ZERO,
                total: dec!(100),
            })
            .unwrap();
        assert_eq!(status, SaleStatus::Pending);
    }

    #[test]
    fn test_draft_sale_rejects_payments() {
        let result = SaleStatus::Draft.transition(SaleEvent::PaymentsChanged {
            amount_paid: dec!(10),
            total: dec!(100),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_overdue_sale_stays_overdue_until_paid() {
        let partial = SaleStatus::Overdue
            .transition(SaleEvent::PaymentsChanged {
                amount_paid: dec!(50),
                total: dec!(100),
            })
            .unwrap();
        assert_eq!(partial, SaleStatus::Overdue);

        let settled = SaleStatus::Overdue
            .transition(SaleEvent::PaymentsChanged {
                amount_paid: dec!(100),
                total: dec!(100),
            })
            .unwrap();
        assert_eq!(settled, SaleStatus::Paid);
    }

    #[test]
    fn test_paid_sale_cannot_be_canceled() {
        assert!(SaleStatus::Paid.transition(SaleEvent::Cancel).is_err());
        assert_eq!(
            SaleStatus::Partial.transition(SaleEvent::Cancel),
            Ok(SaleStatus::Canceled)
        );
    }

    #[test]
    fn test_sale_overdue_reconcile() {
        let due = Some(date(2024, 5, 1));
        let today = date(2024, 5, 2);
        assert_eq!(SaleStatus::Pending.reconcile(due, today, dec!(10)), SaleStatus::Overdue);
        assert_eq!(SaleStatus::Pending.reconcile(due, today, dec!(0)), SaleStatus::Pending);
        assert_eq!(SaleStatus::Draft.reconcile(due, today, dec!(10)), SaleStatus::Draft);
        assert_eq!(SaleStatus::Paid.reconcile(due, today, dec!(10)), SaleStatus::Paid);
    }
}
