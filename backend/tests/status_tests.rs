//! Quotation and sale lifecycle tests
//!
//! Tests for status transitions including:
//! - Quotation approval, rejection, conversion and expiry
//! - Sale payment derivation, cancellation and overdue handling

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::{
    payment_status, QuotationEvent, QuotationStatus, SaleEvent, SaleStatus, TransitionError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn paid(amount_paid: Decimal, total: Decimal) -> SaleEvent {
    SaleEvent::PaymentsChanged { amount_paid, total }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

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
    fn test_draft_quotation_cannot_be_approved() {
        let err = QuotationStatus::Draft
            .transition(QuotationEvent::Approve)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                document: "quotation",
                from: "draft",
                event: "approve",
            }
        );
        assert_eq!(err.to_string(), "Cannot approve a quotation in status 'draft'");
    }

    #[test]
    fn test_terminal_quotations_refuse_everything() {
        for status in [
            QuotationStatus::Rejected,
            QuotationStatus::Expired,
            QuotationStatus::Converted,
        ] {
            for event in [
                QuotationEvent::Send,
                QuotationEvent::Approve,
                QuotationEvent::Reject,
                QuotationEvent::Convert,
                QuotationEvent::ExpiryPassed,
            ] {
                assert!(status.transition(event).is_err(), "{:?} {:?}", status, event);
            }
        }
    }

    #[test]
    fn test_only_draft_is_editable() {
        assert!(QuotationStatus::Draft.is_editable());
        assert!(!QuotationStatus::Sent.is_editable());
        assert!(SaleStatus::Draft.is_editable());
        assert!(!SaleStatus::Pending.is_editable());
    }

    #[test]
    fn test_quotation_expires_day_after_expiry_date() {
        let expiry = Some(date(2024, 6, 30));
        assert_eq!(
            QuotationStatus::Sent.reconcile(expiry, date(2024, 6, 30)),
            QuotationStatus::Sent
        );
        assert_eq!(
            QuotationStatus::Sent.reconcile(expiry, date(2024, 7, 1)),
            QuotationStatus::Expired
        );
        assert_eq!(
            QuotationStatus::Approved.reconcile(expiry, date(2024, 7, 1)),
            QuotationStatus::Approved
        );
        assert_eq!(
            QuotationStatus::Draft.reconcile(None, date(2030, 1, 1)),
            QuotationStatus::Draft
        );
    }

    #[test]
    fn test_sale_payment_progression() {
        let total = dec!(328);
        let status = SaleStatus::Draft.transition(SaleEvent::Confirm).unwrap();
        assert_eq!(status, SaleStatus::Pending);

        let status = status.transition(paid(dec!(100), total)).unwrap();
        assert_eq!(status, SaleStatus::Partial);

        let status = status.transition(paid(total, total)).unwrap();
        assert_eq!(status, SaleStatus::Paid);

        // Removing the last payment falls back to pending
        let status = status.transition(paid(Decimal::ZERO, total)).unwrap();
        assert_eq!(status, SaleStatus::Pending);
    }

    #[test]
    fn test_draft_and_canceled_sales_refuse_payments() {
        assert!(SaleStatus::Draft.transition(paid(dec!(1), dec!(10))).is_err());
        assert!(SaleStatus::Canceled.transition(paid(dec!(1), dec!(10))).is_err());
    }

    #[test]
    fn test_paid_sale_cannot_be_canceled() {
        assert!(SaleStatus::Paid.transition(SaleEvent::Cancel).is_err());
        assert_eq!(
            SaleStatus::Overdue.transition(SaleEvent::Cancel),
            Ok(SaleStatus::Canceled)
        );
    }

    #[test]
    fn test_sale_becomes_overdue_after_due_date() {
        let due = Some(date(2024, 3, 1));
        assert_eq!(
            SaleStatus::Partial.reconcile(due, date(2024, 3, 2), dec!(50)),
            SaleStatus::Overdue
        );
        assert_eq!(
            SaleStatus::Partial.reconcile(due, date(2024, 3, 1), dec!(50)),
            SaleStatus::Partial
        );
        assert_eq!(
            SaleStatus::Paid.reconcile(due, date(2024, 3, 2), Decimal::ZERO),
            SaleStatus::Paid
        );
        assert_eq!(
            SaleStatus::Draft.reconcile(due, date(2024, 3, 2), dec!(50)),
            SaleStatus::Draft
        );
    }

    #[test]
    fn test_overdue_sale_stays_overdue_until_paid() {
        let total = dec!(200);
        let status = SaleStatus::Overdue.transition(paid(dec!(50), total)).unwrap();
        assert_eq!(status, SaleStatus::Overdue);
        let status = status.transition(paid(total, total)).unwrap();
        assert_eq!(status, SaleStatus::Paid);
    }

    #[test]
    fn test_payment_status_derivation() {
        assert_eq!(payment_status(Decimal::ZERO, dec!(10)), SaleStatus::Pending);
        assert_eq!(payment_status(dec!(-1), dec!(10)), SaleStatus::Pending);
        assert_eq!(payment_status(dec!(4), dec!(10)), SaleStatus::Partial);
        assert_eq!(payment_status(dec!(10), dec!(10)), SaleStatus::Paid);
        assert_eq!(payment_status(dec!(12), dec!(10)), SaleStatus::Paid);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn open_sale_strategy() -> impl Strategy<Value = SaleStatus> {
        prop::sample::select(vec![
            SaleStatus::Pending,
            SaleStatus::Partial,
            SaleStatus::Paid,
            SaleStatus::Overdue,
        ])
    }

    proptest! {
        /// Payments on an open sale always land on a payment-derived status
        #[test]
        fn prop_payments_follow_balance(
            from in open_sale_strategy(),
            amount_paid in money_strategy(),
            total in money_strategy(),
        ) {
            let status = from.transition(paid(amount_paid, total)).unwrap();
            let derived = payment_status(amount_paid, total);
            if derived == SaleStatus::Paid {
                prop_assert_eq!(status, SaleStatus::Paid);
            } else if from == SaleStatus::Overdue {
                prop_assert_eq!(status, SaleStatus::Overdue);
            } else {
                prop_assert_eq!(status, derived);
            }
        }

        /// A sale with nothing left to pay is never marked overdue
        #[test]
        fn prop_settled_sales_never_overdue(
            from in open_sale_strategy(),
            days_late in 1i64..365,
        ) {
            let due = date(2024, 1, 1);
            let today = due + chrono::Duration::days(days_late);
            let status = from.reconcile(Some(due), today, Decimal::ZERO);
            prop_assert_eq!(status, from);
        }
    }
}
