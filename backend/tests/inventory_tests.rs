//! Inventory ledger tests
//!
//! Tests for stock adjustments including:
//! - Quantity always equals the replayed ledger
//! - Reducing adjustments never take stock below zero
//! - Reversal restores the quantity before the adjustment

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::{
    classify_stock, plan_adjustment, plan_reversal, replay_ledger, AdjustmentKind, LedgerCheck,
    LedgerError, Polarity, StockLevel,
};
use uuid::Uuid;

/// In-memory record: a running quantity plus its ledger of deltas
#[derive(Debug, Default)]
struct Ledger {
    quantity: Decimal,
    deltas: Vec<Decimal>,
}

impl Ledger {
    fn opened_with(quantity: Decimal) -> Self {
        let mut ledger = Ledger::default();
        ledger
            .apply(AdjustmentKind::Initial, quantity)
            .expect("opening stock");
        ledger
    }

    fn apply(&mut self, kind: AdjustmentKind, magnitude: Decimal) -> Result<Decimal, LedgerError> {
        let plan = plan_adjustment(self.quantity, kind, magnitude)?;
        self.deltas.push(plan.delta);
        self.quantity = plan.quantity_after;
        Ok(plan.delta)
    }

    fn reverse(&mut self, index: usize) {
        let delta = self.deltas.remove(index);
        self.quantity = plan_reversal(self.quantity, delta);
    }

    fn check(&self) -> LedgerCheck {
        LedgerCheck::new(Uuid::nil(), self.quantity, &self.deltas)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Addition, subtraction, then a refused oversized subtraction
    #[test]
    fn test_addition_then_subtraction_then_refusal() {
        let mut ledger = Ledger::opened_with(dec!(100));

        let delta = ledger.apply(AdjustmentKind::Addition, dec!(50)).unwrap();
        assert_eq!(delta, dec!(50));
        assert_eq!(ledger.quantity, dec!(150));

        let delta = ledger.apply(AdjustmentKind::Subtraction, dec!(30)).unwrap();
        assert_eq!(delta, dec!(-30));
        assert_eq!(ledger.quantity, dec!(120));

        let err = ledger
            .apply(AdjustmentKind::Subtraction, dec!(500))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                available: dec!(120),
                requested: dec!(500),
            }
        );
        assert_eq!(ledger.quantity, dec!(120));
        assert_eq!(ledger.deltas.len(), 3);
        assert!(ledger.check().balanced);
    }

    #[test]
    fn test_every_reducing_kind_is_negated() {
        for kind in [
            AdjustmentKind::Subtraction,
            AdjustmentKind::Transfer,
            AdjustmentKind::Loss,
            AdjustmentKind::Damaged,
            AdjustmentKind::Expired,
        ] {
            let plan = plan_adjustment(dec!(10), kind, dec!(4)).unwrap();
            assert_eq!(plan.delta, dec!(-4), "{kind}");
            assert_eq!(plan.quantity_after, dec!(6));
        }
    }

    #[test]
    fn test_increasing_kinds_skip_stock_check() {
        for kind in [
            AdjustmentKind::Addition,
            AdjustmentKind::Correction,
            AdjustmentKind::Initial,
        ] {
            let plan = plan_adjustment(Decimal::ZERO, kind, dec!(7.5)).unwrap();
            assert_eq!(plan.delta, dec!(7.5));
        }
    }

    #[test]
    fn test_exact_stock_can_be_removed() {
        let mut ledger = Ledger::opened_with(dec!(12));
        ledger.apply(AdjustmentKind::Loss, dec!(12)).unwrap();
        assert_eq!(ledger.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_zero_and_negative_magnitudes_rejected() {
        for magnitude in [Decimal::ZERO, dec!(-3)] {
            assert!(matches!(
                plan_adjustment(dec!(10), AdjustmentKind::Addition, magnitude),
                Err(LedgerError::NonPositiveMagnitude(_))
            ));
        }
    }

    #[test]
    fn test_reversal_restores_quantity() {
        let mut ledger = Ledger::opened_with(dec!(100));
        ledger.apply(AdjustmentKind::Subtraction, dec!(30)).unwrap();
        ledger.reverse(1);
        assert_eq!(ledger.quantity, dec!(100));
        assert!(ledger.check().balanced);
    }

    /// Reversing an earlier addition after stock was sold can go negative
    #[test]
    fn test_reversal_can_leave_negative_quantity() {
        let mut ledger = Ledger::opened_with(dec!(5));
        ledger.apply(AdjustmentKind::Addition, dec!(20)).unwrap();
        ledger.apply(AdjustmentKind::Subtraction, dec!(22)).unwrap();
        ledger.reverse(1);
        assert_eq!(ledger.quantity, dec!(-17));
        assert!(ledger.check().balanced);
    }

    #[test]
    fn test_unbalanced_ledger_detected() {
        let check = LedgerCheck::new(Uuid::nil(), dec!(90), &[dec!(100), dec!(-5)]);
        assert!(!check.balanced);
        assert_eq!(check.ledger_quantity, dec!(95));
        assert_eq!(check.entry_count, 2);
    }

    #[test]
    fn test_stock_levels() {
        assert_eq!(classify_stock(Decimal::ZERO, dec!(5), None), StockLevel::OutOfStock);
        assert_eq!(classify_stock(dec!(5), dec!(5), None), StockLevel::Low);
        assert_eq!(classify_stock(dec!(6), dec!(5), Some(dec!(50))), StockLevel::Normal);
        assert_eq!(classify_stock(dec!(51), dec!(5), Some(dec!(50))), StockLevel::Over);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn magnitude_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..100_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    fn kind_strategy() -> impl Strategy<Value = AdjustmentKind> {
        prop::sample::select(AdjustmentKind::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The running quantity always equals the sum of the ledger
        #[test]
        fn prop_quantity_equals_replayed_ledger(
            opening in magnitude_strategy(),
            ops in prop::collection::vec((kind_strategy(), magnitude_strategy()), 0..40),
        ) {
            let mut ledger = Ledger::opened_with(opening);
            for (kind, magnitude) in ops {
                let _ = ledger.apply(kind, magnitude);
                prop_assert_eq!(ledger.quantity, replay_ledger(ledger.deltas.iter().copied()));
            }
            prop_assert!(ledger.check().balanced);
        }

        /// Adjustments alone never drive the quantity below zero
        #[test]
        fn prop_adjustments_never_go_negative(
            ops in prop::collection::vec((kind_strategy(), magnitude_strategy()), 0..40),
        ) {
            let mut ledger = Ledger::default();
            for (kind, magnitude) in ops {
                let _ = ledger.apply(kind, magnitude);
                prop_assert!(ledger.quantity >= Decimal::ZERO);
            }
        }

        /// A refused adjustment leaves the record untouched
        #[test]
        fn prop_refused_adjustment_changes_nothing(
            current in magnitude_strategy(),
            extra in magnitude_strategy(),
        ) {
            let mut ledger = Ledger::opened_with(current);
            let before = ledger.deltas.len();
            let result = ledger.apply(AdjustmentKind::Subtraction, current + extra);
            prop_assert!(
                matches!(result, Err(LedgerError::InsufficientStock { .. })),
                "expected InsufficientStock, got {:?}",
                result
            );
            prop_assert_eq!(ledger.quantity, current);
            prop_assert_eq!(ledger.deltas.len(), before);
        }

        /// Apply followed by reverse is the identity on quantity
        #[test]
        fn prop_apply_then_reverse_is_identity(
            opening in magnitude_strategy(),
            kind in kind_strategy(),
            magnitude in magnitude_strategy(),
        ) {
            let mut ledger = Ledger::opened_with(opening);
            if ledger.apply(kind, magnitude).is_ok() {
                let last = ledger.deltas.len() - 1;
                ledger.reverse(last);
            }
            prop_assert_eq!(ledger.quantity, opening);
            prop_assert!(ledger.check().balanced);
        }

        /// Persisted deltas always carry the polarity of their kind
        #[test]
        fn prop_delta_polarity_matches_kind(
            kind in kind_strategy(),
            magnitude in magnitude_strategy(),
        ) {
            let plan = plan_adjustment(magnitude, kind, magnitude).unwrap();
            match kind.polarity() {
                Polarity::Increase => prop_assert!(plan.delta > Decimal::ZERO),
                Polarity::Decrease => prop_assert!(plan.delta < Decimal::ZERO),
            }
            prop_assert_eq!(plan.delta.abs(), magnitude);
        }

        /// Magnitudes finer than a thousandth never reach the ledger
        #[test]
        fn prop_sub_thousandth_magnitudes_rejected(
            kind in kind_strategy(),
            whole in 0i64..1_000_000,
            last_digit in 1i64..10,
        ) {
            let magnitude = Decimal::new(whole * 10 + last_digit, 4);
            prop_assert_eq!(
                plan_adjustment(Decimal::from(2_000), kind, magnitude),
                Err(LedgerError::ExcessPrecision(magnitude))
            );
        }
    }
}
