//! Quotation and sale arithmetic
//!
//! Quotations and sales share one totals model: line items carry their own
//! subtotal/discount/tax/total, and the order aggregates are always the sums
//! over the items. Amounts are rounded to cents with midpoint-away-from-zero,
//! matching the `NUMERIC(15,2)` columns they are stored in.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::validation::MONEY_SCALE;

/// Round a money amount to cents
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Pricing inputs of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    /// Flat discount, only honoured when `discount_percentage` is zero
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
}

/// Derived amounts of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineItemAmounts {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Compute a line item's amounts from its pricing inputs.
///
/// `subtotal = quantity × unit_price`, the discount comes from the percentage
/// when one is set (otherwise the pre-set flat amount is kept), tax applies to
/// the discounted subtotal, and `total = subtotal − discount + tax`.
pub fn calculate_line_item(input: &LineItemInput) -> LineItemAmounts {
    let subtotal = round_money(input.quantity * input.unit_price);

    let discount_amount = if input.discount_percentage > Decimal::ZERO {
        round_money(subtotal * input.discount_percentage / Decimal::ONE_HUNDRED)
    } else {
        round_money(input.discount_amount)
    };

    let tax_amount =
        round_money((subtotal - discount_amount) * input.tax_percentage / Decimal::ONE_HUNDRED);

    LineItemAmounts {
        subtotal,
        discount_amount,
        tax_amount,
        total: subtotal - discount_amount + tax_amount,
    }
}

/// Aggregate amounts of a quotation or sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Sum line items into order totals.
///
/// `total = subtotal − discount_amount + (include_tax ? tax_amount : 0)`.
/// The tax sum is reported even when it is excluded from the total.
pub fn calculate_order_totals<'a, I>(items: I, include_tax: bool) -> OrderTotals
where
    I: IntoIterator<Item = &'a LineItemAmounts>,
{
    let (subtotal, discount_amount, tax_amount) = items.into_iter().fold(
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        |(subtotal, discount, tax), item| {
            (
                subtotal + item.subtotal,
                discount + item.discount_amount,
                tax + item.tax_amount,
            )
        },
    );

    let tax_in_total = if include_tax { tax_amount } else { Decimal::ZERO };

    OrderTotals {
        subtotal,
        discount_amount,
        tax_amount,
        total: subtotal - discount_amount + tax_in_total,
    }
}

/// Sale aggregates: order totals plus shipping and payment balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleTotals {
    #[serde(flatten)]
    pub order: OrderTotals,
    pub shipping_amount: Decimal,
    pub amount_paid: Decimal,
    pub amount_due: Decimal,
}

impl SaleTotals {
    pub fn total(&self) -> Decimal {
        self.order.total
    }
}

/// Sum sale items, add shipping and compute the amount still due
pub fn calculate_sale_totals<'a, I>(
    items: I,
    include_tax: bool,
    shipping_amount: Decimal,
    amount_paid: Decimal,
) -> SaleTotals
where
    I: IntoIterator<Item = &'a LineItemAmounts>,
{
    let mut order = calculate_order_totals(items, include_tax);
    order.total += shipping_amount;

    SaleTotals {
        order,
        shipping_amount,
        amount_paid,
        amount_due: order.total - amount_paid,
    }
}

/// Convert an amount in the document currency to the base currency
pub fn to_base_currency(amount: Decimal, exchange_rate: Decimal) -> Decimal {
    round_money(amount * exchange_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            quantity,
            unit_price,
            discount_percentage: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
        }
    }

    #[test]
    fn test_plain_line_item() {
        let amounts = calculate_line_item(&input(dec!(2), dec!(19.99)));
        assert_eq!(amounts.subtotal, dec!(39.98));
        assert_eq!(amounts.discount_amount, Decimal::ZERO);
        assert_eq!(amounts.total, dec!(39.98));
    }

    #[test]
    fn test_flat_discount_kept_without_percentage() {
        let amounts = calculate_line_item(&LineItemInput {
            discount_amount: dec!(5),
            tax_percentage: dec!(10),
            ..input(dec!(1), dec!(100))
        });
        assert_eq!(amounts.discount_amount, dec!(5));
        assert_eq!(amounts.tax_amount, dec!(9.5));
        assert_eq!(amounts.total, dec!(104.5));
    }

    #[test]
    fn test_percentage_overrides_flat_discount() {
        let amounts = calculate_line_item(&LineItemInput {
            discount_percentage: dec!(10),
            discount_amount: dec!(99),
            ..input(dec!(1), dec!(50))
        });
        assert_eq!(amounts.discount_amount, dec!(5));
    }

    #[test]
    fn test_rounding_to_cents() {
        let amounts = calculate_line_item(&LineItemInput {
            tax_percentage: dec!(16),
            ..input(dec!(3), dec!(0.33))
        });
        // 0.99 * 0.16 = 0.1584
        assert_eq!(amounts.tax_amount, dec!(0.16));
        assert_eq!(amounts.total, dec!(1.15));
    }

    #[test]
    fn test_stored_item_recalculates_to_itself() {
        let pricing = LineItemInput {
            discount_amount: dec!(0.05),
            tax_percentage: dec!(16),
            ..input(dec!(3), dec!(0.34))
        };
        let first = calculate_line_item(&pricing);
        assert_eq!(first.subtotal, dec!(1.02));

        let stored = LineItemInput {
            discount_amount: first.discount_amount,
            ..pricing
        };
        assert_eq!(calculate_line_item(&stored), first);
    }

    #[test]
    fn test_empty_order_is_zero() {
        let items: [LineItemAmounts; 0] = [];
        let totals = calculate_order_totals(&items, true);
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn test_tax_excluded_from_total() {
        let items = [LineItemAmounts {
            subtotal: dec!(100),
            discount_amount: dec!(10),
            tax_amount: dec!(14.4),
            total: dec!(104.4),
        }];
        let totals = calculate_order_totals(&items, false);
        assert_eq!(totals.tax_amount, dec!(14.4));
        assert_eq!(totals.total, dec!(90));
    }

    #[test]
    fn test_sale_totals_with_shipping_and_payment() {
        let items = [LineItemAmounts {
            subtotal: dec!(200),
            discount_amount: Decimal::ZERO,
            tax_amount: dec!(32),
            total: dec!(232),
        }];
        let totals = calculate_sale_totals(&items, true, dec!(15), dec!(100));
        assert_eq!(totals.total(), dec!(247));
        assert_eq!(totals.amount_due, dec!(147));
    }

    #[test]
    fn test_to_base_currency() {
        assert_eq!(to_base_currency(dec!(10), dec!(17.2345)), dec!(172.35));
    }
}
