//! Validation utilities for the commerce back office
//!
//! Input checks that run before any transaction is opened. Decimal inputs
//! are rejected when they carry more places than the column they land in,
//! so nothing is rounded by the database after amounts are computed.

use rust_decimal::Decimal;

use crate::models::LineItemInput;

/// Places kept for quantities, adjustment deltas and thresholds
pub const QUANTITY_SCALE: u32 = 3;
/// Places kept for money amounts
pub const MONEY_SCALE: u32 = 2;
/// Places kept for discount and tax percentages
pub const PERCENTAGE_SCALE: u32 = 2;
/// Places kept for exchange rate snapshots
pub const EXCHANGE_RATE_SCALE: u32 = 6;

/// Whether `value` can be stored with `scale` places without rounding
pub fn fits_scale(value: Decimal, scale: u32) -> bool {
    value.normalize().scale() <= scale
}

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate an adjustment magnitude (always entered as a positive amount)
pub fn validate_adjustment_magnitude(magnitude: Decimal) -> Result<(), &'static str> {
    if magnitude <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    if !fits_scale(magnitude, QUANTITY_SCALE) {
        return Err("Quantity cannot have more than 3 decimal places");
    }
    Ok(())
}

/// Validate the low-stock threshold
pub fn validate_min_quantity(min: Decimal) -> Result<(), &'static str> {
    if min < Decimal::ZERO {
        return Err("Minimum quantity cannot be negative");
    }
    if !fits_scale(min, QUANTITY_SCALE) {
        return Err("Minimum quantity cannot have more than 3 decimal places");
    }
    Ok(())
}

/// Validate the optional overstock threshold against the minimum
pub fn validate_max_quantity(min: Decimal, max: Option<Decimal>) -> Result<(), &'static str> {
    let Some(max) = max else {
        return Ok(());
    };
    if !fits_scale(max, QUANTITY_SCALE) {
        return Err("Maximum quantity cannot have more than 3 decimal places");
    }
    if max < min {
        return Err("Maximum quantity must not be below the minimum quantity");
    }
    Ok(())
}

// ============================================================================
// Pricing Validations
// ============================================================================

/// Validate a percentage is between 0 and 100
pub fn validate_percentage(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err("Percentage must be between 0 and 100");
    }
    if !fits_scale(value, PERCENTAGE_SCALE) {
        return Err("Percentage cannot have more than 2 decimal places");
    }
    Ok(())
}

/// Validate line item pricing inputs
pub fn validate_line_item(input: &LineItemInput) -> Result<(), &'static str> {
    if input.quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    if !fits_scale(input.quantity, QUANTITY_SCALE) {
        return Err("Quantity cannot have more than 3 decimal places");
    }
    if input.unit_price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    if !fits_scale(input.unit_price, MONEY_SCALE) {
        return Err("Unit price cannot have more than 2 decimal places");
    }
    validate_percentage(input.discount_percentage)?;
    validate_percentage(input.tax_percentage)?;
    if input.discount_amount < Decimal::ZERO {
        return Err("Discount amount cannot be negative");
    }
    if !fits_scale(input.discount_amount, MONEY_SCALE) {
        return Err("Discount amount cannot have more than 2 decimal places");
    }
    if input.discount_percentage.is_zero()
        && input.discount_amount > input.quantity * input.unit_price
    {
        return Err("Discount amount cannot exceed the line subtotal");
    }
    Ok(())
}

/// Validate a non-negative money amount (shipping, prices)
pub fn validate_non_negative_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if !fits_scale(amount, MONEY_SCALE) {
        return Err("Amount cannot have more than 2 decimal places");
    }
    Ok(())
}

/// Validate a payment amount
pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be greater than zero");
    }
    if !fits_scale(amount, MONEY_SCALE) {
        return Err("Payment amount cannot have more than 2 decimal places");
    }
    Ok(())
}

// ============================================================================
// Currency Validations
// ============================================================================

/// Validate an ISO 4217 style currency code (three uppercase letters)
pub fn validate_currency_code(code: &str) -> Result<(), &'static str> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err("Currency code must be three uppercase letters");
    }
    Ok(())
}

/// Validate an exchange rate snapshot
pub fn validate_exchange_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate <= Decimal::ZERO {
        return Err("Exchange rate must be greater than zero");
    }
    if !fits_scale(rate, EXCHANGE_RATE_SCALE) {
        return Err("Exchange rate cannot have more than 6 decimal places");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            quantity,
            unit_price,
            discount_percentage: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
        }
    }

    // ========================================================================
    // Inventory Validation Tests
    // ========================================================================

    #[test]
    fn test_fits_scale_ignores_trailing_zeros() {
        assert!(fits_scale(dec!(1.500000), MONEY_SCALE));
        assert!(fits_scale(Decimal::ZERO, MONEY_SCALE));
        assert!(!fits_scale(dec!(0.335), MONEY_SCALE));
        assert!(fits_scale(dec!(0.335), QUANTITY_SCALE));
    }

    #[test]
    fn test_adjustment_magnitude() {
        assert!(validate_adjustment_magnitude(dec!(0.5)).is_ok());
        assert!(validate_adjustment_magnitude(dec!(0.002)).is_ok());
        assert!(validate_adjustment_magnitude(Decimal::ZERO).is_err());
        assert!(validate_adjustment_magnitude(dec!(-3)).is_err());
    }

    #[test]
    fn test_adjustment_magnitude_beyond_stored_places() {
        assert_eq!(
            validate_adjustment_magnitude(dec!(0.0015)),
            Err("Quantity cannot have more than 3 decimal places")
        );
        // would be stored as a 0.000 entry
        assert!(validate_adjustment_magnitude(dec!(0.0004)).is_err());
    }

    #[test]
    fn test_min_quantity() {
        assert!(validate_min_quantity(dec!(5)).is_ok());
        assert!(validate_min_quantity(dec!(-1)).is_err());
        assert!(validate_min_quantity(dec!(0.0001)).is_err());
    }

    #[test]
    fn test_max_quantity() {
        assert!(validate_max_quantity(dec!(5), Some(dec!(50))).is_ok());
        assert!(validate_max_quantity(dec!(5), None).is_ok());
        assert!(validate_max_quantity(dec!(10), Some(dec!(5))).is_err());
        assert!(validate_max_quantity(dec!(1), Some(dec!(5.0005))).is_err());
    }

    // ========================================================================
    // Pricing Validation Tests
    // ========================================================================

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_percentage(dec!(0)).is_ok());
        assert!(validate_percentage(dec!(100)).is_ok());
        assert!(validate_percentage(dec!(100.01)).is_err());
        assert!(validate_percentage(dec!(-0.01)).is_err());
    }

    #[test]
    fn test_line_item_valid() {
        assert!(validate_line_item(&line(dec!(3), dec!(200))).is_ok());
    }

    #[test]
    fn test_line_item_rejects_zero_quantity() {
        assert_eq!(
            validate_line_item(&line(Decimal::ZERO, dec!(10))),
            Err("Quantity must be greater than zero")
        );
    }

    #[test]
    fn test_line_item_rejects_oversized_flat_discount() {
        let input = LineItemInput {
            discount_amount: dec!(25),
            ..line(dec!(2), dec!(10))
        };
        assert!(validate_line_item(&input).is_err());
    }

    #[test]
    fn test_line_item_rejects_quantity_beyond_stored_places() {
        assert_eq!(
            validate_line_item(&line(dec!(1.0005), dec!(10))),
            Err("Quantity cannot have more than 3 decimal places")
        );
        assert!(validate_line_item(&line(dec!(1.125), dec!(10))).is_ok());
    }

    #[test]
    fn test_line_item_rejects_sub_cent_price() {
        assert_eq!(
            validate_line_item(&line(dec!(3), dec!(0.335))),
            Err("Unit price cannot have more than 2 decimal places")
        );
        assert!(validate_line_item(&line(dec!(3), dec!(0.330))).is_ok());
    }

    #[test]
    fn test_line_item_rejects_sub_cent_discount() {
        let input = LineItemInput {
            discount_amount: dec!(1.005),
            ..line(dec!(2), dec!(10))
        };
        assert_eq!(
            validate_line_item(&input),
            Err("Discount amount cannot have more than 2 decimal places")
        );
    }

    #[test]
    fn test_line_item_rejects_fine_percentages() {
        let discount = LineItemInput {
            discount_percentage: dec!(10.125),
            ..line(dec!(1), dec!(10))
        };
        let tax = LineItemInput {
            tax_percentage: dec!(16.001),
            ..line(dec!(1), dec!(10))
        };
        assert_eq!(
            validate_line_item(&discount),
            Err("Percentage cannot have more than 2 decimal places")
        );
        assert!(validate_line_item(&tax).is_err());
    }

    #[test]
    fn test_line_item_rejects_bad_tax() {
        let input = LineItemInput {
            tax_percentage: dec!(150),
            ..line(dec!(1), dec!(10))
        };
        assert!(validate_line_item(&input).is_err());
    }

    #[test]
    fn test_payment_amount() {
        assert!(validate_payment_amount(dec!(0.01)).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount(dec!(10.005)).is_err());
    }

    #[test]
    fn test_non_negative_amount() {
        assert!(validate_non_negative_amount(dec!(12.50)).is_ok());
        assert!(validate_non_negative_amount(dec!(-1)).is_err());
        assert!(validate_non_negative_amount(dec!(12.505)).is_err());
    }

    // ========================================================================
    // Currency Validation Tests
    // ========================================================================

    #[test]
    fn test_currency_code() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_currency_code("EURO").is_err());
    }

    #[test]
    fn test_exchange_rate() {
        assert!(validate_exchange_rate(dec!(1)).is_ok());
        assert!(validate_exchange_rate(dec!(17.234512)).is_ok());
        assert!(validate_exchange_rate(Decimal::ZERO).is_err());
        assert!(validate_exchange_rate(dec!(17.2345123)).is_err());
    }
}
