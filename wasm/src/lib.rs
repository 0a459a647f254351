//! WebAssembly module for the commerce back office
//!
//! Lets the browser preview line item and document totals, and check a stock
//! adjustment, with exactly the arithmetic the server applies. Decimals cross
//! the boundary as strings so no precision is lost.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::{
    calculate_line_item, calculate_order_totals, calculate_sale_totals, classify_stock,
    plan_adjustment, signed_delta, validate_line_item, validate_non_negative_amount,
    AdjustmentKind, LineItemAmounts, LineItemInput,
};
use wasm_bindgen::prelude::*;

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|e| format!("Invalid {}: {}", field, e))
}

fn parse_kind(kind: &str) -> Result<AdjustmentKind, String> {
    AdjustmentKind::parse(kind).ok_or_else(|| format!("Unknown adjustment kind '{}'", kind))
}

fn line_item(input_json: &str) -> Result<String, String> {
    let input: LineItemInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid line item JSON: {}", e))?;
    validate_line_item(&input)?;
    serde_json::to_string(&calculate_line_item(&input)).map_err(|e| e.to_string())
}

fn order_totals(items_json: &str, include_tax: bool) -> Result<String, String> {
    let items = parse_items(items_json)?;
    serde_json::to_string(&calculate_order_totals(&items, include_tax)).map_err(|e| e.to_string())
}

fn sale_totals(
    items_json: &str,
    include_tax: bool,
    shipping_amount: &str,
    amount_paid: &str,
) -> Result<String, String> {
    let items = parse_items(items_json)?;
    let shipping_amount = parse_decimal("shipping amount", shipping_amount)?;
    validate_non_negative_amount(shipping_amount)?;
    let totals = calculate_sale_totals(
        &items,
        include_tax,
        shipping_amount,
        parse_decimal("amount paid", amount_paid)?,
    );
    serde_json::to_string(&totals).map_err(|e| e.to_string())
}

/// Items are priced here, so callers pass inputs rather than stored amounts
fn parse_items(items_json: &str) -> Result<Vec<LineItemAmounts>, String> {
    let inputs: Vec<LineItemInput> =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;
    inputs
        .iter()
        .map(|input| -> Result<LineItemAmounts, String> {
            validate_line_item(input)?;
            Ok(calculate_line_item(input))
        })
        .collect()
}

fn delta(kind: &str, magnitude: &str) -> Result<String, String> {
    let delta = signed_delta(parse_kind(kind)?, parse_decimal("quantity", magnitude)?)
        .map_err(|e| e.to_string())?;
    Ok(delta.to_string())
}

fn quantity_after(current: &str, kind: &str, magnitude: &str) -> Result<String, String> {
    let plan = plan_adjustment(
        parse_decimal("current quantity", current)?,
        parse_kind(kind)?,
        parse_decimal("quantity", magnitude)?,
    )
    .map_err(|e| e.to_string())?;
    Ok(plan.quantity_after.to_string())
}

/// Price one line item: `{quantity, unit_price, discount_percentage, ...}`
#[wasm_bindgen]
pub fn calculate_line_item_json(input_json: &str) -> Result<String, JsValue> {
    line_item(input_json).map_err(|e| JsValue::from_str(&e))
}

/// Totals of a quotation from an array of line item inputs
#[wasm_bindgen]
pub fn calculate_order_totals_json(items_json: &str, include_tax: bool) -> Result<String, JsValue> {
    order_totals(items_json, include_tax).map_err(|e| JsValue::from_str(&e))
}

/// Totals of a sale, including shipping and the amount still due
#[wasm_bindgen]
pub fn calculate_sale_totals_json(
    items_json: &str,
    include_tax: bool,
    shipping_amount: &str,
    amount_paid: &str,
) -> Result<String, JsValue> {
    sale_totals(items_json, include_tax, shipping_amount, amount_paid)
        .map_err(|e| JsValue::from_str(&e))
}

fn level(quantity: &str, min: &str, max: &str) -> Result<String, String> {
    let max = match max.trim() {
        "" => None,
        value => Some(parse_decimal("maximum quantity", value)?),
    };
    let level = classify_stock(
        parse_decimal("quantity", quantity)?,
        parse_decimal("minimum quantity", min)?,
        max,
    );
    serde_json::to_value(level)
        .map_err(|e| e.to_string())?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "Stock level is not a string".to_string())
}

/// Signed delta an adjustment of this kind would record
#[wasm_bindgen]
pub fn adjustment_delta(kind: &str, magnitude: &str) -> Result<String, JsValue> {
    delta(kind, magnitude).map_err(|e| JsValue::from_str(&e))
}

/// Quantity after the adjustment, or an error when stock is insufficient
#[wasm_bindgen]
pub fn preview_adjustment(current: &str, kind: &str, magnitude: &str) -> Result<String, JsValue> {
    quantity_after(current, kind, magnitude).map_err(|e| JsValue::from_str(&e))
}

/// `out_of_stock`, `low`, `normal` or `over`; empty `max` means no ceiling
#[wasm_bindgen]
pub fn stock_level(quantity: &str, min: &str, max: &str) -> Result<String, JsValue> {
    level(quantity, min, max).map_err(|e| JsValue::from_str(&e))
}
