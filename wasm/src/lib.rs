//! WebAssembly module for the café inventory forms
//!
//! Provides client-side checks that mirror the server:
//! - Quantity field validation
//! - Order, receipt and count line normalisation
//! - Price display

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use shared::reconciliation::{self, ZeroLines};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("cafe inventory forms ready"));
}

/// Lines after normalisation, ready to post
#[derive(Debug, Serialize, PartialEq)]
pub struct NormalizedLines {
    pub lines: Vec<LineItem>,
    pub errors: Vec<FieldError>,
    pub total: i64,
}

/// Check one quantity input. Returns the error message, or nothing when the
/// value is blank or acceptable.
#[wasm_bindgen]
pub fn validate_quantity_field(value: &str) -> Option<String> {
    let raw = RawQuantity::from(value);
    match raw.parse() {
        Ok(None) => None,
        Ok(Some(quantity)) => validate_line_quantity(quantity).err().map(str::to_string),
        Err(message) => Some(message.to_string()),
    }
}

/// Normalise submitted lines. Orders and receipts drop zero lines, counts keep
/// them. Returns JSON `{ lines, errors, total }`.
#[wasm_bindgen]
pub fn normalize_line_inputs(lines_json: &str, keep_zero: bool) -> Result<String, JsValue> {
    let normalized = normalize(lines_json, keep_zero).map_err(|e| JsValue::from_str(&e))?;
    serde_json::to_string(&normalized).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Error messages for submitted lines, one per failing line
#[wasm_bindgen]
pub fn line_error_messages(lines_json: &str) -> Result<js_sys::Array, JsValue> {
    let normalized = normalize(lines_json, true).map_err(|e| JsValue::from_str(&e))?;
    let messages = js_sys::Array::new();
    for error in normalized.errors {
        let label = error.field.unwrap_or_default();
        messages.push(&JsValue::from_str(&format!("{}: {}", label, error.message)));
    }
    Ok(messages)
}

/// Display a price with two decimals, rounding half away from zero
#[wasm_bindgen]
pub fn format_currency(price: &str) -> String {
    match price.trim().parse::<Decimal>() {
        Ok(value) => {
            let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("${:.2}", rounded)
        }
        Err(_) => String::new(),
    }
}

/// Whether a SKU marks the item as sold directly
#[wasm_bindgen]
pub fn sku_is_for_sale(sku: &str) -> bool {
    !sku.trim().is_empty() && is_for_sale_sku(sku.trim())
}

fn normalize(lines_json: &str, keep_zero: bool) -> Result<NormalizedLines, String> {
    let inputs: Vec<LineInput> =
        serde_json::from_str(lines_json).map_err(|e| format!("Invalid lines JSON: {}", e))?;
    let zero = if keep_zero {
        ZeroLines::Keep
    } else {
        ZeroLines::Drop
    };

    let (quantities, errors) = reconciliation::parse_lines(&inputs, "items", zero);
    Ok(NormalizedLines {
        total: quantities.total(),
        lines: quantities.into_lines(),
        errors,
    })
}
