//! Validation utilities for the café inventory
//!
//! Plain rule functions return a static message; the `*_rule` wrappers adapt
//! them for `#[validate(custom = ...)]` on input structs.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

use crate::models::{CATEGORY_IMAGE_MAX_BYTES, CATEGORY_IMAGE_TYPES, MAX_STOCK_QUANTITY};
use crate::types::{FieldError, LINE_QUANTITY_LIMIT};

// ============================================================================
// Item Validations
// ============================================================================

/// Item name: required, at most 40 characters
pub fn validate_item_name(name: &str) -> Result<(), &'static str> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err("Item name required");
    }
    if len > 40 {
        return Err("Item name max of 40 characters exceeded");
    }
    Ok(())
}

/// Free-text description: at most 256 characters
pub fn validate_description(description: &str) -> Result<(), &'static str> {
    if description.chars().count() > 256 {
        return Err("Description max of 256 characters exceeded");
    }
    Ok(())
}

/// SKU: at most 24 characters
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.chars().count() > 24 {
        return Err("SKU must be 24 characters or less");
    }
    Ok(())
}

/// Price between 0 and 9,999,999 inclusive
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO || price > Decimal::from(MAX_STOCK_QUANTITY) {
        return Err("Price must be between 0 and 9999999");
    }
    Ok(())
}

/// Stock on hand between 0 and 9,999,999 inclusive
pub fn validate_stock_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 || quantity > i64::from(MAX_STOCK_QUANTITY) {
        return Err("Quantity must be an integer between 0 and 9999999");
    }
    Ok(())
}

/// Quantity on an order, receipt or count line: 0 up to (not including) ten million
pub fn validate_line_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    if quantity >= LINE_QUANTITY_LIMIT {
        return Err("Quantity must be less than 10000000");
    }
    Ok(())
}

// ============================================================================
// Category Validations
// ============================================================================

/// Category name: 1 to 100 characters
pub fn validate_category_name(name: &str) -> Result<(), &'static str> {
    let len = name.trim().chars().count();
    if len == 0 || len > 100 {
        return Err("Category name must be between 1 and 100 characters long");
    }
    Ok(())
}

/// Category description: 1 to 256 characters
pub fn validate_category_description(description: &str) -> Result<(), &'static str> {
    let len = description.trim().chars().count();
    if len == 0 || len > 256 {
        return Err("Category description must be between 1 and 256 characters long");
    }
    Ok(())
}

/// Category picture: png or jpeg, at most 1MB
pub fn validate_category_image(content_type: &str, size: usize) -> Result<(), &'static str> {
    if !CATEGORY_IMAGE_TYPES.contains(&content_type.to_lowercase().as_str()) {
        return Err("Filetype must be .png, .jpg or .jpeg");
    }
    if size > CATEGORY_IMAGE_MAX_BYTES {
        return Err("Image must be 1MB or smaller");
    }
    Ok(())
}

// ============================================================================
// validator adapters
// ============================================================================

fn rule(code: &'static str, result: Result<(), &'static str>) -> Result<(), ValidationError> {
    result.map_err(|message| {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Borrowed(message));
        error
    })
}

pub fn item_name_rule(name: &str) -> Result<(), ValidationError> {
    rule("item_name", validate_item_name(name))
}

pub fn price_rule(price: &Decimal) -> Result<(), ValidationError> {
    rule("price", validate_price(*price))
}

pub fn category_name_rule(name: &str) -> Result<(), ValidationError> {
    rule("category_name", validate_category_name(name))
}

pub fn category_description_rule(description: &str) -> Result<(), ValidationError> {
    rule("category_description", validate_category_description(description))
}

/// Flatten `validator` output into field errors, ordered by field name
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                FieldError::new(field, message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
