//! Stocked item models

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::category_sort_key;

/// SKU value carried by items that are not sold directly
pub const SKU_NOT_FOR_SALE: &str = "Not marked for sale";

/// Upper bound for stock quantities and prices (inclusive)
pub const MAX_STOCK_QUANTITY: i32 = 9_999_999;

/// A stocked item and its current on-hand quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<Uuid>,
    pub sku: String,
    pub price: Option<Decimal>,
    pub quantity_in_stock: i32,
    pub qty_last_updated: DateTime<Utc>,
    pub item_last_updated: DateTime<Utc>,
    pub active: bool,
}

impl Item {
    /// Whether the item carries a real SKU
    pub fn for_sale(&self) -> bool {
        is_for_sale_sku(&self.sku)
    }

    /// Whether a new item with this name and sku would duplicate this one
    pub fn conflicts_with(&self, name: &str, sku: &str) -> bool {
        self.name == name || (is_for_sale_sku(sku) && self.sku == sku)
    }
}

pub fn is_for_sale_sku(sku: &str) -> bool {
    sku != SKU_NOT_FOR_SALE
}

/// Which items an item listing shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFilter {
    /// Every active item
    All,
    /// Active items in the named category
    Category(String),
    /// Inactive items
    Archived,
}

impl ItemFilter {
    pub fn parse(filter: Option<&str>) -> Self {
        match filter.map(str::trim) {
            None | Some("") | Some("All") | Some("all") => ItemFilter::All,
            Some("Archived") | Some("archived") => ItemFilter::Archived,
            Some(name) => ItemFilter::Category(name.to_string()),
        }
    }
}

/// Listing order: sku, then category name (uncategorised last), then name
/// ignoring case
pub fn compare_for_listing(
    a: &Item,
    a_category: Option<&str>,
    b: &Item,
    b_category: Option<&str>,
) -> Ordering {
    a.sku
        .cmp(&b.sku)
        .then_with(|| category_sort_key(a_category).cmp(&category_sort_key(b_category)))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Detail-view order for counted lines: sku, then name ignoring case
pub fn compare_by_sku_then_name(a_sku: &str, a_name: &str, b_sku: &str, b_name: &str) -> Ordering {
    a_sku
        .cmp(b_sku)
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
}
