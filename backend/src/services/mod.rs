//! Business logic services for the café inventory
//!
//! Each service reads through the store, decides what changes with the shared
//! reconciliation rules and commits one write batch per operation.

use serde::Serialize;
use shared::{category_sort_key, compare_by_sku_then_name, Category, Item, LineItem};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::DynStore;

pub mod auth;
pub mod category;
pub mod count;
pub mod dashboard;
pub mod item;
pub mod order;
pub mod receiving;

pub use auth::{AdminGuard, DeleteInput};
pub use category::CategoryService;
pub use count::CountService;
pub use dashboard::DashboardService;
pub use item::ItemService;
pub use order::OrderService;
pub use receiving::ReceivingService;

/// A stored line joined with its item, for detail views
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PopulatedLine {
    pub item: Uuid,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub active: bool,
    pub quantity: i32,
}

/// Join lines with their items and category names. Lines whose item no
/// longer exists are left out.
pub(crate) async fn populate_lines(
    store: &DynStore,
    lines: &[LineItem],
) -> AppResult<Vec<PopulatedLine>> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.item).collect();
    let items = store.get_items(&ids).await?;
    let categories = store.list_categories().await?;

    Ok(lines
        .iter()
        .filter_map(|line| {
            let item = items.iter().find(|i| i.id == line.item)?;
            Some(PopulatedLine {
                item: item.id,
                name: item.name.clone(),
                sku: item.sku.clone(),
                category: category_name(&categories, item).map(str::to_string),
                active: item.active,
                quantity: line.quantity,
            })
        })
        .collect())
}

pub(crate) fn category_name<'a>(categories: &'a [Category], item: &Item) -> Option<&'a str> {
    let id = item.category?;
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.as_str())
}

pub(crate) fn sort_by_name(lines: &mut [PopulatedLine]) {
    lines.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| {
                category_sort_key(a.category.as_deref())
                    .cmp(&category_sort_key(b.category.as_deref()))
            })
    });
}

pub(crate) fn sort_by_sku_then_name(lines: &mut [PopulatedLine]) {
    lines.sort_by(|a, b| compare_by_sku_then_name(&a.sku, &a.name, &b.sku, &b.name));
}

/// Resolve a category filter by name; an unknown name is a missing category
pub(crate) async fn category_by_name(store: &DynStore, name: &str) -> AppResult<Category> {
    store
        .find_category_by_name(name)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
}
