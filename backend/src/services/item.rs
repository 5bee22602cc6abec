//! Item ledger: the authoritative stock figure for every item

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    compare_for_listing, field_errors, item_name_rule, price_rule, reconciliation, Category,
    CountType, FieldError, InventoryCount, Item, ItemFilter, LineItem, OrderStatus,
    MAX_STOCK_QUANTITY, SKU_NOT_FOR_SALE,
};
use uuid::Uuid;
use validator::Validate;

use super::{category_by_name, category_name, AdminGuard};
use crate::error::{AppError, AppResult};
use crate::store::{DynStore, ItemQuery, Write, WriteBatch};

/// Item service for creating, editing, archiving and listing items
#[derive(Clone)]
pub struct ItemService {
    store: DynStore,
    admin: AdminGuard,
}

/// Input for creating or updating an item
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ItemInput {
    #[validate(custom = "item_name_rule")]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 256, message = "Description max of 256 characters exceeded"))]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Uuid>,
    /// Blank means not for sale
    #[serde(default)]
    #[validate(length(max = 24, message = "SKU must be 24 characters or less"))]
    pub sku: Option<String>,
    #[serde(default)]
    #[validate(custom = "price_rule")]
    pub price: Option<Decimal>,
    #[validate(range(
        min = 0,
        max = 9_999_999,
        message = "Quantity must be an integer between 0 and 9999999"
    ))]
    pub quantity_in_stock: Option<i64>,
}

/// Input for archiving or restoring an item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchiveInput {
    #[serde(default)]
    pub password: Option<String>,
    /// Restore an archived item instead of archiving it
    #[serde(default)]
    pub restore: bool,
}

/// Item with its category name, as shown in listings
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummary {
    #[serde(flatten)]
    pub item: Item,
    pub category_name: Option<String>,
    pub for_sale: bool,
}

/// Item with its category and how much of it is on order
#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    /// Resolved category; `category` on the item itself stays the id
    #[serde(rename = "category_detail")]
    pub category: Option<Category>,
    pub on_order: i32,
}

/// Validated and normalised item fields
struct ItemFields {
    name: String,
    description: Option<String>,
    category: Option<Uuid>,
    sku: String,
    price: Option<Decimal>,
    quantity: i32,
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(store: DynStore, admin: AdminGuard) -> Self {
        Self { store, admin }
    }

    /// Create an item and record its starting quantity as an Initial count
    pub async fn create(&self, input: ItemInput) -> AppResult<Item> {
        let fields = self.check(&input).await?;

        if let Some(existing) = self
            .store
            .find_item_conflict(&fields.name, &fields.sku)
            .await?
        {
            return Err(AppError::DuplicateItem {
                existing: Box::new(existing),
            });
        }

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            name: fields.name,
            description: fields.description,
            category: fields.category,
            sku: fields.sku,
            price: fields.price,
            quantity_in_stock: fields.quantity,
            qty_last_updated: now,
            item_last_updated: now,
            active: true,
        };
        let initial = InventoryCount::submitted(
            CountType::Initial,
            vec![LineItem::new(item.id, item.quantity_in_stock)],
            now,
        );

        self.store
            .commit(
                WriteBatch::new()
                    .with(Write::PutItem(item.clone()))
                    .with(Write::PutCount(initial)),
            )
            .await?;

        tracing::info!(item_id = %item.id, quantity = item.quantity_in_stock, "Created item");
        Ok(item)
    }

    /// Update an item. A changed stock figure is recorded as an Ad Hoc count.
    pub async fn update(&self, id: Uuid, input: ItemInput) -> AppResult<Item> {
        let mut item = self.get(id).await?;
        let fields = self.check(&input).await?;
        let now = Utc::now();

        let mut batch = WriteBatch::new();
        let adjusted = fields.quantity != item.quantity_in_stock;
        if adjusted {
            item.quantity_in_stock = fields.quantity;
            item.qty_last_updated = now;
        }

        item.name = fields.name;
        item.description = fields.description;
        item.category = fields.category;
        item.sku = fields.sku;
        item.price = fields.price;
        item.item_last_updated = now;

        batch.push(Write::PutItem(item.clone()));
        if adjusted {
            batch.push(Write::PutCount(InventoryCount::submitted(
                CountType::AdHoc,
                vec![LineItem::new(item.id, item.quantity_in_stock)],
                now,
            )));
        }
        self.store.commit(batch).await?;

        if adjusted {
            tracing::info!(item_id = %item.id, quantity = item.quantity_in_stock, "Adjusted stock by hand");
        }
        Ok(item)
    }

    /// Archive an item, or restore it when `input.restore` is set
    pub async fn archive(&self, id: Uuid, input: &ArchiveInput) -> AppResult<Item> {
        self.admin.check(input.password.as_deref())?;

        let mut item = self.get(id).await?;
        let now = Utc::now();
        item.active = input.restore;
        item.item_last_updated = now;

        self.store
            .commit(WriteBatch::new().with(Write::SetItemActive {
                item: id,
                active: item.active,
                at: now,
            }))
            .await?;

        tracing::info!(item_id = %id, active = item.active, "Changed item archive state");
        Ok(item)
    }

    /// List items: active ones, active ones in a category, or archived ones
    pub async fn list(&self, filter: &ItemFilter) -> AppResult<Vec<ItemSummary>> {
        let query = match filter {
            ItemFilter::All => ItemQuery::active(),
            ItemFilter::Archived => ItemQuery::archived(),
            ItemFilter::Category(name) => ItemQuery {
                category: Some(category_by_name(&self.store, name).await?.id),
                ..ItemQuery::active()
            },
        };

        let items = self.store.find_items(&query).await?;
        let categories = self.store.list_categories().await?;

        let mut summaries: Vec<ItemSummary> = items
            .into_iter()
            .map(|item| ItemSummary {
                category_name: category_name(&categories, &item).map(str::to_string),
                for_sale: item.for_sale(),
                item,
            })
            .collect();
        summaries.sort_by(|a, b| {
            compare_for_listing(
                &a.item,
                a.category_name.as_deref(),
                &b.item,
                b.category_name.as_deref(),
            )
        });

        tracing::debug!(count = summaries.len(), "Listed items");
        Ok(summaries)
    }

    /// Get an item with its category and quantity on order
    pub async fn detail(&self, id: Uuid) -> AppResult<ItemDetail> {
        let item = self.get(id).await?;
        let category = match item.category {
            Some(category_id) => self.store.get_category(category_id).await?,
            None => None,
        };
        let orders = self.store.find_orders(&[OrderStatus::Ordered]).await?;
        let on_order = reconciliation::quantity_on_order(&orders)
            .get(id)
            .unwrap_or(0);

        Ok(ItemDetail {
            item,
            category,
            on_order,
        })
    }

    async fn get(&self, id: Uuid) -> AppResult<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    async fn check(&self, input: &ItemInput) -> AppResult<ItemFields> {
        let mut errors = match input.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        if input.quantity_in_stock.is_none() {
            errors.push(FieldError::new(
                "quantity_in_stock",
                "Quantity in stock required",
            ));
        }
        if let Some(category) = input.category {
            if self.store.get_category(category).await?.is_none() {
                errors.push(FieldError::new("category", "Category not found"));
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let sku = input
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(SKU_NOT_FOR_SALE)
            .to_string();
        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        // Range-checked by the validator above
        let quantity = input
            .quantity_in_stock
            .map(|q| q.clamp(0, i64::from(MAX_STOCK_QUANTITY)) as i32)
            .unwrap_or(0);

        Ok(ItemFields {
            name: input.name.trim().to_string(),
            description,
            category: input.category,
            sku,
            price: input.price,
            quantity,
        })
    }
}
