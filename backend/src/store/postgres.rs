//! PostgreSQL store
//!
//! Line lists live in JSONB columns; every batch runs in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Category, CategoryImage, CountType, InventoryCount, Item, LineItem, Order, OrderStatus,
    Receipt,
};
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{CountQuery, ItemQuery, Store, Write, WriteBatch};
use crate::error::{AppError, AppResult};

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    /// Create a new PgStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: String,
    image_content_type: Option<String>,
    image_data: Option<Vec<u8>>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        let image = match (row.image_content_type, row.image_data) {
            (Some(content_type), Some(data)) => Some(CategoryImage { content_type, data }),
            _ => None,
        };
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            image,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    category_id: Option<Uuid>,
    sku: String,
    price: Option<Decimal>,
    quantity_in_stock: i32,
    qty_last_updated: DateTime<Utc>,
    item_last_updated: DateTime<Utc>,
    active: bool,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category_id,
            sku: row.sku,
            price: row.price,
            quantity_in_stock: row.quantity_in_stock,
            qty_last_updated: row.qty_last_updated,
            item_last_updated: row.item_last_updated,
            active: row.active,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    order_date: Option<DateTime<Utc>>,
    delivery_date: Option<DateTime<Utc>>,
    status: String,
    ordered_items: Json<Vec<LineItem>>,
    last_updated: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> AppResult<Self> {
        let status = OrderStatus::from_str(&row.status)
            .ok_or_else(|| AppError::StorageError(format!("unknown order status {}", row.status)))?;
        Ok(Order {
            id: row.id,
            order_date: row.order_date,
            delivery_date: row.delivery_date,
            status,
            ordered_items: row.ordered_items.0,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReceiptRow {
    id: Uuid,
    date_initiated: DateTime<Utc>,
    date_submitted: Option<DateTime<Utc>>,
    received_items: Json<Vec<LineItem>>,
    order_received: Option<Uuid>,
}

impl From<ReceiptRow> for Receipt {
    fn from(row: ReceiptRow) -> Self {
        Receipt {
            id: row.id,
            date_initiated: row.date_initiated,
            date_submitted: row.date_submitted,
            received_items: row.received_items.0,
            order_received: row.order_received,
        }
    }
}

#[derive(Debug, FromRow)]
struct CountRow {
    id: Uuid,
    date_initiated: DateTime<Utc>,
    date_submitted: Option<DateTime<Utc>>,
    counted_quantities: Json<Vec<LineItem>>,
    count_type: String,
}

impl TryFrom<CountRow> for InventoryCount {
    type Error = AppError;

    fn try_from(row: CountRow) -> AppResult<Self> {
        let count_type = CountType::from_str(&row.count_type).ok_or_else(|| {
            AppError::StorageError(format!("unknown count type {}", row.count_type))
        })?;
        Ok(InventoryCount {
            id: row.id,
            date_initiated: row.date_initiated,
            date_submitted: row.date_submitted,
            counted_quantities: row.counted_quantities.0,
            count_type,
        })
    }
}

const CATEGORY_COLUMNS: &str = "id, name, description, image_content_type, image_data";
const ITEM_COLUMNS: &str = "id, name, description, category_id, sku, price, quantity_in_stock, \
                            qty_last_updated, item_last_updated, active";
const ORDER_COLUMNS: &str = "id, order_date, delivery_date, status, ordered_items, last_updated";
const RECEIPT_COLUMNS: &str = "id, date_initiated, date_submitted, received_items, order_received";
const COUNT_COLUMNS: &str = "id, date_initiated, date_submitted, counted_quantities, count_type";

// ============================================================================
// Writes
// ============================================================================

async fn apply(tx: &mut Transaction<'_, Postgres>, write: Write) -> AppResult<()> {
    match write {
        Write::PutCategory(category) => {
            let (content_type, data) = match category.image {
                Some(image) => (Some(image.content_type), Some(image.data)),
                None => (None, None),
            };
            sqlx::query(
                r#"
                INSERT INTO categories (id, name, description, image_content_type, image_data)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    image_content_type = EXCLUDED.image_content_type,
                    image_data = EXCLUDED.image_data
                "#,
            )
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(content_type)
            .bind(data)
            .execute(&mut **tx)
            .await?;
        }
        Write::DeleteCategory(id) => {
            sqlx::query("DELETE FROM categories WHERE id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
        Write::UncategorizeItems(id) => {
            sqlx::query("UPDATE items SET category_id = NULL WHERE category_id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
        Write::PutItem(item) => {
            sqlx::query(
                r#"
                INSERT INTO items (
                    id, name, description, category_id, sku, price, quantity_in_stock,
                    qty_last_updated, item_last_updated, active
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    category_id = EXCLUDED.category_id,
                    sku = EXCLUDED.sku,
                    price = EXCLUDED.price,
                    quantity_in_stock = EXCLUDED.quantity_in_stock,
                    qty_last_updated = EXCLUDED.qty_last_updated,
                    item_last_updated = EXCLUDED.item_last_updated,
                    active = EXCLUDED.active
                "#,
            )
            .bind(item.id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(&item.sku)
            .bind(item.price)
            .bind(item.quantity_in_stock)
            .bind(item.qty_last_updated)
            .bind(item.item_last_updated)
            .bind(item.active)
            .execute(&mut **tx)
            .await?;
        }
        Write::SetStock { item, quantity, at } => {
            let result = sqlx::query(
                "UPDATE items SET quantity_in_stock = $2, qty_last_updated = $3 WHERE id = $1",
            )
            .bind(item)
            .bind(quantity)
            .bind(at)
            .execute(&mut **tx)
            .await?;
            ensure_updated(result.rows_affected())?;
        }
        Write::IncrementStock { item, quantity, at } => {
            let result = sqlx::query(
                r#"
                UPDATE items
                SET quantity_in_stock = quantity_in_stock + $2,
                    qty_last_updated = $3,
                    item_last_updated = $3
                WHERE id = $1
                "#,
            )
            .bind(item)
            .bind(quantity)
            .bind(at)
            .execute(&mut **tx)
            .await?;
            ensure_updated(result.rows_affected())?;
        }
        Write::SetItemActive { item, active, at } => {
            let result =
                sqlx::query("UPDATE items SET active = $2, item_last_updated = $3 WHERE id = $1")
                    .bind(item)
                    .bind(active)
                    .bind(at)
                    .execute(&mut **tx)
                    .await?;
            ensure_updated(result.rows_affected())?;
        }
        Write::PutOrder(order) => {
            sqlx::query(
                r#"
                INSERT INTO orders (id, order_date, delivery_date, status, ordered_items, last_updated)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE SET
                    order_date = EXCLUDED.order_date,
                    delivery_date = EXCLUDED.delivery_date,
                    status = EXCLUDED.status,
                    ordered_items = EXCLUDED.ordered_items,
                    last_updated = EXCLUDED.last_updated
                "#,
            )
            .bind(order.id)
            .bind(order.order_date)
            .bind(order.delivery_date)
            .bind(order.status.as_str())
            .bind(Json(&order.ordered_items))
            .bind(order.last_updated)
            .execute(&mut **tx)
            .await?;
        }
        Write::DeleteOrder(id) => {
            sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
        Write::PutReceipt(receipt) => {
            sqlx::query(
                r#"
                INSERT INTO receipts (id, date_initiated, date_submitted, received_items, order_received)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    date_submitted = EXCLUDED.date_submitted,
                    received_items = EXCLUDED.received_items,
                    order_received = EXCLUDED.order_received
                "#,
            )
            .bind(receipt.id)
            .bind(receipt.date_initiated)
            .bind(receipt.date_submitted)
            .bind(Json(&receipt.received_items))
            .bind(receipt.order_received)
            .execute(&mut **tx)
            .await?;
        }
        Write::DeleteReceipt(id) => {
            sqlx::query("DELETE FROM receipts WHERE id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
        Write::PutCount(count) => {
            sqlx::query(
                r#"
                INSERT INTO inventory_counts (id, date_initiated, date_submitted, counted_quantities, count_type)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    date_submitted = EXCLUDED.date_submitted,
                    counted_quantities = EXCLUDED.counted_quantities,
                    count_type = EXCLUDED.count_type
                "#,
            )
            .bind(count.id)
            .bind(count.date_initiated)
            .bind(count.date_submitted)
            .bind(Json(&count.counted_quantities))
            .bind(count.count_type.as_str())
            .execute(&mut **tx)
            .await?;
        }
        Write::DeleteCount(id) => {
            sqlx::query("DELETE FROM inventory_counts WHERE id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
    }
    Ok(())
}

fn ensure_updated(rows: u64) -> AppResult<()> {
    if rows == 0 {
        return Err(AppError::NotFound("Item".to_string()));
    }
    Ok(())
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {} FROM categories ORDER BY LOWER(name)",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {} FROM categories WHERE name = $1 LIMIT 1",
            CATEGORY_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn get_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Item::from))
    }

    async fn get_items(&self, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items WHERE id = ANY($1)",
            ITEM_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn find_items(&self, query: &ItemQuery) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {} FROM items
            WHERE ($1::BOOLEAN IS NULL OR active = $1)
              AND ($2::UUID IS NULL OR category_id = $2)
            ORDER BY LOWER(name)
            "#,
            ITEM_COLUMNS
        ))
        .bind(query.active)
        .bind(query.category)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn find_item_conflict(&self, name: &str, sku: &str) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            SELECT {} FROM items
            WHERE name = $1 OR (sku = $2 AND sku <> $3)
            LIMIT 1
            "#,
            ITEM_COLUMNS
        ))
        .bind(name)
        .bind(sku)
        .bind(shared::SKU_NOT_FOR_SALE)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Item::from))
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    async fn find_orders(&self, statuses: &[OrderStatus]) -> AppResult<Vec<Order>> {
        let statuses: Vec<&str> = statuses.iter().map(OrderStatus::as_str).collect();
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE status = ANY($1) ORDER BY last_updated DESC",
            ORDER_COLUMNS
        ))
        .bind(&statuses)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_receipt(&self, id: Uuid) -> AppResult<Option<Receipt>> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {} FROM receipts WHERE id = $1",
            RECEIPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Receipt::from))
    }

    async fn find_receipt_for_order(&self, order_id: Uuid) -> AppResult<Option<Receipt>> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {} FROM receipts WHERE order_received = $1",
            RECEIPT_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Receipt::from))
    }

    async fn find_receipts(&self, limit: Option<usize>) -> AppResult<Vec<Receipt>> {
        let limit = limit.map(|l| l as i64);
        let rows = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {} FROM receipts ORDER BY date_initiated DESC LIMIT $1",
            RECEIPT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Receipt::from).collect())
    }

    async fn get_count(&self, id: Uuid) -> AppResult<Option<InventoryCount>> {
        sqlx::query_as::<_, CountRow>(&format!(
            "SELECT {} FROM inventory_counts WHERE id = $1",
            COUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(InventoryCount::try_from)
        .transpose()
    }

    async fn find_counts(&self, query: &CountQuery) -> AppResult<Vec<InventoryCount>> {
        let limit = query.limit.map(|l| l as i64);
        let rows = sqlx::query_as::<_, CountRow>(&format!(
            r#"
            SELECT {} FROM inventory_counts
            WHERE (NOT $1 OR date_submitted IS NULL)
            ORDER BY date_initiated DESC
            LIMIT $2
            "#,
            COUNT_COLUMNS
        ))
        .bind(query.unsubmitted_only)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(InventoryCount::try_from).collect()
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        for write in batch.into_writes() {
            apply(&mut tx, write).await?;
        }
        tx.commit().await?;

        Ok(())
    }
}
