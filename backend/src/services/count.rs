//! Inventory counts: count sheets, drafts and committing counted stock

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::reconciliation::{self, ZeroLines};
use shared::{
    category_label, category_sort_key, CountFilter, CountListFilter, CountType, FieldError,
    InventoryCount, ItemQuantities, LineInput, OrderStatus, RawQuantity, SubmitType,
    RECENT_LIMIT,
};
use uuid::Uuid;

use super::{
    category_by_name, category_name, populate_lines, sort_by_sku_then_name, AdminGuard,
    DeleteInput, PopulatedLine,
};
use crate::error::{AppError, AppResult};
use crate::store::{CountQuery, DynStore, ItemQuery, Write, WriteBatch};

/// Count service for taking and committing stock counts
#[derive(Clone)]
pub struct CountService {
    store: DynStore,
    admin: AdminGuard,
}

/// Input for saving or submitting a count
#[derive(Debug, Clone, Deserialize)]
pub struct CountInput {
    /// `Full`, `AdHoc` or a category name. Optional when editing a count
    /// that is not a By Category count.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub items: Vec<LineInput>,
    pub submit_type: SubmitType,
}

/// One row of a count sheet
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SheetLine {
    pub item: Uuid,
    pub name: String,
    pub sku: String,
    /// Category name, or "(None)"
    pub category: String,
    pub active: bool,
    pub quantity_in_stock: i32,
    pub on_order: i32,
    /// Quantity already entered for this item, if any
    pub counted: Option<i32>,
    /// Value typed for this item in a rejected submission, valid or not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted: Option<RawQuantity>,
}

/// Items to count, grouped by category
#[derive(Debug, Clone, Serialize)]
pub struct CountSheet {
    /// `None` when the submitted filter could not be resolved
    pub filter: Option<CountFilter>,
    pub count_type: Option<CountType>,
    pub lines: Vec<SheetLine>,
}

impl CountSheet {
    fn unresolved() -> Self {
        Self {
            filter: None,
            count_type: None,
            lines: Vec::new(),
        }
    }
}

/// A rejected submission, returned so the form can be shown again
#[derive(Debug, Clone, Serialize)]
pub struct CountForm {
    /// The count as it would have been saved; holds the valid lines only
    pub count: InventoryCount,
    pub errors: Vec<FieldError>,
    pub sheet: CountSheet,
    /// Lines exactly as submitted, matching the `items[i]` error keys
    pub items: Vec<LineInput>,
}

/// Result of saving or submitting a count
#[derive(Debug, Clone)]
pub enum CountOutcome {
    Saved(InventoryCount),
    Rejected(CountForm),
}

/// Count row in listings
#[derive(Debug, Clone, Serialize)]
pub struct CountSummary {
    #[serde(flatten)]
    pub count: InventoryCount,
    pub line_count: usize,
}

/// Count with its lines joined to items
#[derive(Debug, Clone, Serialize)]
pub struct CountDetail {
    #[serde(flatten)]
    pub count: InventoryCount,
    pub lines: Vec<PopulatedLine>,
}

impl CountService {
    /// Create a new CountService instance
    pub fn new(store: DynStore, admin: AdminGuard) -> Self {
        Self { store, admin }
    }

    /// Sheet for a new count
    pub async fn start_count(&self, filter: &str) -> AppResult<CountSheet> {
        let filter = parse_filter(Some(filter)).map_err(|e| AppError::Validation(vec![e]))?;
        let category = self.category_for(&filter).await?;
        let none = ItemQuantities::new();
        self.build_sheet(filter, category, &none, &none, &[]).await
    }

    /// Sheet for continuing a draft count, with its entered quantities
    pub async fn sheet_for_update(&self, id: Uuid, filter: Option<&str>) -> AppResult<CountSheet> {
        let count = self.get_draft(id).await?;
        let filter = filter_for(&count, filter).map_err(|e| AppError::Validation(vec![e]))?;
        let category = self.category_for(&filter).await?;
        let referenced = ItemQuantities::from(count.counted_quantities);
        self.build_sheet(filter, category, &referenced, &referenced, &[])
            .await
    }

    /// Save a draft or submit a count. `id` is `None` for a new count.
    ///
    /// Bad input is not an error: the attempted count comes back as
    /// [`CountOutcome::Rejected`] so the form can be shown again as typed.
    pub async fn submit(&self, id: Option<Uuid>, input: CountInput) -> AppResult<CountOutcome> {
        let existing = match id {
            Some(id) => Some(self.get_draft(id).await?),
            None => None,
        };
        let filter = match &existing {
            Some(count) => filter_for(count, input.filter.as_deref()),
            None => parse_filter(input.filter.as_deref()),
        };
        let category = match &filter {
            Ok(filter) => self.category_for(filter).await?,
            Err(_) => None,
        };
        let drafted = existing
            .as_ref()
            .map(|count| ItemQuantities::from(count.counted_quantities.clone()))
            .unwrap_or_default();

        let (counted, mut errors) =
            reconciliation::parse_lines(&input.items, "items", ZeroLines::Keep);
        let items = self.store.get_items(&counted.item_ids()).await?;
        let known: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        errors.extend(reconciliation::unknown_items(
            &input.items,
            &counted,
            &known,
            "items",
        ));
        match &filter {
            Ok(filter) => {
                let eligible: Vec<Uuid> =
                    reconciliation::eligible_items(items.clone(), filter, category, &drafted)
                        .iter()
                        .map(|i| i.id)
                        .collect();
                errors.extend(reconciliation::off_sheet_items(
                    &input.items,
                    &counted,
                    &known,
                    &eligible,
                    "items",
                ));
            }
            Err(error) => errors.insert(0, error.clone()),
        }

        let now = Utc::now();
        let count_type = match (&filter, &existing) {
            (Ok(filter), _) => filter.count_type(),
            (Err(_), Some(count)) => count.count_type,
            (Err(_), None) => CountType::AdHoc,
        };
        let mut count = existing.unwrap_or_else(|| InventoryCount::draft(count_type, now));
        count.count_type = count_type;

        if !errors.is_empty() {
            let sheet = match filter {
                Ok(filter) => {
                    self.build_sheet(filter, category, &drafted, &counted, &input.items)
                        .await?
                }
                Err(_) => CountSheet::unresolved(),
            };
            count.counted_quantities = counted.into_lines();
            tracing::debug!(count_id = %count.id, errors = errors.len(), "Rejected count");
            return Ok(CountOutcome::Rejected(CountForm {
                count,
                errors,
                sheet,
                items: input.items,
            }));
        }

        let mut batch = WriteBatch::new();
        if input.submit_type.is_submit() {
            count.date_submitted = Some(now);
            for change in reconciliation::stock_changes(&counted, &items) {
                batch.push(Write::SetStock {
                    item: change.item,
                    quantity: change.quantity,
                    at: now,
                });
            }
        }
        count.counted_quantities = counted.into_lines();
        batch.push(Write::PutCount(count.clone()));

        let changed = batch.len() - 1;
        self.store.commit(batch).await?;

        if count.is_submitted() {
            tracing::info!(
                count_id = %count.id,
                count_type = %count.count_type,
                changed,
                "Submitted count"
            );
        } else {
            tracing::debug!(count_id = %count.id, "Saved draft count");
        }
        Ok(CountOutcome::Saved(count))
    }

    /// List counts, newest first
    pub async fn list(&self, filter: CountListFilter) -> AppResult<Vec<CountSummary>> {
        let query = match filter {
            CountListFilter::All => CountQuery::default(),
            CountListFilter::Recent => CountQuery {
                limit: Some(RECENT_LIMIT),
                ..CountQuery::default()
            },
            CountListFilter::Unsubmitted => CountQuery {
                unsubmitted_only: true,
                ..CountQuery::default()
            },
        };

        Ok(self
            .store
            .find_counts(&query)
            .await?
            .into_iter()
            .map(|count| CountSummary {
                line_count: count.counted_quantities.len(),
                count,
            })
            .collect())
    }

    /// Get a count with its lines sorted by sku, then name
    pub async fn detail(&self, id: Uuid) -> AppResult<CountDetail> {
        let count = self.get(id).await?;
        let mut lines = populate_lines(&self.store, &count.counted_quantities).await?;
        sort_by_sku_then_name(&mut lines);
        Ok(CountDetail { count, lines })
    }

    /// Delete a count, submitted or not. Stock is left as it is.
    pub async fn delete(&self, id: Uuid, input: &DeleteInput) -> AppResult<()> {
        self.admin.check(input.password.as_deref())?;

        let count = self.get(id).await?;
        self.store
            .commit(WriteBatch::new().with(Write::DeleteCount(count.id)))
            .await?;

        tracing::info!(count_id = %id, "Deleted count");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<InventoryCount> {
        self.store
            .get_count(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Count".to_string()))
    }

    async fn get_draft(&self, id: Uuid) -> AppResult<InventoryCount> {
        let count = self.get(id).await?;
        if count.is_submitted() {
            return Err(AppError::InvalidState(
                "count has already been submitted".to_string(),
            ));
        }
        Ok(count)
    }

    async fn category_for(&self, filter: &CountFilter) -> AppResult<Option<Uuid>> {
        match filter.category_name() {
            Some(name) => Ok(Some(category_by_name(&self.store, name).await?.id)),
            None => Ok(None),
        }
    }

    /// Sheet rows for `filter`. `referenced` items are listed even when
    /// archived; `counted` and `attempted` annotate the rows.
    async fn build_sheet(
        &self,
        filter: CountFilter,
        category: Option<Uuid>,
        referenced: &ItemQuantities,
        counted: &ItemQuantities,
        attempted: &[LineInput],
    ) -> AppResult<CountSheet> {
        let items = self.store.find_items(&ItemQuery::default()).await?;
        let items = reconciliation::eligible_items(items, &filter, category, referenced);
        let mut typed: HashMap<Uuid, RawQuantity> = HashMap::new();
        for line in attempted.iter().filter(|l| !l.quantity.is_blank()) {
            if let Ok(id) = Uuid::parse_str(line.item.trim()) {
                typed.insert(id, line.quantity.clone());
            }
        }
        let categories = self.store.list_categories().await?;
        let orders = self.store.find_orders(&[OrderStatus::Ordered]).await?;
        let on_order = reconciliation::quantity_on_order(&orders);

        let mut lines: Vec<(Option<String>, SheetLine)> = items
            .into_iter()
            .map(|item| {
                let name = category_name(&categories, &item).map(str::to_string);
                let line = SheetLine {
                    item: item.id,
                    category: category_label(name.as_deref()).to_string(),
                    on_order: on_order.get(item.id).unwrap_or(0),
                    counted: counted.get(item.id),
                    attempted: typed.remove(&item.id),
                    active: item.active,
                    quantity_in_stock: item.quantity_in_stock,
                    sku: item.sku,
                    name: item.name,
                };
                (name, line)
            })
            .collect();
        lines.sort_by(|(a_cat, a), (b_cat, b)| {
            category_sort_key(a_cat.as_deref())
                .cmp(&category_sort_key(b_cat.as_deref()))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(CountSheet {
            count_type: Some(filter.count_type()),
            filter: Some(filter),
            lines: lines.into_iter().map(|(_, line)| line).collect(),
        })
    }
}

fn parse_filter(filter: Option<&str>) -> Result<CountFilter, FieldError> {
    filter
        .and_then(CountFilter::parse)
        .ok_or_else(|| FieldError::new("filter", "Choose what to count"))
}

/// Filter for an existing count: the one given, or the one implied by its type
fn filter_for(count: &InventoryCount, filter: Option<&str>) -> Result<CountFilter, FieldError> {
    if let Some(filter) = filter.and_then(CountFilter::parse) {
        return Ok(filter);
    }
    match count.count_type {
        CountType::Full => Ok(CountFilter::Full),
        CountType::AdHoc | CountType::Initial => Ok(CountFilter::AdHoc),
        CountType::ByCategory => Err(FieldError::new(
            "filter",
            "Category required for a By Category count",
        )),
    }
}
