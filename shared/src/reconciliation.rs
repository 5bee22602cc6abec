//! Reconciliation rules shared by orders, receiving and counts
//!
//! Everything here is pure: callers load records, ask these functions what
//! should change, and commit the answer in one write batch.

use uuid::Uuid;

use crate::models::{CountFilter, Item, Order, OrderStatus};
use crate::types::{FieldError, ItemQuantities, LineInput, LineItem};
use crate::validation::validate_line_quantity;

/// What to do with lines whose quantity is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroLines {
    /// Zero is a real value (a count of nothing on the shelf)
    Keep,
    /// Zero means "not part of this order/delivery"
    Drop,
}

/// Parse submitted lines into a quantity map.
///
/// Blank quantities are discarded before validation. Every remaining line must
/// carry a valid item id and a quantity in `0..10_000_000`. Errors are keyed as
/// `{prefix}[{index}].item` / `{prefix}[{index}].quantity`. Valid lines are
/// returned even when other lines fail, so a form can be re-rendered intact.
pub fn parse_lines(
    lines: &[LineInput],
    prefix: &str,
    zero: ZeroLines,
) -> (ItemQuantities, Vec<FieldError>) {
    let mut quantities = ItemQuantities::new();
    let mut errors = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if line.quantity.is_blank() {
            continue;
        }
        let item = match Uuid::parse_str(line.item.trim()) {
            Ok(id) => id,
            Err(_) => {
                errors.push(FieldError::new(
                    format!("{}[{}].item", prefix, index),
                    "Invalid item id",
                ));
                continue;
            }
        };
        let quantity = match line.quantity.parse() {
            Ok(Some(q)) => q,
            Ok(None) => continue,
            Err(message) => {
                errors.push(FieldError::new(
                    format!("{}[{}].quantity", prefix, index),
                    message,
                ));
                continue;
            }
        };
        if let Err(message) = validate_line_quantity(quantity) {
            errors.push(FieldError::new(
                format!("{}[{}].quantity", prefix, index),
                message,
            ));
            continue;
        }
        if quantity == 0 && zero == ZeroLines::Drop {
            continue;
        }
        // Bounded above by validate_line_quantity
        quantities.set(item, quantity as i32);
    }

    (quantities, errors)
}

/// Field errors for every accepted line whose item id is not in `known`.
///
/// Keyed `{prefix}[{index}].item` like the errors from [`parse_lines`], so each
/// one points back at the submitted row.
pub fn unknown_items(
    lines: &[LineInput],
    accepted: &ItemQuantities,
    known: &[Uuid],
    prefix: &str,
) -> Vec<FieldError> {
    accepted_rows(lines, accepted)
        .filter(|(_, id)| !known.contains(id))
        .map(|(index, _)| FieldError::new(format!("{}[{}].item", prefix, index), "Item not found"))
        .collect()
}

/// Field errors for accepted lines naming a known item that the count sheet
/// does not cover (e.g. an uncategorised item on a By Category count)
pub fn off_sheet_items(
    lines: &[LineInput],
    accepted: &ItemQuantities,
    known: &[Uuid],
    eligible: &[Uuid],
    prefix: &str,
) -> Vec<FieldError> {
    accepted_rows(lines, accepted)
        .filter(|(_, id)| known.contains(id) && !eligible.contains(id))
        .map(|(index, _)| {
            FieldError::new(
                format!("{}[{}].item", prefix, index),
                "Item is not part of this count",
            )
        })
        .collect()
}

/// Index of the submitted row carrying `item`, last one wins like [`parse_lines`]
pub fn row_for_item(lines: &[LineInput], item: Uuid) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.quantity.is_blank())
        .filter(|(_, line)| Uuid::parse_str(line.item.trim()).ok() == Some(item))
        .map(|(index, _)| index)
        .last()
}

fn accepted_rows<'a>(
    lines: &'a [LineInput],
    accepted: &'a ItemQuantities,
) -> impl Iterator<Item = (usize, Uuid)> + 'a {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.quantity.is_blank())
        .filter_map(|(index, line)| Uuid::parse_str(line.item.trim()).ok().map(|id| (index, id)))
        .filter(move |(_, id)| accepted.contains(*id))
}

/// Total quantity per item across every order that has been placed but not received
pub fn quantity_on_order(orders: &[Order]) -> ItemQuantities {
    let mut on_order = ItemQuantities::new();
    for order in orders.iter().filter(|o| o.status == OrderStatus::Ordered) {
        for line in &order.ordered_items {
            on_order.add(line.item, line.quantity);
        }
    }
    on_order
}

/// Record every ordered item missing from a delivery at quantity zero, so
/// "ordered but not received" differs from "not part of this delivery"
pub fn zero_fill(received: &mut ItemQuantities, ordered: &[LineItem]) {
    for line in ordered {
        if !received.contains(line.item) {
            received.set(line.item, 0);
        }
    }
}

/// Items whose counted quantity differs from what is on record.
///
/// Unchanged items are left out so their `qty_last_updated` stays put.
/// Counted ids with no matching item are ignored.
pub fn stock_changes(counted: &ItemQuantities, items: &[Item]) -> Vec<LineItem> {
    counted
        .iter()
        .filter(|line| {
            items
                .iter()
                .any(|item| item.id == line.item && item.quantity_in_stock != line.quantity)
        })
        .copied()
        .collect()
}

/// Items a count sheet should show.
///
/// `Full` and `AdHoc` cover every active item; a category filter covers the
/// active items in `category_id`. Items listed in `referenced` (the lines of the
/// count being edited) are always kept, even once archived.
pub fn eligible_items(
    items: Vec<Item>,
    filter: &CountFilter,
    category_id: Option<Uuid>,
    referenced: &ItemQuantities,
) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| {
            if referenced.contains(item.id) {
                return true;
            }
            if !item.active {
                return false;
            }
            match filter {
                CountFilter::Full | CountFilter::AdHoc => true,
                CountFilter::Category(_) => category_id.is_some() && item.category == category_id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawQuantity;
    use chrono::Utc;
    use proptest::prelude::*;

    fn item(quantity: i32, active: bool, category: Option<Uuid>) -> Item {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4(),
            name: "Item".to_string(),
            description: None,
            category,
            sku: crate::models::SKU_NOT_FOR_SALE.to_string(),
            price: None,
            quantity_in_stock: quantity,
            qty_last_updated: now,
            item_last_updated: now,
            active,
        }
    }

    fn order(status: OrderStatus, lines: Vec<LineItem>) -> Order {
        let mut order = Order::new(lines, false, Utc::now());
        order.status = status;
        order
    }

    // ========================================================================
    // Line parsing
    // ========================================================================

    #[test]
    fn test_blank_lines_are_discarded() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![LineInput::new(a, 4), LineInput::blank(b)];

        let (quantities, errors) = parse_lines(&lines, "items", ZeroLines::Keep);
        assert!(errors.is_empty());
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities.get(a), Some(4));
    }

    #[test]
    fn test_zero_kept_for_counts_dropped_for_orders() {
        let a = Uuid::new_v4();
        let lines = vec![LineInput::new(a, 0)];

        let (kept, _) = parse_lines(&lines, "items", ZeroLines::Keep);
        let (dropped, _) = parse_lines(&lines, "items", ZeroLines::Drop);
        assert_eq!(kept.get(a), Some(0));
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_bad_lines_reported_by_index() {
        let a = Uuid::new_v4();
        let lines = vec![
            LineInput::new(a, 2),
            LineInput {
                item: "not-an-id".into(),
                quantity: RawQuantity::Integer(1),
            },
            LineInput::new(Uuid::new_v4(), RawQuantity::Number(1.5)),
            LineInput::new(Uuid::new_v4(), 10_000_000),
        ];

        let (quantities, errors) = parse_lines(&lines, "orderedItems", ZeroLines::Drop);
        assert_eq!(quantities.get(a), Some(2));
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.clone()).collect();
        assert_eq!(
            fields,
            vec![
                "orderedItems[1].item",
                "orderedItems[2].quantity",
                "orderedItems[3].quantity"
            ]
        );
    }

    #[test]
    fn test_duplicate_lines_last_assignment_wins() {
        let a = Uuid::new_v4();
        let lines = vec![LineInput::new(a, 2), LineInput::new(a, 9)];

        let (quantities, _) = parse_lines(&lines, "items", ZeroLines::Keep);
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities.get(a), Some(9));
    }

    #[test]
    fn test_unknown_items_keyed_by_row() {
        let known = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let lines = vec![
            LineInput::new(known, 1),
            LineInput::blank(stranger),
            LineInput::new(stranger, 1),
        ];
        let (accepted, _) = parse_lines(&lines, "items", ZeroLines::Keep);

        let errors = unknown_items(&lines, &accepted, &[known], "items");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("items[2].item"));
    }

    #[test]
    fn test_dropped_zero_lines_are_not_checked() {
        let stranger = Uuid::new_v4();
        let lines = vec![LineInput::new(stranger, 0)];
        let (accepted, _) = parse_lines(&lines, "items", ZeroLines::Drop);

        assert!(unknown_items(&lines, &accepted, &[], "items").is_empty());
    }

    #[test]
    fn test_off_sheet_items() {
        let on_sheet = Uuid::new_v4();
        let elsewhere = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let lines = vec![
            LineInput::new(on_sheet, 1),
            LineInput::new(elsewhere, 1),
            LineInput::new(stranger, 1),
        ];
        let (accepted, _) = parse_lines(&lines, "items", ZeroLines::Keep);

        let errors = off_sheet_items(
            &lines,
            &accepted,
            &[on_sheet, elsewhere],
            &[on_sheet],
            "items",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("items[1].item"));
    }

    #[test]
    fn test_row_for_item_prefers_last_filled_row() {
        let a = Uuid::new_v4();
        let lines = vec![
            LineInput::new(a, 2),
            LineInput::new(Uuid::new_v4(), 1),
            LineInput::new(a, 9),
            LineInput::blank(a),
        ];

        assert_eq!(row_for_item(&lines, a), Some(2));
        assert_eq!(row_for_item(&lines, Uuid::new_v4()), None);
    }

    // ========================================================================
    // On order
    // ========================================================================

    #[test]
    fn test_on_order_counts_only_placed_orders() {
        let a = Uuid::new_v4();
        let orders = vec![
            order(OrderStatus::Ordered, vec![LineItem::new(a, 5)]),
            order(OrderStatus::Ordered, vec![LineItem::new(a, 3)]),
            order(OrderStatus::Saved, vec![LineItem::new(a, 100)]),
            order(OrderStatus::Received, vec![LineItem::new(a, 100)]),
        ];

        assert_eq!(quantity_on_order(&orders).get(a), Some(8));
    }

    // ========================================================================
    // Receiving
    // ========================================================================

    #[test]
    fn test_zero_fill_marks_missing_ordered_items() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut received: ItemQuantities = vec![LineItem::new(a, 4)].into();

        zero_fill(&mut received, &[LineItem::new(a, 5), LineItem::new(b, 2)]);
        assert_eq!(received.get(a), Some(4));
        assert_eq!(received.get(b), Some(0));
    }

    // ========================================================================
    // Counts
    // ========================================================================

    #[test]
    fn test_stock_changes_skip_unchanged_items() {
        let same = item(10, true, None);
        let changed = item(10, true, None);
        let counted: ItemQuantities =
            vec![LineItem::new(same.id, 10), LineItem::new(changed.id, 7)].into();

        let changes = stock_changes(&counted, &[same, changed.clone()]);
        assert_eq!(changes, vec![LineItem::new(changed.id, 7)]);
    }

    #[test]
    fn test_eligible_items_by_category_keeps_referenced_archived() {
        let dairy = Uuid::new_v4();
        let in_dairy = item(1, true, Some(dairy));
        let archived_in_dairy = item(1, false, Some(dairy));
        let elsewhere = item(1, true, None);
        let referenced: ItemQuantities = vec![LineItem::new(archived_in_dairy.id, 1)].into();

        let items = vec![in_dairy.clone(), archived_in_dairy.clone(), elsewhere];
        let eligible = eligible_items(
            items.clone(),
            &CountFilter::Category("Dairy".into()),
            Some(dairy),
            &referenced,
        );
        let ids: Vec<_> = eligible.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![in_dairy.id, archived_in_dairy.id]);

        let fresh = eligible_items(
            items,
            &CountFilter::Category("Dairy".into()),
            Some(dairy),
            &ItemQuantities::new(),
        );
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_eligible_items_full_is_all_active() {
        let items = vec![item(1, true, None), item(1, false, None), item(1, true, Some(Uuid::new_v4()))];
        let eligible = eligible_items(items, &CountFilter::Full, None, &ItemQuantities::new());
        assert_eq!(eligible.len(), 2);
        assert!(eligible.iter().all(|i| i.active));
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    proptest! {
        #[test]
        fn prop_on_order_equals_sum_of_placed_lines(
            quantities in prop::collection::vec((0..3usize, 0i32..1000), 0..20)
        ) {
            let item_id = Uuid::new_v4();
            let statuses = [OrderStatus::Saved, OrderStatus::Ordered, OrderStatus::Received];
            let orders: Vec<Order> = quantities
                .iter()
                .map(|(s, q)| order(statuses[*s], vec![LineItem::new(item_id, *q)]))
                .collect();

            let expected: i32 = quantities.iter().filter(|(s, _)| *s == 1).map(|(_, q)| *q).sum();
            let on_order = quantity_on_order(&orders);
            prop_assert_eq!(on_order.get(item_id).unwrap_or(0), expected);
        }

        #[test]
        fn prop_applying_stock_changes_makes_recount_idempotent(
            pairs in prop::collection::vec((0i32..100, 0i32..100), 1..15)
        ) {
            let mut items: Vec<Item> = pairs.iter().map(|(stock, _)| item(*stock, true, None)).collect();
            let counted: ItemQuantities = items
                .iter()
                .zip(pairs.iter())
                .map(|(i, (_, counted))| LineItem::new(i.id, *counted))
                .collect();

            for change in stock_changes(&counted, &items) {
                if let Some(target) = items.iter_mut().find(|i| i.id == change.item) {
                    target.quantity_in_stock = change.quantity;
                }
            }

            prop_assert!(stock_changes(&counted, &items).is_empty());
        }

        #[test]
        fn prop_zero_fill_preserves_received_and_covers_order(
            ordered in prop::collection::vec(1i32..50, 0..10),
            received_mask in prop::collection::vec(any::<bool>(), 10)
        ) {
            let ordered: Vec<LineItem> = ordered.iter().map(|q| LineItem::new(Uuid::new_v4(), *q)).collect();
            let mut received: ItemQuantities = ordered
                .iter()
                .zip(received_mask.iter())
                .filter(|(_, keep)| **keep)
                .map(|(l, _)| *l)
                .collect();
            let before = received.clone();

            zero_fill(&mut received, &ordered);

            for line in before.iter() {
                prop_assert_eq!(received.get(line.item), Some(line.quantity));
            }
            for line in &ordered {
                prop_assert!(received.contains(line.item));
            }
            prop_assert_eq!(received.total(), before.total());
        }
    }
}
