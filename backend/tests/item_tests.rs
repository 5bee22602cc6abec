//! Item ledger tests
//!
//! Covers item creation with its Initial count, manual stock edits recorded as
//! Ad Hoc counts, duplicate detection, archiving and listing order.

mod common;

use cafe_inventory_backend::error::AppError;
use cafe_inventory_backend::services::category::CategoryInput;
use cafe_inventory_backend::services::item::{ArchiveInput, ItemInput};
use cafe_inventory_backend::services::order::OrderInput;
use cafe_inventory_backend::store::{CountQuery, Store};
use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{CountType, InventoryCount, ItemFilter, LineItem, SubmitType, SKU_NOT_FOR_SALE};
use uuid::Uuid;

async fn counts_of(h: &Harness, count_type: CountType) -> Vec<InventoryCount> {
    h.store
        .find_counts(&CountQuery::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.count_type == count_type)
        .collect()
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_records_initial_count() {
    let h = harness();
    let item = create_item(&h, "Oat Milk", 10).await;

    assert!(item.active);
    assert_eq!(item.sku, SKU_NOT_FOR_SALE);
    assert_eq!(item.quantity_in_stock, 10);

    let initial = counts_of(&h, CountType::Initial).await;
    assert_eq!(initial.len(), 1);
    assert!(initial[0].is_submitted());
    assert_eq!(initial[0].counted_quantities, vec![LineItem::new(item.id, 10)]);
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let h = harness();
    let input = ItemInput {
        name: "   ".to_string(),
        price: Some(Decimal::from(-1)),
        quantity_in_stock: None,
        ..ItemInput::default()
    };

    let err = h.items.create(input).await.unwrap_err();
    let AppError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"price"));
    assert!(fields.contains(&"quantity_in_stock"));

    let all = h.store.find_counts(&CountQuery::default()).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_create_rejects_out_of_range_stock() {
    let h = harness();
    let err = h
        .items
        .create(item_input("Beans", 10_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_create_rejects_unknown_category() {
    let h = harness();
    let input = ItemInput {
        category: Some(Uuid::new_v4()),
        ..item_input("Cups", 100)
    };
    let err = h.items.create(input).await.unwrap_err();
    let AppError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors[0].field.as_deref(), Some("category"));
}

#[tokio::test]
async fn test_duplicate_name_rejected_even_when_archived() {
    let h = harness();
    let existing = create_item(&h, "Oat Milk", 3).await;
    h.items
        .archive(
            existing.id,
            &ArchiveInput {
                password: Some(ADMIN_PASSWORD.to_string()),
                restore: false,
            },
        )
        .await
        .unwrap();

    let err = h.items.create(item_input("Oat Milk", 1)).await.unwrap_err();
    match err {
        AppError::DuplicateItem { existing: found } => assert_eq!(found.id, existing.id),
        other => panic!("expected duplicate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_sku_rejected_but_sentinel_is_shared() {
    let h = harness();
    h.items
        .create(ItemInput {
            sku: Some("SYR-VAN".to_string()),
            ..item_input("Vanilla Syrup", 2)
        })
        .await
        .unwrap();

    let err = h
        .items
        .create(ItemInput {
            sku: Some("SYR-VAN".to_string()),
            ..item_input("Vanilla Syrup Large", 2)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateItem { .. }));

    // Two items not for sale share the sentinel sku
    create_item(&h, "Napkins", 500).await;
    create_item(&h, "Straws", 500).await;
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_with_new_quantity_records_ad_hoc_count() {
    let h = harness();
    let item = create_item(&h, "Whole Milk", 10).await;
    tick().await;

    let updated = h
        .items
        .update(item.id, item_input("Whole Milk", 7))
        .await
        .unwrap();

    assert_eq!(updated.quantity_in_stock, 7);
    assert!(updated.qty_last_updated > item.qty_last_updated);
    assert!(updated.item_last_updated > item.item_last_updated);

    let ad_hoc = counts_of(&h, CountType::AdHoc).await;
    assert_eq!(ad_hoc.len(), 1);
    assert!(ad_hoc[0].is_submitted());
    assert_eq!(ad_hoc[0].counted_quantities, vec![LineItem::new(item.id, 7)]);
}

#[tokio::test]
async fn test_update_with_same_quantity_keeps_qty_timestamp() {
    let h = harness();
    let item = create_item(&h, "Whole Milk", 10).await;
    tick().await;

    let updated = h
        .items
        .update(
            item.id,
            ItemInput {
                description: Some("Two litre bottles".to_string()),
                ..item_input("Whole Milk", 10)
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.qty_last_updated, item.qty_last_updated);
    assert!(updated.item_last_updated > item.item_last_updated);
    assert_eq!(updated.description.as_deref(), Some("Two litre bottles"));
    assert!(counts_of(&h, CountType::AdHoc).await.is_empty());
}

#[tokio::test]
async fn test_update_missing_item_is_not_found() {
    let h = harness();
    let err = h
        .items
        .update(Uuid::new_v4(), item_input("Ghost", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_changed_quantity_is_captured_exactly(start in 0i64..=9_999_999, next in 0i64..=9_999_999) {
        prop_assume!(start != next);
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = harness();
            let item = create_item(&h, "Beans", start).await;
            h.items.update(item.id, item_input("Beans", next)).await.unwrap();

            let ad_hoc = counts_of(&h, CountType::AdHoc).await;
            assert_eq!(ad_hoc.len(), 1);
            assert_eq!(
                ad_hoc[0].counted_quantities,
                vec![LineItem::new(item.id, next as i32)]
            );
        });
    }
}

// ============================================================================
// Archive
// ============================================================================

#[tokio::test]
async fn test_archive_requires_admin_password() {
    let h = harness();
    let item = create_item(&h, "Lids", 40).await;

    let err = h
        .items
        .archive(
            item.id,
            &ArchiveInput {
                password: Some("wrong".to_string()),
                restore: false,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPassword));

    let stored = h.store.get_item(item.id).await.unwrap().unwrap();
    assert!(stored.active);
}

#[tokio::test]
async fn test_archive_then_restore() {
    let h = harness();
    let item = create_item(&h, "Lids", 40).await;
    let password = Some(ADMIN_PASSWORD.to_string());

    let archived = h
        .items
        .archive(
            item.id,
            &ArchiveInput {
                password: password.clone(),
                restore: false,
            },
        )
        .await
        .unwrap();
    assert!(!archived.active);

    let listed = h.items.list(&ItemFilter::Archived).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(h.items.list(&ItemFilter::All).await.unwrap().is_empty());

    let restored = h
        .items
        .archive(
            item.id,
            &ArchiveInput {
                password,
                restore: true,
            },
        )
        .await
        .unwrap();
    assert!(restored.active);
}

// ============================================================================
// Listing and detail
// ============================================================================

#[tokio::test]
async fn test_list_sorts_by_sku_then_category_then_name() {
    let h = harness();
    let dairy = h
        .categories
        .create(CategoryInput {
            name: "Dairy".to_string(),
            description: "Milk and cream".to_string(),
        })
        .await
        .unwrap();

    create_item(&h, "napkins", 1).await;
    h.items
        .create(ItemInput {
            category: Some(dairy.id),
            ..item_input("Whole Milk", 1)
        })
        .await
        .unwrap();
    h.items
        .create(ItemInput {
            category: Some(dairy.id),
            ..item_input("cream", 1)
        })
        .await
        .unwrap();
    h.items
        .create(ItemInput {
            sku: Some("A-100".to_string()),
            ..item_input("Muffin", 1)
        })
        .await
        .unwrap();

    let names: Vec<String> = h
        .items
        .list(&ItemFilter::All)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.item.name)
        .collect();
    assert_eq!(names, vec!["Muffin", "cream", "Whole Milk", "napkins"]);

    let in_dairy = h
        .items
        .list(&ItemFilter::Category("Dairy".to_string()))
        .await
        .unwrap();
    assert_eq!(in_dairy.len(), 2);
    assert!(in_dairy
        .iter()
        .all(|s| s.category_name.as_deref() == Some("Dairy")));
}

#[tokio::test]
async fn test_list_unknown_category_is_not_found() {
    let h = harness();
    let err = h
        .items
        .list(&ItemFilter::Category("Pastries".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_detail_reports_quantity_on_order() {
    let h = harness();
    let item = create_item(&h, "Beans", 4).await;
    for (quantity, submit_type) in [(5, SubmitType::Submit), (3, SubmitType::Submit), (9, SubmitType::Save)] {
        h.orders
            .create(OrderInput {
                items: lines(&[(item.id, quantity)]),
                submit_type,
            })
            .await
            .unwrap();
    }

    let detail = h.items.detail(item.id).await.unwrap();
    assert_eq!(detail.on_order, 8);
    assert!(detail.category.is_none());
}
