//! Checkout, cancellation and sale numbering.

mod common;

use common::Chain;
use tally_core::{
    CoreError, CreateSaleItem, MovementFilter, MovementType, SaleFilter, SaleStatus,
    MAX_SALE_ITEMS,
};
use tally_db::DbError;

#[tokio::test]
async fn test_two_line_sale_completes_with_one_movement_per_line() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 10).await;
    chain.receive(&chain.product_b, &chain.store1, 5).await;

    let request = chain.checkout(
        &chain.store1,
        &[(chain.product_a.as_str(), 3), (chain.product_b.as_str(), 2)],
    );
    let detail = chain.db.sales().create(&request, &chain.user).await.unwrap();

    assert_eq!(detail.sale.status, SaleStatus::Completed);
    assert!(detail.sale.completed_at.is_some());
    assert_eq!(detail.sale.subtotal_cents, 5000);
    assert_eq!(detail.sale.total_cents, 5000);
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].product_id, chain.product_a);
    assert_eq!(detail.items[0].product_sku.as_deref(), Some("A-001"));
    assert_eq!(detail.items[1].product_name.as_deref(), Some("Product B"));
    assert_eq!(detail.location_name.as_deref(), Some("Store 1"));
    assert_eq!(detail.cashier_name.as_deref(), Some("Jordan Smith"));

    assert_eq!(chain.levels(&chain.product_a, &chain.store1).await, (7, 0));
    assert_eq!(chain.levels(&chain.product_b, &chain.store1).await, (3, 0));

    let movements = chain
        .db
        .movements()
        .list(&MovementFilter {
            sale_id: Some(detail.sale.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    for movement in &movements {
        assert_eq!(movement.movement_type, MovementType::Sale);
        assert_eq!(movement.from_location_id.as_deref(), Some(chain.store1.as_str()));
        assert_eq!(movement.to_location_id, None);
        assert_eq!(movement.performed_by, chain.user);
    }
}

#[tokio::test]
async fn test_failing_line_rolls_back_the_whole_sale() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 10).await;
    chain.receive(&chain.product_b, &chain.store1, 1).await;
    let movements_before = chain
        .db
        .movements()
        .list(&MovementFilter::default())
        .await
        .unwrap()
        .len();

    let request = chain.checkout(
        &chain.store1,
        &[(chain.product_a.as_str(), 3), (chain.product_b.as_str(), 2)],
    );
    let err = chain.db.sales().create(&request, &chain.user).await.unwrap_err();

    match err {
        DbError::Core(CoreError::InsufficientStock {
            product_id,
            available,
            requested,
            ..
        }) => {
            assert_eq!(product_id, chain.product_b);
            assert_eq!((available, requested), (1, 2));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // the first line's reservation did not survive
    assert_eq!(chain.levels(&chain.product_a, &chain.store1).await, (10, 0));
    assert_eq!(chain.levels(&chain.product_b, &chain.store1).await, (1, 0));

    let listing = chain.db.sales().list(&SaleFilter::default()).await.unwrap();
    assert_eq!(listing.total, 0);
    assert!(listing.data.is_empty());

    let movements_after = chain
        .db
        .movements()
        .list(&MovementFilter::default())
        .await
        .unwrap()
        .len();
    assert_eq!(movements_after, movements_before);
}

#[tokio::test]
async fn test_sale_numbers_are_daily_and_sequential() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 10).await;

    let request = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 1)]);
    let first = chain.db.sales().create(&request, &chain.user).await.unwrap();
    let second = chain.db.sales().create(&request, &chain.user).await.unwrap();

    let day = first.sale.created_at.format("%Y%m%d").to_string();
    assert_eq!(first.sale.sale_number, format!("SALE-{day}-0001"));
    assert_eq!(second.sale.sale_number, format!("SALE-{day}-0002"));
}

#[tokio::test]
async fn test_failed_checkout_does_not_consume_a_number() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 1).await;

    let too_many = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 5)]);
    chain.db.sales().create(&too_many, &chain.user).await.unwrap_err();

    let ok = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 1)]);
    let sale = chain.db.sales().create(&ok, &chain.user).await.unwrap();
    assert!(sale.sale.sale_number.ends_with("-0001"));
}

#[tokio::test]
async fn test_completed_sale_cannot_be_cancelled_or_completed_again() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 5).await;

    let request = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 2)]);
    let sale = chain.db.sales().create(&request, &chain.user).await.unwrap();

    let err = chain.db.sales().cancel(&sale.sale.id).await.unwrap_err();
    match err {
        DbError::Core(CoreError::InvalidSaleStatus {
            current_status,
            operation,
            ..
        }) => {
            assert_eq!(current_status, "completed");
            assert_eq!(operation, "cancel");
        }
        other => panic!("expected InvalidSaleStatus, got {other:?}"),
    }

    let err = chain
        .db
        .sales()
        .complete_sale(&sale.sale.id, &chain.user)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::InvalidSaleStatus { .. })
    ));

    // stock untouched by the rejected transitions
    assert_eq!(chain.levels(&chain.product_a, &chain.store1).await, (3, 0));
}

#[tokio::test]
async fn test_discounts_beyond_the_subtotal_keep_a_negative_total() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 5).await;

    let mut request = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 1)]);
    request.items[0].discount_cents = 1500;

    let sale = chain.db.sales().create(&request, &chain.user).await.unwrap();
    assert_eq!(sale.sale.subtotal_cents, 1000);
    assert_eq!(sale.sale.discount_cents, 1500);
    assert_eq!(sale.sale.total_cents, -500);
    assert_eq!(sale.items[0].total_price_cents, -500);

    let loaded = chain.db.sales().get(&sale.sale.id).await.unwrap();
    assert_eq!(loaded.sale.total_cents, -500);
}

#[tokio::test]
async fn test_oversized_and_empty_sales_are_rejected() {
    let chain = Chain::in_memory().await;

    let mut request = chain.checkout(&chain.store1, &[]);
    let err = chain.db.sales().create(&request, &chain.user).await.unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

    request.items = (0..=MAX_SALE_ITEMS)
        .map(|_| CreateSaleItem {
            product_id: chain.product_a.clone(),
            quantity: 1,
            unit_price_cents: 100,
            discount_cents: 0,
            is_gift: false,
        })
        .collect();
    let err = chain.db.sales().create(&request, &chain.user).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::SaleTooLarge { max }) if max == MAX_SALE_ITEMS
    ));
}

#[tokio::test]
async fn test_get_unknown_sale_is_not_found() {
    let chain = Chain::in_memory().await;
    let err = chain.db.sales().get("missing").await.unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::SaleNotFound(_))));
}

#[tokio::test]
async fn test_list_filters_and_counts() {
    let chain = Chain::in_memory().await;
    chain.receive(&chain.product_a, &chain.store1, 10).await;
    chain.receive(&chain.product_a, &chain.store2, 10).await;

    let at_store1 = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 1)]);
    let at_store2 = chain.checkout(&chain.store2, &[(chain.product_a.as_str(), 1)]);
    for _ in 0..3 {
        chain.db.sales().create(&at_store1, &chain.user).await.unwrap();
    }
    let last = chain.db.sales().create(&at_store2, &chain.user).await.unwrap();

    let all = chain.db.sales().list(&SaleFilter::default()).await.unwrap();
    assert_eq!(all.total, 4);
    assert_eq!(all.data[0].id, last.sale.id);

    let store1 = chain
        .db
        .sales()
        .list(&SaleFilter {
            location_id: Some(chain.store1.clone()),
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(store1.total, 3);
    assert_eq!(store1.data.len(), 2);

    let by_cashier = chain
        .db
        .sales()
        .list(&SaleFilter {
            cashier_id: Some("someone-else".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_cashier.total, 0);

    let since_last = chain
        .db
        .sales()
        .list(&SaleFilter {
            start_date: Some(last.sale.created_at),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(since_last.data.iter().any(|s| s.id == last.sale.id));
}
