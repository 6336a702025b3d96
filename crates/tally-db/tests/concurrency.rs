//! Racing writers against a file-backed pool.
//!
//! Each test spawns its callers onto the multi-threaded runtime so they
//! contend for the SQLite write lock through separate pooled connections.

mod common;

use std::collections::HashSet;

use common::Chain;
use tally_core::{CoreError, TransferRequest, WriteOffRequest};
use tally_db::DbError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_exceed_available() {
    let chain = Chain::on_disk().await;
    chain.receive(&chain.product_a, &chain.store1, 10).await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let stock = chain.db.stock();
        let (product, location) = (chain.product_a.clone(), chain.store1.clone());
        tasks.push(tokio::spawn(async move {
            stock.reserve(&product, &location, 1).await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(DbError::Core(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 10, "exactly 10 reservations should succeed");
    assert_eq!(chain.levels(&chain.product_a, &chain.store1).await, (10, 10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crossing_transfers_and_write_offs_conserve_stock() {
    let chain = Chain::on_disk().await;
    chain.receive(&chain.product_a, &chain.store1, 20).await;
    chain.receive(&chain.product_a, &chain.store2, 20).await;

    let mut tasks = Vec::new();
    for i in 0..30 {
        let stock = chain.db.stock();
        let user = chain.user.clone();
        let product = chain.product_a.clone();
        let (from, to) = if i % 2 == 0 {
            (chain.store1.clone(), chain.store2.clone())
        } else {
            (chain.store2.clone(), chain.store1.clone())
        };

        tasks.push(tokio::spawn(async move {
            if i % 3 == 0 {
                let request = WriteOffRequest {
                    product_id: product,
                    location_id: from,
                    quantity: 1,
                    reason: "damaged".to_string(),
                };
                stock.write_off(&request, &user).await.map(|_| 1)
            } else {
                let request = TransferRequest {
                    product_id: product,
                    from_location_id: from,
                    to_location_id: to,
                    quantity: 3,
                    reason: None,
                };
                stock.transfer(&request, &user).await.map(|_| 0)
            }
        }));
    }

    let mut written_off = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(units) => written_off += units,
            Err(DbError::Core(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let (q1, r1) = chain.levels(&chain.product_a, &chain.store1).await;
    let (q2, r2) = chain.levels(&chain.product_a, &chain.store2).await;
    assert!(q1 >= 0 && q2 >= 0);
    assert_eq!((r1, r2), (0, 0));
    assert_eq!(q1 + q2, 40 - written_off);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_get_distinct_numbers() {
    let chain = Chain::on_disk().await;
    chain.receive(&chain.product_a, &chain.store1, 10).await;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let sales = chain.db.sales();
        let user = chain.user.clone();
        let request = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 1)]);
        tasks.push(tokio::spawn(async move { sales.create(&request, &user).await }));
    }

    let mut numbers = HashSet::new();
    for task in tasks {
        let detail = task.await.unwrap().unwrap();
        assert!(numbers.insert(detail.sale.sale_number));
    }

    assert_eq!(numbers.len(), 10);
    assert!(numbers.iter().any(|n| n.ends_with("-0001")));
    assert!(numbers.iter().any(|n| n.ends_with("-0010")));
    assert_eq!(chain.levels(&chain.product_a, &chain.store1).await, (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_oversubscribed_checkouts_sell_only_what_exists() {
    let chain = Chain::on_disk().await;
    chain.receive(&chain.product_a, &chain.store1, 5).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let sales = chain.db.sales();
        let user = chain.user.clone();
        let request = chain.checkout(&chain.store1, &[(chain.product_a.as_str(), 1)]);
        tasks.push(tokio::spawn(async move { sales.create(&request, &user).await }));
    }

    let mut completed = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => completed += 1,
            Err(DbError::Core(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(completed, 5);
    assert_eq!(chain.levels(&chain.product_a, &chain.store1).await, (0, 0));
}
