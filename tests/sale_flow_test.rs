mod common;

use common::TestApp;
use partshub_api::{
    entities::sale::SaleStatus,
    errors::ServiceError,
    services::sales::{CreateSaleInput, SaleItemInput},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn sale_input(store_id: i32, items: Vec<SaleItemInput>, discount: Decimal) -> CreateSaleInput {
    CreateSaleInput {
        store_id,
        seller: "ana".to_string(),
        client: "oficina do zé".to_string(),
        items,
        discount,
    }
}

fn item(part_id: Uuid, quantity: i64, unit_price: Decimal) -> SaleItemInput {
    SaleItemInput {
        part_id,
        name: "item".to_string(),
        quantity,
        unit_price,
    }
}

#[tokio::test]
async fn finalized_sale_debits_exactly_the_item_quantities() {
    let app = TestApp::new().await;
    let disc = app.seed_part("brake-disc", &[(1, 10)]).await;
    let pads = app.seed_part("brake-pads", &[(1, 6)]).await;

    let sale_id = app
        .services()
        .sales
        .create_sale(sale_input(
            1,
            vec![item(disc, 2, dec!(150.00)), item(pads, 3, dec!(40.00))],
            dec!(20.00),
        ))
        .await
        .unwrap();

    // Creation is a hold: nothing debited yet.
    assert_eq!(app.quantity_at(disc, 1).await, Some(10));
    assert_eq!(app.quantity_at(pads, 1).await, Some(6));

    let created = app.services().sales.get_sale(sale_id).await.unwrap();
    assert_eq!(created.sale.status, SaleStatus::Pending);
    assert_eq!(created.sale.subtotal, dec!(420.00));
    assert_eq!(created.sale.total, dec!(400.00));
    assert_eq!(created.sale.payment_method, None);

    let finalized = app
        .services()
        .sales
        .finalize_sale(sale_id, "pix".to_string())
        .await
        .unwrap();
    assert_eq!(finalized.status, SaleStatus::Finalized);
    assert_eq!(finalized.payment_method.as_deref(), Some("pix"));
    assert!(finalized.finalized_at.is_some());

    assert_eq!(app.quantity_at(disc, 1).await, Some(8));
    assert_eq!(app.quantity_at(pads, 1).await, Some(3));
}

// Two concurrent finalizations of the same sale: the conditional status
// flip lets exactly one through, so the items are debited exactly once and
// the loser sees the sale as already settled.
#[tokio::test]
async fn racing_finalizations_debit_once() {
    let app = TestApp::with_pool_size(5).await;
    let part = app.seed_part("cv-joint", &[(1, 10)]).await;

    let sale_id = app
        .services()
        .sales
        .create_sale(sale_input(1, vec![item(part, 4, dec!(120.00))], dec!(0)))
        .await
        .unwrap();

    let sales_a = app.services().sales.clone();
    let sales_b = app.services().sales.clone();
    let task_a = tokio::spawn(async move { sales_a.finalize_sale(sale_id, "pix".to_string()).await });
    let task_b = tokio::spawn(async move { sales_b.finalize_sale(sale_id, "card".to_string()).await });

    let results = [task_a.await.unwrap(), task_b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one finalization may succeed");

    let loss = results.into_iter().find(|r| r.is_err()).unwrap().unwrap_err();
    assert!(matches!(loss, ServiceError::AlreadyFinalized(id) if id == sale_id));

    assert_eq!(app.quantity_at(part, 1).await, Some(6));
}

// The money columns hold four decimal places through storage and back.
#[tokio::test]
async fn fractional_prices_survive_the_round_trip() {
    let app = TestApp::new().await;
    let part = app.seed_part("o-ring", &[(1, 20)]).await;

    let sale_id = app
        .services()
        .sales
        .create_sale(sale_input(
            1,
            vec![item(part, 3, dec!(12.25))],
            dec!(0.75),
        ))
        .await
        .unwrap();

    let sale = app.services().sales.get_sale(sale_id).await.unwrap();
    assert_eq!(sale.sale.subtotal, dec!(36.75));
    assert_eq!(sale.sale.discount, dec!(0.75));
    assert_eq!(sale.sale.total, dec!(36.00));
    assert_eq!(sale.items[0].unit_price, dec!(12.25));
}

#[tokio::test]
async fn finalizing_twice_fails_and_never_debits_again() {
    let app = TestApp::new().await;
    let part = app.seed_part("clutch-kit", &[(2, 5)]).await;

    let sale_id = app
        .services()
        .sales
        .create_sale(sale_input(2, vec![item(part, 1, dec!(800.00))], dec!(0)))
        .await
        .unwrap();

    app.services()
        .sales
        .finalize_sale(sale_id, "card".to_string())
        .await
        .unwrap();
    assert_eq!(app.quantity_at(part, 2).await, Some(4));

    for _ in 0..3 {
        let err = app
            .services()
            .sales
            .finalize_sale(sale_id, "card".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyFinalized(id) if id == sale_id));
    }
    assert_eq!(app.quantity_at(part, 2).await, Some(4));
}

#[tokio::test]
async fn failed_debit_rolls_back_the_whole_finalization() {
    let app = TestApp::new().await;
    let plentiful = app.seed_part("filter", &[(1, 100)]).await;
    let scarce = app.seed_part("turbo", &[(1, 1)]).await;

    let sale_id = app
        .services()
        .sales
        .create_sale(sale_input(
            1,
            vec![item(plentiful, 5, dec!(30.00)), item(scarce, 2, dec!(2500.00))],
            dec!(0),
        ))
        .await
        .unwrap();

    let err = app
        .services()
        .sales
        .finalize_sale(sale_id, "cash".to_string())
        .await
        .unwrap_err();

    match err {
        ServiceError::StockDebitFailed { part_id, cause } => {
            assert_eq!(part_id, scarce);
            assert!(matches!(
                *cause,
                ServiceError::InsufficientStock { available: 1, .. }
            ));
        }
        other => panic!("expected StockDebitFailed, got {:?}", other),
    }

    // The first item's debit was rolled back with the transaction; the sale
    // stays pending.
    assert_eq!(app.quantity_at(plentiful, 1).await, Some(100));
    assert_eq!(app.quantity_at(scarce, 1).await, Some(1));
    let sale = app.services().sales.get_sale(sale_id).await.unwrap();
    assert_eq!(sale.sale.status, SaleStatus::Pending);
}

#[tokio::test]
async fn debit_targets_the_sale_store_only() {
    let app = TestApp::new().await;
    let part = app.seed_part("battery", &[(1, 4), (2, 9)]).await;

    let sale_id = app
        .services()
        .sales
        .create_sale(sale_input(2, vec![item(part, 4, dec!(350.00))], dec!(0)))
        .await
        .unwrap();
    app.services()
        .sales
        .finalize_sale(sale_id, "pix".to_string())
        .await
        .unwrap();

    assert_eq!(app.quantity_at(part, 1).await, Some(4));
    assert_eq!(app.quantity_at(part, 2).await, Some(5));
}

#[tokio::test]
async fn create_sale_rejects_bad_input() {
    let app = TestApp::new().await;
    let part = app.seed_part("hose", &[(1, 5)]).await;

    let err = app
        .services()
        .sales
        .create_sale(sale_input(1, vec![], dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .services()
        .sales
        .create_sale(sale_input(1, vec![item(part, 0, dec!(10.00))], dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Discount beyond the subtotal.
    let err = app
        .services()
        .sales
        .create_sale(sale_input(1, vec![item(part, 1, dec!(10.00))], dec!(11.00)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn finalize_missing_sale_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .services()
        .sales
        .finalize_sale(Uuid::new_v4(), "pix".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn pending_feed_is_per_store_and_excludes_finalized() {
    let app = TestApp::new().await;
    let part = app.seed_part("mirror", &[(1, 50), (2, 50)]).await;

    let s1 = app
        .services()
        .sales
        .create_sale(sale_input(1, vec![item(part, 1, dec!(80.00))], dec!(0)))
        .await
        .unwrap();
    let s2 = app
        .services()
        .sales
        .create_sale(sale_input(1, vec![item(part, 2, dec!(80.00))], dec!(0)))
        .await
        .unwrap();
    let other_store = app
        .services()
        .sales
        .create_sale(sale_input(2, vec![item(part, 1, dec!(80.00))], dec!(0)))
        .await
        .unwrap();

    app.services()
        .sales
        .finalize_sale(s1, "cash".to_string())
        .await
        .unwrap();

    let pending = app.services().sales.list_pending_sales(1).await.unwrap();
    let ids: Vec<_> = pending.iter().map(|s| s.sale.id).collect();
    assert_eq!(ids, vec![s2]);
    assert!(!ids.contains(&other_store));
    assert_eq!(pending[0].items.len(), 1);
}
