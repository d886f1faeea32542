mod common;

use common::TestApp;
use partshub_api::errors::ServiceError;
use serde_json::json;

// Two racing debits of 6 against a location holding 10: exactly one may win,
// and no interleaving may leave the quantity negative.
#[tokio::test]
async fn racing_debits_never_go_negative() {
    let app = TestApp::with_pool_size(5).await;
    let part = app.seed_part("shock-absorber", &[(1, 10)]).await;

    let ledger_a = app.services().ledger.clone();
    let ledger_b = app.services().ledger.clone();
    let task_a = tokio::spawn(async move { ledger_a.debit(part, 1, 6).await });
    let task_b = tokio::spawn(async move { ledger_b.debit(part, 1, 6).await });

    let results = [task_a.await.unwrap(), task_b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one of the racing debits may succeed");

    let loss = results.into_iter().find(|r| r.is_err()).unwrap().unwrap_err();
    match loss {
        ServiceError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 4);
            assert_eq!(requested, 6);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(app.quantity_at(part, 1).await, Some(4));
}

// Twenty concurrent single-unit debits against 10 units: exactly ten land.
#[tokio::test]
async fn concurrent_unit_debits_stop_at_zero() {
    let app = TestApp::with_pool_size(5).await;
    let part = app.seed_part("wiper-blade", &[(1, 10)]).await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let ledger = app.services().ledger.clone();
        tasks.push(tokio::spawn(async move { ledger.debit(part, 1, 1).await.is_ok() }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10, "exactly 10 unit debits should succeed");
    assert_eq!(app.quantity_at(part, 1).await, Some(0));
}

#[tokio::test]
async fn credit_appends_a_location_for_a_new_store() {
    let app = TestApp::new().await;
    let part = app.seed_part("fuel-pump", &[(1, 2)]).await;

    app.services().ledger.credit(part, 7, 3).await.unwrap();
    app.services().ledger.credit(part, 7, 2).await.unwrap();

    let locations = app.services().ledger.stock_for_part(part).await.unwrap();
    assert_eq!(locations.len(), 2);
    let appended = locations.iter().find(|l| l.store_id == 7).unwrap();
    assert_eq!(appended.quantity, 5);
    assert_eq!(appended.sub_location, "received");
    assert_eq!(app.services().ledger.total_stock(part).await.unwrap(), 7);
}

#[tokio::test]
async fn debit_distinguishes_missing_location_from_shortage() {
    let app = TestApp::new().await;
    let part = app.seed_part("gasket", &[(1, 2)]).await;

    let err = app.services().ledger.debit(part, 9, 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::NoSuchLocation { store_id: 9, .. }));

    let err = app.services().ledger.debit(part, 1, 3).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InsufficientStock { available: 2, .. }
    ));
}

#[tokio::test]
async fn zero_and_negative_quantities_are_rejected() {
    let app = TestApp::new().await;
    let part = app.seed_part("bearing", &[(1, 2)]).await;

    for qty in [0, -3] {
        let err = app.services().ledger.debit(part, 1, qty).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
        let err = app.services().ledger.credit(part, 1, qty).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
    assert_eq!(app.quantity_at(part, 1).await, Some(2));
}

// Legacy dumps carry quantities as strings and occasional garbage; the total
// must treat anything malformed as zero instead of failing.
#[tokio::test]
async fn imported_legacy_quantities_are_coerced_into_the_total() {
    let app = TestApp::new().await;

    let doc = json!({
        "SKU_ID": "SKU-7781",
        "PRODUTO_NOME": "Bomba d'água",
        "MARCA": "Urba",
        "COD_FABRICANTE": "UB0482",
        "PRECO_VENDA": 189.90,
        "TAGS_IA": "bomba agua arrefecimento",
        "ESTOQUE_REDE": [
            { "loja_id": 1, "nome": "Loja 1", "qtd": "12", "local": "A3" },
            { "loja_id": 2, "nome": "Loja 2", "qtd": "doze", "local": "B1" },
            { "loja_id": 3, "nome": "Loja 3", "qtd": 5, "local": "C2" }
        ]
    });

    let part = app.services().catalog.import_part(&doc).await.unwrap();

    assert_eq!(app.services().ledger.total_stock(part).await.unwrap(), 17);
    assert_eq!(app.quantity_at(part, 1).await, Some(12));
    assert_eq!(app.quantity_at(part, 2).await, Some(0));
    assert_eq!(app.quantity_at(part, 3).await, Some(5));

    // The imported part is searchable by its AI tags, like the original
    // catalog search.
    let found = app
        .services()
        .catalog
        .search_parts("arrefecimento")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, part);
}

#[tokio::test]
async fn total_stock_of_unknown_part_is_zero() {
    let app = TestApp::new().await;
    let total = app
        .services()
        .ledger
        .total_stock(uuid::Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(total, 0);
}
