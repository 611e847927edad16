//! Repository behavior on an in-memory image backend

use std::sync::Arc;

use qrmaster_core::domain::setting::MIGRATED_V1;
use qrmaster_core::domain::{
    CartLine, MapPost, PaymentMethod, PostPayload, PostType, Product, ProductPatch, QrCodeRecord,
    Sale, ScanHistoryEntry, ScanKind,
};
use qrmaster_core::port::durable_store::mocks::MemoryDurableStore;
use qrmaster_core::port::id_provider::SequentialIdProvider;
use qrmaster_core::port::time_provider::FixedTimeProvider;
use qrmaster_core::{Database, StoreError};
use qrmaster_infra_sqlite::SqliteBackendFactory;

fn test_db() -> Database {
    let factory = SqliteBackendFactory::memory_image(Arc::new(MemoryDurableStore::new()), "image");
    Database::builder(Arc::new(factory))
        .id_provider(Arc::new(SequentialIdProvider::new("id")))
        .time_provider(Arc::new(FixedTimeProvider::new(1_000, 10)))
        .build()
}

fn tea() -> Product {
    let mut product = Product::new("p1", "Green Tea", 3.5, "4006381333931", "Drinks", 12, 100);
    product.description = Some("Loose leaf".to_string());
    product
}

#[tokio::test]
async fn test_duplicate_barcode_keeps_existing_row() {
    let db = test_db();
    let products = db.products();
    products.add(&tea()).await.unwrap();

    let clash = Product::new("p2", "Fake Tea", 1.0, "4006381333931", "Drinks", 1, 200);
    let err = products.add(&clash).await.unwrap_err();

    assert!(matches!(err, StoreError::ConstraintViolation(_)));
    let all = products.list().await.unwrap();
    assert_eq!(all, vec![tea()]);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let db = test_db();
    let products = db.products();
    products.add(&tea()).await.unwrap();

    let patch = ProductPatch {
        price: Some(4.0),
        stock: Some(3),
        ..Default::default()
    };
    assert_eq!(products.update("p1", patch).await.unwrap(), 1);

    let stored = products.find_by_id("p1").await.unwrap().unwrap();
    assert_eq!(stored.price, 4.0);
    assert_eq!(stored.stock, 3);
    assert_eq!(stored.name, "Green Tea");
    assert_eq!(stored.description.as_deref(), Some("Loose leaf"));

    // Missing rows are reported, not created
    let patch = ProductPatch {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };
    assert_eq!(products.update("missing", patch).await.unwrap(), 0);
    assert_eq!(products.delete("missing").await.unwrap(), 0);
}

#[tokio::test]
async fn test_product_lookup_search_and_low_stock() {
    let db = test_db();
    let products = db.products();
    products.add(&tea()).await.unwrap();
    products
        .add(&Product::new("p2", "Espresso Beans", 9.0, "111", "Coffee", 2, 100))
        .await
        .unwrap();

    let by_barcode = products.find_by_barcode("111").await.unwrap().unwrap();
    assert_eq!(by_barcode.id, "p2");
    assert!(products.find_by_barcode("999").await.unwrap().is_none());

    let hits = products.search("LEAF").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "p1");

    let low = products.low_stock(5).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, "p2");
}

#[tokio::test]
async fn test_cart_add_merges_quantities() {
    let db = test_db();
    let cart = db.cart();
    let product = tea();

    cart.add(&CartLine::from_product(&product, 2)).await.unwrap();
    cart.add(&CartLine::from_product(&product, 3)).await.unwrap();

    let lines = cart.list().await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);
    assert!((cart.total().await.unwrap() - 17.5).abs() < 1e-9);

    assert!(matches!(
        cart.set_quantity("p1", 0).await,
        Err(StoreError::Validation(_))
    ));
    assert_eq!(cart.set_quantity("p1", 1).await.unwrap(), 1);
    assert_eq!(cart.clear().await.unwrap(), 1);
    assert_eq!(cart.total().await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_sale_snapshot_survives_cart_and_catalog_changes() {
    let db = test_db();
    let product = tea();
    db.products().add(&product).await.unwrap();
    db.cart()
        .add(&CartLine::from_product(&product, 2))
        .await
        .unwrap();

    let lines = db.cart().list().await.unwrap();
    let sale = Sale::checkout(
        db.new_id(),
        &lines,
        PaymentMethod::Cash,
        Some(10.0),
        db.now_millis(),
    )
    .unwrap();
    db.sales().add(&sale).await.unwrap();

    db.cart().clear().await.unwrap();
    let patch = ProductPatch {
        price: Some(99.0),
        ..Default::default()
    };
    db.products().update("p1", patch).await.unwrap();

    let sales = db.sales().list(10).await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].items[0].price, 3.5);
    assert_eq!(sales[0].items[0].quantity, 2);
    assert_eq!(sales[0].total, 7.0);
    assert_eq!(sales[0].change, Some(3.0));
}

#[tokio::test]
async fn test_history_and_qr_codes_newest_first() {
    let db = test_db();
    let history = db.scan_history();

    for (id, ts) in [("a", 10), ("b", 30), ("c", 20)] {
        history
            .add(&ScanHistoryEntry {
                id: id.to_string(),
                content: format!("content {}", id),
                kind: ScanKind::Text,
                timestamp: ts,
            })
            .await
            .unwrap();
    }

    let ids: Vec<String> = history
        .list(Some(2))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
    assert_eq!(history.clear().await.unwrap(), 3);

    let codes = db.qr_codes();
    codes
        .add(&QrCodeRecord {
            id: "q1".to_string(),
            content: "WIFI:S:shop;;".to_string(),
            kind: "wifi".to_string(),
            timestamp: 5,
            image: None,
        })
        .await
        .unwrap();
    codes
        .add(&QrCodeRecord {
            id: "q2".to_string(),
            content: "https://example.com".to_string(),
            kind: "url".to_string(),
            timestamp: 6,
            image: Some("data:image/png;base64,AAAA".to_string()),
        })
        .await
        .unwrap();

    let wifi = codes.list_by_type("wifi").await.unwrap();
    assert_eq!(wifi.len(), 1);
    assert_eq!(wifi[0].id, "q1");
    assert_eq!(codes.list(None).await.unwrap()[0].id, "q2");
}

#[tokio::test]
async fn test_map_post_payload_matches_type() {
    let db = test_db();
    let posts = db.map_posts();

    let post = MapPost {
        id: "m1".to_string(),
        payload: PostPayload::Qr {
            qr_code: "https://example.com".to_string(),
            qr_type: "url".to_string(),
        },
        caption: "Found this".to_string(),
        latitude: 52.52,
        longitude: 13.405,
        timestamp: 1_000,
        user_name: "ana".to_string(),
    };
    posts.add(&post).await.unwrap();

    let stored = posts.list().await.unwrap();
    assert_eq!(stored, vec![post]);
    assert_eq!(stored[0].post_type(), PostType::Qr);
    assert_eq!(posts.delete("m1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_reset_empties_tables_and_keeps_guard() {
    let db = test_db();
    db.products().add(&tea()).await.unwrap();
    db.settings().set("currency", "EUR").await.unwrap();

    db.reset().await.unwrap();

    assert!(db.products().list().await.unwrap().is_empty());
    assert_eq!(db.settings().get("currency").await.unwrap(), None);
    assert_eq!(
        db.settings().get(MIGRATED_V1).await.unwrap(),
        Some("true".to_string())
    );
}
