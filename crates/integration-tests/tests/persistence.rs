//! Durability of both backends across process-like restarts

use std::sync::Arc;

use qrmaster_core::domain::{
    CartLine, MapPost, PaymentMethod, PostPayload, Product, QrCodeRecord, Sale, ScanHistoryEntry,
    ScanKind,
};
use qrmaster_core::port::durable_store::mocks::MemoryDurableStore;
use qrmaster_core::port::{BackendKind, DurableStore};
use qrmaster_core::Database;
use qrmaster_infra_sqlite::{NativeConnections, SqliteBackendFactory};
use qrmaster_infra_storage::FileDurableStore;

fn memory_db(store: Arc<dyn DurableStore>) -> Database {
    Database::new(Arc::new(SqliteBackendFactory::memory_image(store, "qrmaster.image")))
}

fn cake() -> Product {
    Product::new("p1", "Cheesecake", 4.25, "222", "Bakery", 6, 1_000)
}

#[tokio::test]
async fn test_memory_image_survives_restart() {
    let store = Arc::new(MemoryDurableStore::new());

    {
        let db = memory_db(store.clone());
        db.products().add(&cake()).await.unwrap();
        db.settings().set("currency", "EUR").await.unwrap();
        assert_eq!(db.backend_kind(), Some(BackendKind::MemoryImage));
        db.close().await.unwrap();
    }
    assert!(store.get("qrmaster.image").is_some());

    let db = memory_db(store.clone());
    assert_eq!(db.products().list().await.unwrap(), vec![cake()]);
    assert_eq!(
        db.settings().get("currency").await.unwrap(),
        Some("EUR".to_string())
    );

    // Unique index came back with the image
    let clash = Product::new("p2", "Copy", 1.0, "222", "Bakery", 1, 0);
    assert!(db
        .products()
        .add(&clash)
        .await
        .unwrap_err()
        .is_constraint_violation());
}

#[tokio::test]
async fn test_failed_durable_write_keeps_engine_consistent() {
    let store = Arc::new(MemoryDurableStore::new());
    store.set_fail_saves(true);

    let db = memory_db(store.clone());
    db.products().add(&cake()).await.unwrap();

    // The write is visible in memory even though it was never persisted
    assert_eq!(db.products().list().await.unwrap(), vec![cake()]);
    assert_eq!(store.save_count(), 0);
    assert!(store.get("qrmaster.image").is_none());

    // Store recovers: the next image carries the earlier write as well
    store.set_fail_saves(false);
    let tart = Product::new("p2", "Lemon Tart", 3.75, "333", "Bakery", 2, 2_000);
    db.products().add(&tart).await.unwrap();
    db.close().await.unwrap();
    assert!(store.save_count() >= 1);
    assert!(store.get("qrmaster.image").is_some());

    let reopened = memory_db(store);
    let ids: Vec<String> = reopened
        .products()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"p1".to_string()));
    assert!(ids.contains(&"p2".to_string()));
}

#[tokio::test]
async fn test_every_table_survives_restart() {
    let store = Arc::new(MemoryDurableStore::new());

    let db = memory_db(store.clone());
    let product = cake();
    db.products().add(&product).await.unwrap();
    db.cart()
        .add(&CartLine::from_product(&product, 2))
        .await
        .unwrap();
    db.scan_history()
        .add(&ScanHistoryEntry {
            id: "s1".to_string(),
            content: "https://example.com".to_string(),
            kind: ScanKind::Url,
            timestamp: 1_500,
        })
        .await
        .unwrap();
    db.qr_codes()
        .add(&QrCodeRecord {
            id: "q1".to_string(),
            content: "WIFI:S:shop;;".to_string(),
            kind: "wifi".to_string(),
            timestamp: 1_600,
            image: Some("data:image/png;base64,AAAA".to_string()),
        })
        .await
        .unwrap();

    let lines = db.cart().list().await.unwrap();
    let sale = Sale::checkout("sale-1", &lines, PaymentMethod::Cash, Some(10.0), 1_700).unwrap();
    db.sales().add(&sale).await.unwrap();

    db.map_posts()
        .add(&MapPost {
            id: "m1".to_string(),
            payload: PostPayload::Qr {
                qr_code: "https://example.com".to_string(),
                qr_type: "url".to_string(),
            },
            caption: "Menu".to_string(),
            latitude: 48.8566,
            longitude: 2.3522,
            timestamp: 1_800,
            user_name: "sam".to_string(),
        })
        .await
        .unwrap();
    db.settings().set("currency", "EUR").await.unwrap();

    let products = db.products().list().await.unwrap();
    let cart = db.cart().list().await.unwrap();
    let scans = db.scan_history().list(None).await.unwrap();
    let codes = db.qr_codes().list(None).await.unwrap();
    let sales = db.sales().list(100).await.unwrap();
    let posts = db.map_posts().list().await.unwrap();
    let settings = db.settings().all().await.unwrap();
    db.close().await.unwrap();

    assert_eq!(sales, vec![sale]);
    assert_eq!(sales[0].change, Some(1.5));

    let db = memory_db(store);
    assert_eq!(db.products().list().await.unwrap(), products);
    assert_eq!(db.cart().list().await.unwrap(), cart);
    assert_eq!(db.scan_history().list(None).await.unwrap(), scans);
    assert_eq!(db.qr_codes().list(None).await.unwrap(), codes);
    assert_eq!(db.sales().list(100).await.unwrap(), sales);
    assert_eq!(db.map_posts().list().await.unwrap(), posts);
    assert_eq!(db.settings().all().await.unwrap(), settings);
    assert!(!settings.is_empty());
}

#[tokio::test]
async fn test_corrupt_image_starts_fresh() {
    let store = Arc::new(MemoryDurableStore::with_blob(
        "qrmaster.image",
        b"definitely not sqlite".to_vec(),
    ));

    let db = memory_db(store);
    assert!(db.products().list().await.unwrap().is_empty());
    db.products().add(&cake()).await.unwrap();
}

#[tokio::test]
async fn test_file_durable_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store: Arc<dyn DurableStore> = Arc::new(FileDurableStore::new(dir.path()));
        let db = memory_db(store);
        db.products().add(&cake()).await.unwrap();
        db.close().await.unwrap();
    }

    let store: Arc<dyn DurableStore> = Arc::new(FileDurableStore::new(dir.path()));
    let db = memory_db(store);
    assert_eq!(db.products().list().await.unwrap(), vec![cake()]);
}

#[tokio::test]
async fn test_native_database_reopens_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let native = |dir: &std::path::Path| {
        Database::new(Arc::new(SqliteBackendFactory::native(
            NativeConnections::new(dir),
            "qrmaster.db",
            1,
        )))
    };

    {
        let db = native(dir.path());
        db.products().add(&cake()).await.unwrap();
        assert_eq!(db.backend_kind(), Some(BackendKind::Native));

        // Close and lazily reopen through the same registry
        db.close().await.unwrap();
        assert_eq!(db.products().list().await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    assert!(dir.path().join("qrmaster.db").exists());

    let db = native(dir.path());
    assert_eq!(db.products().list().await.unwrap(), vec![cake()]);
    db.close().await.unwrap();
}
