//! Operation queue behavior against the real SQLite backends
//!
//! Calls made before initialization are buffered, replayed in order and
//! rejected together when the backend cannot be opened.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use qrmaster_core::domain::{Product, ScanHistoryEntry, ScanKind};
use qrmaster_core::port::durable_store::mocks::MemoryDurableStore;
use qrmaster_core::port::{Backend, BackendFactory};
use qrmaster_core::{params, Database, StoreError};
use qrmaster_infra_sqlite::SqliteBackendFactory;

/// Counts opens and fails the first `failures` of them
struct CountingFactory {
    inner: SqliteBackendFactory,
    opens: AtomicUsize,
    failures: usize,
}

impl CountingFactory {
    fn new(failures: usize) -> Self {
        Self {
            inner: SqliteBackendFactory::memory_image(Arc::new(MemoryDurableStore::new()), "image"),
            opens: AtomicUsize::new(0),
            failures,
        }
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendFactory for CountingFactory {
    async fn open(&self) -> qrmaster_core::Result<Arc<dyn Backend>> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(StoreError::BackendUnavailable("engine not loaded".to_string()));
        }
        self.inner.open().await
    }
}

#[tokio::test]
async fn test_calls_before_init_replay_in_order() {
    let factory = Arc::new(CountingFactory::new(0));
    let db = Database::new(factory.clone());

    let insert_params = params!["theme", "dark"];
    let update_params = params!["light", "theme"];
    let read_params = params!["theme"];

    // Submitted back to back before anything is open
    let insert = db.execute(
        "INSERT INTO settings (key, value) VALUES (?, ?)",
        &insert_params,
    );
    let update = db.execute("UPDATE settings SET value = ? WHERE key = ?", &update_params);
    let read = db.query("SELECT value FROM settings WHERE key = ?", &read_params);

    let (inserted, updated, rows) = tokio::join!(insert, update, read);

    assert_eq!(inserted.unwrap(), 1);
    assert_eq!(updated.unwrap(), 1);
    let rows = rows.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text("value").unwrap(), "light");
    assert!(db.is_ready());
    assert_eq!(db.pending_len(), 0);
    assert_eq!(factory.opens(), 1);
}

#[tokio::test]
async fn test_concurrent_initialization_opens_once() {
    let factory = Arc::new(CountingFactory::new(0));
    let db = Database::new(factory.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move { db.ensure_initialized().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Already ready: no further open
    db.ensure_initialized().await.unwrap();
    assert_eq!(factory.opens(), 1);
}

#[tokio::test]
async fn test_failed_open_rejects_queue_then_retries() {
    let factory = Arc::new(CountingFactory::new(1));
    let db = Database::new(factory.clone());

    let products = db.products();
    let history = db.scan_history();
    let (first, second) = tokio::join!(products.list(), history.list(None));

    // Both queued calls see the same initialization error
    let first = first.unwrap_err();
    let second = second.unwrap_err();
    assert!(first.is_backend_unavailable());
    assert_eq!(first.to_string(), second.to_string());
    assert!(!db.is_ready());
    assert_eq!(db.pending_len(), 0);

    // The next call starts a fresh attempt
    let entry = ScanHistoryEntry {
        id: "s1".to_string(),
        content: "https://example.com".to_string(),
        kind: ScanKind::Url,
        timestamp: 1_000,
    };
    db.scan_history().add(&entry).await.unwrap();

    assert_eq!(db.scan_history().list(None).await.unwrap(), vec![entry]);
    assert_eq!(factory.opens(), 2);
}

#[tokio::test]
async fn test_failing_queued_statement_does_not_stop_drain() {
    let db = Database::new(Arc::new(CountingFactory::new(0)));

    let product = Product::new("p1", "Tea", 2.5, "111", "Drinks", 10, 0);
    let duplicate = Product::new("p2", "Other Tea", 3.0, "111", "Drinks", 4, 0);
    let unrelated = Product::new("p3", "Cake", 4.0, "222", "Food", 1, 0);

    let products = db.products();
    let (a, b, c) = tokio::join!(
        products.add(&product),
        products.add(&duplicate),
        products.add(&unrelated)
    );

    assert!(a.is_ok());
    assert!(b.unwrap_err().is_constraint_violation());
    assert!(c.is_ok());

    let names: Vec<String> = db
        .products()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Cake".to_string(), "Tea".to_string()]);
}

#[tokio::test]
async fn test_close_then_lazy_reopen() {
    let factory = Arc::new(CountingFactory::new(0));
    let db = Database::new(factory.clone());

    db.settings().set("currency", "EUR").await.unwrap();
    db.close().await.unwrap();
    assert!(!db.is_ready());

    // Reopened from the saved image
    assert_eq!(
        db.settings().get("currency").await.unwrap(),
        Some("EUR".to_string())
    );
    assert_eq!(factory.opens(), 2);
}
