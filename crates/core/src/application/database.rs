// Database Context - Operation queue and lazy backend lifecycle
//
// Every query/execute checks one readiness flag. Before the backend is
// ready, calls are parked in a FIFO queue with a one-shot reply and a
// single memoized initialization is started. The queue is drained by that
// initialization, strictly in submission order, and the context is only
// marked ready once the queue is observed empty under the lock.

use crate::application::repository::{
    CartRepository, MapPostRepository, ProductRepository, QrCodeRepository, SalesRepository,
    ScanHistoryRepository, SettingsRepository,
};
use crate::application::{migration, schema};
use crate::domain::setting::MIGRATED_V1;
use crate::error::{Result, StoreError};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{Backend, BackendFactory, BackendKind, IdProvider, LegacySource, Row, SqlValue, TimeProvider};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Memoized initialization attempt shared by every waiter
type InitFuture = Shared<BoxFuture<'static, std::result::Result<(), String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Query,
    Execute,
}

enum OpOutput {
    Rows(Vec<Row>),
    Affected(u64),
}

/// Call parked until the backend is ready
struct PendingOp {
    kind: OpKind,
    sql: String,
    params: Vec<SqlValue>,
    reply: oneshot::Sender<Result<OpOutput>>,
}

#[derive(Default)]
struct QueueState {
    backend: Option<Arc<dyn Backend>>,
    ready: bool,
    pending: VecDeque<PendingOp>,
    init: Option<InitFuture>,
}

struct Inner {
    factory: Arc<dyn BackendFactory>,
    legacy: Option<Arc<dyn LegacySource>>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
    state: Mutex<QueueState>,
}

enum Route {
    Direct(Arc<dyn Backend>),
    Queued(oneshot::Receiver<Result<OpOutput>>),
}

/// Builder for [`Database`]
pub struct DatabaseBuilder {
    factory: Arc<dyn BackendFactory>,
    legacy: Option<Arc<dyn LegacySource>>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
}

impl DatabaseBuilder {
    /// Source of pre-SQLite documents for the one-time import
    pub fn legacy_source(mut self, legacy: Arc<dyn LegacySource>) -> Self {
        self.legacy = Some(legacy);
        self
    }

    pub fn id_provider(mut self, ids: Arc<dyn IdProvider>) -> Self {
        self.ids = ids;
        self
    }

    pub fn time_provider(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Database {
        Database {
            inner: Arc::new(Inner {
                factory: self.factory,
                legacy: self.legacy,
                ids: self.ids,
                clock: self.clock,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }
}

/// Store context, constructed once at startup and shared by cloning.
///
/// Nothing is opened on construction. The first call (or
/// [`Database::ensure_initialized`]) opens the backend, creates the schema
/// and runs the legacy import.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        Self::builder(factory).build()
    }

    pub fn builder(factory: Arc<dyn BackendFactory>) -> DatabaseBuilder {
        DatabaseBuilder {
            factory,
            legacy: None,
            ids: Arc::new(UuidProvider),
            clock: Arc::new(SystemTimeProvider::new()),
        }
    }

    /// Resolves once open, schema creation and migration have completed.
    /// Concurrent callers share one attempt; a failed attempt is retried by
    /// the next call.
    pub async fn ensure_initialized(&self) -> Result<()> {
        let init = {
            let mut state = self.inner.lock_state();
            if state.ready && state.backend.is_some() {
                return Ok(());
            }
            self.start_init(&mut state)
        };

        init.await.map_err(StoreError::BackendUnavailable)
    }

    /// Run a read statement (queued while the backend is not ready)
    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        match self.submit(OpKind::Query, sql, params).await? {
            OpOutput::Rows(rows) => Ok(rows),
            OpOutput::Affected(_) => Err(StoreError::InvalidData(
                "read statement produced an affected count".to_string(),
            )),
        }
    }

    /// Run a mutating statement and return the affected row count
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        match self.submit(OpKind::Execute, sql, params).await? {
            OpOutput::Affected(count) => Ok(count),
            OpOutput::Rows(_) => Err(StoreError::InvalidData(
                "mutating statement produced rows".to_string(),
            )),
        }
    }

    /// Close the backend. The next call re-initializes lazily.
    pub async fn close(&self) -> Result<()> {
        // Let an in-flight initialization settle so its backend is not leaked
        let in_flight = self.inner.lock_state().init.clone();
        if let Some(init) = in_flight {
            let _ = init.await;
        }

        let backend = {
            let mut state = self.inner.lock_state();
            state.ready = false;
            state.backend.take()
        };

        match backend {
            Some(backend) => {
                backend.close().await?;
                info!(backend = %backend.kind(), "Database closed");
            }
            None => debug!("Database close requested, nothing open"),
        }
        Ok(())
    }

    /// Delete every row from every entity table, re-run the schema and
    /// re-mark the migration guard so legacy data is not imported again.
    pub async fn reset(&self) -> Result<()> {
        warn!("Resetting all store data");

        for table in schema::ENTITY_TABLES {
            self.execute(&format!("DELETE FROM {}", table), &[]).await?;
        }
        for statement in schema::schema_statements() {
            self.execute(&statement, &[]).await?;
        }
        self.settings().set(MIGRATED_V1, "true").await?;

        info!("Store reset completed");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        let state = self.inner.lock_state();
        state.ready && state.backend.is_some()
    }

    /// Number of calls waiting for initialization
    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    /// Kind of the open backend, `None` before initialization
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.inner.lock_state().backend.as_ref().map(|b| b.kind())
    }

    /// Fresh record id from the configured provider
    pub fn new_id(&self) -> String {
        self.inner.ids.generate_id()
    }

    /// Current epoch milliseconds from the configured provider
    pub fn now_millis(&self) -> i64 {
        self.inner.clock.now_millis()
    }

    pub fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(self)
    }

    pub fn cart(&self) -> CartRepository<'_> {
        CartRepository::new(self)
    }

    pub fn scan_history(&self) -> ScanHistoryRepository<'_> {
        ScanHistoryRepository::new(self)
    }

    pub fn qr_codes(&self) -> QrCodeRepository<'_> {
        QrCodeRepository::new(self)
    }

    pub fn sales(&self) -> SalesRepository<'_> {
        SalesRepository::new(self)
    }

    pub fn map_posts(&self) -> MapPostRepository<'_> {
        MapPostRepository::new(self)
    }

    pub fn settings(&self) -> SettingsRepository<'_> {
        SettingsRepository::new(self)
    }

    async fn submit(&self, kind: OpKind, sql: &str, params: &[SqlValue]) -> Result<OpOutput> {
        let route = {
            let mut state = self.inner.lock_state();
            let ready_backend = if state.ready { state.backend.clone() } else { None };
            match ready_backend {
                Some(backend) => Route::Direct(backend),
                None => {
                    let (reply, rx) = oneshot::channel();
                    state.pending.push_back(PendingOp {
                        kind,
                        sql: sql.to_string(),
                        params: params.to_vec(),
                        reply,
                    });
                    debug!(pending = state.pending.len(), ?kind, "Statement queued until backend is ready");
                    self.start_init(&mut state);
                    Route::Queued(rx)
                }
            }
        };

        match route {
            Route::Direct(backend) => run_op(backend.as_ref(), kind, sql, params).await,
            Route::Queued(rx) => rx.await.map_err(|_| {
                StoreError::BackendUnavailable("queued statement was dropped".to_string())
            })?,
        }
    }

    /// Return the in-flight attempt, starting one if none exists.
    ///
    /// The attempt is spawned so it makes progress even when callers only
    /// wait on their reply channel.
    fn start_init(&self, state: &mut QueueState) -> InitFuture {
        if let Some(init) = &state.init {
            return init.clone();
        }

        let inner = Arc::clone(&self.inner);
        let init = async move { inner.initialize().await }.boxed().shared();
        state.init = Some(init.clone());
        tokio::spawn(init.clone());
        init
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn initialize(&self) -> std::result::Result<(), String> {
        info!("Initializing database backend...");

        match self.bootstrap().await {
            Ok(backend) => {
                let kind = backend.kind();
                let drained = self.drain(backend).await;
                info!(backend = %kind, drained, "Database ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Database initialization failed");
                let message = match e {
                    StoreError::BackendUnavailable(message) => message,
                    other => other.to_string(),
                };
                self.fail_pending(&message);
                Err(message)
            }
        }
    }

    /// Open, then create the schema, then run the legacy import. All of it
    /// completes before the context can be marked ready.
    async fn bootstrap(&self) -> Result<Arc<dyn Backend>> {
        let backend = self.factory.open().await?;

        if let Err(e) = schema::create_schema(backend.as_ref()).await {
            if let Err(close_err) = backend.close().await {
                warn!(error = %close_err, "Failed to close backend after schema failure");
            }
            return Err(e);
        }

        let now = self.clock.now_millis();
        if let Err(e) =
            migration::run_legacy_import(backend.as_ref(), self.legacy.as_deref(), now).await
        {
            // Guard stays unset, the import retries on the next startup
            warn!(error = %e, "Legacy import failed");
        }

        Ok(backend)
    }

    /// Replay queued calls in FIFO order. Returns the number replayed.
    async fn drain(&self, backend: Arc<dyn Backend>) -> usize {
        self.lock_state().backend = Some(Arc::clone(&backend));

        let mut drained = 0;
        loop {
            let op = {
                let mut state = self.lock_state();
                match state.pending.pop_front() {
                    Some(op) => op,
                    None => {
                        state.ready = true;
                        state.init = None;
                        break;
                    }
                }
            };

            let result = run_op(backend.as_ref(), op.kind, &op.sql, &op.params).await;
            if let Err(e) = &result {
                warn!(error = %e, sql = %op.sql, "Queued statement failed");
            }
            // Receiver may have been dropped by an uninterested caller
            let _ = op.reply.send(result);
            drained += 1;
        }

        drained
    }

    /// Reject every queued call with the same error and clear the attempt
    fn fail_pending(&self, message: &str) {
        let pending = {
            let mut state = self.lock_state();
            state.init = None;
            state.backend = None;
            state.ready = false;
            std::mem::take(&mut state.pending)
        };

        if !pending.is_empty() {
            warn!(rejected = pending.len(), "Rejecting queued statements");
        }
        for op in pending {
            let _ = op
                .reply
                .send(Err(StoreError::BackendUnavailable(message.to_string())));
        }
    }
}

async fn run_op(
    backend: &dyn Backend,
    kind: OpKind,
    sql: &str,
    params: &[SqlValue],
) -> Result<OpOutput> {
    match kind {
        OpKind::Query => backend.query(sql, params).await.map(OpOutput::Rows),
        OpKind::Execute => backend.execute(sql, params).await.map(OpOutput::Affected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::backend::mocks::{Recorded, RecordingBackend};
    use crate::port::backend::MockBackendFactory;

    fn factory_for(backend: Arc<RecordingBackend>, times: usize) -> MockBackendFactory {
        let mut factory = MockBackendFactory::new();
        factory.expect_open().times(times).returning(move || {
            let backend: Arc<dyn Backend> = backend.clone();
            Ok(backend)
        });
        factory
    }

    fn user_statements(backend: &RecordingBackend) -> Vec<String> {
        backend
            .executed()
            .into_iter()
            .filter(|sql| sql.starts_with("UPDATE t"))
            .collect()
    }

    #[tokio::test]
    async fn test_queued_calls_replay_in_fifo_order() {
        let backend = Arc::new(RecordingBackend::new());
        let db = Database::new(Arc::new(factory_for(backend.clone(), 1)));

        let (a, b, c) = tokio::join!(
            db.execute("UPDATE t SET v = 1", &[]),
            db.execute("UPDATE t SET v = 2", &[]),
            db.execute("UPDATE t SET v = 3", &[]),
        );
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (1, 1, 1));

        assert_eq!(
            user_statements(&backend),
            vec!["UPDATE t SET v = 1", "UPDATE t SET v = 2", "UPDATE t SET v = 3"]
        );
        assert!(db.is_ready());
        assert_eq!(db.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_schema_runs_before_queued_calls() {
        let backend = Arc::new(RecordingBackend::new());
        let db = Database::new(Arc::new(factory_for(backend.clone(), 1)));

        db.execute("UPDATE t SET v = 1", &[]).await.unwrap();

        let executed = backend.executed();
        let user_pos = executed.iter().position(|s| s.starts_with("UPDATE t")).unwrap();
        let guard_pos = executed
            .iter()
            .position(|s| s.contains("INSERT OR REPLACE INTO settings"))
            .unwrap();
        assert!(executed[0].starts_with("CREATE TABLE IF NOT EXISTS"));
        assert!(guard_pos < user_pos);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_initialized_opens_once() {
        let backend = Arc::new(RecordingBackend::new());
        let db = Database::new(Arc::new(factory_for(backend, 1)));

        let (first, second) = tokio::join!(db.ensure_initialized(), db.ensure_initialized());
        first.unwrap();
        second.unwrap();

        // Already ready: no further open
        db.ensure_initialized().await.unwrap();
        db.query("SELECT 1", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_entry_does_not_abort_drain() {
        let backend = Arc::new(RecordingBackend::new());
        backend.fail_statements_containing("v = 2");
        let db = Database::new(Arc::new(factory_for(backend.clone(), 1)));

        let (a, b, c) = tokio::join!(
            db.execute("UPDATE t SET v = 1", &[]),
            db.execute("UPDATE t SET v = 2", &[]),
            db.execute("UPDATE t SET v = 3", &[]),
        );

        assert!(a.is_ok());
        assert!(matches!(b, Err(StoreError::Database(_))));
        assert!(c.is_ok());
        assert_eq!(user_statements(&backend).len(), 3);
    }

    #[tokio::test]
    async fn test_open_failure_rejects_all_queued_then_retries() {
        let backend = Arc::new(RecordingBackend::new());
        let mut factory = MockBackendFactory::new();
        let mut seq = mockall::Sequence::new();
        factory
            .expect_open()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(StoreError::Database("disk unavailable".to_string())));
        let retry_backend = backend.clone();
        factory
            .expect_open()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || {
                let backend: Arc<dyn Backend> = retry_backend.clone();
                Ok(backend)
            });
        let db = Database::new(Arc::new(factory));

        let (a, b) = tokio::join!(
            db.execute("UPDATE t SET v = 1", &[]),
            db.query("SELECT 1", &[]),
        );
        assert!(matches!(a, Err(StoreError::BackendUnavailable(ref m)) if m.contains("disk unavailable")));
        assert!(matches!(b, Err(StoreError::BackendUnavailable(_))));
        assert!(!db.is_ready());

        // A fresh call starts a fresh attempt
        db.execute("UPDATE t SET v = 4", &[]).await.unwrap();
        assert!(db.is_ready());
        assert_eq!(user_statements(&backend), vec!["UPDATE t SET v = 4"]);
    }

    #[tokio::test]
    async fn test_schema_failure_is_backend_unavailable() {
        let backend = Arc::new(RecordingBackend::new());
        backend.fail_statements_containing("CREATE TABLE IF NOT EXISTS products");
        let db = Database::new(Arc::new(factory_for(backend.clone(), 1)));

        let result = db.ensure_initialized().await;

        assert!(matches!(result, Err(StoreError::BackendUnavailable(_))));
        assert!(backend.is_closed());
    }

    #[tokio::test]
    async fn test_close_returns_to_not_ready_and_reopens_lazily() {
        let backend = Arc::new(RecordingBackend::new());
        let db = Database::new(Arc::new(factory_for(backend.clone(), 2)));

        db.ensure_initialized().await.unwrap();
        db.close().await.unwrap();
        assert!(!db.is_ready());
        assert!(backend.calls().contains(&Recorded::Close));

        db.query("SELECT 1", &[]).await.unwrap();
        assert!(db.is_ready());
    }

    #[tokio::test]
    async fn test_reset_marks_migration_guard() {
        let backend = Arc::new(RecordingBackend::new());
        let db = Database::new(Arc::new(factory_for(backend.clone(), 1)));

        db.reset().await.unwrap();

        let executed = backend.executed();
        for table in schema::ENTITY_TABLES {
            assert!(executed.contains(&format!("DELETE FROM {}", table)));
        }
        assert!(executed
            .last()
            .unwrap()
            .contains("INSERT INTO settings"));
    }
}
