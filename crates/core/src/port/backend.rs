// SQL Backend Port (Interface)
//
// One implementation per platform, chosen once by the factory. Repository
// code never sees which one is active.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// Dynamically typed SQL value (SQLite storage classes)
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Build a parameter list: `params![id, name, price]`
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::port::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::port::SqlValue::from($value)),+]
    };
}

/// Result row: ordered (column, value) pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push((column.into(), value));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&SqlValue> {
        self.get(column)
            .ok_or_else(|| StoreError::InvalidData(format!("Column not found: {}", column)))
    }

    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)?
            .ok_or_else(|| StoreError::InvalidData(format!("Column {} is NULL", column)))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) => Ok(Some(s.clone())),
            // Numeric values in TEXT-affinity columns come back as numbers
            SqlValue::Integer(i) => Ok(Some(i.to_string())),
            SqlValue::Real(r) => Ok(Some(r.to_string())),
            SqlValue::Blob(_) => Err(StoreError::InvalidData(format!(
                "Column {} holds a blob, expected text",
                column
            ))),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64> {
        self.opt_integer(column)?
            .ok_or_else(|| StoreError::InvalidData(format!("Column {} is NULL", column)))
    }

    pub fn opt_integer(&self, column: &str) -> Result<Option<i64>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(i) => Ok(Some(*i)),
            SqlValue::Real(r) if r.fract() == 0.0 => Ok(Some(*r as i64)),
            other => Err(StoreError::InvalidData(format!(
                "Column {} holds {:?}, expected integer",
                column, other
            ))),
        }
    }

    pub fn real(&self, column: &str) -> Result<f64> {
        self.opt_real(column)?
            .ok_or_else(|| StoreError::InvalidData(format!("Column {} is NULL", column)))
    }

    pub fn opt_real(&self, column: &str) -> Result<Option<f64>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Real(r) => Ok(Some(*r)),
            SqlValue::Integer(i) => Ok(Some(*i as f64)),
            other => Err(StoreError::InvalidData(format!(
                "Column {} holds {:?}, expected number",
                column, other
            ))),
        }
    }
}

/// Which implementation is behind a `Backend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Persistent, OS-provided connection
    Native,
    /// In-memory engine mirrored to a durable store image
    MemoryImage,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::MemoryImage => write!(f, "memory-image"),
        }
    }
}

/// Opened SQL engine handle
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Run a read statement and return all rows
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Run a mutating statement and return the affected row count
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Release the handle. Pending durable writes are flushed first.
    async fn close(&self) -> Result<()>;
}

/// Opens the platform backend; called once per successful initialization
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn Backend>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Statement seen by a `RecordingBackend`
    #[derive(Debug, Clone, PartialEq)]
    pub enum Recorded {
        Query(String),
        Execute(String),
        Close,
    }

    /// Backend that records every call in order. Queries return no rows,
    /// executes report one affected row unless the statement matches a
    /// configured failure pattern.
    #[derive(Default)]
    pub struct RecordingBackend {
        calls: Mutex<Vec<Recorded>>,
        fail_pattern: Mutex<Option<String>>,
        closed: AtomicBool,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail every statement containing `pattern`
        pub fn fail_statements_containing(&self, pattern: &str) {
            *self.fail_pattern.lock().unwrap() = Some(pattern.to_string());
        }

        pub fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }

        /// Executed statements only, in submission order
        pub fn executed(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Recorded::Execute(sql) => Some(sql),
                    _ => None,
                })
                .collect()
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        fn check(&self, sql: &str) -> Result<()> {
            match self.fail_pattern.lock().unwrap().as_deref() {
                Some(pattern) if sql.contains(pattern) => {
                    Err(StoreError::Database(format!("forced failure: {}", sql)))
                }
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::MemoryImage
        }

        async fn query(&self, sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>> {
            self.calls
                .lock()
                .unwrap()
                .push(Recorded::Query(sql.to_string()));
            self.check(sql)?;
            Ok(Vec::new())
        }

        async fn execute(&self, sql: &str, _params: &[SqlValue]) -> Result<u64> {
            self.calls
                .lock()
                .unwrap()
                .push(Recorded::Execute(sql.to_string()));
            self.check(sql)?;
            Ok(1)
        }

        async fn close(&self) -> Result<()> {
            self.calls.lock().unwrap().push(Recorded::Close);
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}
