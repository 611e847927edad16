// sqlx -> StoreError mapping

use qrmaster_core::error::StoreError;

/// Convert sqlx::Error to StoreError, keeping unique-key violations
/// distinguishable from every other engine failure
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite extended result codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE / PRIMARY KEY constraint failed
                        StoreError::ConstraintViolation(db_err.message().to_string())
                    }
                    "5" => StoreError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => StoreError::Database(format!("Database full: {}", db_err.message())),
                    _ => StoreError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                StoreError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::ColumnNotFound(col) => {
            StoreError::InvalidData(format!("Column not found: {}", col))
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::BackendUnavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}
