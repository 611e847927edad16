// SqlValue <-> sqlx conversion

use crate::error::map_sqlx_error;
use qrmaster_core::error::Result;
use qrmaster_core::port::{Row, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// Bind positional parameters in order
pub(crate) fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Real(r) => query.bind(*r),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Blob(b) => query.bind(b.as_slice()),
        };
    }
    query
}

/// Decode a row by the storage class of each value, not the declared type
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut decoded = Row::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index).map_err(map_sqlx_error)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => {
                    SqlValue::Integer(row.try_get_unchecked(index).map_err(map_sqlx_error)?)
                }
                "REAL" | "NUMERIC" => {
                    SqlValue::Real(row.try_get_unchecked(index).map_err(map_sqlx_error)?)
                }
                "BLOB" => SqlValue::Blob(row.try_get_unchecked(index).map_err(map_sqlx_error)?),
                _ => SqlValue::Text(row.try_get_unchecked(index).map_err(map_sqlx_error)?),
            }
        };
        decoded.push(column.name(), value);
    }

    Ok(decoded)
}
