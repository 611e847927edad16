// Schema Manager
//
// Runs directly against an opened backend handle, before the owning
// Database is marked ready.

use crate::error::Result;
use crate::port::Backend;
use tracing::{debug, info};

const INITIAL_SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Entity tables, in the order `reset` empties them
pub const ENTITY_TABLES: [&str; 7] = [
    "products",
    "cart",
    "scan_history",
    "sales",
    "qrcodes",
    "map_posts",
    "settings",
];

/// Ordered, comment-free statements of the embedded schema
pub fn schema_statements() -> Vec<String> {
    split_statements(INITIAL_SCHEMA)
}

/// Create every table and index if not present. Safe on every startup.
pub async fn create_schema(backend: &dyn Backend) -> Result<()> {
    info!(backend = %backend.kind(), "Ensuring schema...");

    let statements = schema_statements();
    for statement in &statements {
        backend.execute(statement, &[]).await?;
    }

    debug!(statements = statements.len(), "Schema statements applied");
    Ok(())
}

fn split_statements(sql: &str) -> Vec<String> {
    // Comments go first so a ';' inside one never ends a statement
    let code = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .map(|statement| statement.trim().to_string())
        .filter(|statement| !statement.is_empty())
        .collect()
}
