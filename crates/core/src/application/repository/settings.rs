// Settings Repository (generic key/value, also holds internal flags)

use crate::application::Database;
use crate::domain::SettingEntry;
use crate::error::Result;
use crate::params;

pub struct SettingsRepository<'a> {
    db: &'a Database,
}

impl<'a> SettingsRepository<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let rows = self
            .db
            .query("SELECT value FROM settings WHERE key = ?", &params![key])
            .await?;
        rows.first().map(|row| row.text("value")).transpose()
    }

    /// Insert or overwrite
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                r#"
                INSERT INTO settings (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                &params![key, value],
            )
            .await?;
        Ok(())
    }

    /// Every entry ordered by key
    pub async fn all(&self) -> Result<Vec<SettingEntry>> {
        let rows = self
            .db
            .query("SELECT key, value FROM settings ORDER BY key", &[])
            .await?;
        rows.iter()
            .map(|row| {
                Ok(SettingEntry {
                    key: row.text("key")?,
                    value: row.text("value")?,
                })
            })
            .collect()
    }
}
