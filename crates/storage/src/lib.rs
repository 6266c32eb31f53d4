//! Sqlite-backed persistence for client settings and resume points.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use rusqlite::{Connection, OptionalExtension as _};
use shelfdeck_core::{ResumeKey, Settings, Theme};

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    #[cfg(test)]
    fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                backend_url TEXT NOT NULL,
                grid_columns INTEGER NOT NULL,
                status_poll_secs INTEGER NOT NULL,
                volumes_poll_secs INTEGER NOT NULL,
                theme TEXT NOT NULL
            );
            INSERT OR IGNORE INTO settings
                (id, backend_url, grid_columns, status_poll_secs, volumes_poll_secs, theme)
            VALUES (1, 'http://localhost:11337', 8, 5, 1, 'dark');

            CREATE TABLE IF NOT EXISTS resume_points (
                list_key TEXT PRIMARY KEY,
                item_id TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;

        match self.conn.execute(
            "ALTER TABLE settings ADD COLUMN page_timeout_secs INTEGER NOT NULL DEFAULT 12",
            [],
        ) {
            Ok(_) => {}
            Err(err) => {
                let msg = err.to_string();
                if !msg.contains("duplicate column name") {
                    return Err(err).context("add settings.page_timeout_secs column");
                }
            }
        }

        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT backend_url, grid_columns, status_poll_secs, volumes_poll_secs, page_timeout_secs, theme FROM settings WHERE id = 1",
                [],
                |row| {
                    let backend_url: String = row.get(0)?;
                    let grid_columns: i64 = row.get(1)?;
                    let status_poll_secs: i64 = row.get(2)?;
                    let volumes_poll_secs: i64 = row.get(3)?;
                    let page_timeout_secs: i64 = row.get(4)?;
                    let theme: String = row.get(5)?;
                    Ok((
                        backend_url,
                        grid_columns,
                        status_poll_secs,
                        volumes_poll_secs,
                        page_timeout_secs,
                        theme,
                    ))
                },
            )
            .optional()?;

        let Some((
            backend_url,
            grid_columns,
            status_poll_secs,
            volumes_poll_secs,
            page_timeout_secs,
            theme,
        )) = row
        else {
            return Ok(Settings::default());
        };

        let defaults = Settings::default();
        let mut settings = Settings {
            backend_url,
            grid_columns: usize::try_from(grid_columns).unwrap_or(defaults.grid_columns),
            status_poll_secs: u64::try_from(status_poll_secs).unwrap_or(defaults.status_poll_secs),
            volumes_poll_secs: u64::try_from(volumes_poll_secs)
                .unwrap_or(defaults.volumes_poll_secs),
            page_timeout_secs: u64::try_from(page_timeout_secs)
                .unwrap_or(defaults.page_timeout_secs),
            theme: theme.parse::<Theme>().unwrap_or(Theme::Dark),
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();

        self.conn.execute(
            "UPDATE settings SET backend_url = ?, grid_columns = ?, status_poll_secs = ?, volumes_poll_secs = ?, page_timeout_secs = ?, theme = ? WHERE id = 1",
            (
                &settings.backend_url,
                settings.grid_columns as i64,
                settings.status_poll_secs as i64,
                settings.volumes_poll_secs as i64,
                settings.page_timeout_secs as i64,
                settings.theme.as_str(),
            ),
        )?;
        Ok(())
    }

    pub fn resume_point(&self, key: ResumeKey) -> anyhow::Result<Option<String>> {
        let item = self
            .conn
            .query_row(
                "SELECT item_id FROM resume_points WHERE list_key = ?",
                [key.storage_key()],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("read resume point {key}"))?;
        Ok(item)
    }

    pub fn set_resume_point(&self, key: ResumeKey, item_id: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO resume_points (list_key, item_id, updated_at) VALUES (?, ?, unixepoch())
                ON CONFLICT(list_key) DO UPDATE SET item_id = excluded.item_id, updated_at = excluded.updated_at
                "#,
                (key.storage_key(), item_id),
            )
            .with_context(|| format!("write resume point {key}"))?;
        tracing::debug!(list = %key, item = item_id, "saved resume point");
        Ok(())
    }

    pub fn clear_resume_point(&self, key: ResumeKey) -> anyhow::Result<()> {
        self.conn
            .execute(
                "DELETE FROM resume_points WHERE list_key = ?",
                [key.storage_key()],
            )?;
        Ok(())
    }

    /// All stored resume points; rows with unrecognised keys are skipped.
    pub fn list_resume_points(&self) -> anyhow::Result<HashMap<ResumeKey, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT list_key, item_id FROM resume_points")?;
        let rows = stmt.query_map([], |row| {
            let key: String = row.get(0)?;
            let item: String = row.get(1)?;
            Ok((key, item))
        })?;

        let mut out = HashMap::new();
        for row in rows {
            let (key, item) = row?;
            match key.parse::<ResumeKey>() {
                Ok(key) => {
                    out.insert(key, item);
                }
                Err(err) => tracing::warn!(key = %key, error = err, "ignoring stored resume point"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_roundtrip() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        let mut settings = storage.load_settings()?;
        assert_eq!(settings.backend_url, "http://localhost:11337");
        settings.backend_url = "http://10.0.0.5:11337".to_string();
        settings.grid_columns = 6;
        settings.status_poll_secs = 10;
        settings.page_timeout_secs = 15;
        settings.theme = Theme::Light;
        storage.save_settings(&settings)?;

        let settings2 = storage.load_settings()?;
        assert_eq!(settings2.backend_url, "http://10.0.0.5:11337");
        assert_eq!(settings2.grid_columns, 6);
        assert_eq!(settings2.status_poll_secs, 10);
        assert_eq!(settings2.volumes_poll_secs, 1);
        assert_eq!(settings2.page_timeout_secs, 15);
        assert_eq!(settings2.theme, Theme::Light);
        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        storage.migrate()?;
        storage.migrate()?;
        assert_eq!(storage.load_settings()?.page_timeout_secs, 12);
        Ok(())
    }

    #[test]
    fn resume_points_are_scoped_per_list() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        assert_eq!(storage.resume_point(ResumeKey::Shelf)?, None);

        storage.set_resume_point(ResumeKey::Shelf, "3")?;
        storage.set_resume_point(ResumeKey::Series(12), "104")?;
        storage.set_resume_point(ResumeKey::Series(13), "201")?;
        storage.set_resume_point(ResumeKey::Series(12), "105")?;

        assert_eq!(storage.resume_point(ResumeKey::Shelf)?.as_deref(), Some("3"));
        assert_eq!(
            storage.resume_point(ResumeKey::Series(12))?.as_deref(),
            Some("105")
        );
        assert_eq!(
            storage.resume_point(ResumeKey::Series(13))?.as_deref(),
            Some("201")
        );
        let all = storage.list_resume_points()?;
        assert_eq!(all.len(), 3);
        assert_eq!(all.get(&ResumeKey::Series(12)).map(String::as_str), Some("105"));

        storage.clear_resume_point(ResumeKey::Series(13))?;
        assert_eq!(storage.resume_point(ResumeKey::Series(13))?, None);
        Ok(())
    }
}
