use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;
use crate::models::ClientSettings;

impl Database {
    /// Stored settings, or the defaults when none were saved yet.
    pub fn get_settings(&self) -> Result<ClientSettings> {
        let json: Option<String> = self
            .conn()
            .query_row("SELECT json FROM app_settings WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(ClientSettings::default()),
        }
    }

    pub fn update_settings(&self, settings: &ClientSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO app_settings (id, json) VALUES (1, ?1)",
            params![json],
        )?;
        tracing::info!("settings updated");
        Ok(())
    }
}
