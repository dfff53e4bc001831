use chrono::{DateTime, TimeZone, Utc};
use rusqlite::params;

use vitrine_shared::constants::{
    KEY_AUTH_TOKEN, KEY_SESSION_TIMESTAMP, KEY_SHOP, KEY_USER, KEY_USER_TYPE, SESSION_KEYS,
};
use vitrine_shared::types::UserType;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::StoredSession;

impl Database {
    /// Persist every session entry in one transaction.
    ///
    /// A session without a shop removes any stale `shop` entry.
    pub fn save_session(&self, session: &StoredSession) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        let user_json = serde_json::to_string(&session.user)?;
        let timestamp = session.session_timestamp.timestamp_millis().to_string();

        let mut upsert = tx.prepare(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )?;
        upsert.execute(params![KEY_AUTH_TOKEN, session.auth_token, now])?;
        upsert.execute(params![KEY_USER, user_json, now])?;
        upsert.execute(params![KEY_USER_TYPE, session.user_type.as_str(), now])?;
        upsert.execute(params![KEY_SESSION_TIMESTAMP, timestamp, now])?;

        match &session.shop {
            Some(shop) => {
                upsert.execute(params![KEY_SHOP, serde_json::to_string(shop)?, now])?;
            }
            None => {
                tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![KEY_SHOP])?;
            }
        }
        drop(upsert);

        tx.commit()?;
        tracing::debug!(user = %session.user.id, user_type = %session.user_type, "session saved");
        Ok(())
    }

    /// Load the stored session, or `None` when no token is stored.
    pub fn load_session(&self) -> Result<Option<StoredSession>> {
        let Some(auth_token) = self.get_entry(KEY_AUTH_TOKEN)? else {
            return Ok(None);
        };

        let user_json = self.required(KEY_USER)?;
        let user = serde_json::from_str(&user_json).map_err(|e| corrupt(KEY_USER, e))?;

        let user_type_raw = self.required(KEY_USER_TYPE)?;
        let user_type = UserType::parse(&user_type_raw)
            .ok_or_else(|| corrupt(KEY_USER_TYPE, format!("unknown user type {user_type_raw:?}")))?;

        let shop = match self.get_entry(KEY_SHOP)? {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| corrupt(KEY_SHOP, e))?),
            None => None,
        };

        let session_timestamp = parse_timestamp(&self.required(KEY_SESSION_TIMESTAMP)?)?;

        Ok(Some(StoredSession {
            auth_token,
            user,
            user_type,
            shop,
            session_timestamp,
        }))
    }

    /// Remove every session entry in one transaction. Returns how many
    /// were present.
    pub fn clear_session(&self) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        let mut removed = 0;
        for key in SESSION_KEYS {
            removed += tx.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        tracing::debug!(removed, "session cleared");
        Ok(removed)
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get_entry(key)?
            .ok_or_else(|| corrupt(key, "missing while authToken is present"))
    }
}

fn corrupt(key: &str, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Timestamps are written as epoch milliseconds; RFC-3339 is accepted too.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(millis) = raw.trim().parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| corrupt(KEY_SESSION_TIMESTAMP, format!("out of range: {millis}")));
    }

    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(KEY_SESSION_TIMESTAMP, e))
}
