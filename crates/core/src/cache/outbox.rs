//! Outbox of writes issued while offline.
//!
//! Entries are replayed in insertion order when the background sync
//! signal fires.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A queued request waiting for connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Assigned by the database; ignored on enqueue.
    pub id: i64,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub created_at: String,
}

impl CacheDb {
    /// Append a request to the outbox, returning its id.
    pub async fn enqueue_outbox(
        &self, method: &str, url: &str, headers: Vec<(String, String)>, body: Option<Vec<u8>>,
    ) -> Result<i64, Error> {
        let method = method.to_ascii_uppercase();
        let url = url.to_string();
        let headers_json = serde_json::to_string(&headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO outbox (method, url, headers_json, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![method, url, headers_json, body, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Pending entries, oldest first.
    pub async fn pending_outbox(&self) -> Result<Vec<OutboxEntry>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(i64, String, String, String, Option<Vec<u8>>, String)>, Error> {
                let mut stmt =
                    conn.prepare("SELECT id, method, url, headers_json, body, created_at FROM outbox ORDER BY id ASC")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(id, method, url, headers_json, body, created_at)| {
                let headers = serde_json::from_str(&headers_json)
                    .map_err(|e| Error::CorruptEntry(format!("outbox {id}: headers: {e}")))?;
                Ok(OutboxEntry { id, method, url, headers, body, created_at })
            })
            .collect()
    }

    /// Remove an entry once it has been delivered or dropped.
    pub async fn remove_outbox(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM outbox WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
