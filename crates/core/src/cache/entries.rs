//! Cache entries: request identity mapped to a stored response.

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// Request identity used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self { method: method.as_ref().to_ascii_uppercase(), url: url.into() }
    }

    /// Key for a GET request, the only method the worker caches.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn hash(&self) -> String {
        compute_entry_key(&self.method, &self.url)
    }
}

/// A response as persisted in a generation.
///
/// Headers keep their original order and casing; lookups are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StoredResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// A full row from the `entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub generation: String,
    pub key: RequestKey,
    pub response: StoredResponse,
    pub stored_at: String,
}

pub(crate) fn insert_entry(
    conn: &rusqlite::Connection, generation: &str, key: &RequestKey, response: &StoredResponse, stored_at: &str,
) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::CacheWrite(format!("headers: {e}")))?;

    conn.execute(
        "INSERT INTO entries (
            generation, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(generation, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            generation,
            key.hash(),
            &key.method,
            &key.url,
            response.status as i64,
            &response.status_text,
            headers_json,
            &response.body,
            stored_at,
        ],
    )?;
    Ok(())
}

/// Raw column values read inside the connection thread, decoded outside
/// of the rusqlite row callback so JSON errors map onto `Error`.
struct RawEntry {
    generation: String,
    method: String,
    url: String,
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl RawEntry {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            generation: row.get(0)?,
            method: row.get(1)?,
            url: row.get(2)?,
            status: row.get(3)?,
            status_text: row.get(4)?,
            headers_json: row.get(5)?,
            body: row.get(6)?,
            stored_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<CacheEntry, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("{}: headers: {e}", self.url)))?;
        let status = u16::try_from(self.status)
            .map_err(|_| Error::CorruptEntry(format!("{}: status {}", self.url, self.status)))?;

        Ok(CacheEntry {
            generation: self.generation,
            key: RequestKey { method: self.method, url: self.url },
            response: StoredResponse { status, status_text: self.status_text, headers, body: self.body },
            stored_at: self.stored_at,
        })
    }
}

const SELECT_ENTRY: &str = "SELECT generation, method, url, status, status_text, headers_json, body, stored_at
     FROM entries";

impl CacheDb {
    /// Look up a request in the named generation.
    ///
    /// Returns None if either the generation or the entry is absent.
    pub async fn match_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        Ok(self.get_entry(generation, key).await?.map(|e| e.response))
    }

    /// Fetch the full entry row, including when it was stored.
    pub async fn get_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE generation = ?1 AND key_hash = ?2"))?;

                match stmt.query_row(params![generation, key_hash], RawEntry::from_row) {
                    Ok(raw) => raw.decode().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the request keys stored in a generation, oldest first.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<RequestKey>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn
                    .prepare("SELECT method, url FROM entries WHERE generation = ?1 ORDER BY stored_at ASC, url ASC")?;
                let keys = stmt
                    .query_map(params![generation], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a generation.
    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_response(body: &str) -> StoredResponse {
        StoredResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("Content-Type".to_string(), "text/html; charset=utf-8".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_request_key_uppercases_method() {
        let key = RequestKey::new("get", "http://localhost:3000/");
        assert_eq!(key.method, "GET");
        assert_eq!(key, RequestKey::get("http://localhost:3000/"));
    }

    #[test]
    fn test_content_type_case_insensitive() {
        let response = html_response("<p>hi</p>");
        assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/html; charset=utf-8"));
        assert_eq!(response.header("etag"), None);
    }

    #[tokio::test]
    async fn test_put_then_match_is_byte_identical() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("vibecaas-v1.0.0").await.unwrap();
        let key = RequestKey::get("http://localhost:3000/styles.css");
        let response = StoredResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![
                ("content-type".to_string(), "text/css".to_string()),
                ("x-build".to_string(), "42".to_string()),
            ],
            body: vec![0x00, 0xff, b'{', b'}', 0x80],
        };

        generation.put(&key, &response).await.unwrap();

        let stored = db.match_entry("vibecaas-v1.0.0", &key).await.unwrap().unwrap();
        assert_eq!(stored, response);
        assert_eq!(stored.content_type(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("http://localhost:3000/nope");
        assert!(db.match_entry("vibecaas-v1.0.0", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_is_scoped_to_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("http://localhost:3000/");
        db.open_generation("app-v1.0.0")
            .await
            .unwrap()
            .put(&key, &html_response("v1"))
            .await
            .unwrap();

        assert!(db.match_entry("app-v2.0.0", &key).await.unwrap().is_none());
        assert!(db.match_entry("app-v1.0.0", &key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_overwrites_last_write_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("app-v1.0.0").await.unwrap();
        let key = RequestKey::get("http://localhost:3000/page");

        generation.put(&key, &html_response("first")).await.unwrap();
        generation.put(&key, &html_response("second")).await.unwrap();

        let stored = db.match_entry("app-v1.0.0", &key).await.unwrap().unwrap();
        assert_eq!(stored.body, b"second");
        assert_eq!(db.entry_count("app-v1.0.0").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let generation = db.open_generation("app-v1.0.0").await.unwrap();
        generation
            .put(&RequestKey::get("http://localhost:3000/"), &html_response("root"))
            .await
            .unwrap();

        let keys = db.list_entries("app-v1.0.0").await.unwrap();
        assert_eq!(keys, vec![RequestKey::get("http://localhost:3000/")]);
        assert!(db.list_entries("other-v1.0.0").await.unwrap().is_empty());
    }
}
