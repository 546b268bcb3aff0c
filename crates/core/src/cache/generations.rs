//! Cache generations: named, versioned groups of entries.
//!
//! A generation is created on first open, marked installed once its whole
//! asset manifest has been stored, and marked activated when it becomes
//! the current generation. Deleting a generation cascades to its entries.

use super::connection::CacheDb;
use super::entries::{RequestKey, StoredResponse, insert_entry};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// Lifecycle timestamps for a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub name: String,
    pub created_at: String,
    pub installed_at: Option<String>,
    pub activated_at: Option<String>,
}

impl GenerationInfo {
    /// All manifest assets were stored.
    pub fn is_ready(&self) -> bool {
        self.installed_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.activated_at.is_some()
    }
}

/// Short-lived handle to an opened generation.
///
/// Holds the name only; every call goes back to the database, so a handle
/// kept across an eviction simply re-creates the generation on write.
#[derive(Debug, Clone)]
pub struct Generation {
    db: CacheDb,
    name: String,
}

impl Generation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.db.match_entry(&self.name, key).await
    }

    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.db.list_entries(&self.name).await
    }

    /// Store a single response, replacing any previous one for the key.
    pub async fn put(&self, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        self.put_all(vec![(key.clone(), response.clone())]).await
    }

    /// Store several responses in one transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_all(&self, entries: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error> {
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&name, &now],
                )?;
                for (key, response) in &entries {
                    insert_entry(&tx, &name, key, response, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
            .map_err(|e| match e {
                Error::Database(inner) => Error::CacheWrite(inner.to_string()),
                other => other,
            })
    }
}

impl CacheDb {
    /// Open a generation, creating it if it does not exist yet.
    pub async fn open_generation(&self, name: &str) -> Result<Generation, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("generation name cannot be empty".into()));
        }

        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Generation { db: self.clone(), name: name.to_string() })
    }

    /// Names of every generation, oldest first.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        Ok(self.generation_info(name).await?.is_some())
    }

    pub async fn generation_info(&self, name: &str) -> Result<Option<GenerationInfo>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Option<GenerationInfo>, Error> {
                let result = conn.query_row(
                    "SELECT name, created_at, installed_at, activated_at FROM generations WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(GenerationInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            installed_at: row.get(2)?,
                            activated_at: row.get(3)?,
                        })
                    },
                );

                match result {
                    Ok(info) => Ok(Some(info)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no generation had that name.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Record that the full asset manifest is stored in the generation.
    pub async fn mark_installed(&self, name: &str) -> Result<(), Error> {
        self.stamp(name, "installed_at").await
    }

    /// Record that the generation became current.
    pub async fn mark_activated(&self, name: &str) -> Result<(), Error> {
        self.stamp(name, "activated_at").await
    }

    async fn stamp(&self, name: &str, column: &'static str) -> Result<(), Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let updated = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let updated =
                    conn.execute(&format!("UPDATE generations SET {column} = ?1 WHERE name = ?2"), params![now, owned])?;
                Ok(updated)
            })
            .await
            .map_err(Error::from)?;

        if updated == 0 {
            return Err(Error::CacheMiss(format!("generation {name}")));
        }
        Ok(())
    }
}
