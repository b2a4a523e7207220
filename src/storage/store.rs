//! `SQLite` document store.

use crate::error::{Result, YabtError};
use crate::storage::document::{Collection, Document};
use crate::storage::patch::{self, PatchQuery};
use crate::storage::schema::apply_schema;
use crate::util::content_hash;
use crate::util::id::format_short_id;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

/// Etag and timestamp of a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

/// Read access shared by the store and by open sessions.
pub trait DocumentRead {
    fn conn(&self) -> &Connection;

    /// Load a document by short or full id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the body does not deserialize.
    fn load<T: Document>(&self, id: &str) -> Result<Option<T>> {
        let full_id = T::COLLECTION.full_id(id);
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT id, body FROM documents WHERE id = ? AND collection = ?",
                rusqlite::params![full_id, T::COLLECTION.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(stored_id, body)| decode::<T>(stored_id, &body))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn exists<T: Document>(&self, id: &str) -> Result<bool> {
        let full_id = T::COLLECTION.full_id(id);
        let mut stmt = self
            .conn()
            .prepare_cached("SELECT 1 FROM documents WHERE id = ? AND collection = ?")?;
        Ok(stmt.exists(rusqlite::params![full_id, T::COLLECTION.as_str()])?)
    }

    /// All documents of a collection, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a body does not deserialize.
    fn query_all<T: Document>(&self) -> Result<Vec<T>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, body FROM documents WHERE collection = ? ORDER BY rowid")?;
        let rows = stmt
            .query_map([T::COLLECTION.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(stored_id, body)| decode::<T>(stored_id, &body))
            .collect()
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn metadata(&self, collection: Collection, id: &str) -> Result<Option<DocumentMetadata>> {
        let full_id = collection.full_id(id);
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT etag, last_modified FROM documents WHERE id = ? AND collection = ?",
                rusqlite::params![full_id, collection.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(etag, last_modified)| DocumentMetadata {
            etag,
            last_modified: parse_timestamp(&last_modified),
        }))
    }
}

fn decode<T: Document>(stored_id: String, body: &str) -> Result<T> {
    let mut doc: T = serde_json::from_str(body).map_err(|e| YabtError::CorruptDocument {
        id: stored_id.clone(),
        reason: e.to_string(),
    })?;
    doc.set_id(stored_id);
    Ok(doc)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc))
}

/// SQLite-backed JSON document store.
#[derive(Debug)]
pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Open (or create) the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened document store");
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run a unit of work.
    ///
    /// The closure reads and writes through the [`Session`] and may queue
    /// deferred patches. When it returns `Ok`, the patches run in insertion
    /// order and the transaction commits. On any error nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the closure's error or any storage error; the transaction is
    /// rolled back.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Session<'_>) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut session = Session::new(&tx, op);

        let result = f(&mut session)?;

        let deferred = std::mem::take(&mut session.deferred);
        let mut patched = 0;
        for query in &deferred {
            patched += patch::execute(&mut session, query)?;
        }
        let writes = session.writes;

        tx.commit()?;

        debug!(
            op,
            writes,
            patches = deferred.len(),
            patched,
            "Committed unit of work"
        );
        Ok(result)
    }
}

impl DocumentRead for DocumentStore {
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// A unit of work inside one transaction.
pub struct Session<'conn> {
    conn: &'conn Connection,
    op_name: String,
    deferred: Vec<PatchQuery>,
    writes: usize,
}

impl<'conn> Session<'conn> {
    fn new(conn: &'conn Connection, op_name: &str) -> Self {
        Self {
            conn,
            op_name: op_name.to_string(),
            deferred: Vec::new(),
            writes: 0,
        }
    }

    #[must_use]
    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    /// Insert or replace a document and refresh its index entries.
    ///
    /// A document with an empty id gets the next id of its collection.
    ///
    /// # Errors
    ///
    /// Returns an error if id generation, serialization or the write fails.
    pub fn store<T: Document>(&mut self, doc: &mut T) -> Result<()> {
        let collection = T::COLLECTION;
        if doc.id().trim().is_empty() {
            let id = self.next_id(collection)?;
            doc.set_id(id);
        } else {
            let full_id = collection.full_id(doc.id());
            doc.set_id(full_id);
        }

        let body = serde_json::to_string(doc)?;
        let etag = content_hash(&body);
        self.conn.execute(
            "INSERT INTO documents (id, collection, body, etag, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET body = ?3, etag = ?4, last_modified = ?5",
            rusqlite::params![
                doc.id(),
                collection.as_str(),
                body,
                etag,
                Utc::now().to_rfc3339()
            ],
        )?;
        doc.index(self.conn)?;

        self.writes += 1;
        trace!(op = %self.op_name, id = doc.id(), "Stored document");
        Ok(())
    }

    /// Delete a document; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete<T: Document>(&mut self, id: &str) -> Result<bool> {
        let full_id = T::COLLECTION.full_id(id);
        let deleted = self.conn.execute(
            "DELETE FROM documents WHERE id = ? AND collection = ?",
            rusqlite::params![full_id, T::COLLECTION.as_str()],
        )?;
        T::unindex(self.conn, &full_id)?;

        self.writes += deleted;
        trace!(op = %self.op_name, id = %full_id, deleted, "Deleted document");
        Ok(deleted > 0)
    }

    /// Queue a patch to run just before commit.
    pub fn add_deferred_patch(&mut self, query: PatchQuery) {
        self.deferred.push(query);
    }

    #[must_use]
    pub fn deferred_patches(&self) -> &[PatchQuery] {
        &self.deferred
    }

    fn next_id(&self, collection: Collection) -> Result<String> {
        let next: i64 = self.conn.query_row(
            "INSERT INTO hilo (collection, last_id) VALUES (?, 1)
             ON CONFLICT(collection) DO UPDATE SET last_id = last_id + 1
             RETURNING last_id",
            [collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(collection.full_id(&format_short_id(next)))
    }
}

impl DocumentRead for Session<'_> {
    fn conn(&self) -> &Connection {
        self.conn
    }
}
