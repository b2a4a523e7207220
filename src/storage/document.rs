//! Collections and the `Document` trait.

use crate::error::Result;
use crate::model::{BacklogItem, CustomField, User};
use crate::storage::indexes;
use crate::util::id;
use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// A named group of documents sharing an id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    BacklogItems,
    Users,
    CustomFields,
}

impl Collection {
    /// Id prefix and collection name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BacklogItems => "BacklogItems",
            Self::Users => "Users",
            Self::CustomFields => "CustomFields",
        }
    }

    /// `1-A` -> `Users/1-A`. Full ids pass through.
    #[must_use]
    pub fn full_id(&self, id: &str) -> String {
        id::full_id(self.as_str(), id)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON document stored in a collection.
///
/// The index hooks run inside the writing transaction, so index rows are
/// always consistent with committed documents.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    /// Full id, empty for a document that was never stored.
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Refresh this document's index entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the index write fails.
    fn index(&self, _conn: &Connection) -> Result<()> {
        Ok(())
    }

    /// Drop the index entries of a deleted document.
    ///
    /// # Errors
    ///
    /// Returns an error if the index write fails.
    fn unindex(_conn: &Connection, _id: &str) -> Result<()> {
        Ok(())
    }
}

impl Document for BacklogItem {
    const COLLECTION: Collection = Collection::BacklogItems;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn index(&self, conn: &Connection) -> Result<()> {
        indexes::reindex(conn, self)
    }

    fn unindex(conn: &Connection, id: &str) -> Result<()> {
        indexes::remove(conn, id)
    }
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Document for CustomField {
    const COLLECTION: Collection = Collection::CustomFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
