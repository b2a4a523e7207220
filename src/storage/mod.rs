//! Persistence for `yabt`.
//!
//! A JSON document store on `SQLite` with one maintained index
//! (`BacklogItems/ForList`) and deferred patch queries that run inside the
//! writing transaction.

pub mod document;
pub mod indexes;
pub mod patch;
pub mod schema;
pub mod store;

pub use document::{Collection, Document};
pub use indexes::{ListFilter, ListPage, OrderBy, OrderDirection, TagCount, UserRelation};
pub use patch::{IndexPredicate, PatchAction, PatchQuery};
pub use store::{DocumentMetadata, DocumentRead, DocumentStore, Session};
