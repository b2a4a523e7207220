//! Database schema definitions and migration logic.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the yabt database.
pub const SCHEMA_SQL: &str = r"
    -- Documents: one JSON body per row, keyed by full id (e.g. 'Users/1-A')
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY COLLATE NOCASE,
        collection TEXT NOT NULL,
        body TEXT NOT NULL,
        etag TEXT NOT NULL,
        last_modified TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);

    -- Per-collection id counters
    CREATE TABLE IF NOT EXISTS hilo (
        collection TEXT PRIMARY KEY,
        last_id INTEGER NOT NULL
    );

    -- BacklogItems/ForList index: one row per item
    CREATE TABLE IF NOT EXISTS backlog_items_for_list (
        id TEXT PRIMARY KEY COLLATE NOCASE,
        number INTEGER NOT NULL,
        title TEXT NOT NULL,
        title_lower TEXT NOT NULL,
        item_type TEXT NOT NULL,
        state TEXT NOT NULL,
        assigned_user_id TEXT,
        assignee_name TEXT,
        created_by_user_id TEXT,
        created_at TEXT,
        updated_at TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_for_list_state ON backlog_items_for_list(state);
    CREATE INDEX IF NOT EXISTS idx_for_list_type ON backlog_items_for_list(item_type);
    CREATE INDEX IF NOT EXISTS idx_for_list_assignee ON backlog_items_for_list(assigned_user_id);

    -- BacklogItems/ForList multi-valued terms
    -- field: 'modifiedBy' | 'tag' | 'related' | 'customField'
    CREATE TABLE IF NOT EXISTS backlog_items_for_list_terms (
        item_id TEXT NOT NULL COLLATE NOCASE,
        field TEXT NOT NULL,
        term TEXT NOT NULL COLLATE NOCASE,
        PRIMARY KEY (item_id, field, term)
    );

    CREATE INDEX IF NOT EXISTS idx_for_list_terms_lookup
        ON backlog_items_for_list_terms(field, term);

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// Idempotent: all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    run_migrations(conn)?;

    // WAL lets the CLI read while a server holds the write lock
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(())
}

/// Record the schema version for databases created before it was tracked.
fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?)",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}
