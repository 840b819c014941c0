use std::time::Duration;

use rusqlite::Connection;

/// The posts table and the index that serves the listing order.
///
/// `id` is the rowid, so the index on `(created_at DESC, id DESC)` already
/// carries every column the identifier-only scan reads.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS posts (
    id          INTEGER PRIMARY KEY,
    author_id   INTEGER NOT NULL,
    title       TEXT    NOT NULL,
    content     TEXT    NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at_id
    ON posts (created_at DESC, id DESC);
";

/// Pragmas that persist in the database file. Run once, on the first
/// connection.
pub(crate) fn apply_database_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "database pragmas applied");
    Ok(())
}

/// Pragmas that only last for one connection. Run on every pooled
/// connection.
pub(crate) fn apply_connection_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(())
}

pub(crate) fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
