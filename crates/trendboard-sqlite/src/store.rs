use std::path::Path;

use chrono::DateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Row, params, params_from_iter};
use trendboard::{ListItem, Post, PostId, PostStore};

use crate::{
    error::{Result, StoreError},
    schema::{apply_connection_pragmas, apply_database_pragmas, initialize_schema},
};

const SCAN_NEWEST: &str = "SELECT id, author_id, title, created_at FROM posts
     ORDER BY created_at DESC, id DESC
     LIMIT ?1 OFFSET ?2";

const SCAN_NEWEST_IDS: &str = "SELECT id FROM posts
     ORDER BY created_at DESC, id DESC
     LIMIT ?1 OFFSET ?2";

const SCAN_BEFORE: &str = "SELECT id, author_id, title, created_at FROM posts
     WHERE id < ?1
     ORDER BY id DESC
     LIMIT ?2";

const SCAN_FROM_TOP: &str = "SELECT id, author_id, title, created_at FROM posts
     ORDER BY id DESC
     LIMIT ?1";

const INSERT_POST: &str = "INSERT INTO posts (id, author_id, title, content, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)";

const GET_POST: &str = "SELECT id, author_id, title, content, created_at FROM posts
     WHERE id = ?1";

pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Posts stored in one SQLite database file, read through a connection pool.
///
/// Cloning the store clones the pool handle.
#[derive(Clone, Debug)]
pub struct SqlitePostStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlitePostStore {
    /// Opens (or creates) the database at `path`, switches it to WAL mode and
    /// makes sure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be built or the schema cannot be
    /// applied.
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(ConnectionCustomizer))
            .build(manager)?;

        let conn = pool.get()?;
        apply_database_pragmas(&conn)?;
        initialize_schema(&conn)?;
        drop(conn);

        tracing::debug!(path = %path.display(), pool_size, "opened post store");
        Ok(Self { pool })
    }

    /// A pooled connection, for queries this type does not wrap.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Pool`] if no connection frees up in time.
    pub fn connection(&self) -> Result<SqliteConnection> {
        Ok(self.pool.get()?)
    }

    /// Inserts all `posts` in one transaction. Either every row lands or
    /// none does. `created_at` is kept at full nanosecond precision.
    ///
    /// # Errors
    ///
    /// Fails on any constraint violation, such as a duplicate id, or with
    /// [`StoreError::TimestampOutOfRange`] for a `created_at` outside
    /// 1677..=2262.
    pub fn insert_batch(&self, posts: &[Post]) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_POST)?;
            for post in posts {
                stmt.execute(params![
                    post.id.to_i64(),
                    post.author_id,
                    post.title,
                    post.content,
                    stored_nanos(post)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(posts.len())
    }

    /// One full post, body included.
    ///
    /// # Errors
    ///
    /// Any database failure, or a row that cannot be decoded.
    pub fn get(&self, id: PostId) -> Result<Option<Post>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(GET_POST)?;
        let mut rows = stmt.query_map([id.to_i64()], PostRow::read)?;
        rows.next().transpose()?.map(PostRow::into_post).transpose()
    }

    /// # Errors
    ///
    /// Any database failure.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Deletes every post, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Any database failure.
    pub fn truncate(&self) -> Result<usize> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM posts", [])?;
        tracing::debug!(removed, "truncated posts");
        Ok(removed)
    }

    fn list_items<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ListItem>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, ListRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ListRow::into_item).collect()
    }
}

impl PostStore for SqlitePostStore {
    type Err = StoreError;

    fn scan_newest(&self, offset: u64, limit: usize) -> Result<Vec<ListItem>> {
        self.list_items(SCAN_NEWEST, params![sql_limit(limit), sql_offset(offset)])
    }

    fn scan_newest_ids(&self, offset: u64, limit: usize) -> Result<Vec<PostId>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(SCAN_NEWEST_IDS)?;
        let ids = stmt
            .query_map(params![sql_limit(limit), sql_offset(offset)], |row| {
                row.get::<_, i64>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.into_iter().map(post_id).collect()
    }

    fn scan_before(&self, cursor: Option<PostId>, limit: usize) -> Result<Vec<ListItem>> {
        match cursor {
            Some(cursor) => {
                self.list_items(SCAN_BEFORE, params![cursor.to_i64(), sql_limit(limit)])
            }
            None => self.list_items(SCAN_FROM_TOP, params![sql_limit(limit)]),
        }
    }

    fn fetch_by_ids(&self, ids: &[PostId]) -> Result<Vec<ListItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, author_id, title, created_at FROM posts WHERE id IN ({placeholders})"
        );
        self.list_items(&sql, params_from_iter(ids.iter().map(PostId::to_i64)))
    }
}

/// Raw columns of a listing query, before the identifier is checked.
struct ListRow {
    id: i64,
    author_id: i64,
    title: String,
    created_at: i64,
}

impl ListRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author_id: row.get(1)?,
            title: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn into_item(self) -> Result<ListItem> {
        Ok(ListItem {
            id: post_id(self.id)?,
            author_id: self.author_id,
            title: self.title,
            created_at: DateTime::from_timestamp_nanos(self.created_at),
        })
    }
}

/// Raw columns of a full post.
struct PostRow {
    id: i64,
    author_id: i64,
    title: String,
    content: String,
    created_at: i64,
}

impl PostRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_post(self) -> Result<Post> {
        Ok(Post {
            id: post_id(self.id)?,
            author_id: self.author_id,
            title: self.title,
            content: self.content,
            created_at: DateTime::from_timestamp_nanos(self.created_at),
        })
    }
}

fn post_id(raw: i64) -> Result<PostId> {
    PostId::from_i64(raw).ok_or(StoreError::NegativeId(raw))
}

fn stored_nanos(post: &Post) -> Result<i64> {
    post.created_at
        .timestamp_nanos_opt()
        .ok_or(StoreError::TimestampOutOfRange {
            id: post.id,
            created_at: post.created_at,
        })
}

// SQLite binds integers as i64; page windows never get near the limit.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

/// Applies per-connection pragmas as the pool hands connections out.
#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
        apply_connection_pragmas(conn)
    }
}
