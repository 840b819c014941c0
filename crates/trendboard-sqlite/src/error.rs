use chrono::{DateTime, Utc};
use thiserror::Error;
use trendboard::PostId;

pub type Result<T, E = StoreError> = core::result::Result<T, E>;

/// Errors surfaced by [`SqlitePostStore`](crate::SqlitePostStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored identifier does not fit the post id layout.
    #[error("row has a negative post id: {0}")]
    NegativeId(i64),

    /// `created_at` cannot be stored as signed Unix nanoseconds (before
    /// 1677 or after 2262).
    #[error("post {id} has a created_at outside the storable range: {created_at}")]
    TimestampOutOfRange {
        id: PostId,
        created_at: DateTime<Utc>,
    },
}
