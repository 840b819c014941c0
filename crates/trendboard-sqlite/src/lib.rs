//! A [`PostStore`](trendboard::PostStore) over a SQLite `posts` table.
//!
//! Reads go through an r2d2 pool; the database runs in WAL mode so readers
//! never block each other or the writer.

mod error;
mod schema;
mod store;

pub use crate::error::*;
pub use crate::store::*;
