use core::fmt;
use std::sync::Arc;

use crate::{id::PostId, store::ListItem};

/// Read access to an indexed, ordered collection of posts.
///
/// Implementations are expected to answer each method with a single
/// indexed query. Nothing here mutates rows, and no method is expected to
/// see a consistent snapshot across calls.
///
/// Two orders are involved:
///
/// - the *listing order*: `created_at` descending, then `id` descending;
/// - the *identifier order*: `id` descending.
pub trait PostStore {
    /// The error type surfaced by the backing storage. Listing operations
    /// return it unchanged.
    type Err: fmt::Debug;

    /// Up to `limit` rows in listing order, skipping the first `offset`.
    ///
    /// # Errors
    ///
    /// Any failure of the backing storage.
    fn scan_newest(&self, offset: u64, limit: usize) -> Result<Vec<ListItem>, Self::Err>;

    /// Like [`PostStore::scan_newest`] but returns identifiers only, so a
    /// covering index can answer it without touching row payloads.
    ///
    /// # Errors
    ///
    /// Any failure of the backing storage.
    fn scan_newest_ids(&self, offset: u64, limit: usize) -> Result<Vec<PostId>, Self::Err>;

    /// Up to `limit` rows in identifier order whose id is strictly below
    /// `cursor`, or from the largest id when `cursor` is `None`.
    ///
    /// # Errors
    ///
    /// Any failure of the backing storage.
    fn scan_before(&self, cursor: Option<PostId>, limit: usize)
    -> Result<Vec<ListItem>, Self::Err>;

    /// The rows whose identifiers are in `ids`, in no particular order.
    /// Unknown identifiers are skipped.
    ///
    /// # Errors
    ///
    /// Any failure of the backing storage.
    fn fetch_by_ids(&self, ids: &[PostId]) -> Result<Vec<ListItem>, Self::Err>;
}

impl<S: PostStore + ?Sized> PostStore for &S {
    type Err = S::Err;

    fn scan_newest(&self, offset: u64, limit: usize) -> Result<Vec<ListItem>, Self::Err> {
        (**self).scan_newest(offset, limit)
    }

    fn scan_newest_ids(&self, offset: u64, limit: usize) -> Result<Vec<PostId>, Self::Err> {
        (**self).scan_newest_ids(offset, limit)
    }

    fn scan_before(
        &self,
        cursor: Option<PostId>,
        limit: usize,
    ) -> Result<Vec<ListItem>, Self::Err> {
        (**self).scan_before(cursor, limit)
    }

    fn fetch_by_ids(&self, ids: &[PostId]) -> Result<Vec<ListItem>, Self::Err> {
        (**self).fetch_by_ids(ids)
    }
}

impl<S: PostStore + ?Sized> PostStore for Arc<S> {
    type Err = S::Err;

    fn scan_newest(&self, offset: u64, limit: usize) -> Result<Vec<ListItem>, Self::Err> {
        (**self).scan_newest(offset, limit)
    }

    fn scan_newest_ids(&self, offset: u64, limit: usize) -> Result<Vec<PostId>, Self::Err> {
        (**self).scan_newest_ids(offset, limit)
    }

    fn scan_before(
        &self,
        cursor: Option<PostId>,
        limit: usize,
    ) -> Result<Vec<ListItem>, Self::Err> {
        (**self).scan_before(cursor, limit)
    }

    fn fetch_by_ids(&self, ids: &[PostId]) -> Result<Vec<ListItem>, Self::Err> {
        (**self).fetch_by_ids(ids)
    }
}
