use core::{cmp::Reverse, convert::Infallible};
use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use crate::{
    id::PostId,
    store::{ListItem, NewestFirst, Post, PostStore},
};

#[derive(Default)]
struct Inner {
    rows: BTreeMap<PostId, Post>,
    newest: BTreeSet<NewestFirst>,
}

/// An in-process [`PostStore`] backed by ordered maps.
///
/// Rows are keyed by identifier, with a second ordered set standing in for
/// the `(created_at DESC, id DESC)` index. Offsets are still walked one entry
/// at a time, so deep pages cost what they would on a real table.
///
/// `fetch_by_ids` returns rows in ascending identifier order regardless of
/// the order requested.
#[derive(Default)]
pub struct MemoryPostStore {
    inner: RwLock<Inner>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a post, returning the previous row with the same id.
    pub fn insert(&self, post: Post) -> Option<Post> {
        let mut inner = self.inner.write();
        inner.newest.insert(post.newest_first());
        let previous = inner.rows.insert(post.id, post);
        if let Some(previous) = &previous {
            let key = previous.newest_first();
            // The replacement may share the old key; only drop a stale one.
            if inner.rows.get(&previous.id).map(Post::newest_first) != Some(key) {
                inner.newest.remove(&key);
            }
        }
        previous
    }

    pub fn remove(&self, id: PostId) -> Option<Post> {
        let mut inner = self.inner.write();
        let removed = inner.rows.remove(&id)?;
        inner.newest.remove(&removed.newest_first());
        Some(removed)
    }

    pub fn get(&self, id: PostId) -> Option<Post> {
        self.inner.read().rows.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Post> for MemoryPostStore {
    fn from_iter<I: IntoIterator<Item = Post>>(iter: I) -> Self {
        let store = Self::new();
        for post in iter {
            store.insert(post);
        }
        store
    }
}

fn skip_count(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

impl PostStore for MemoryPostStore {
    type Err = Infallible;

    fn scan_newest(&self, offset: u64, limit: usize) -> Result<Vec<ListItem>, Self::Err> {
        let inner = self.inner.read();
        Ok(inner
            .newest
            .iter()
            .skip(skip_count(offset))
            .take(limit)
            .filter_map(|(_, Reverse(id))| inner.rows.get(id).map(Post::to_list_item))
            .collect())
    }

    fn scan_newest_ids(&self, offset: u64, limit: usize) -> Result<Vec<PostId>, Self::Err> {
        let inner = self.inner.read();
        Ok(inner
            .newest
            .iter()
            .skip(skip_count(offset))
            .take(limit)
            .map(|(_, Reverse(id))| *id)
            .collect())
    }

    fn scan_before(
        &self,
        cursor: Option<PostId>,
        limit: usize,
    ) -> Result<Vec<ListItem>, Self::Err> {
        let inner = self.inner.read();
        let rows = match cursor {
            Some(cursor) => inner.rows.range(..cursor).rev().take(limit),
            None => inner.rows.range(..).rev().take(limit),
        };
        Ok(rows.map(|(_, post)| post.to_list_item()).collect())
    }

    fn fetch_by_ids(&self, ids: &[PostId]) -> Result<Vec<ListItem>, Self::Err> {
        let wanted: BTreeSet<PostId> = ids.iter().copied().collect();
        let inner = self.inner.read();
        Ok(wanted
            .iter()
            .filter_map(|id| inner.rows.get(id).map(Post::to_list_item))
            .collect())
    }
}
