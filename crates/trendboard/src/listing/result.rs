use crate::{id::PostId, store::ListItem};

/// One page of listing results.
///
/// `page` is set for offset requests; `next_cursor_id` is set for cursor
/// requests, and only when `has_next` is true.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageResult {
    pub items: Vec<ListItem>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub page: Option<u32>,
    /// The normalized page size that was requested.
    pub size: usize,
    pub has_next: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub next_cursor_id: Option<PostId>,
}

impl PageResult {
    /// Number of items actually returned.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identifiers of the returned items, in page order.
    pub fn ids(&self) -> Vec<PostId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

/// Cuts a `size + 1` probe down to the visible page and reports whether the
/// extra row was there.
pub(crate) fn split_probe<T>(mut rows: Vec<T>, size: usize) -> (Vec<T>, bool) {
    let has_next = rows.len() > size;
    rows.truncate(size);
    (rows, has_next)
}
