#[cfg(feature = "tracing")]
use std::time::Instant;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    listing::{
        CursorRequest, OffsetRequest, OffsetStrategy, PageRequest, PageResult, split_probe,
    },
    store::{ListItem, PostStore},
};

/// Answers page requests against a [`PostStore`].
///
/// Offset requests go through the configured [`OffsetStrategy`]; cursor
/// requests always use identifier order. Every listing fetches one row more
/// than the page size to decide `has_next` without a count query.
///
/// The engine holds no state besides the store handle and the strategy, so
/// it can be shared freely between request handlers.
///
/// # Example
/// ```
/// use trendboard::{ListingEngine, MemoryPostStore, OffsetRequest, OffsetStrategy};
///
/// let engine = ListingEngine::new(MemoryPostStore::new(), OffsetStrategy::CoveringLookup);
/// let page = engine.list_by_offset(&OffsetRequest::new(Some(1), Some(20))).unwrap();
///
/// assert!(page.is_empty());
/// assert!(!page.has_next);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ListingEngine<S> {
    store: S,
    offset_strategy: OffsetStrategy,
}

impl<S> ListingEngine<S>
where
    S: PostStore,
{
    pub fn new(store: S, offset_strategy: OffsetStrategy) -> Self {
        Self {
            store,
            offset_strategy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn offset_strategy(&self) -> OffsetStrategy {
        self.offset_strategy
    }

    /// Dispatches on the request form.
    ///
    /// # Errors
    ///
    /// Whatever the store returns; nothing is retried or wrapped.
    pub fn list(&self, request: &PageRequest) -> Result<PageResult, S::Err> {
        match request {
            PageRequest::Offset(request) => self.list_by_offset(request),
            PageRequest::Cursor(request) => self.list_by_cursor(request),
        }
    }

    /// Lists one numbered page in listing order using the configured
    /// strategy.
    ///
    /// # Errors
    ///
    /// Whatever the store returns.
    pub fn list_by_offset(&self, request: &OffsetRequest) -> Result<PageResult, S::Err> {
        self.list_by_offset_with(self.offset_strategy, request)
    }

    /// Lists one numbered page with an explicit strategy, ignoring the
    /// configured one. Used to compare the two on the same data.
    ///
    /// # Errors
    ///
    /// Whatever the store returns.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(page = request.page(), size = request.size().get())))]
    pub fn list_by_offset_with(
        &self,
        strategy: OffsetStrategy,
        request: &OffsetRequest,
    ) -> Result<PageResult, S::Err> {
        let items_and_next = match strategy {
            OffsetStrategy::NaiveScan => self.naive_scan(request),
            OffsetStrategy::CoveringLookup => self.covering_lookup(request),
        };
        let (items, has_next) = items_and_next?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            %strategy,
            offset = request.offset(),
            limit = request.size().probe(),
            count = items.len(),
            has_next,
            "offset page"
        );

        Ok(PageResult {
            items,
            page: Some(request.page()),
            size: request.size().get(),
            has_next,
            next_cursor_id: None,
        })
    }

    /// Lists the page after `cursor_id` in identifier order, or the first
    /// page when there is no cursor.
    ///
    /// The cursor is a position, not an index, so rows inserted above it or
    /// deleted anywhere do not shift later pages. A stale or unknown cursor
    /// is not an error: the query just continues below it.
    ///
    /// # Errors
    ///
    /// Whatever the store returns.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(cursor = ?request.cursor_id(), size = request.size().get())))]
    pub fn list_by_cursor(&self, request: &CursorRequest) -> Result<PageResult, S::Err> {
        let size = request.size();
        let rows = timed("scan_before", || {
            self.store.scan_before(request.cursor_id(), size.probe())
        })?;
        let (items, has_next) = split_probe(rows, size.get());
        let next_cursor_id = if has_next {
            items.last().map(|item| item.id)
        } else {
            None
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            cursor = ?request.cursor_id(),
            limit = size.probe(),
            count = items.len(),
            has_next,
            ?next_cursor_id,
            "cursor page"
        );

        Ok(PageResult {
            items,
            page: None,
            size: size.get(),
            has_next,
            next_cursor_id,
        })
    }

    fn naive_scan(&self, request: &OffsetRequest) -> Result<(Vec<ListItem>, bool), S::Err> {
        let size = request.size();
        let rows = timed("scan_newest", || {
            self.store.scan_newest(request.offset(), size.probe())
        })?;
        Ok(split_probe(rows, size.get()))
    }

    fn covering_lookup(&self, request: &OffsetRequest) -> Result<(Vec<ListItem>, bool), S::Err> {
        let size = request.size();
        let ids = timed("scan_newest_ids", || {
            self.store.scan_newest_ids(request.offset(), size.probe())
        })?;
        let (ids, has_next) = split_probe(ids, size.get());
        if ids.is_empty() {
            return Ok((Vec::new(), has_next));
        }

        // `has_next` comes from the id window; the fetch below may see rows
        // deleted since and return fewer items.
        let mut items = timed("fetch_by_ids", || self.store.fetch_by_ids(&ids))?;
        items.sort_unstable_by_key(ListItem::newest_first);
        Ok((items, has_next))
    }
}

/// Runs one store query, reporting its duration when tracing is enabled.
#[cfg(feature = "tracing")]
fn timed<R, E>(
    query: &'static str,
    run: impl FnOnce() -> Result<Vec<R>, E>,
) -> Result<Vec<R>, E> {
    let started = Instant::now();
    let result = run();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
    match &result {
        Ok(rows) => tracing::debug!(query, rows = rows.len(), elapsed_ms, "store query"),
        Err(_) => tracing::debug!(query, elapsed_ms, "store query failed"),
    }
    result
}

#[cfg(not(feature = "tracing"))]
#[inline(always)]
fn timed<R, E>(
    _query: &'static str,
    run: impl FnOnce() -> Result<Vec<R>, E>,
) -> Result<Vec<R>, E> {
    run()
}
