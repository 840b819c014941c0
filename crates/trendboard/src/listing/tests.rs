use crate::{
    CUSTOM_EPOCH, CursorRequest, ListItem, ListingEngine, MemoryPostStore, OffsetRequest,
    OffsetStrategy, PageRequest, Post, PostId, PostStore,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::cell::RefCell;
use std::collections::HashSet;

/// A post whose `created_at` is the millisecond encoded in its id, so
/// listing order and identifier order agree.
fn post_at(timestamp: u64, sequence: u64) -> Post {
    let id = PostId::from_components(timestamp, 1, sequence);
    Post {
        id,
        author_id: (id.to_raw() % 1000) as i64 + 1,
        title: format!("title-{id}"),
        content: format!("content-{id}"),
        created_at: id.created_at(CUSTOM_EPOCH).unwrap(),
    }
}

/// `count` posts, three per millisecond.
fn board(count: u64) -> MemoryPostStore {
    (0..count).map(|n| post_at(1_000 + n / 3, n % 3)).collect()
}

/// Posts whose `created_at` ignores id order and repeats often.
fn scrambled(count: u64) -> MemoryPostStore {
    let base = DateTime::from_timestamp(1_750_000_000, 0).unwrap();
    (0..count)
        .map(|n| Post {
            id: PostId::from_components(1_000 + n, 1, 0),
            author_id: 1,
            title: format!("title-{n}"),
            content: format!("content-{n}"),
            created_at: base + TimeDelta::seconds(((n * 7) % 11) as i64),
        })
        .collect()
}

fn everything(store: &MemoryPostStore) -> Vec<PostId> {
    store
        .scan_newest(0, store.len())
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect()
}

fn offset(page: i64, size: i64) -> OffsetRequest {
    OffsetRequest::new(Some(page), Some(size))
}

#[derive(Debug, PartialEq, Eq)]
struct StoreFault(&'static str);

/// Wraps a memory store, recording every call and optionally failing one
/// method or deleting a row right before `fetch_by_ids` runs.
#[derive(Default)]
struct ProbeStore {
    inner: MemoryPostStore,
    calls: RefCell<Vec<&'static str>>,
    fail: Option<&'static str>,
    delete_before_fetch: Option<PostId>,
}

impl ProbeStore {
    fn new(inner: MemoryPostStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn failing(method: &'static str) -> Self {
        Self {
            inner: board(30),
            fail: Some(method),
            ..Self::default()
        }
    }

    fn enter(&self, method: &'static str) -> Result<(), StoreFault> {
        self.calls.borrow_mut().push(method);
        match self.fail {
            Some(failing) if failing == method => Err(StoreFault(method)),
            _ => Ok(()),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.take()
    }
}

impl PostStore for ProbeStore {
    type Err = StoreFault;

    fn scan_newest(&self, offset: u64, limit: usize) -> Result<Vec<ListItem>, Self::Err> {
        self.enter("scan_newest")?;
        self.inner.scan_newest(offset, limit).map_err(|e| match e {})
    }

    fn scan_newest_ids(&self, offset: u64, limit: usize) -> Result<Vec<PostId>, Self::Err> {
        self.enter("scan_newest_ids")?;
        self.inner
            .scan_newest_ids(offset, limit)
            .map_err(|e| match e {})
    }

    fn scan_before(
        &self,
        cursor: Option<PostId>,
        limit: usize,
    ) -> Result<Vec<ListItem>, Self::Err> {
        self.enter("scan_before")?;
        self.inner.scan_before(cursor, limit).map_err(|e| match e {})
    }

    fn fetch_by_ids(&self, ids: &[PostId]) -> Result<Vec<ListItem>, Self::Err> {
        self.enter("fetch_by_ids")?;
        if let Some(id) = self.delete_before_fetch {
            self.inner.remove(id);
        }
        self.inner.fetch_by_ids(ids).map_err(|e| match e {})
    }
}

#[test]
fn twenty_five_rows_make_a_full_and_a_partial_page() {
    for strategy in OffsetStrategy::ALL {
        let engine = ListingEngine::new(board(25), strategy);

        let first = engine.list_by_offset(&OffsetRequest::default()).unwrap();
        assert_eq!(first.count(), 20, "{strategy}");
        assert_eq!(first.page, Some(1));
        assert_eq!(first.size, 20);
        assert!(first.has_next);
        assert_eq!(first.next_cursor_id, None);

        let second = engine.list_by_offset(&offset(2, 20)).unwrap();
        assert_eq!(second.count(), 5, "{strategy}");
        assert_eq!(second.page, Some(2));
        assert!(!second.has_next);

        let all = everything(engine.store());
        assert_eq!(first.ids(), all[..20]);
        assert_eq!(second.ids(), all[20..]);
    }
}

#[test]
fn exact_multiple_has_no_phantom_next_page() {
    for strategy in OffsetStrategy::ALL {
        let engine = ListingEngine::new(board(20), strategy);
        let last = engine.list_by_offset(&offset(2, 10)).unwrap();
        assert_eq!(last.count(), 10);
        assert!(!last.has_next, "{strategy}");
    }

    let engine = ListingEngine::new(board(20), OffsetStrategy::default());
    let first = engine.list_by_cursor(&CursorRequest::first(Some(10))).unwrap();
    let cursor = first.next_cursor_id.unwrap();
    let last = engine
        .list_by_cursor(&CursorRequest::new(Some(cursor), Some(10)))
        .unwrap();
    assert_eq!(last.count(), 10);
    assert!(!last.has_next);
    assert_eq!(last.next_cursor_id, None);
}

#[test]
fn offset_strategies_return_identical_pages() {
    let store = scrambled(137);
    let naive = ListingEngine::new(&store, OffsetStrategy::NaiveScan);
    let covering = ListingEngine::new(&store, OffsetStrategy::CoveringLookup);

    for size in [1, 7, 20, 50] {
        for page in 1..=(137 / size + 2) {
            let request = offset(page, size);
            let a = naive.list_by_offset(&request).unwrap();
            let b = covering.list_by_offset(&request).unwrap();
            assert_eq!(a, b, "page {page} size {size}");
        }
    }
}

#[test]
fn covering_lookup_restores_listing_order() {
    // The memory store answers `fetch_by_ids` in ascending id order, which
    // is never listing order for more than one row here.
    let store = scrambled(30);
    let engine = ListingEngine::new(&store, OffsetStrategy::CoveringLookup);
    let page = engine.list_by_offset(&offset(1, 30)).unwrap();

    assert_eq!(page.ids(), everything(&store));
    assert!(
        page.items
            .windows(2)
            .all(|pair| pair[0].newest_first() < pair[1].newest_first())
    );
}

#[test]
fn cursor_walk_visits_every_row_once() {
    let engine = ListingEngine::new(board(95), OffsetStrategy::default());
    let mut request = CursorRequest::first(Some(10));
    let mut walked = Vec::new();
    let mut pages = 0;

    loop {
        let page = engine.list_by_cursor(&request).unwrap();
        pages += 1;
        assert_eq!(page.page, None);
        walked.extend(page.ids());
        match page.next_cursor_id {
            Some(cursor) => {
                assert!(page.has_next);
                assert_eq!(page.count(), 10);
                assert_eq!(Some(cursor), page.items.last().map(|item| item.id));
                request = request.after(cursor);
            }
            None => {
                assert!(!page.has_next);
                assert_eq!(page.count(), 5);
                break;
            }
        }
    }

    assert_eq!(pages, 10);
    let unique: HashSet<_> = walked.iter().collect();
    assert_eq!(unique.len(), 95);
    assert_eq!(walked, everything(engine.store()));
}

#[test]
fn cursor_pages_are_strictly_below_the_cursor() {
    let engine = ListingEngine::new(board(30), OffsetStrategy::default());
    let cursor = PostId::from_components(1_005, 1, 1);
    let page = engine
        .list_by_cursor(&CursorRequest::new(Some(cursor), Some(50)))
        .unwrap();

    assert!(page.items.iter().all(|item| item.id < cursor));
    assert_eq!(page.count(), 16);
    assert!(!page.has_next);

    // A cursor that matches no row still positions the scan.
    let gap = PostId::from_components(1_005, 1, 2).increment_sequence();
    let page = engine
        .list_by_cursor(&CursorRequest::new(Some(gap), Some(50)))
        .unwrap();
    assert_eq!(page.count(), 18);
}

#[test]
fn empty_store_lists_nothing() {
    for strategy in OffsetStrategy::ALL {
        let engine = ListingEngine::new(ProbeStore::new(MemoryPostStore::new()), strategy);
        let page = engine.list_by_offset(&OffsetRequest::default()).unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.next_cursor_id, None);
    }

    let engine = ListingEngine::new(MemoryPostStore::new(), OffsetStrategy::default());
    let page = engine.list_by_cursor(&CursorRequest::first(None)).unwrap();
    assert!(page.is_empty());
    assert!(!page.has_next);
    assert_eq!(page.next_cursor_id, None);
}

#[test]
fn pages_past_the_end_are_empty() {
    for strategy in OffsetStrategy::ALL {
        let engine = ListingEngine::new(board(25), strategy);
        let page = engine.list_by_offset(&offset(99, 20)).unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.page, Some(99));
    }
}

#[test]
fn each_strategy_issues_the_expected_queries() {
    let engine = ListingEngine::new(ProbeStore::new(board(25)), OffsetStrategy::NaiveScan);
    engine.list_by_offset(&offset(1, 10)).unwrap();
    assert_eq!(engine.store().calls(), ["scan_newest"]);

    let engine = ListingEngine::new(ProbeStore::new(board(25)), OffsetStrategy::CoveringLookup);
    engine.list_by_offset(&offset(1, 10)).unwrap();
    assert_eq!(engine.store().calls(), ["scan_newest_ids", "fetch_by_ids"]);

    // No second query when the id window is empty.
    engine.list_by_offset(&offset(9, 10)).unwrap();
    assert_eq!(engine.store().calls(), ["scan_newest_ids"]);

    engine.list_by_cursor(&CursorRequest::first(None)).unwrap();
    assert_eq!(engine.store().calls(), ["scan_before"]);
}

#[test]
fn out_of_range_sizes_are_normalized() {
    for strategy in OffsetStrategy::ALL {
        let engine = ListingEngine::new(board(60), strategy);

        for raw in [0, -1] {
            let page = engine.list_by_offset(&offset(1, raw)).unwrap();
            assert_eq!(page.size, 20);
            assert_eq!(page.count(), 20);
        }

        let page = engine.list_by_offset(&offset(1, 999)).unwrap();
        assert_eq!(page.size, 50);
        assert_eq!(page.count(), 50);
        assert!(page.has_next);

        let page = engine
            .list_by_offset(&OffsetRequest::new(Some(-4), None))
            .unwrap();
        assert_eq!(page.page, Some(1));
    }

    let engine = ListingEngine::new(board(60), OffsetStrategy::default());
    let page = engine
        .list_by_cursor(&CursorRequest::first(Some(999)))
        .unwrap();
    assert_eq!(page.count(), 50);
    assert!(page.has_next);
}

#[test]
fn store_errors_are_returned_unchanged() {
    let naive = ListingEngine::new(ProbeStore::failing("scan_newest"), OffsetStrategy::NaiveScan);
    assert_eq!(
        naive.list_by_offset(&OffsetRequest::default()),
        Err(StoreFault("scan_newest"))
    );

    let covering = ListingEngine::new(
        ProbeStore::failing("scan_newest_ids"),
        OffsetStrategy::CoveringLookup,
    );
    assert_eq!(
        covering.list_by_offset(&OffsetRequest::default()),
        Err(StoreFault("scan_newest_ids"))
    );

    // A failing second query yields no partial page.
    let covering = ListingEngine::new(
        ProbeStore::failing("fetch_by_ids"),
        OffsetStrategy::CoveringLookup,
    );
    assert_eq!(
        covering.list_by_offset(&OffsetRequest::default()),
        Err(StoreFault("fetch_by_ids"))
    );

    let cursor = ListingEngine::new(ProbeStore::failing("scan_before"), OffsetStrategy::default());
    assert_eq!(
        cursor.list(&CursorRequest::first(None).into()),
        Err(StoreFault("scan_before"))
    );
}

#[test]
fn covering_lookup_tolerates_rows_deleted_between_queries() {
    let inner = board(25);
    let victim = everything(&inner)[3];
    let store = ProbeStore {
        delete_before_fetch: Some(victim),
        ..ProbeStore::new(inner)
    };
    let engine = ListingEngine::new(store, OffsetStrategy::CoveringLookup);

    let page = engine.list_by_offset(&OffsetRequest::default()).unwrap();
    assert_eq!(page.count(), 19);
    assert!(page.has_next);
    assert!(!page.ids().contains(&victim));
}

#[test]
fn cursor_pages_survive_concurrent_inserts_and_deletes() {
    let store = board(30);
    let engine = ListingEngine::new(&store, OffsetStrategy::NaiveScan);
    let before = everything(&store);

    let request = CursorRequest::first(Some(10));
    let first_cursor = engine.list_by_cursor(&request).unwrap();
    let first_offset = engine.list_by_offset(&offset(1, 10)).unwrap();
    assert_eq!(first_cursor.ids(), first_offset.ids());

    // Five newer posts arrive and one already-seen post is deleted.
    for sequence in 0..5 {
        store.insert(post_at(5_000, sequence));
    }
    store.remove(before[5]);

    let cursor = first_cursor.next_cursor_id.unwrap();
    let next = engine.list_by_cursor(&request.after(cursor)).unwrap();
    assert_eq!(next.ids(), before[10..20]);

    // The offset page shifted and now repeats rows from the first page.
    let shifted = engine.list_by_offset(&offset(2, 10)).unwrap();
    let seen: HashSet<_> = first_offset.ids().into_iter().collect();
    assert!(shifted.ids().iter().any(|id| seen.contains(id)));
}

#[test]
fn list_dispatches_on_request_form() {
    let engine = ListingEngine::new(board(25), OffsetStrategy::CoveringLookup);

    let by_offset = engine
        .list(&PageRequest::Offset(offset(2, 10)))
        .unwrap();
    assert_eq!(by_offset, engine.list_by_offset(&offset(2, 10)).unwrap());

    let request = CursorRequest::first(Some(10));
    let by_cursor = engine.list(&request.into()).unwrap();
    assert_eq!(by_cursor, engine.list_by_cursor(&request).unwrap());
    assert!(by_cursor.next_cursor_id.is_some());
}

#[test]
fn explicit_strategy_overrides_the_configured_one() {
    let engine = ListingEngine::new(ProbeStore::new(board(25)), OffsetStrategy::NaiveScan);
    engine
        .list_by_offset_with(OffsetStrategy::CoveringLookup, &offset(1, 10))
        .unwrap();
    assert_eq!(engine.store().calls(), ["scan_newest_ids", "fetch_by_ids"]);
    assert_eq!(engine.offset_strategy(), OffsetStrategy::NaiveScan);
}
