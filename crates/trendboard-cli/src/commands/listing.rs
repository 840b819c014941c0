use std::{collections::HashSet, time::Instant};

use serde::Serialize;
use trendboard::{CursorRequest, ListingEngine, OffsetRequest, OffsetStrategy, PageResult};
use trendboard_sqlite::{SqlitePostStore, StoreError};

use crate::telemetry;

pub type Engine = ListingEngine<SqlitePostStore>;

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}

pub fn offset_page(engine: &Engine, request: &OffsetRequest) -> Result<PageResult, StoreError> {
    let started = Instant::now();
    let page = engine.list_by_offset(request)?;
    telemetry::record_list(engine.offset_strategy().as_str(), elapsed_ms(started));
    Ok(page)
}

pub fn cursor_page(engine: &Engine, request: &CursorRequest) -> Result<PageResult, StoreError> {
    let started = Instant::now();
    let page = engine.list_by_cursor(request)?;
    telemetry::record_list("cursor", elapsed_ms(started));
    Ok(page)
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WalkReport {
    pub size: usize,
    pub pages: u64,
    pub rows: u64,
    pub duplicates: u64,
    pub elapsed_ms: f64,
    pub slowest_page_ms: f64,
}

/// Follows cursors from the newest post to the oldest.
#[tracing::instrument(level = "info", skip(engine))]
pub fn walk(engine: &Engine, size: Option<i64>) -> Result<WalkReport, StoreError> {
    let started = Instant::now();
    let mut request = CursorRequest::first(size);
    let mut seen = HashSet::new();
    let mut report = WalkReport {
        size: request.size().get(),
        pages: 0,
        rows: 0,
        duplicates: 0,
        elapsed_ms: 0.0,
        slowest_page_ms: 0.0,
    };

    loop {
        let page_started = Instant::now();
        let page = cursor_page(engine, &request)?;
        report.slowest_page_ms = report.slowest_page_ms.max(elapsed_ms(page_started));
        report.pages += 1;

        for item in &page.items {
            report.rows += 1;
            if !seen.insert(item.id) {
                report.duplicates += 1;
            }
        }

        if report.pages % 1_000 == 0 {
            tracing::info!(pages = report.pages, rows = report.rows, "walking");
        }

        match page.next_cursor_id {
            Some(cursor) => request = request.after(cursor),
            None => break,
        }
    }

    report.elapsed_ms = elapsed_ms(started);
    Ok(report)
}

#[derive(Debug, Serialize)]
pub struct StrategyTiming {
    pub strategy: OffsetStrategy,
    pub count: usize,
    pub has_next: bool,
    pub best_ms: f64,
    pub mean_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub page: u32,
    pub size: usize,
    pub agree: bool,
    pub strategies: Vec<StrategyTiming>,
}

/// Runs every offset strategy `rounds` times on the same page.
#[tracing::instrument(level = "info", skip(engine, request), fields(page = request.page()))]
pub fn compare(
    engine: &Engine,
    request: &OffsetRequest,
    rounds: u32,
) -> Result<CompareReport, StoreError> {
    let mut strategies = Vec::with_capacity(OffsetStrategy::ALL.len());
    let mut pages = Vec::with_capacity(OffsetStrategy::ALL.len());

    for strategy in OffsetStrategy::ALL {
        let mut best_ms = f64::INFINITY;
        let mut total_ms = 0.0;
        let mut last = None;

        for _ in 0..rounds.max(1) {
            let started = Instant::now();
            let page = engine.list_by_offset_with(strategy, request)?;
            let took = elapsed_ms(started);
            telemetry::record_list(strategy.as_str(), took);
            best_ms = best_ms.min(took);
            total_ms += took;
            last = Some(page);
        }

        if let Some(page) = last {
            strategies.push(StrategyTiming {
                strategy,
                count: page.count(),
                has_next: page.has_next,
                best_ms,
                mean_ms: total_ms / f64::from(rounds.max(1)),
            });
            pages.push(page);
        }
    }

    let agree = pages.windows(2).all(|pair| pair[0] == pair[1]);
    if !agree {
        tracing::warn!(page = request.page(), "offset strategies returned different pages");
    }

    Ok(CompareReport {
        page: request.page(),
        size: request.size().get(),
        agree,
        strategies,
    })
}
