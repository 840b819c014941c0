use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use trendboard::{IdAllocator, Post, TimeSource};
use trendboard_sqlite::SqlitePostStore;

use crate::telemetry;

/// Distinct authors cycled through by synthetic posts.
const AUTHORS: u64 = 1_000;

/// Synthetic posts are spread over the day before `now`.
const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Serialize)]
pub struct SeedReport {
    pub removed: usize,
    pub inserted: u64,
    pub batches: u64,
    pub elapsed_ms: f64,
}

/// The `n`th synthetic post (1-based).
pub fn synthetic_post(n: u64, id: trendboard::PostId, now: DateTime<Utc>) -> Post {
    let age = i64::try_from(n % SECONDS_PER_DAY)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or_default();
    Post {
        id,
        author_id: i64::try_from(n.saturating_sub(1) % AUTHORS + 1).unwrap_or(1),
        title: format!("title-{n}"),
        content: format!("content-{n}"),
        created_at: now - age,
    }
}

/// Empties the table and inserts `total` synthetic posts, `batch_size` per
/// transaction, drawing every id from `allocator`.
#[tracing::instrument(level = "info", skip(store, allocator, now))]
pub fn seed<T: TimeSource>(
    store: &SqlitePostStore,
    allocator: &IdAllocator<T>,
    total: u64,
    batch_size: usize,
    now: DateTime<Utc>,
) -> anyhow::Result<SeedReport> {
    let started = Instant::now();
    let removed = store.truncate().context("failed to clear posts")?;
    tracing::info!(removed, "cleared posts");

    let mut inserted = 0;
    let mut batches = 0;
    let mut batch = Vec::with_capacity(batch_size);

    for n in 1..=total {
        let id = allocator.next_id().context("failed to allocate post id")?;
        batch.push(synthetic_post(n, id, now));

        if batch.len() == batch_size || n == total {
            store
                .insert_batch(&batch)
                .with_context(|| format!("failed to insert batch ending at post {n}"))?;
            inserted += batch.len() as u64;
            batches += 1;
            telemetry::increment_ids_issued(batch.len() as u64);
            batch.clear();

            tracing::info!(
                inserted,
                total,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "seeded batch"
            );
        }
    }

    Ok(SeedReport {
        removed,
        inserted,
        batches,
        elapsed_ms: started.elapsed().as_secs_f64() * 1_000.0,
    })
}
