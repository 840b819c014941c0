pub mod ids;
pub mod listing;
pub mod seed;

use std::io::Write;

use anyhow::Context;
use serde::Serialize;
use trendboard::{CursorRequest, IdAllocator, ListingEngine, OffsetRequest, SystemClock};
use trendboard_sqlite::SqlitePostStore;

use crate::config::{Command, Config};

/// Runs the configured subcommand, writing its result to `out` as JSON.
pub fn run(config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    match config.command {
        Command::Seed { total, batch_size } => {
            let store = open_store(config)?;
            let allocator = allocator(config)?;
            let report = seed::seed(&store, &allocator, total, batch_size, chrono::Utc::now())?;
            tracing::info!(
                inserted = report.inserted,
                elapsed_ms = report.elapsed_ms,
                "seed complete"
            );
            emit(out, &report)
        }
        Command::List { page, size } => {
            let engine = ListingEngine::new(open_store(config)?, config.offset_strategy);
            let page = listing::offset_page(&engine, &OffsetRequest::new(page, size))?;
            emit(out, &page)
        }
        Command::Cursor { cursor_id, size } => {
            let engine = ListingEngine::new(open_store(config)?, config.offset_strategy);
            let page = listing::cursor_page(&engine, &CursorRequest::new(cursor_id, size))?;
            emit(out, &page)
        }
        Command::Walk { size } => {
            let engine = ListingEngine::new(open_store(config)?, config.offset_strategy);
            let report = listing::walk(&engine, size)?;
            if report.duplicates > 0 {
                tracing::warn!(duplicates = report.duplicates, "cursor walk saw duplicates");
            }
            emit(out, &report)
        }
        Command::Compare { page, size, rounds } => {
            let engine = ListingEngine::new(open_store(config)?, config.offset_strategy);
            let report = listing::compare(&engine, &OffsetRequest::new(page, size), rounds)?;
            emit(out, &report)
        }
        Command::NextId { count } => {
            let allocator = allocator(config)?;
            for report in ids::next_ids(&allocator, count)? {
                emit(out, &report)?;
            }
            Ok(())
        }
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqlitePostStore> {
    SqlitePostStore::open(&config.database, config.pool_size)
        .with_context(|| format!("failed to open {}", config.database.display()))
}

fn allocator(config: &Config) -> anyhow::Result<IdAllocator<SystemClock>> {
    IdAllocator::new(config.machine_tag, SystemClock::default())
        .context("invalid machine tag")
}

fn emit(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
