use chrono::{DateTime, Utc};
use serde::Serialize;
use trendboard::{IdAllocator, PostId, SystemClock};

use crate::telemetry;

/// One issued identifier and its decoded fields.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IdReport {
    pub id: PostId,
    pub padded: String,
    pub timestamp: u64,
    pub machine_tag: u64,
    pub sequence: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl IdReport {
    pub fn new(id: PostId, clock: &SystemClock) -> Self {
        Self {
            id,
            padded: id.to_padded_string(),
            timestamp: id.timestamp(),
            machine_tag: id.machine_tag(),
            sequence: id.sequence(),
            created_at: id.created_at(clock.epoch()),
        }
    }
}

/// Issues `count` identifiers.
pub fn next_ids(
    allocator: &IdAllocator<SystemClock>,
    count: u64,
) -> trendboard::Result<Vec<IdReport>> {
    let reports = (0..count)
        .map(|_| {
            allocator
                .next_id()
                .map(|id| IdReport::new(id, allocator.time()))
        })
        .collect::<trendboard::Result<Vec<_>>>()?;
    telemetry::increment_ids_issued(count);
    Ok(reports)
}
