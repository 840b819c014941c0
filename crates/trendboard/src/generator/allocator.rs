use std::{cmp::Ordering, sync::Arc};

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::Poll,
    id::PostId,
    time::TimeSource,
};

/// The mutable half of an allocator: the last identifier it issued, or
/// `None` before the first allocation.
pub(crate) type State = Option<PostId>;

/// A lock-based post identifier allocator, safe to share across threads.
///
/// Every allocation reads the clock and updates the last timestamp and
/// sequence inside one critical section, so two callers can never observe
/// the same `(timestamp, sequence)` pair. Cloning an allocator clones the
/// handle, not the state: all clones draw from the same sequence.
///
/// Run exactly one allocator per machine tag. Instances with distinct tags
/// never collide, with no coordination beyond configuring the tags.
///
/// # Example
/// ```
/// use trendboard::{IdAllocator, SystemClock};
///
/// let allocator = IdAllocator::new(7, SystemClock::default()).unwrap();
/// let first = allocator.next_id().unwrap();
/// let second = allocator.next_id().unwrap();
///
/// assert!(first < second);
/// assert_eq!(first.machine_tag(), 7);
/// ```
pub struct IdAllocator<T>
where
    T: TimeSource,
{
    machine_tag: u64,
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<State>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<State>>,
    time: T,
}

impl<T> IdAllocator<T>
where
    T: TimeSource,
{
    /// Creates an allocator for `machine_tag` that has not issued anything
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineTag`] if the tag does not fit in 10
    /// bits (`0..=1023`). This is a configuration error and should abort
    /// startup.
    pub fn new(machine_tag: u64, time: T) -> Result<Self> {
        Self::build(machine_tag, None, time)
    }

    /// Creates an allocator that resumes from a known last timestamp and
    /// sequence.
    ///
    /// Useful when restarting close to a previous run whose last issued
    /// identifier is known, and for driving the allocator into edge states.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineTag`] as [`Self::new`] does.
    pub fn from_components(
        last_timestamp: u64,
        machine_tag: u64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        let last = PostId::from_components(
            last_timestamp,
            machine_tag,
            sequence.min(PostId::max_sequence()),
        );
        Self::build(machine_tag, Some(last), time)
    }

    fn build(machine_tag: u64, state: State, time: T) -> Result<Self> {
        if machine_tag > PostId::max_machine_tag() {
            return Err(Error::InvalidMachineTag {
                machine_tag,
                max: PostId::max_machine_tag(),
            });
        }
        Ok(Self {
            machine_tag,
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(state))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(state)),
            time,
        })
    }

    pub fn machine_tag(&self) -> u64 {
        self.machine_tag
    }

    /// The time source this allocator reads.
    pub fn time(&self) -> &T {
        &self.time
    }

    /// Issues the next identifier, spinning on the clock if the current
    /// millisecond's sequence budget is spent.
    ///
    /// The spin only happens after 4096 allocations within one millisecond
    /// and lasts until the clock crosses into the next one.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued identifier.
    /// - [`Error::TimestampOverflow`] once the epoch-relative time no longer
    ///   fits in 41 bits.
    pub fn next_id(&self) -> Result<PostId> {
        self.next_id_with(|_| core::hint::spin_loop())
    }

    /// Issues the next identifier, calling `backoff` with the suggested wait
    /// (in milliseconds) each time the sequence is exhausted.
    ///
    /// The lock is released while `backoff` runs, so other callers keep
    /// making progress; `std::thread::yield_now` or a short sleep trade
    /// latency for less CPU burn.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn next_id_with(&self, mut backoff: impl FnMut(u64)) -> Result<PostId> {
        loop {
            match self.poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => backoff(yield_for),
            }
        }
    }

    /// Attempts to issue an identifier without waiting.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: a new ID is available
    /// - `Ok(Poll::Pending { yield_for })`: the sequence is exhausted for the
    ///   current millisecond
    /// - `Err(e)`: the clock regressed or overflowed the timestamp field
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`]. On error the state is left untouched.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(machine_tag = self.machine_tag)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut state = self.state.lock();
        // Read under the lock: a reading taken before acquiring it could be
        // older than a timestamp another caller just recorded.
        let now = self.time.current_millis();

        if now > PostId::max_timestamp() {
            return Err(Error::TimestampOverflow {
                timestamp: now,
                max: PostId::max_timestamp(),
            });
        }

        let Some(last) = *state else {
            let id = PostId::from_components(now, self.machine_tag, 0);
            *state = Some(id);
            return Ok(Poll::Ready { id });
        };

        match now.cmp(&last.timestamp()) {
            Ordering::Equal => {
                if last.has_sequence_room() {
                    let id = last.increment_sequence();
                    *state = Some(id);
                    Ok(Poll::Ready { id })
                } else {
                    Ok(Poll::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                let id = last.rollover_to_timestamp(now);
                *state = Some(id);
                Ok(Poll::Ready { id })
            }
            Ordering::Less => Err(Self::cold_clock_behind(last.timestamp(), now)),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(last: u64, now: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(last, now, "clock moved backwards, refusing to issue identifiers");
        Error::ClockRegression { last, now }
    }
}

impl<T> Clone for IdAllocator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            machine_tag: self.machine_tag,
            state: Arc::clone(&self.state),
            time: self.time.clone(),
        }
    }
}
