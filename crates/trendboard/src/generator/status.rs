use crate::id::PostId;

/// The outcome of a single non-blocking allocation attempt.
///
/// - [`Poll::Ready`] carries a freshly issued identifier.
/// - [`Poll::Pending`] means the 4096 sequence values of the current
///   millisecond are used up; try again once `yield_for` milliseconds have
///   passed.
///
/// # Example
///
/// ```
/// use trendboard::{IdAllocator, Poll, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let allocator = IdAllocator::new(1, FixedTime).unwrap();
/// match allocator.poll_id().unwrap() {
///     Poll::Ready { id } => println!("ID: {}", id.timestamp()),
///     Poll::Pending { yield_for } => println!("Back off for {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: PostId,
    },
    /// The sequence is exhausted for the current millisecond.
    Pending {
        /// Milliseconds to wait before polling again.
        yield_for: u64,
    },
}
