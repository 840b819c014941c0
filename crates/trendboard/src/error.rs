/// A result type defaulting to the allocator's [`Error`].
///
/// Listing operations do not use this alias: they return the backing store's
/// own error type unchanged.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors the identifier allocator can produce.
///
/// None of these are retryable. An invalid machine tag is a configuration
/// mistake that should abort startup; a clock regression or an exhausted
/// timestamp field means the allocator can no longer guarantee uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The machine tag does not fit in the 10-bit machine field.
    #[error("machine tag {machine_tag} is out of range (expected 0..={max})")]
    InvalidMachineTag {
        /// The rejected tag.
        machine_tag: u64,
        /// The largest accepted tag.
        max: u64,
    },

    /// The clock reported a millisecond earlier than the last one used.
    ///
    /// Issuing an identifier now could repeat one that was already handed
    /// out, so the allocator refuses instead of waiting.
    #[error("clock moved backwards: last issued at {last}ms, clock now reads {now}ms")]
    ClockRegression {
        /// Millisecond (relative to the epoch) of the last issued identifier.
        last: u64,
        /// Millisecond the clock returned.
        now: u64,
    },

    /// The elapsed time since the epoch no longer fits in 41 bits.
    #[error("timestamp {timestamp}ms exceeds the {max}ms the identifier layout can hold")]
    TimestampOverflow {
        /// Millisecond the clock returned.
        timestamp: u64,
        /// The largest representable timestamp.
        max: u64,
    },
}
