use core::{fmt, num::ParseIntError, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};

/// A 64-bit, time-ordered post identifier.
///
/// - 1 bit reserved (always zero, so the value is a non-negative `i64`)
/// - 41 bits timestamp (ms since the allocator's epoch, see [`CUSTOM_EPOCH`])
/// - 10 bits machine tag
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21              12 11             0
///              +--------------+----------------+------------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | machine tag (10) | sequence (12) |
///              +--------------+----------------+------------------+---------------+
///              |<------------ MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// Because the timestamp occupies the most significant bits, numeric order
/// is issue order for identifiers from one allocator, and approximately
/// creation order across allocators.
///
/// [`CUSTOM_EPOCH`]: crate::CUSTOM_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostId {
    id: u64,
}

impl PostId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 10-bit machine tag field. Occupies bits 12
    /// through 21.
    pub const MACHINE_TAG_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the machine tag to its correct position (bit 12).
    pub const MACHINE_TAG_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Packs the three fields into an identifier. Out-of-range inputs are
    /// truncated to their field width.
    pub const fn from_components(timestamp: u64, machine_tag: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let machine_tag = (machine_tag & Self::MACHINE_TAG_MASK) << Self::MACHINE_TAG_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | machine_tag | sequence,
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the machine tag from the packed ID.
    pub const fn machine_tag(&self) -> u64 {
        (self.id >> Self::MACHINE_TAG_SHIFT) & Self::MACHINE_TAG_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    pub const fn max_machine_tag() -> u64 {
        Self::MACHINE_TAG_MASK
    }

    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns true if the current sequence value can be incremented.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    pub const fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.machine_tag(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with sequence reset to zero.
    pub const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.machine_tag(), 0)
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw value, clearing the reserved bit.
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            id: raw & (u64::MAX >> 1),
        }
    }

    /// The identifier as the signed integer stored by SQL databases.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i64(&self) -> i64 {
        // The reserved bit is always clear, so this never wraps.
        self.id as i64
    }

    /// Converts a stored signed value back, rejecting negatives.
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_i64(raw: i64) -> Option<Self> {
        if raw < 0 {
            None
        } else {
            Some(Self { id: raw as u64 })
        }
    }

    /// The wall-clock instant encoded in the timestamp field, given the epoch
    /// the issuing allocator's clock was configured with.
    pub fn created_at(&self, epoch: Duration) -> Option<DateTime<Utc>> {
        let epoch_ms = i64::try_from(epoch.as_millis()).ok()?;
        let ts = i64::try_from(self.timestamp()).ok()?;
        DateTime::from_timestamp_millis(epoch_ms.checked_add(ts)?)
    }

    /// Returns the ID as a zero-padded 19-digit string, which sorts
    /// lexicographically in numeric order.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("machine_tag", &self.machine_tag())
            .field("sequence", &self.sequence())
            .finish()
    }
}

/// Error returned when a string is not a valid [`PostId`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParsePostIdError {
    #[error("invalid post id: {0}")]
    Int(#[from] ParseIntError),
    #[error("post id must not be negative, got {0}")]
    Negative(i64),
}

impl FromStr for PostId {
    type Err = ParsePostIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s.trim().parse()?;
        Self::from_i64(raw).ok_or(ParsePostIdError::Negative(raw))
    }
}

impl From<PostId> for i64 {
    fn from(id: PostId) -> Self {
        id.to_i64()
    }
}

impl TryFrom<i64> for PostId {
    type Error = ParsePostIdError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::from_i64(raw).ok_or(ParsePostIdError::Negative(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks_components() {
        let id = PostId::from_components(1_000, 2, 1);
        assert_eq!(id.timestamp(), 1_000);
        assert_eq!(id.machine_tag(), 2);
        assert_eq!(id.sequence(), 1);
        assert_eq!(id.to_raw(), (1_000 << 22) | (2 << 12) | 1);
    }

    #[test]
    fn max_components_keep_sign_bit_clear() {
        let id = PostId::from_components(
            PostId::max_timestamp(),
            PostId::max_machine_tag(),
            PostId::max_sequence(),
        );
        assert_eq!(id.to_i64(), i64::MAX);
        assert_eq!(id.timestamp(), PostId::max_timestamp());
        assert_eq!(id.machine_tag(), 1023);
        assert_eq!(id.sequence(), 4095);
    }

    #[test]
    fn timestamp_dominates_ordering() {
        let older = PostId::from_components(10, 1023, 4095);
        let newer = PostId::from_components(11, 0, 0);
        assert!(older < newer);
        assert!(older.to_i64() < newer.to_i64());
    }

    #[test]
    fn sequence_helpers() {
        let id = PostId::from_components(5, 3, 0);
        assert!(id.has_sequence_room());
        let next = id.increment_sequence();
        assert_eq!(next.sequence(), 1);
        assert_eq!(next.machine_tag(), 3);

        let full = PostId::from_components(5, 3, PostId::max_sequence());
        assert!(!full.has_sequence_room());
        let rolled = full.rollover_to_timestamp(6);
        assert_eq!(rolled.timestamp(), 6);
        assert_eq!(rolled.sequence(), 0);
        assert_eq!(rolled.machine_tag(), 3);
    }

    #[test]
    fn signed_conversions() {
        let id = PostId::from_components(77, 1, 9);
        assert_eq!(PostId::from_i64(id.to_i64()), Some(id));
        assert_eq!(PostId::from_i64(-1), None);
        assert_eq!(PostId::try_from(-5), Err(ParsePostIdError::Negative(-5)));
        assert_eq!(PostId::from_raw(u64::MAX).to_i64(), i64::MAX);
    }

    #[test]
    fn parses_decimal_strings() {
        let id = PostId::from_components(123, 4, 5);
        let parsed: PostId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!(matches!("abc".parse::<PostId>(), Err(ParsePostIdError::Int(_))));
        assert_eq!("-3".parse::<PostId>(), Err(ParsePostIdError::Negative(-3)));
    }

    #[test]
    fn padded_string_sorts_like_numbers() {
        let small = PostId::from_raw(42);
        let big = PostId::from_components(1, 0, 0);
        assert_eq!(small.to_padded_string().len(), 19);
        assert!(small.to_padded_string() < big.to_padded_string());
    }

    #[test]
    fn created_at_adds_epoch() {
        let epoch = Duration::from_millis(1_735_689_600_000);
        let id = PostId::from_components(1_500, 0, 0);
        let at = id.created_at(epoch).unwrap();
        assert_eq!(at.timestamp_millis(), 1_735_689_601_500);
    }
}
