use core::{fmt, str::FromStr};

/// How offset pages are fetched. Chosen once, when the engine is built.
///
/// Both strategies return identical pages for the same data; they differ in
/// what the store has to read.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OffsetStrategy {
    /// One query: skip `offset` full rows in listing order and read
    /// `size + 1`. Every skipped row is materialized, so cost grows with the
    /// page number.
    #[cfg_attr(feature = "serde", serde(rename = "naive"))]
    NaiveScan,

    /// Two queries: read only identifiers for the window from the ordering
    /// index, then fetch full rows for exactly those identifiers and restore
    /// listing order.
    ///
    /// The queries do not share a snapshot. A row deleted or inserted between
    /// them can make the page shorter than `size`, or shift a row to a
    /// neighbouring page; this is accepted, not corrected.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "covering"))]
    CoveringLookup,
}

impl OffsetStrategy {
    pub const ALL: [Self; 2] = [Self::NaiveScan, Self::CoveringLookup];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NaiveScan => "naive",
            Self::CoveringLookup => "covering",
        }
    }
}

impl fmt::Display for OffsetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown offset strategy `{0}` (expected `naive` or `covering`)")]
pub struct ParseStrategyError(String);

impl FromStr for OffsetStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive" | "naive-scan" | "offset" => Ok(Self::NaiveScan),
            "covering" | "covering-lookup" | "two-step" => Ok(Self::CoveringLookup),
            _ => Err(ParseStrategyError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("naive".parse(), Ok(OffsetStrategy::NaiveScan));
        assert_eq!(" Covering ".parse(), Ok(OffsetStrategy::CoveringLookup));
        assert_eq!("two-step".parse(), Ok(OffsetStrategy::CoveringLookup));
        assert!("cursor".parse::<OffsetStrategy>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for strategy in OffsetStrategy::ALL {
            assert_eq!(strategy.to_string().parse(), Ok(strategy));
        }
        assert_eq!(OffsetStrategy::default(), OffsetStrategy::CoveringLookup);
    }
}
