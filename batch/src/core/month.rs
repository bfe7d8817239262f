//! Month filter for date directory names.

use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};
use serde::{Serialize, Serializer};

/// Byte range of the month inside a `YYYYMMDD...` directory name.
const MONTH_OFFSET: std::ops::Range<usize> = 4..6;

/// A validated two-digit month token (`"01"` through `"12"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(u8);

impl Month {
    pub fn new(month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(month))
    }

    /// Returns true when `name[4..6]` spells this month.
    ///
    /// Names shorter than six bytes, or whose month slice does not fall on
    /// character boundaries, never match.
    pub fn matches_dir_name(self, name: &str) -> bool {
        name.get(MONTH_OFFSET)
            .is_some_and(|token| token == self.to_string())
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || anyhow!("invalid month {s:?} (expected 01..12)");
        if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u8 = s.parse().map_err(|_| invalid())?;
        Month::new(value).ok_or_else(invalid)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
