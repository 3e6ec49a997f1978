//! Entry-number ordering of filtered records.

use crate::error::{FichasError, Result};
use crate::record::Record;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Requested result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Highest entry number first
    #[default]
    NewestFirst,
    /// Lowest entry number first
    OldestFirst,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::NewestFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::NewestFirst,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "newest first",
            SortOrder::OldestFirst => "oldest first",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortOrder {
    type Err = FichasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "newest-first" | "desc" | "entrada-desc" => Ok(SortOrder::NewestFirst),
            "oldest" | "oldest-first" | "asc" | "entrada-asc" => Ok(SortOrder::OldestFirst),
            other => Err(FichasError::invalid_input(format!(
                "unknown sort order '{}' (expected 'newest' or 'oldest')",
                other
            ))),
        }
    }
}

/// Order `records` by parsed entry number. Equal keys keep their relative order.
pub fn sort<'a>(mut records: Vec<&'a Record>, order: SortOrder) -> Vec<&'a Record> {
    match order {
        SortOrder::NewestFirst => records.sort_by_key(|r| Reverse(r.entry_key())),
        SortOrder::OldestFirst => records.sort_by_key(|r| r.entry_key()),
    }
    records
}
