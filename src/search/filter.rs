//! Free-text record filtering.

use crate::record::Record;
use crate::text::normalize;

/// Return the records matching `query`, in their original order.
///
/// A blank query matches everything. Otherwise a record matches when the
/// query is all digits and equals its entry number exactly, or when the
/// normalized query is a substring of any normalized searchable field.
pub fn search<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return records.iter().collect();
    }

    let needle = Needle::new(trimmed);
    records
        .iter()
        .filter(|record| needle.matches(record))
        .collect()
}

/// Single-record form of the predicate used by [`search`].
pub fn matches(record: &Record, query: &str) -> bool {
    let trimmed = query.trim();
    trimmed.is_empty() || Needle::new(trimmed).matches(record)
}

/// Query text prepared once per search.
struct Needle<'q> {
    exact_entry: Option<&'q str>,
    normalized: String,
}

impl<'q> Needle<'q> {
    fn new(trimmed: &'q str) -> Self {
        let numeric = trimmed.bytes().all(|b| b.is_ascii_digit());
        Self {
            exact_entry: numeric.then_some(trimmed),
            normalized: normalize(trimmed),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        if let (Some(wanted), Some(entry)) = (self.exact_entry, record.entry_number()) {
            if entry == wanted {
                return true;
            }
        }

        record
            .searchable_fields()
            .into_iter()
            .flatten()
            .any(|field| normalize(field).contains(&self.normalized))
    }
}
