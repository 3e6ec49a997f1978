//! Search pipeline: free-text filtering, entry-number ordering, and the
//! background worker that runs both against freshly fetched records.

pub mod filter;
pub mod sort;
pub mod worker;

pub use filter::{matches, search};
pub use sort::{sort, SortOrder};
pub use worker::search_worker_loop;

/// Free-text query plus the requested ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub order: SortOrder,
}

impl Query {
    pub fn new(text: impl Into<String>, order: SortOrder) -> Self {
        Self {
            text: text.into(),
            order,
        }
    }
}
