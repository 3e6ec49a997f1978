//! Protocol definitions shared between the render coordinator and the search worker.

use crate::error::FichasError;
use crate::record::Record;
use crate::search::Query;

/// Identifier attached to worker requests so responses can be correlated.
///
/// Identifiers increase monotonically; only the response to the most recently
/// issued search may update the view.
pub type RequestId = u64;

/// Commands sent from the render coordinator to the search worker.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCommand {
    /// Re-fetch every record, then filter and order them for `query`
    Execute { request_id: RequestId, query: Query },
    Shutdown,
}

/// Responses emitted by the search worker back to the coordinator.
#[derive(Debug)]
pub enum SearchResponse {
    Completed {
        request_id: RequestId,
        query: Query,
        /// Matching records, already ordered
        records: Vec<Record>,
        /// Size of the full record set the matches came from
        fetched: usize,
    },
    Error {
        request_id: RequestId,
        error: FichasError,
    },
}

impl SearchResponse {
    pub fn request_id(&self) -> RequestId {
        match self {
            SearchResponse::Completed { request_id, .. }
            | SearchResponse::Error { request_id, .. } => *request_id,
        }
    }
}
