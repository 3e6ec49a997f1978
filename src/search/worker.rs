use crate::error::Result;
use crate::gateway::Gateway;
use crate::render::protocol::{RequestId, SearchCommand, SearchResponse};
use crate::search::{search, sort, Query};
use log::debug;
use tokio::sync::mpsc::{Receiver, Sender};

/// Run the search worker processing commands from the coordinator.
///
/// Every search re-fetches the complete record set from the gateway and runs
/// in its own task, so a slow request never holds back a newer one. Responses
/// may therefore arrive out of order; the coordinator sorts that out with the
/// request id.
pub async fn search_worker_loop(
    mut rx: Receiver<SearchCommand>,
    tx: Sender<SearchResponse>,
    gateway: Gateway,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            SearchCommand::Execute { request_id, query } => {
                let gateway = gateway.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = match execute_search(&gateway, request_id, query).await {
                        Ok(response) => response,
                        Err(error) => SearchResponse::Error { request_id, error },
                    };
                    if tx.send(response).await.is_err() {
                        debug!("request {}: coordinator gone", request_id);
                    }
                });
            }
            SearchCommand::Shutdown => break,
        }
    }
}

async fn execute_search(
    gateway: &Gateway,
    request_id: RequestId,
    query: Query,
) -> Result<SearchResponse> {
    let all = gateway.fetch_all().await?;
    let records = sort(search(&all, &query.text), query.order)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    debug!(
        "request {}: {} of {} records match '{}'",
        request_id,
        records.len(),
        all.len(),
        query.text
    );

    Ok(SearchResponse::Completed {
        request_id,
        query,
        records,
        fetched: all.len(),
    })
}
