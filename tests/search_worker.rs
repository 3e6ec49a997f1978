use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use fichas::error::{FichasError, Result};
use fichas::gateway::{Gateway, Transport};
use fichas::render::protocol::{SearchCommand, SearchResponse};
use fichas::search::worker::search_worker_loop;
use fichas::search::{Query, SortOrder};

const TIMEOUT_MS: u64 = 2_000;

/// Serves one payload; each call waits for the next scripted delay first.
struct ScriptedTransport {
    payload: Value,
    delays: Mutex<VecDeque<Duration>>,
    calls: Mutex<Vec<Url>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_json(&self, url: Url) -> Result<Value> {
        self.calls.lock().push(url);
        let delay = self.delays.lock().pop_front().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Ok(self.payload.clone())
    }
}

struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn fetch_json(&self, _url: Url) -> Result<Value> {
        Err(FichasError::transport("connection refused"))
    }
}

fn sample_records() -> Value {
    json!([
        {"numero_entrada": "3", "estado_animal": "Cadáver", "especie_comun": "Erizo"},
        {"numero_entrada": "12", "estado_animal": "Animal vivo", "especie_comun": "Búho real"},
        {"numero_entrada": "1", "estado_animal": "Animal vivo", "municipio": "Córdoba"},
        {"numero_entrada": "5", "estado_animal": "Animal vivo", "especie_comun": "Buho chico"},
    ])
}

async fn next_response(rx: &mut mpsc::Receiver<SearchResponse>) -> SearchResponse {
    timeout(Duration::from_millis(TIMEOUT_MS), rx.recv())
        .await
        .expect("worker response timed out")
        .expect("worker channel closed unexpectedly")
}

fn spawn_worker(
    transport: Arc<dyn Transport>,
) -> (
    mpsc::Sender<SearchCommand>,
    mpsc::Receiver<SearchResponse>,
    tokio::task::JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(4);
    let (resp_tx, resp_rx) = mpsc::channel(4);
    let base = Url::parse("https://gateway.example.test/exec").expect("base url");
    let gateway = Gateway::new(base, transport);

    let worker = tokio::spawn(search_worker_loop(cmd_rx, resp_tx, gateway));
    (cmd_tx, resp_rx, worker)
}

fn scripted(delays: &[u64]) -> Arc<ScriptedTransport> {
    Arc::new(ScriptedTransport {
        payload: sample_records(),
        delays: Mutex::new(delays.iter().map(|ms| Duration::from_millis(*ms)).collect()),
        calls: Mutex::new(Vec::new()),
    })
}

fn entries(response: &SearchResponse) -> Vec<String> {
    match response {
        SearchResponse::Completed { records, .. } => records
            .iter()
            .map(|r| r.entry_number().unwrap_or_default().to_string())
            .collect(),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn empty_query_returns_everything_newest_first() {
    let transport = scripted(&[]);
    let (cmd_tx, mut resp_rx, worker) = spawn_worker(transport.clone());

    cmd_tx
        .send(SearchCommand::Execute {
            request_id: 1,
            query: Query::default(),
        })
        .await
        .unwrap();

    let response = next_response(&mut resp_rx).await;
    assert_eq!(response.request_id(), 1);
    assert_eq!(entries(&response), vec!["12", "5", "3", "1"]);
    match response {
        SearchResponse::Completed { fetched, .. } => assert_eq!(fetched, 4),
        other => panic!("unexpected response: {other:?}"),
    }
    assert_eq!(transport.calls.lock()[0].query(), Some("getAllData=true"));

    cmd_tx.send(SearchCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn accent_insensitive_query_in_oldest_order() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker(scripted(&[]));

    cmd_tx
        .send(SearchCommand::Execute {
            request_id: 7,
            query: Query::new("  BÚHO ", SortOrder::OldestFirst),
        })
        .await
        .unwrap();

    assert_eq!(entries(&next_response(&mut resp_rx).await), vec!["5", "12"]);

    cmd_tx.send(SearchCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn numeric_query_prefers_exact_entry() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker(scripted(&[]));

    cmd_tx
        .send(SearchCommand::Execute {
            request_id: 1,
            query: Query::new("1", SortOrder::NewestFirst),
        })
        .await
        .unwrap();

    // "1" is entry 1 exactly; "12" is not a substring match of any other field
    assert_eq!(entries(&next_response(&mut resp_rx).await), vec!["1"]);

    cmd_tx.send(SearchCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_request_does_not_hold_back_newer_one() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker(scripted(&[500, 10]));

    for (request_id, text) in [(1, "erizo"), (2, "córdoba")] {
        cmd_tx
            .send(SearchCommand::Execute {
                request_id,
                query: Query::new(text, SortOrder::NewestFirst),
            })
            .await
            .unwrap();
    }

    let first = next_response(&mut resp_rx).await;
    let second = next_response(&mut resp_rx).await;
    assert_eq!(first.request_id(), 2);
    assert_eq!(entries(&first), vec!["1"]);
    assert_eq!(second.request_id(), 1);
    assert_eq!(entries(&second), vec!["3"]);

    cmd_tx.send(SearchCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn transport_failure_becomes_error_response() {
    let (cmd_tx, mut resp_rx, worker) = spawn_worker(Arc::new(FailingTransport));

    cmd_tx
        .send(SearchCommand::Execute {
            request_id: 9,
            query: Query::default(),
        })
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        SearchResponse::Error { request_id, error } => {
            assert_eq!(request_id, 9);
            assert!(error.is_load_failure());
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(SearchCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn malformed_payload_is_a_shape_error() {
    let transport = Arc::new(ScriptedTransport {
        payload: json!({"error": "script not shared"}),
        delays: Mutex::new(VecDeque::new()),
        calls: Mutex::new(Vec::new()),
    });
    let (cmd_tx, mut resp_rx, worker) = spawn_worker(transport);

    cmd_tx
        .send(SearchCommand::Execute {
            request_id: 1,
            query: Query::default(),
        })
        .await
        .unwrap();

    match next_response(&mut resp_rx).await {
        SearchResponse::Error { error, .. } => {
            assert!(matches!(error, FichasError::Shape { .. }))
        }
        other => panic!("unexpected response: {other:?}"),
    }

    cmd_tx.send(SearchCommand::Shutdown).await.unwrap();
    worker.await.unwrap();
}
