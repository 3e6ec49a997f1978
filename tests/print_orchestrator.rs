use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use fichas::error::{FichasError, Result};
use fichas::gateway::{Gateway, Transport};
use fichas::print::{
    BatchSettings, DocumentView, ManualScheduler, Notice, Notifier, PrintKind, PrintOrchestrator,
    Viewer,
};

struct CannedTransport {
    reply: Value,
    calls: Mutex<Vec<Url>>,
}

#[async_trait]
impl Transport for CannedTransport {
    async fn fetch_json(&self, url: Url) -> Result<Value> {
        self.calls.lock().push(url);
        Ok(self.reply.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Open(String, Duration),
    Print(String, Duration),
}

/// Viewer that stamps every open and print with the virtual clock.
struct ClockedViewer {
    clock: Arc<ManualScheduler>,
    events: Arc<Mutex<Vec<Event>>>,
    blocked: bool,
}

struct ClockedView {
    url: Url,
    clock: Arc<ManualScheduler>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl DocumentView for ClockedView {
    fn url(&self) -> &Url {
        &self.url
    }

    fn print(&self) -> Result<()> {
        self.events
            .lock()
            .push(Event::Print(self.url.to_string(), self.clock.now()));
        Ok(())
    }
}

impl Viewer for ClockedViewer {
    fn open(&self, url: &Url) -> Option<Box<dyn DocumentView>> {
        if self.blocked {
            return None;
        }
        self.events
            .lock()
            .push(Event::Open(url.to_string(), self.clock.now()));
        Some(Box::new(ClockedView {
            url: url.clone(),
            clock: Arc::clone(&self.clock),
            events: Arc::clone(&self.events),
        }))
    }
}

struct Fixture {
    orchestrator: PrintOrchestrator,
    transport: Arc<CannedTransport>,
    clock: Arc<ManualScheduler>,
    events: Arc<Mutex<Vec<Event>>>,
    notices: mpsc::UnboundedReceiver<Notice>,
}

impl Fixture {
    fn new(reply: Value, blocked: bool) -> Self {
        let transport = Arc::new(CannedTransport {
            reply,
            calls: Mutex::new(Vec::new()),
        });
        let base = Url::parse("https://gateway.example.test/exec").unwrap();
        let gateway = Gateway::new(base, transport.clone());

        let clock = Arc::new(ManualScheduler::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let viewer = Arc::new(ClockedViewer {
            clock: Arc::clone(&clock),
            events: Arc::clone(&events),
            blocked,
        });
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let notifier: Arc<dyn Notifier> = Arc::new(notice_tx);

        let orchestrator = PrintOrchestrator::new(
            gateway,
            viewer,
            clock.clone(),
            notifier,
            BatchSettings::default(),
        );

        Self {
            orchestrator,
            transport,
            clock,
            events,
            notices,
        }
    }

    fn drain_notices(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }
}

fn ids(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|i| i.to_string()).collect()
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[tokio::test]
async fn single_print_without_url_is_not_found() {
    let fx = Fixture::new(json!({"url": null}), false);

    let err = fx
        .orchestrator
        .print_single("12", Some(PrintKind::Clinical))
        .await
        .unwrap_err();

    assert!(matches!(err, FichasError::NotFound { ref entry } if entry == "12"));
    assert!(fx.events.lock().is_empty());
    assert_eq!(
        fx.transport.calls.lock()[0].query(),
        Some("getFichaManual=12&tipo=clinica")
    );
}

#[tokio::test]
async fn single_print_opens_the_returned_document() {
    let fx = Fixture::new(json!({"url": "https://docs.example.test/d/7"}), false);

    let url = fx.orchestrator.print_single(" 7 ", None).await.unwrap();

    assert_eq!(url.as_str(), "https://docs.example.test/d/7");
    assert_eq!(
        *fx.events.lock(),
        vec![Event::Open("https://docs.example.test/d/7".into(), Duration::ZERO)]
    );
    assert_eq!(fx.transport.calls.lock()[0].query(), Some("getPrintUrl=7"));
}

#[tokio::test]
async fn single_print_reports_blocked_viewer() {
    let fx = Fixture::new(json!({"url": "https://docs.example.test/d/7"}), true);

    let err = fx
        .orchestrator
        .print_single("7", Some(PrintKind::CaptiveBirth))
        .await
        .unwrap_err();

    assert!(matches!(err, FichasError::PopupBlocked { .. }));
    assert_eq!(
        fx.transport.calls.lock()[0].query(),
        Some("getFichaManual=7&tipo=cria_cautividad")
    );
}

#[tokio::test]
async fn single_print_needs_an_entry() {
    let fx = Fixture::new(Value::Null, false);

    let err = fx.orchestrator.print_single("  ", None).await.unwrap_err();

    assert!(matches!(err, FichasError::InvalidInput { .. }));
    assert!(fx.transport.calls.lock().is_empty());
}

/// Viewer whose launcher takes a while to return, like a cold browser start.
struct SlowViewer(Duration);

struct PlainView(Url);

impl DocumentView for PlainView {
    fn url(&self) -> &Url {
        &self.0
    }

    fn print(&self) -> Result<()> {
        Ok(())
    }
}

impl Viewer for SlowViewer {
    fn open(&self, url: &Url) -> Option<Box<dyn DocumentView>> {
        std::thread::sleep(self.0);
        Some(Box::new(PlainView(url.clone())))
    }
}

#[tokio::test]
async fn slow_viewer_does_not_stall_the_runtime() {
    let transport = Arc::new(CannedTransport {
        reply: json!({"url": "https://docs.example.test/d/7"}),
        calls: Mutex::new(Vec::new()),
    });
    let base = Url::parse("https://gateway.example.test/exec").unwrap();
    let (notice_tx, _notices) = mpsc::unbounded_channel();
    let notifier: Arc<dyn Notifier> = Arc::new(notice_tx);
    let orchestrator = PrintOrchestrator::new(
        Gateway::new(base, transport),
        Arc::new(SlowViewer(Duration::from_millis(400))),
        Arc::new(ManualScheduler::new()),
        notifier,
        BatchSettings::default(),
    );

    let ticker = async {
        let mut worst = Duration::ZERO;
        let mut last = Instant::now();
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            worst = worst.max(last.elapsed());
            last = Instant::now();
        }
        worst
    };

    let (opened, worst_gap) = tokio::join!(orchestrator.print_single("7", None), ticker);

    assert_eq!(opened.unwrap().as_str(), "https://docs.example.test/d/7");
    assert!(
        worst_gap < Duration::from_millis(200),
        "timer stalled for {worst_gap:?}"
    );
}

#[test]
fn batch_of_25_is_planned_as_10_10_5() {
    let fx = Fixture::new(Value::Null, false);

    let plan = fx.orchestrator.plan_batch(&ids(1..=25)).unwrap();

    let sizes: Vec<usize> = plan.groups.iter().map(|g| g.entries.len()).collect();
    let delays: Vec<Duration> = plan.groups.iter().map(|g| g.delay).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(delays, vec![secs(0), secs(2), secs(4)]);
    assert_eq!(plan.total_entries, 25);
    assert_eq!(
        plan.prompt(),
        "Print 25 selected records? 3 windows will open."
    );
    assert_eq!(
        plan.groups[2].url.query(),
        Some("getFichaBatch=21,22,23,24,25")
    );
}

#[test]
fn confirmed_batch_opens_and_prints_on_schedule() {
    let mut fx = Fixture::new(Value::Null, false);

    let groups = fx
        .orchestrator
        .print_batch(&ids(1..=25), |_| true)
        .unwrap();
    assert_eq!(groups, Some(3));
    assert!(fx.events.lock().is_empty(), "nothing opens before the clock moves");

    fx.clock.advance(secs(10));

    let first = "https://gateway.example.test/exec?getFichaBatch=1,2,3,4,5,6,7,8,9,10";
    let second = "https://gateway.example.test/exec?getFichaBatch=11,12,13,14,15,16,17,18,19,20";
    let third = "https://gateway.example.test/exec?getFichaBatch=21,22,23,24,25";
    assert_eq!(
        *fx.events.lock(),
        vec![
            Event::Open(first.into(), secs(0)),
            Event::Print(first.into(), secs(1)),
            Event::Open(second.into(), secs(2)),
            Event::Print(second.into(), secs(3)),
            Event::Open(third.into(), secs(4)),
            Event::Print(third.into(), secs(5)),
        ]
    );

    let notices = fx.drain_notices();
    assert_eq!(notices.len(), 6);
    assert!(notices.iter().all(|n| !n.is_error()));
}

#[test]
fn declined_batch_is_a_no_op() {
    let fx = Fixture::new(Value::Null, false);
    let mut asked = None;

    let outcome = fx
        .orchestrator
        .print_batch(&ids(1..=3), |prompt| {
            asked = Some(prompt.to_string());
            false
        })
        .unwrap();

    assert_eq!(outcome, None);
    assert_eq!(
        asked.as_deref(),
        Some("Print 3 selected records? 1 window will open.")
    );
    assert_eq!(fx.clock.pending(), 0);
    assert_eq!(fx.clock.advance(secs(60)), 0);
    assert!(fx.events.lock().is_empty());
}

#[test]
fn empty_batch_is_rejected_before_asking() {
    let fx = Fixture::new(Value::Null, false);

    let err = fx
        .orchestrator
        .print_batch(&[], |_| panic!("must not ask"))
        .unwrap_err();

    assert!(matches!(err, FichasError::NothingSelected));
}

#[test]
fn blocked_batch_documents_are_reported_not_printed() {
    let mut fx = Fixture::new(Value::Null, true);

    fx.orchestrator.print_batch(&ids(1..=12), |_| true).unwrap();
    fx.clock.advance(secs(10));

    assert!(fx.events.lock().is_empty());
    let notices = fx.drain_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices
        .iter()
        .all(|n| matches!(n, Notice::PopupBlocked { .. })));
}

#[test]
fn batch_identifiers_are_escaped_individually() {
    let fx = Fixture::new(Value::Null, false);

    let plan = fx
        .orchestrator
        .plan_batch(&["7/B".to_string(), "a b".to_string()])
        .unwrap();

    assert_eq!(plan.groups[0].url.query(), Some("getFichaBatch=7%2FB,a%20b"));
}
