//! Application orchestration layer
//!
//! Wires the gateway, the search worker, the print orchestrator and the
//! terminal together and runs the event loop. State changes themselves live in
//! [`RenderLoopState`].

pub mod runtime;

use crate::config::Config;
use crate::error::{FichasError, Result};
use crate::gateway::Gateway;
use crate::print::{BatchSettings, Notice, Notifier, PrintOrchestrator, SystemViewer, TokioScheduler};
use crate::record::Record;
use crate::render::protocol::{SearchCommand, SearchResponse};
use crate::render::ui::{UIRenderer, ViewState};
use crate::render::view::RowView;
use crate::render::RenderLoopState;
use crate::search::{search, search_worker_loop, sort, Query};
use log::{debug, info};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the coordinator/worker channels.
const CHANNEL_CAPACITY: usize = 32;

/// Application orchestrator - owns the components and the loop that connects them
pub struct Application {
    config: Config,
    gateway: Gateway,
    ui_renderer: Box<dyn UIRenderer>,
    initial_query: Query,
}

impl Application {
    /// Create application by building the gateway described by `config`
    pub fn new(config: Config, initial_query: Query, ui_renderer: Box<dyn UIRenderer>) -> Result<Self> {
        let gateway = Gateway::from_config(&config.gateway)?;
        Ok(Self::with_gateway(config, gateway, initial_query, ui_renderer))
    }

    /// Create application around an existing gateway
    pub fn with_gateway(
        config: Config,
        gateway: Gateway,
        initial_query: Query,
        ui_renderer: Box<dyn UIRenderer>,
    ) -> Self {
        Self {
            config,
            gateway,
            ui_renderer,
            initial_query,
        }
    }

    /// Run the interactive session until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        self.ui_renderer.initialize()?;
        let outcome = self.event_loop().await;
        // Restore the terminal even when the loop failed.
        let cleanup = self.ui_renderer.cleanup();
        outcome.and(cleanup)
    }

    async fn event_loop(&mut self) -> Result<()> {
        let (width, height) = self.ui_renderer.get_terminal_size()?;
        let mut view_state = ViewState::new(self.initial_query.clone(), width, height);

        let (search_tx, search_rx) = mpsc::channel::<SearchCommand>(CHANNEL_CAPACITY);
        let (response_tx, mut response_rx) = mpsc::channel::<SearchResponse>(CHANNEL_CAPACITY);
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel::<Notice>();
        let (input_tx, mut input_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(search_worker_loop(
            search_rx,
            response_tx,
            self.gateway.clone(),
        ));

        let notifier: Arc<dyn Notifier> = Arc::new(notice_tx);
        let orchestrator = Arc::new(PrintOrchestrator::new(
            self.gateway.clone(),
            Arc::new(SystemViewer::from_config(&self.config.print)),
            Arc::new(TokioScheduler::current()),
            Arc::clone(&notifier),
            BatchSettings::from(&self.config.print),
        ));
        let mut state = RenderLoopState::new(orchestrator, notifier);

        let shutdown = Arc::new(AtomicBool::new(false));
        let input_thread = runtime::spawn_input_thread(
            input_tx,
            Arc::clone(&shutdown),
            self.config.ui.poll_interval(),
        );

        info!("starting session against {}", self.gateway.base_url());
        state
            .request_search(self.initial_query.clone(), &mut view_state, &search_tx)
            .await?;
        self.ui_renderer.render(&view_state)?;

        let mut running = true;
        while running {
            tokio::select! {
                action = input_rx.recv() => match action {
                    Some(action) => {
                        running = state.process_action(action, &mut view_state, &search_tx).await?;
                    }
                    None => {
                        debug!("input thread stopped");
                        running = false;
                    }
                },
                Some(response) = response_rx.recv() => {
                    state.handle_response(response, &mut view_state);
                }
                Some(notice) = notice_rx.recv() => {
                    state.handle_notice(notice, &mut view_state);
                }
            }

            if running {
                self.ui_renderer.render(&view_state)?;
            }
        }

        shutdown.store(true, Ordering::SeqCst);
        let _ = search_tx.send(SearchCommand::Shutdown).await;
        let _ = worker.await;
        tokio::task::spawn_blocking(move || input_thread.join())
            .await
            .map_err(|e| FichasError::other(format!("input thread join failed: {}", e)))?
            .map_err(|_| FichasError::other("input thread panicked"))?;
        Ok(())
    }
}

/// Run one search without the terminal UI and write the rows as tab-separated
/// lines. Returns how many rows were written.
pub async fn list_records<W: Write>(gateway: &Gateway, query: &Query, out: &mut W) -> Result<usize> {
    let all = gateway.fetch_all().await?;
    let ordered: Vec<&Record> = sort(search(&all, &query.text), query.order);

    writeln!(out, "Records found: {}", ordered.len())?;
    for record in &ordered {
        let row = RowView::from_record(record);
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.entry_label(),
            row.date,
            row.species,
            row.municipality,
            row.completed_by,
            row.vitality.label()
        )?;
    }
    Ok(ordered.len())
}
