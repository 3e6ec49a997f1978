//! Render coordination.
//!
//! Provides the state machine that mediates between input actions, search
//! commands, print requests and view updates. `Application::run` owns the loop;
//! this module decides what each event does to the view.

use crate::error::{FichasError, Result};
use crate::input::{CursorDirection, InputAction};
use crate::print::{BatchPlan, Notice, Notifier, PrintKind, PrintOrchestrator};
use crate::record::Record;
use crate::render::protocol::{RequestId, SearchCommand, SearchResponse};
use crate::render::ui::ViewState;
use crate::render::view::{render, ResultHandlers, ResultsPane};
use crate::search::Query;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Control activations collected from the results pane during one action.
#[derive(Default)]
struct PrintIntents {
    singles: Vec<(String, PrintKind)>,
    batches: Vec<Vec<String>>,
    notices: Vec<Notice>,
}

impl ResultHandlers for PrintIntents {
    fn print_single(&mut self, entry: &str, kind: PrintKind) {
        self.singles.push((entry.to_string(), kind));
    }

    fn print_batch(&mut self, entries: Vec<String>) {
        self.batches.push(entries);
    }

    fn report(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Tracks render-related state that must persist across input actions and worker responses.
pub struct RenderLoopState {
    orchestrator: Arc<PrintOrchestrator>,
    notifier: Arc<dyn Notifier>,
    next_request_id: RequestId,
    latest_search_request: Option<RequestId>,
    /// Batch waiting for a yes/no answer
    pending_batch: Option<BatchPlan>,
}

impl RenderLoopState {
    pub fn new(orchestrator: Arc<PrintOrchestrator>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            orchestrator,
            notifier,
            next_request_id: 1,
            latest_search_request: None,
            pending_batch: None,
        }
    }

    pub fn latest_search_request(&self) -> Option<RequestId> {
        self.latest_search_request
    }

    pub fn pending_batch(&self) -> Option<&BatchPlan> {
        self.pending_batch.as_ref()
    }

    /// Apply one input action. Returns `Ok(false)` when the loop should stop.
    pub async fn process_action(
        &mut self,
        action: InputAction,
        view_state: &mut ViewState,
        search_tx: &mpsc::Sender<SearchCommand>,
    ) -> Result<bool> {
        // A pending question swallows everything but its answer.
        if self.pending_batch.is_some()
            && !matches!(
                action,
                InputAction::Confirm(_) | InputAction::Quit | InputAction::Resize { .. }
            )
        {
            return Ok(true);
        }

        match action {
            InputAction::Quit => return Ok(false),
            InputAction::MoveCursor { direction, rows } => {
                if let Some(table) = view_state.pane.table_mut() {
                    match direction {
                        CursorDirection::Up => table.move_cursor_up(rows),
                        CursorDirection::Down => table.move_cursor_down(rows),
                    }
                }
                view_state.follow_cursor();
            }
            InputAction::PageUp => {
                let page = view_state.rows_per_page();
                if let Some(table) = view_state.pane.table_mut() {
                    table.move_cursor_up(page);
                }
                view_state.follow_cursor();
            }
            InputAction::PageDown => {
                let page = view_state.rows_per_page();
                if let Some(table) = view_state.pane.table_mut() {
                    table.move_cursor_down(page);
                }
                view_state.follow_cursor();
            }
            InputAction::GoToFirst => {
                if let Some(table) = view_state.pane.table_mut() {
                    table.go_to_first();
                }
                view_state.follow_cursor();
            }
            InputAction::GoToLast => {
                if let Some(table) = view_state.pane.table_mut() {
                    table.go_to_last();
                }
                view_state.follow_cursor();
            }
            InputAction::StartQuery => {
                view_state.status_line.clear_notice();
                view_state.status_line.open_query_prompt();
            }
            InputAction::UpdateQueryBuffer(buffer) => {
                view_state.status_line.update_query_prompt(buffer);
            }
            InputAction::CancelQuery => {
                view_state.status_line.close_query_prompt();
            }
            InputAction::SubmitQuery(text) => {
                view_state.status_line.close_query_prompt();
                let query = Query::new(text, view_state.query.order);
                self.request_search(query, view_state, search_tx).await?;
            }
            InputAction::Refresh => {
                let query = view_state.query.clone();
                self.request_search(query, view_state, search_tx).await?;
            }
            InputAction::ToggleOrder => {
                let query = Query::new(view_state.query.text.clone(), view_state.query.order.toggled());
                self.request_search(query, view_state, search_tx).await?;
            }
            InputAction::ToggleRow => {
                if let Some(table) = view_state.pane.table_mut() {
                    let cursor = table.cursor();
                    table.toggle_row(cursor);
                }
            }
            InputAction::ToggleAll => {
                if let Some(table) = view_state.pane.table_mut() {
                    let checked = !table.all_checked();
                    table.toggle_all(checked);
                }
            }
            InputAction::PrintRow(choice) => {
                let mut intents = PrintIntents::default();
                if let Some(table) = view_state.pane.table() {
                    table.activate_row_action(table.cursor(), choice, &mut intents);
                }
                self.apply_intents(intents, view_state);
            }
            InputAction::PrintSelected => {
                let mut intents = PrintIntents::default();
                match view_state.pane.table() {
                    Some(table) => table.activate_batch_print(&mut intents),
                    None => intents.report(Notice::NothingSelected),
                }
                self.apply_intents(intents, view_state);
            }
            InputAction::Confirm(yes) => self.answer_batch(yes, view_state),
            InputAction::Resize { width, height } => {
                view_state.update_terminal_size(width, height);
            }
            InputAction::NoAction | InputAction::InvalidInput => {}
        }
        Ok(true)
    }

    /// Apply a worker response. Anything but the answer to the latest search is dropped.
    pub fn handle_response(&mut self, response: SearchResponse, view_state: &mut ViewState) {
        let request_id = response.request_id();
        if Some(request_id) != self.latest_search_request {
            debug!(
                "dropping stale response {} (latest {:?})",
                request_id, self.latest_search_request
            );
            return;
        }
        self.latest_search_request = None;

        match response {
            SearchResponse::Completed {
                query,
                records,
                fetched,
                ..
            } => {
                info!(
                    "search '{}' ({}): {} of {} records",
                    query.text,
                    query.order,
                    records.len(),
                    fetched
                );
                let ordered: Vec<&Record> = records.iter().collect();
                view_state.set_pane(render(&ordered));
            }
            SearchResponse::Error { error, .. } => {
                warn!("search {} failed: {}", request_id, error);
                view_state.set_pane(ResultsPane::failed(error.detail()));
                view_state.status_line.set_notice(Notice::from(&error));
            }
        }
    }

    /// Show a notice raised outside the loop.
    pub fn handle_notice(&mut self, notice: Notice, view_state: &mut ViewState) {
        if notice.is_error() {
            warn!("{}", notice.message());
        }
        view_state.status_line.set_notice(notice);
    }

    /// Issue a search. The pane shows the loading state until the answer lands.
    pub async fn request_search(
        &mut self,
        query: Query,
        view_state: &mut ViewState,
        search_tx: &mpsc::Sender<SearchCommand>,
    ) -> Result<RequestId> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.latest_search_request = Some(request_id);

        view_state.query = query.clone();
        view_state.set_pane(ResultsPane::Loading);
        view_state.status_line.clear_notice();

        search_tx
            .send(SearchCommand::Execute { request_id, query })
            .await
            .map_err(|_| FichasError::other("search worker unavailable"))?;
        Ok(request_id)
    }

    fn apply_intents(&mut self, intents: PrintIntents, view_state: &mut ViewState) {
        for notice in intents.notices {
            view_state.status_line.set_notice(notice);
        }

        for (entry, kind) in intents.singles {
            view_state
                .status_line
                .set_notice(Notice::info(format!("Opening {} for entry {}...", kind, entry)));
            let orchestrator = Arc::clone(&self.orchestrator);
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                let notice = match orchestrator.print_single(&entry, Some(kind)).await {
                    Ok(url) => Notice::Opened {
                        url: url.to_string(),
                    },
                    Err(err) => Notice::from(&err),
                };
                notifier.notify(notice);
            });
        }

        if let Some(entries) = intents.batches.into_iter().last() {
            match self.orchestrator.plan_batch(&entries) {
                Ok(plan) => {
                    view_state.status_line.confirm_prompt = Some(plan.prompt());
                    self.pending_batch = Some(plan);
                }
                Err(err) => view_state.status_line.set_notice(Notice::from(&err)),
            }
        }
    }

    fn answer_batch(&mut self, yes: bool, view_state: &mut ViewState) {
        let Some(plan) = self.pending_batch.take() else {
            return;
        };
        view_state.status_line.confirm_prompt = None;

        if yes {
            let total = plan.total_entries;
            let windows = self.orchestrator.submit_batch(plan);
            view_state.status_line.set_notice(Notice::info(format!(
                "Printing {} records in {} document(s)",
                total, windows
            )));
        } else {
            info!("batch print declined");
            view_state
                .status_line
                .set_notice(Notice::info("Batch print cancelled"));
        }
    }
}
