//! UI state management structures
//!
//! This module contains the state the terminal draws from: the results pane,
//! the active query and the status line.

use crate::print::Notice;
use crate::render::view::ResultsPane;
use crate::search::Query;

/// Rows taken by the title, the table header and the status line.
const CHROME_ROWS: u16 = 4;

/// Everything the terminal needs to draw one frame.
#[derive(Debug)]
pub struct ViewState {
    pub pane: ResultsPane,

    /// Query of the search currently displayed (or in flight)
    pub query: Query,

    pub status_line: StatusLine,

    /// Index of the first table row in the viewport
    pub scroll_top: usize,

    /// Viewport dimensions
    pub viewport_width: u16,
    pub viewport_height: u16,
}

impl ViewState {
    pub fn new(query: Query, viewport_width: u16, viewport_height: u16) -> Self {
        Self {
            pane: ResultsPane::Idle,
            query,
            status_line: StatusLine::new(),
            scroll_top: 0,
            viewport_width,
            viewport_height,
        }
    }

    /// Table rows that fit on screen.
    pub fn rows_per_page(&self) -> usize {
        self.viewport_height.saturating_sub(CHROME_ROWS).max(1) as usize
    }

    /// Replace the pane; a new table starts scrolled to the top.
    pub fn set_pane(&mut self, pane: ResultsPane) {
        self.pane = pane;
        self.scroll_top = 0;
    }

    /// Scroll so the table cursor is visible.
    pub fn follow_cursor(&mut self) {
        let page = self.rows_per_page();
        let Some(table) = self.pane.table() else {
            self.scroll_top = 0;
            return;
        };
        let cursor = table.cursor();
        if cursor < self.scroll_top {
            self.scroll_top = cursor;
        } else if cursor >= self.scroll_top + page {
            self.scroll_top = cursor + 1 - page;
        }
    }

    /// Update terminal dimensions. Returns true if they actually changed.
    pub fn update_terminal_size(&mut self, width: u16, height: u16) -> bool {
        let changed = self.viewport_width != width || self.viewport_height != height;
        if changed {
            self.viewport_width = width;
            self.viewport_height = height;
            self.follow_cursor();
        }
        changed
    }

    pub fn format_status_line(&self) -> String {
        self.status_line.format_status_line(&self.query, &self.pane)
    }
}

/// Status line information
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    pub notice: Option<Notice>,
    /// Query being typed, when the prompt is open
    pub query_prompt: Option<String>,
    /// Pending yes/no question
    pub confirm_prompt: Option<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn open_query_prompt(&mut self) {
        self.query_prompt = Some(String::new());
    }

    pub fn update_query_prompt(&mut self, buffer: String) {
        self.query_prompt = Some(buffer);
    }

    pub fn close_query_prompt(&mut self) {
        self.query_prompt = None;
    }

    pub fn has_error(&self) -> bool {
        self.notice.as_ref().is_some_and(Notice::is_error)
    }

    /// Prompt text wins over everything, then the pending question, then the
    /// summary with any notice appended.
    pub fn format_status_line(&self, query: &Query, pane: &ResultsPane) -> String {
        if let Some(buffer) = &self.query_prompt {
            return format!("/{}", buffer);
        }
        if let Some(question) = &self.confirm_prompt {
            return format!("{} [y/n]", question);
        }

        let state = match pane {
            ResultsPane::Idle => "ready".to_string(),
            ResultsPane::Loading => "loading...".to_string(),
            ResultsPane::NoResults => "0 records".to_string(),
            ResultsPane::Table(table) => {
                format!("{} records, {} selected", table.len(), table.selection().len())
            }
            ResultsPane::Failed { .. } => "load failed".to_string(),
        };
        let filter = if query.text.trim().is_empty() {
            "all".to_string()
        } else {
            format!("'{}'", query.text.trim())
        };

        match &self.notice {
            Some(notice) => format!(
                "{} | {} | {} | {}",
                filter,
                query.order,
                state,
                notice.message()
            ),
            None => format!("{} | {} | {}", filter, query.order, state),
        }
    }
}
