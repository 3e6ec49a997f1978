//! Terminal UI implementation using ratatui
//!
//! This module provides the concrete implementation of UIRenderer using ratatui
//! for a cross-platform terminal interface. It only draws; the render
//! coordinator owns the state.

use crate::error::Result;
use crate::print::PrintKind;
use crate::render::ui::{ColorTheme, UIRenderer, ViewState};
use crate::render::view::{ResultsPane, ResultsTable, RowView, LOAD_FAILURE_HINT};
use ratatui::crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout, Write};

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

const KEY_HINTS: &str = "/ search  o order  space select  a all  P print selected  \
                         p print  c clinical  m post-mortem  g/G first/last  q quit";

/// Terminal UI implementation with ratatui backend
pub struct TerminalUI {
    terminal: Option<CrosstermTerminal>,
    theme: ColorTheme,
}

impl TerminalUI {
    /// Create a new terminal UI instance with the default theme
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: None,
            theme: ColorTheme::default(),
        })
    }

    /// Create terminal UI with custom theme
    pub fn with_theme(theme: ColorTheme) -> Result<Self> {
        Ok(Self {
            terminal: None,
            theme,
        })
    }

    /// Draw a whole frame. Split out of `render` so it can run against any backend.
    pub fn draw_frame(frame: &mut Frame, view_state: &ViewState, theme: &ColorTheme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.size());

        Self::render_title(frame, chunks[0], view_state, theme);
        Self::render_pane(frame, chunks[1], view_state, theme);
        Self::render_status(frame, chunks[2], view_state, theme);
    }

    fn render_title(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
        let title = match &view_state.pane {
            ResultsPane::Table(table) => table.header(),
            _ => "Intake records".to_string(),
        };
        let lines = vec![
            Line::from(Span::styled(title, theme.title)),
            Line::from(Span::styled(KEY_HINTS, theme.placeholder)),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_pane(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
        let placeholder = |text: &str, style: Style| {
            Paragraph::new(text.to_string())
                .style(style)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
        };

        match &view_state.pane {
            ResultsPane::Idle => frame.render_widget(
                placeholder("Press / to search, Enter on an empty query lists everything", theme.placeholder),
                area,
            ),
            ResultsPane::Loading => {
                frame.render_widget(placeholder("Loading all records...", theme.placeholder), area)
            }
            ResultsPane::NoResults => {
                frame.render_widget(placeholder("No records found", theme.placeholder), area)
            }
            ResultsPane::Failed { message } => {
                let text = format!("Failed to load data\n{}\n{}", message, LOAD_FAILURE_HINT);
                frame.render_widget(
                    placeholder(&text, Style::default().fg(theme.error_text)),
                    area,
                );
            }
            ResultsPane::Table(table) => Self::render_table(frame, area, table, view_state, theme),
        }
    }

    fn render_table(
        frame: &mut Frame,
        area: Rect,
        table: &ResultsTable,
        view_state: &ViewState,
        theme: &ColorTheme,
    ) {
        let header_box = if table.all_checked() { "[x]" } else { "[ ]" };
        let header = Row::new(vec![
            Cell::from(header_box),
            Cell::from("Entry"),
            Cell::from("Date"),
            Cell::from("Species"),
            Cell::from("Municipality"),
            Cell::from("Completed by"),
            Cell::from("Status"),
            Cell::from("Print"),
        ])
        .style(theme.table_header);

        let rows = table
            .rows()
            .iter()
            .enumerate()
            .skip(view_state.scroll_top)
            .take(view_state.rows_per_page())
            .map(|(index, row)| {
                let checkbox = if table.is_row_checked(index) { "[x]" } else { "[ ]" };
                let styled = Row::new(vec![
                    Cell::from(checkbox),
                    Cell::from(row.entry_label().to_string()),
                    Cell::from(row.date.clone()),
                    Cell::from(row.species.clone()),
                    Cell::from(row.municipality.clone()),
                    Cell::from(row.completed_by.clone()),
                    Cell::from(Span::styled(
                        row.vitality.label(),
                        theme.vitality_tag(row.vitality),
                    )),
                    Cell::from(Self::action_line(row, theme)),
                ]);
                if index == table.cursor() {
                    styled.style(theme.cursor_row)
                } else {
                    styled
                }
            });

        let widths = [
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(12),
            Constraint::Percentage(22),
            Constraint::Percentage(18),
            Constraint::Percentage(14),
            Constraint::Length(9),
            Constraint::Min(24),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), area);
    }

    fn action_line(row: &RowView, theme: &ColorTheme) -> Line<'static> {
        let short = |kind: PrintKind| match kind {
            PrintKind::Clinical => "clinical",
            PrintKind::PostMortem => "post-mortem",
            PrintKind::CaptiveBirth => "captive-birth",
        };
        let spans: Vec<Span<'static>> = row
            .actions
            .kinds()
            .into_iter()
            .flat_map(|kind| {
                let style = if row.actions.is_emphasized(kind) {
                    theme.emphasized_action
                } else {
                    theme.plain_action
                };
                [Span::styled(format!("[{}]", short(kind)), style), Span::raw(" ")]
            })
            .collect();
        Line::from(spans)
    }

    fn render_status(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
        let fg = if view_state.status_line.has_error() {
            theme.error_text
        } else {
            theme.status_fg
        };
        let status_style = Style::default().bg(theme.status_bg).fg(fg);
        let status = Paragraph::new(view_state.format_status_line()).style(status_style);
        frame.render_widget(status, area);
    }

    fn draw_on<B: Backend>(
        terminal: &mut Terminal<B>,
        view_state: &ViewState,
        theme: &ColorTheme,
    ) -> Result<()> {
        terminal.draw(|frame| Self::draw_frame(frame, view_state, theme))?;
        Ok(())
    }
}

/// Alternate screen with mouse capture, so wheel scrolling reaches the input thread.
fn enter_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)
}

fn leave_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, DisableMouseCapture, cursor::Show)
}

impl UIRenderer for TerminalUI {
    fn render(&mut self, view_state: &ViewState) -> Result<()> {
        if let Some(ref mut terminal) = self.terminal {
            Self::draw_on(terminal, view_state, &self.theme)?;
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        enter_screen(&mut stdout)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        self.terminal = Some(terminal);

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.terminal.is_some() {
            disable_raw_mode()?;
            leave_screen(&mut io::stdout())?;
            self.terminal = None;
        }
        Ok(())
    }

    fn get_terminal_size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = ratatui::crossterm::terminal::size()?;
        Ok((cols, rows))
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
