//! High-level input service.
//!
//! Reads terminal events, runs the input state machine, and yields
//! domain-level `InputAction`s that the render coordinator consumes.

use crate::error::Result;
use crate::print::PrintKind;
use crate::render::view::RowPrintChoice;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use std::time::Duration;

/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: usize = 3;

/// Current input mode (table navigation vs query prompt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Navigation,
    QueryInput,
}

/// Direction for cursor moves emitted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    Up,
    Down,
}

/// High-level input actions emitted by the state machine/service.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    MoveCursor {
        direction: CursorDirection,
        rows: usize,
    },
    PageUp,
    PageDown,
    GoToFirst,
    GoToLast,
    Quit,
    StartQuery,
    UpdateQueryBuffer(String),
    CancelQuery,
    /// Run a search; an empty query lists every record
    SubmitQuery(String),
    /// Re-run the current query against fresh data
    Refresh,
    ToggleOrder,
    /// Flip the checkbox under the cursor
    ToggleRow,
    /// Header checkbox
    ToggleAll,
    /// A print control on the row under the cursor
    PrintRow(RowPrintChoice),
    /// Batch-print control
    PrintSelected,
    /// Answer to a pending yes/no question
    Confirm(bool),
    Resize {
        width: u16,
        height: u16,
    },
    NoAction,
    InvalidInput,
}

fn plain(modifiers: KeyModifiers) -> bool {
    !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

/// Key bindings for the results screen and the query prompt.
pub struct InputStateMachine {
    state: InputState,
    query_buffer: String,
}

impl InputStateMachine {
    pub fn new() -> Self {
        Self {
            state: InputState::Navigation,
            query_buffer: String::new(),
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> InputAction {
        if key_event.kind != KeyEventKind::Press {
            return InputAction::NoAction;
        }

        match self.state {
            InputState::Navigation => self.handle_navigation(key_event),
            InputState::QueryInput => self.handle_query_input(key_event),
        }
    }

    fn handle_navigation(&mut self, key_event: KeyEvent) -> InputAction {
        let modifiers = key_event.modifiers;
        match key_event.code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => InputAction::Quit,
            KeyCode::Char(_) if !plain(modifiers) => InputAction::InvalidInput,

            KeyCode::Char('j') | KeyCode::Down => InputAction::MoveCursor {
                direction: CursorDirection::Down,
                rows: 1,
            },
            KeyCode::Char('k') | KeyCode::Up => InputAction::MoveCursor {
                direction: CursorDirection::Up,
                rows: 1,
            },
            KeyCode::Char('f') | KeyCode::PageDown => InputAction::PageDown,
            KeyCode::Char('b') | KeyCode::PageUp => InputAction::PageUp,
            KeyCode::Char('g') | KeyCode::Home => InputAction::GoToFirst,
            KeyCode::Char('G') | KeyCode::End => InputAction::GoToLast,

            KeyCode::Char('/') => {
                self.state = InputState::QueryInput;
                self.query_buffer.clear();
                InputAction::StartQuery
            }
            KeyCode::Char('o') => InputAction::ToggleOrder,
            KeyCode::Char('r') => InputAction::Refresh,

            KeyCode::Char(' ') => InputAction::ToggleRow,
            KeyCode::Char('a') => InputAction::ToggleAll,
            KeyCode::Char('P') => InputAction::PrintSelected,
            KeyCode::Char('p') | KeyCode::Enter => InputAction::PrintRow(RowPrintChoice::Primary),
            KeyCode::Char('c') => InputAction::PrintRow(RowPrintChoice::Kind(PrintKind::Clinical)),
            KeyCode::Char('m') => {
                InputAction::PrintRow(RowPrintChoice::Kind(PrintKind::PostMortem))
            }

            KeyCode::Char('y') | KeyCode::Char('Y') => InputAction::Confirm(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => InputAction::Confirm(false),

            KeyCode::Char('q') => InputAction::Quit,
            _ => InputAction::InvalidInput,
        }
    }

    fn handle_query_input(&mut self, key_event: KeyEvent) -> InputAction {
        match (key_event.code, key_event.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                self.state = InputState::Navigation;
                self.query_buffer.clear();
                InputAction::CancelQuery
            }
            (KeyCode::Enter, _) => {
                self.state = InputState::Navigation;
                InputAction::SubmitQuery(std::mem::take(&mut self.query_buffer))
            }
            (KeyCode::Backspace, _) => {
                self.query_buffer.pop();
                InputAction::UpdateQueryBuffer(self.query_buffer.clone())
            }
            // Accented letters arrive as plain chars; keep anything printable.
            (KeyCode::Char(ch), modifiers) if !ch.is_control() && plain(modifiers) => {
                self.query_buffer.push(ch);
                InputAction::UpdateQueryBuffer(self.query_buffer.clone())
            }
            _ => InputAction::NoAction,
        }
    }

    pub fn get_query_buffer(&self) -> &str {
        &self.query_buffer
    }

    pub fn get_state(&self) -> InputState {
        self.state
    }
}

impl Default for InputStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Service responsible for producing high-level `InputAction`s from terminal events.
pub struct InputService {
    state_machine: InputStateMachine,
}

impl InputService {
    pub fn new() -> Self {
        Self {
            state_machine: InputStateMachine::new(),
        }
    }

    /// Wait up to `timeout` for terminal events, then drain whatever else is
    /// already queued.
    pub fn poll_actions(&mut self, timeout: Option<Duration>) -> Result<Vec<InputAction>> {
        let mut actions = Vec::new();

        if event::poll(timeout.unwrap_or(Duration::ZERO))? {
            actions.extend(self.process_event(event::read()?));
            while event::poll(Duration::ZERO)? {
                actions.extend(self.process_event(event::read()?));
            }
        }

        Ok(actions)
    }

    pub fn process_event(&mut self, event: Event) -> Option<InputAction> {
        let action = match event {
            Event::Key(key_event) => self.state_machine.handle_key_event(key_event),
            Event::Resize(width, height) => InputAction::Resize { width, height },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => InputAction::MoveCursor {
                    direction: CursorDirection::Down,
                    rows: WHEEL_ROWS,
                },
                MouseEventKind::ScrollUp => InputAction::MoveCursor {
                    direction: CursorDirection::Up,
                    rows: WHEEL_ROWS,
                },
                _ => InputAction::NoAction,
            },
            _ => InputAction::NoAction,
        };

        match action {
            InputAction::NoAction | InputAction::InvalidInput => None,
            _ => Some(action),
        }
    }

    pub fn state(&self) -> InputState {
        self.state_machine.get_state()
    }
}

impl Default for InputService {
    fn default() -> Self {
        Self::new()
    }
}
