//! Input subsystem.
//!
//! Turns terminal events into [`InputAction`]s for the render coordinator.

pub mod service;

// Modules outside this crate should prefer importing from `crate::input`
// rather than reaching into submodules.
pub use service::{CursorDirection, InputAction, InputService, InputState, InputStateMachine};
