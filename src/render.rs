//! Rendering subsystem.
//!
//! - [`view`] - projection of ordered records into rows, selection and print controls
//! - [`protocol`] - messages exchanged with the search worker
//! - [`service`] - coordinator applying input actions and worker responses to the view
//! - [`ui`] - terminal drawing

pub mod protocol;
pub mod service;
pub mod ui;
pub mod view;

pub use service::RenderLoopState;
pub use view::{render, ResultHandlers, ResultsPane, ResultsTable, RowActions, RowView};
