//! # fichas - Wildlife Intake Record Browser
//!
//! Terminal front-end for the intake records a wildlife recovery centre keeps
//! in a spreadsheet. Records are fetched through the spreadsheet's web-app
//! gateway, filtered and ordered locally, shown as a selectable table, and
//! turned into printable documents on request.
//!
//! ## Features
//!
//! - **Accent-insensitive search**: free text over the main fields, exact match on entry numbers
//! - **Ordering**: by entry number, newest or oldest first
//! - **Per-record printing**: clinical, post-mortem or captive-birth forms
//! - **Batch printing**: checked records grouped into staggered documents after confirmation
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - TOML configuration
//! - [`gateway`] - Gateway client and its transports
//! - [`record`] / [`text`] - Data model and text normalization
//! - [`search`] - Filtering, ordering and the background search worker
//! - [`render`] - Result table, render coordinator and terminal drawing
//! - [`print`] - Single and batch print flows
//! - [`input`] - Key bindings
//! - [`app`] - Application core and component coordination

// Core modules
pub mod config;
pub mod error;
pub mod record;
pub mod text;

// Subsystems
pub mod gateway;
pub mod input;
pub mod print;
pub mod render;
pub mod search;

pub mod app;

// Re-export commonly used types for convenience
pub use error::{FichasError, Result};

// Public API surface for external usage
pub use app::Application;
pub use config::Config;
pub use gateway::Gateway;
pub use print::{Notice, PrintKind, PrintOrchestrator};
pub use record::{Record, Vitality};
pub use search::{Query, SortOrder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
