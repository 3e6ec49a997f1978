//! Printing: resolving records to printable documents and opening them.
//!
//! - [`orchestrator`] - single and batched print flows
//! - [`scheduler`] - delayed task execution (real timers or a virtual clock)
//! - [`viewer`] - where documents are opened and printed

pub mod orchestrator;
pub mod scheduler;
pub mod viewer;

pub use orchestrator::{BatchGroup, BatchPlan, BatchSettings, PrintOrchestrator};
pub use scheduler::{ManualScheduler, Scheduler, Task, TokioScheduler};
pub use viewer::{DocumentView, SystemViewer, Viewer};

use crate::error::FichasError;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Document form requested from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintKind {
    Clinical,
    PostMortem,
    CaptiveBirth,
}

impl PrintKind {
    /// Value of the gateway's `tipo` parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            PrintKind::Clinical => "clinica",
            PrintKind::PostMortem => "postmortem",
            PrintKind::CaptiveBirth => "cria_cautividad",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrintKind::Clinical => "clinical record",
            PrintKind::PostMortem => "post-mortem record",
            PrintKind::CaptiveBirth => "captive-birth form",
        }
    }
}

impl fmt::Display for PrintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-facing outcome of a print step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Batch print requested with nothing checked
    NothingSelected,
    /// The gateway had no document for this entry
    NotFound { entry: String },
    /// The viewer refused to open a document
    PopupBlocked { url: String },
    /// Any other failure, already phrased for the user
    Failed { message: String },
    /// A document was opened
    Opened { url: String },
    /// A document was sent to print
    Printed { url: String },
    /// Plain information
    Info { message: String },
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice::Info {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::NothingSelected
                | Notice::NotFound { .. }
                | Notice::PopupBlocked { .. }
                | Notice::Failed { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            Notice::NothingSelected => FichasError::NothingSelected.to_string(),
            Notice::NotFound { entry } => FichasError::not_found(entry.clone()).to_string(),
            Notice::PopupBlocked { url } => FichasError::popup_blocked(url.clone()).to_string(),
            Notice::Failed { message } | Notice::Info { message } => message.clone(),
            Notice::Opened { url } => format!("Opened {}", url),
            Notice::Printed { url } => format!("Sent to print: {}", url),
        }
    }
}

impl From<&FichasError> for Notice {
    fn from(err: &FichasError) -> Self {
        match err {
            FichasError::NothingSelected => Notice::NothingSelected,
            FichasError::NotFound { entry } => Notice::NotFound {
                entry: entry.clone(),
            },
            FichasError::PopupBlocked { url } => Notice::PopupBlocked { url: url.clone() },
            FichasError::Transport { .. } => Notice::Failed {
                message: "Connection to the gateway failed".to_string(),
            },
            other => Notice::Failed {
                message: other.to_string(),
            },
        }
    }
}

/// Receives notices raised away from the UI loop (scheduled batch steps,
/// background single prints).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl Notifier for UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        if self.send(notice).is_err() {
            log::debug!("notice dropped: UI loop has shut down");
        }
    }
}
