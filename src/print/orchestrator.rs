//! Single and batched print flows.

use super::scheduler::Scheduler;
use super::viewer::Viewer;
use super::{Notice, Notifier, PrintKind};
use crate::config::PrintConfig;
use crate::error::{FichasError, Result};
use crate::gateway::Gateway;
use log::{info, warn};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

/// Batch staggering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Entries per opened document
    pub group_size: usize,
    /// Delay between consecutive documents
    pub group_interval: Duration,
    /// Time an opened document gets to load before it is printed
    pub print_grace: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from(&PrintConfig::default())
    }
}

impl From<&PrintConfig> for BatchSettings {
    fn from(config: &PrintConfig) -> Self {
        Self {
            group_size: config.group_size.max(1),
            group_interval: config.group_interval(),
            print_grace: config.print_grace(),
        }
    }
}

/// One document of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGroup {
    pub index: usize,
    pub delay: Duration,
    pub entries: Vec<String>,
    pub url: Url,
}

/// A batch print waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub total_entries: usize,
    pub groups: Vec<BatchGroup>,
}

impl BatchPlan {
    pub fn window_count(&self) -> usize {
        self.groups.len()
    }

    /// Question put to the user before anything is opened.
    pub fn prompt(&self) -> String {
        format!(
            "Print {} selected records? {} window{} will open.",
            self.total_entries,
            self.window_count(),
            if self.window_count() == 1 { "" } else { "s" }
        )
    }
}

/// Resolves records to printable documents and opens them.
pub struct PrintOrchestrator {
    gateway: Gateway,
    viewer: Arc<dyn Viewer>,
    scheduler: Arc<dyn Scheduler>,
    notifier: Arc<dyn Notifier>,
    settings: BatchSettings,
}

impl PrintOrchestrator {
    pub fn new(
        gateway: Gateway,
        viewer: Arc<dyn Viewer>,
        scheduler: Arc<dyn Scheduler>,
        notifier: Arc<dyn Notifier>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            gateway,
            viewer,
            scheduler,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> BatchSettings {
        self.settings
    }

    /// Open the printable document of one entry.
    ///
    /// `kind` selects a specific form; `None` lets the gateway choose. Returns
    /// the opened URL.
    pub async fn print_single(&self, entry: &str, kind: Option<PrintKind>) -> Result<Url> {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(FichasError::invalid_input("record has no entry number"));
        }

        let url = self
            .gateway
            .print_url(entry, kind)
            .await?
            .ok_or_else(|| FichasError::not_found(entry))?;

        // Launchers block until the desktop hands the URL off
        let viewer = Arc::clone(&self.viewer);
        let target = url.clone();
        let opened = tokio::task::spawn_blocking(move || viewer.open(&target).is_some())
            .await
            .map_err(|e| FichasError::other(format!("viewer task failed: {}", e)))?;

        if !opened {
            return Err(FichasError::popup_blocked(url.as_str()));
        }
        info!("opened {} for entry {}", kind.map_or("document", PrintKind::label), entry);
        Ok(url)
    }

    /// Split `entries` into staggered groups. Nothing is opened yet.
    pub fn plan_batch(&self, entries: &[String]) -> Result<BatchPlan> {
        if entries.is_empty() {
            return Err(FichasError::NothingSelected);
        }

        let groups = entries
            .chunks(self.settings.group_size)
            .enumerate()
            .map(|(index, chunk)| BatchGroup {
                index,
                delay: self.settings.group_interval * index as u32,
                entries: chunk.to_vec(),
                url: self.gateway.batch_url(chunk),
            })
            .collect();

        Ok(BatchPlan {
            total_entries: entries.len(),
            groups,
        })
    }

    /// Schedule every group of a confirmed plan. Returns the number of groups.
    ///
    /// Each group opens its document when due and, if the viewer accepted it,
    /// prints that same view once the grace delay has passed. A refused open is
    /// reported and not retried.
    pub fn submit_batch(&self, plan: BatchPlan) -> usize {
        let count = plan.groups.len();
        info!(
            "scheduling {} batch documents for {} entries",
            count, plan.total_entries
        );

        for group in plan.groups {
            let viewer = Arc::clone(&self.viewer);
            let scheduler = Arc::clone(&self.scheduler);
            let notifier = Arc::clone(&self.notifier);
            let grace = self.settings.print_grace;

            self.scheduler.schedule(
                group.delay,
                Box::new(move || {
                    let Some(view) = viewer.open(&group.url) else {
                        warn!("batch document {} was blocked", group.index);
                        notifier.notify(Notice::PopupBlocked {
                            url: group.url.to_string(),
                        });
                        return;
                    };
                    notifier.notify(Notice::Opened {
                        url: group.url.to_string(),
                    });

                    let print_notifier = Arc::clone(&notifier);
                    scheduler.schedule(
                        grace,
                        Box::new(move || {
                            let url = view.url().to_string();
                            match view.print() {
                                Ok(()) => print_notifier.notify(Notice::Printed { url }),
                                Err(e) => print_notifier.notify(Notice::Failed {
                                    message: format!("Printing {} failed: {}", url, e),
                                }),
                            }
                        }),
                    );
                }),
            );
        }
        count
    }

    /// Plan, confirm and submit in one step.
    ///
    /// `confirm` receives the prompt; declining makes the call a no-op and
    /// yields `Ok(None)`.
    pub fn print_batch<F>(&self, entries: &[String], confirm: F) -> Result<Option<usize>>
    where
        F: FnOnce(&str) -> bool,
    {
        let plan = self.plan_batch(entries)?;
        if !confirm(&plan.prompt()) {
            info!("batch print declined");
            return Ok(None);
        }
        Ok(Some(self.submit_batch(plan)))
    }
}
