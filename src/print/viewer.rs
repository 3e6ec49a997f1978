//! Document viewers.
//!
//! A [`Viewer`] opens a document URL somewhere the user can see it and hands
//! back a [`DocumentView`] that can later be printed. Refusing to open is
//! reported as `None`, the terminal equivalent of a blocked pop-up.

use crate::config::PrintConfig;
use crate::error::{FichasError, Result};
use log::{debug, info, warn};
use reqwest::Url;
use std::process::{Command, Stdio};

/// A document that was successfully opened.
pub trait DocumentView: Send {
    fn url(&self) -> &Url;

    /// Send the opened document to print.
    fn print(&self) -> Result<()>;
}

pub trait Viewer: Send + Sync {
    /// Open `url`; `None` when the viewer refused.
    fn open(&self, url: &Url) -> Option<Box<dyn DocumentView>>;
}

/// Opens documents with an external command (the desktop's default browser
/// unless configured otherwise).
#[derive(Debug, Clone)]
pub struct SystemViewer {
    open_command: Vec<String>,
    print_command: Option<Vec<String>>,
}

/// Platform launcher used when no open command is configured.
pub fn default_open_command() -> Vec<String> {
    let parts: &[&str] = if cfg!(target_os = "macos") {
        &["open"]
    } else if cfg!(windows) {
        &["cmd", "/C", "start", ""]
    } else {
        &["xdg-open"]
    };
    parts.iter().map(|s| s.to_string()).collect()
}

impl SystemViewer {
    pub fn new(open_command: Vec<String>, print_command: Option<Vec<String>>) -> Self {
        Self {
            open_command,
            print_command,
        }
    }

    pub fn from_config(config: &PrintConfig) -> Self {
        Self::new(
            config
                .open_command
                .clone()
                .unwrap_or_else(default_open_command),
            config.print_command.clone(),
        )
    }
}

impl Viewer for SystemViewer {
    fn open(&self, url: &Url) -> Option<Box<dyn DocumentView>> {
        match run_with_url(&self.open_command, url) {
            Ok(()) => {
                info!("opened {}", url);
                Some(Box::new(SystemView {
                    url: url.clone(),
                    print_command: self.print_command.clone(),
                }))
            }
            Err(e) => {
                warn!("could not open {}: {}", url, e);
                None
            }
        }
    }
}

struct SystemView {
    url: Url,
    print_command: Option<Vec<String>>,
}

impl DocumentView for SystemView {
    fn url(&self) -> &Url {
        &self.url
    }

    fn print(&self) -> Result<()> {
        match &self.print_command {
            Some(command) => run_with_url(command, &self.url),
            None => {
                info!(
                    "no print command configured; {} is left open in the viewer",
                    self.url
                );
                Ok(())
            }
        }
    }
}

fn run_with_url(command: &[String], url: &Url) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| FichasError::config("empty viewer command"))?;
    debug!("running {} {:?} {}", program, args, url);

    let status = Command::new(program)
        .args(args)
        .arg(url.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(FichasError::other(format!(
            "{} exited with {}",
            program, status
        )))
    }
}
