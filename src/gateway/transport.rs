//! Transport adapter for gateway requests.
//!
//! The gateway is a spreadsheet web app that historically only answered
//! cross-origin callers through a named callback wrapper. `HttpTransport` can
//! speak both the plain JSON dialect and the callback dialect; callers only ever
//! see parsed JSON or a transport error.

use crate::error::{FichasError, Result};
use async_trait::async_trait;
use log::{debug, trace};
use parking_lot::Mutex;
use rand::Rng;
use reqwest::Url;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One request, one parsed JSON value.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and parse the response body as JSON.
    ///
    /// Fails with [`FichasError::Transport`] when the gateway cannot be reached,
    /// answers with an error status, or the body is not JSON. Checking that the
    /// JSON has the expected structure is left to the caller.
    async fn fetch_json(&self, url: Url) -> Result<Value>;
}

/// How the gateway delivers its payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Body is the JSON payload
    #[default]
    Plain,
    /// Request carries `callback=NAME`; body is `NAME(<json>)`
    Callback,
}

/// Names of callbacks currently in flight.
///
/// Every callback-style request registers a fresh name for its lifetime so
/// overlapping requests never share one; the name is released when the
/// request finishes, whichever way it finishes.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    active: Mutex<HashSet<String>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name no other in-flight request holds.
    pub fn register(&self) -> CallbackGuard<'_> {
        let mut active = self.active.lock();
        let name = loop {
            let candidate = candidate_name();
            if !active.contains(&candidate) {
                break candidate;
            }
        };
        active.insert(name.clone());
        trace!("registered callback {}", name);
        CallbackGuard {
            registry: self,
            name,
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.lock().contains(name)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

fn candidate_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("cb_{}_{}", millis, suffix)
}

/// Releases its callback name on drop.
#[derive(Debug)]
pub struct CallbackGuard<'a> {
    registry: &'a CallbackRegistry,
    name: String,
}

impl CallbackGuard<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for CallbackGuard<'_> {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.name);
        trace!("released callback {}", self.name);
    }
}

/// Extract the JSON text from a `NAME(<json>)` body.
pub fn unwrap_callback<'b>(body: &'b str, name: &str) -> Result<&'b str> {
    let wrapped = || FichasError::shape(format!("response is not wrapped in callback {}", name));

    let trimmed = body.trim();
    let trimmed = trimmed.strip_prefix("/**/").unwrap_or(trimmed).trim_start();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    let inner = trimmed
        .strip_prefix(name)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(wrapped)?;
    Ok(inner)
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    delivery: Delivery,
    callbacks: Arc<CallbackRegistry>,
}

impl HttpTransport {
    pub fn new(timeout: Duration, delivery: Delivery) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fichas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FichasError::Transport {
                message: "failed to build HTTP client".to_string(),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            delivery,
            callbacks: Arc::new(CallbackRegistry::new()),
        })
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn callbacks(&self) -> Arc<CallbackRegistry> {
        Arc::clone(&self.callbacks)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_json(&self, url: Url) -> Result<Value> {
        let body;
        let payload = match self.delivery {
            Delivery::Plain => {
                body = self.get_text(url).await?;
                body.as_str()
            }
            Delivery::Callback => {
                let guard = self.callbacks.register();
                let mut url = url;
                url.query_pairs_mut().append_pair("callback", guard.name());
                body = self.get_text(url).await?;
                unwrap_callback(&body, guard.name())?
            }
        };

        serde_json::from_str(payload)
            .map_err(|e| FichasError::transport(format!("gateway body is not JSON: {}", e)))
    }
}
