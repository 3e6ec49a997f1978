//! Remote data gateway client.
//!
//! Builds the gateway's query URLs and interprets its replies. The actual I/O
//! is delegated to a [`Transport`].

pub mod transport;

pub use transport::{CallbackRegistry, Delivery, HttpTransport, Transport};

use crate::config::GatewayConfig;
use crate::error::{FichasError, Result};
use crate::print::PrintKind;
use crate::record::Record;
use log::{debug, warn};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Client for the spreadsheet gateway.
#[derive(Clone)]
pub struct Gateway {
    base: Url,
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(base: Url, transport: Arc<dyn Transport>) -> Self {
        Self { base, transport }
    }

    /// Gateway over HTTP as described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let base = config.parsed_base_url()?;
        let delivery = if config.callback_mode {
            Delivery::Callback
        } else {
            Delivery::Plain
        };
        let transport =
            HttpTransport::new(Duration::from_secs(config.timeout_secs.max(1)), delivery)?;
        Ok(Self::new(base, Arc::new(transport)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetch the complete record set.
    pub async fn fetch_all(&self) -> Result<Vec<Record>> {
        let url = self.endpoint(&[("getAllData", "true")]);
        let payload = self.transport.fetch_json(url).await?;

        if !payload.is_array() {
            return Err(FichasError::shape("expected an array of records"));
        }
        let records: Vec<Record> = serde_json::from_value(payload)
            .map_err(|e| FichasError::shape(format!("malformed record: {}", e)))?;
        debug!("gateway returned {} records", records.len());
        Ok(records)
    }

    /// Ask the gateway for the printable document of one entry.
    ///
    /// Without a kind the generic endpoint picks the form; with one the typed
    /// endpoint is used. `Ok(None)` means the gateway had no URL to give.
    pub async fn print_url(&self, entry: &str, kind: Option<PrintKind>) -> Result<Option<Url>> {
        let url = match kind {
            None => self.endpoint(&[("getPrintUrl", entry)]),
            Some(kind) => self.endpoint(&[("getFichaManual", entry), ("tipo", kind.as_param())]),
        };
        let payload = self.transport.fetch_json(url).await?;
        Ok(document_url(&payload))
    }

    /// URL of the combined document for a group of entries.
    ///
    /// This one is opened directly rather than fetched. Each identifier is
    /// percent-encoded on its own and the list is joined with bare commas.
    pub fn batch_url(&self, entries: &[String]) -> Url {
        let ids = entries
            .iter()
            .map(|id| urlencoding::encode(id))
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.base.clone();
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => {
                format!("{}&getFichaBatch={}", existing, ids)
            }
            _ => format!("getFichaBatch={}", ids),
        };
        url.set_query(Some(&query));
        url
    }

    fn endpoint(&self, pairs: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        url
    }
}

fn document_url(payload: &Value) -> Option<Url> {
    let raw = payload.get("url")?.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("gateway returned an unusable print URL '{}': {}", raw, e);
            None
        }
    }
}
