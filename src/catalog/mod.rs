//! Measurement catalog: listing and fetching records from the monitoring service
//!
//! ## Endpoints
//!
//! - `GET {host}/{waves|spectra}/{machine}/{point}/{mode}` lists measurements;
//!   each item's `_links.self` URL ends in the epoch timestamp.
//! - `GET {host}/{waves|spectra}/{machine}/{point}/{mode}/{epoch}` fetches one
//!   record; epoch `0` asks for the most recent.
//!
//! ## Failure policy
//!
//! A listing that comes back with a non-success status is not an error: it is
//! reported as [`Listing::Unavailable`] (and logged), which reads as an empty
//! listing. A fetch that comes back non-success is [`CatalogError::NotFound`].
//! Network failures and timeouts propagate as [`CatalogError::Transport`] and
//! are never retried here.

mod client;
pub mod transport;

pub use client::*;
pub use transport::{HttpReply, HttpTransport, Transport, TransportError};

use thiserror::Error;

use crate::config::ConfigError;

/// Errors from catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Service returned status {status} for {url}: {snippet}")]
    NotFound {
        url: String,
        status: u16,
        snippet: String,
    },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    /// HTTP status carried by a `NotFound`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// First `max_chars` characters of a response body.
pub(crate) fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
