//! Catalog client over a [`Transport`]

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::transport::{HttpTransport, Transport};
use super::{snippet, CatalogError};
use crate::config::defaults::{CONNECTION_SNIPPET_CHARS, ERROR_SNIPPET_CHARS};
use crate::config::ConnectionConfig;
use crate::time::{epoch_to_iso, ResolvedTimestamp, TimestampSpec};
use crate::types::{MeasurementKey, MeasurementKind, MeasurementRecord, TimestampEntry, LATEST_SENTINEL};

// ============================================================================
// Listing
// ============================================================================

/// Outcome of a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Concrete timestamps in service order (oldest first), sentinel removed
    Available(Vec<TimestampEntry>),
    /// The service answered with a non-success status
    Unavailable { status: u16, snippet: String },
}

impl Listing {
    /// Listed entries; empty when the listing was unavailable.
    pub fn entries(&self) -> &[TimestampEntry] {
        match self {
            Self::Available(entries) => entries,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Most recent concrete entry.
    pub fn latest(&self) -> Option<&TimestampEntry> {
        self.entries().last()
    }
}

#[derive(Debug, Deserialize)]
struct ListingBody {
    #[serde(default, rename = "_items")]
    items: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    #[serde(default, rename = "_links")]
    links: ItemLinks,
}

#[derive(Debug, Default, Deserialize)]
struct ItemLinks {
    #[serde(default, rename = "self")]
    self_url: Option<String>,
}

/// Extract timestamp entries from a listing body.
///
/// The last path segment of each item's self URL is its epoch. The sentinel
/// `0` and segments that are not integers are dropped; order is preserved.
pub fn parse_listing(body: &str) -> Result<Vec<TimestampEntry>, CatalogError> {
    let parsed: ListingBody = serde_json::from_str(body)?;
    let mut entries = Vec::with_capacity(parsed.items.len());

    for url in parsed.items.into_iter().filter_map(|item| item.links.self_url) {
        let Some(segment) = url.trim_end_matches('/').rsplit('/').next() else {
            continue;
        };
        let epoch = match segment.parse::<i64>() {
            Ok(LATEST_SENTINEL) => continue,
            Ok(epoch) => epoch,
            Err(_) => {
                warn!(%url, "Listing item does not end in an epoch, skipping");
                continue;
            }
        };
        match epoch_to_iso(epoch) {
            Ok(iso) => entries.push(TimestampEntry { epoch, iso }),
            Err(e) => warn!(%url, error = %e, "Listing item has unusable epoch, skipping"),
        }
    }

    Ok(entries)
}

// ============================================================================
// Fetched Record
// ============================================================================

/// A record together with what was asked for and what it turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRecord {
    pub key: MeasurementKey,
    pub kind: MeasurementKind,
    pub requested: TimestampSpec,
    pub resolved: ResolvedTimestamp,
    pub record: MeasurementRecord,
}

impl FetchedRecord {
    /// Epoch label for persistence and display.
    pub fn label(&self) -> String {
        self.resolved.label()
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the monitoring service's REST catalog.
pub struct T8Client<T = HttpTransport> {
    host: String,
    transport: T,
}

impl T8Client<HttpTransport> {
    /// Build an HTTP-backed client. Missing host or credentials are fatal here.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, CatalogError> {
        config.require_credentials()?;
        let transport = HttpTransport::new(config)?;
        info!(host = %config.host, timeout_secs = config.timeout_secs, "Catalog client ready");
        Ok(Self::with_transport(&config.host, transport))
    }
}

impl<T: Transport> T8Client<T> {
    pub fn with_transport(host: &str, transport: T) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Collection URL, or record URL when `epoch` is given.
    pub fn url_for(&self, key: &MeasurementKey, kind: MeasurementKind, epoch: Option<i64>) -> String {
        let base = format!(
            "{}/{}/{}/{}/{}",
            self.host,
            kind.collection(),
            key.machine,
            key.point,
            key.mode
        );
        match epoch {
            Some(e) => format!("{base}/{e}"),
            None => base,
        }
    }

    /// GET the service root and report `(status, snippet)` without judging it.
    pub fn test_connection(&self) -> Result<(u16, String), CatalogError> {
        let reply = self.transport.get(&self.host)?;
        Ok((reply.status, snippet(&reply.body, CONNECTION_SNIPPET_CHARS)))
    }

    /// List concrete measurement timestamps for `key`, oldest first.
    pub fn list_timestamps(
        &self,
        key: &MeasurementKey,
        kind: MeasurementKind,
    ) -> Result<Listing, CatalogError> {
        let url = self.url_for(key, kind, None);
        let reply = self.transport.get(&url)?;

        if !reply.is_success() {
            let snippet = snippet(&reply.body, ERROR_SNIPPET_CHARS);
            warn!(%key, %kind, status = reply.status, %snippet, "Listing unavailable");
            return Ok(Listing::Unavailable {
                status: reply.status,
                snippet,
            });
        }

        let entries = parse_listing(&reply.body)?;
        debug!(%key, %kind, count = entries.len(), "Listed measurements");
        Ok(Listing::Available(entries))
    }

    /// Fetch one record.
    ///
    /// For [`TimestampSpec::Latest`] the fetch goes out with the sentinel and
    /// the real epoch is then taken from the last entry of a fresh listing,
    /// because the record body does not carry its own timestamp. The listing
    /// may have moved on between the two calls.
    pub fn fetch_record(
        &self,
        key: &MeasurementKey,
        kind: MeasurementKind,
        requested: TimestampSpec,
    ) -> Result<FetchedRecord, CatalogError> {
        let url = self.url_for(key, kind, Some(requested.wire_epoch()));
        let reply = self.transport.get(&url)?;

        if !reply.is_success() {
            return Err(CatalogError::NotFound {
                url,
                status: reply.status,
                snippet: snippet(&reply.body, ERROR_SNIPPET_CHARS),
            });
        }

        let record: MeasurementRecord = serde_json::from_str(&reply.body)?;

        let resolved = match requested {
            TimestampSpec::Epoch(epoch) => ResolvedTimestamp::Concrete(epoch),
            TimestampSpec::Latest => {
                let listing = self.list_timestamps(key, kind)?;
                let resolved = requested.resolve_against(listing.entries());
                match resolved {
                    ResolvedTimestamp::Concrete(epoch) => {
                        debug!(%key, %kind, epoch, "Resolved latest via listing");
                    }
                    ResolvedTimestamp::Unresolved => {
                        warn!(%key, %kind, "Fetched latest but listing names no concrete timestamp");
                    }
                }
                resolved
            }
        };

        info!(%key, %kind, label = %resolved.label(), "Fetched record");
        Ok(FetchedRecord {
            key: key.clone(),
            kind,
            requested,
            resolved,
            record,
        })
    }
}
