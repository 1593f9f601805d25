//! T8 Client: vibration data retrieval and spectrum analysis
//!
//! Client for a T8 condition-monitoring unit. Lists and downloads stored
//! waveforms and spectra over its REST interface, decodes the compressed
//! payloads and computes band-limited spectra locally.
//!
//! ## Architecture
//!
//! - **Codec**: base64 + zlib payload decoding
//! - **Time**: epoch / ISO-8601 conversion and timestamp specifiers
//! - **Catalog**: HTTP client for listings and record downloads
//! - **Processing**: FFT spectrum engine and spectrum comparison
//! - **Storage**: JSON files for downloaded and computed data

pub mod catalog;
pub mod codec;
pub mod config;
pub mod processing;
pub mod storage;
pub mod time;
pub mod types;

// Re-export configuration
pub use config::{AppConfig, ConfigError, ConnectionConfig};

// Re-export commonly used types
pub use types::{
    FrequencyBand, MeasurementKey, MeasurementKind, MeasurementRecord, SpectrumResult,
    TimestampEntry,
};

// Re-export the client
pub use catalog::{CatalogError, FetchedRecord, Listing, T8Client, Transport};

// Re-export processing entry points
pub use processing::{compute_record_spectrum, compute_spectrum, ProcessingError, SpectrumEngine};

pub use storage::{MeasurementStore, StorageError};
pub use time::{ResolvedTimestamp, TimestampSpec};
