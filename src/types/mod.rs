//! Shared data structures for the T8 client
//!
//! - Measurement identity: `MeasurementKey`, `MeasurementKind`
//! - Catalog listing entries: `TimestampEntry`
//! - Downloaded payloads: `MeasurementRecord`
//! - Spectrum results: `FrequencyBand`, `SpectrumResult`

mod measurement;
mod spectrum;

pub use measurement::*;
pub use spectrum::*;
