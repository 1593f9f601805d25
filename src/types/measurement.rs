//! Measurement identity and downloaded record types

use serde::{Deserialize, Serialize};

/// Epoch value the service interprets as "most recent measurement".
pub const LATEST_SENTINEL: i64 = 0;

/// Which family of measurements a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Time-domain vibration waveform
    Wave,
    /// Frequency-domain magnitude spectrum computed by the service
    Spectrum,
}

impl MeasurementKind {
    /// Path segment used by the remote service (`waves` / `spectra`).
    pub fn collection(self) -> &'static str {
        match self {
            Self::Wave => "waves",
            Self::Spectrum => "spectra",
        }
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wave => write!(f, "wave"),
            Self::Spectrum => write!(f, "spectrum"),
        }
    }
}

/// Machine / measurement point / processing mode triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementKey {
    /// Machine name (e.g. `LP_Turbine`)
    pub machine: String,
    /// Measurement point (e.g. `MAD31CY005`)
    pub point: String,
    /// Processing mode (e.g. `AM1`)
    pub mode: String,
}

impl MeasurementKey {
    pub fn new(machine: impl Into<String>, point: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            point: point.into(),
            mode: mode.into(),
        }
    }

    /// `machine_point_mode`, the stem shared by every stored file of this key.
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.machine, self.point, self.mode)
    }
}

impl std::fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.machine, self.point, self.mode)
    }
}

/// One entry of a catalog listing: the epoch and its ISO-8601 rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampEntry {
    pub epoch: i64,
    pub iso: String,
}

/// One downloaded waveform or spectrum, exactly as the service returns it.
///
/// `data` is base64 text wrapping a zlib-compressed buffer of little-endian
/// samples. Records are immutable once built; decoding lives in
/// [`crate::codec`] and [`crate::processing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Measurement source label
    #[serde(default)]
    pub path: String,

    /// Compressed, base64-encoded sample payload
    pub data: String,

    /// Scale applied to raw integer samples to obtain physical units
    #[serde(default = "default_factor")]
    pub factor: f64,

    /// Samples per second (waveforms only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,

    /// Lower frequency bound (spectra only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_freq: Option<f64>,

    /// Upper frequency bound (spectra only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_freq: Option<f64>,
}

fn default_factor() -> f64 {
    1.0
}

impl MeasurementRecord {
    /// Whether the record carries the frequency bounds of a pre-computed spectrum.
    pub fn is_spectrum(&self) -> bool {
        self.min_freq.is_some() && self.max_freq.is_some()
    }
}
