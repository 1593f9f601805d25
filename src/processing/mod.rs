//! Signal processing module - spectrum computation and comparison

mod analysis;
mod fft;
mod record;

pub use analysis::*;
pub use fft::*;
pub use record::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::CodecError;

/// Errors in signal processing
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Payload decode failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Record has no sample rate; only waveforms can be transformed")]
    MissingSampleRate,

    #[error("Record has no min_freq/max_freq; not a pre-computed spectrum")]
    MissingFrequencyBounds,

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),

    #[error("Invalid frequency band [{fmin}, {fmax}]")]
    InvalidBand { fmin: f64, fmax: f64 },
}

/// Frequency/magnitude pairs regardless of where they came from: computed
/// locally, reconstructed from a downloaded spectrum, or read from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySpectrum {
    /// Frequency bins (Hz)
    pub frequencies: Vec<f64>,
    /// Magnitude at each frequency
    pub magnitudes: Vec<f64>,
}

impl From<crate::types::SpectrumResult> for FrequencySpectrum {
    fn from(result: crate::types::SpectrumResult) -> Self {
        Self {
            frequencies: result.freqs,
            magnitudes: result.spectrum,
        }
    }
}
