//! Spectrum result types

use serde::{Deserialize, Serialize};

/// Inclusive frequency band requested by the caller.
///
/// `fmax = None` means "up to Nyquist" and is resolved once the sample rate
/// of the waveform is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub fmin: f64,
    pub fmax: Option<f64>,
}

impl FrequencyBand {
    pub fn new(fmin: f64, fmax: f64) -> Self {
        Self {
            fmin,
            fmax: Some(fmax),
        }
    }

    /// Band from `fmin` up to the Nyquist frequency of whatever is analysed.
    pub fn up_to_nyquist(fmin: f64) -> Self {
        Self { fmin, fmax: None }
    }

    /// Concrete `(fmin, fmax)` for a waveform sampled at `sample_rate`.
    pub fn resolve(&self, sample_rate: f64) -> (f64, f64) {
        (self.fmin, self.fmax.unwrap_or(sample_rate / 2.0))
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self::up_to_nyquist(0.0)
    }
}

/// Provenance of a locally computed spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumMeta {
    pub sample_rate: f64,
    pub fmin: f64,
    pub fmax: f64,
    /// Sample count before zero-padding
    pub n_original: usize,
    /// Transform length after zero-padding
    pub n_fft: usize,
    pub factor: f64,
}

/// Band-limited magnitude spectrum, serialized as the computed spectrum file
/// (`{freqs, spectrum, meta}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Bin frequencies (Hz), ascending
    pub freqs: Vec<f64>,
    /// Normalised magnitude at each bin
    pub spectrum: Vec<f64>,
    pub meta: SpectrumMeta,
}

impl SpectrumResult {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// `(frequency, magnitude)` pairs in frequency order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.freqs.iter().copied().zip(self.spectrum.iter().copied())
    }

    /// Bin with the largest magnitude, if any.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.points()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Frequency spacing between adjacent FFT bins.
    pub fn bin_width(&self) -> f64 {
        if self.meta.n_fft == 0 {
            return 0.0;
        }
        self.meta.sample_rate / self.meta.n_fft as f64
    }
}
