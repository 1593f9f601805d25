//! Spectrum computation using rustfft
//!
//! Turns a 16-bit waveform into a band-limited magnitude spectrum.
//!
//! # Pipeline
//!
//! 1. Scale samples by the record factor
//! 2. Remove the mean (DC)
//! 3. Apply a Hann window over the original length
//! 4. Zero-pad to the next power of two
//! 5. Forward complex FFT
//! 6. Magnitude × 2√2 / N
//! 7. Keep bins whose frequency lies in `[fmin, fmax]`
//!
//! # Example
//!
//! ```ignore
//! use t8_client::processing::SpectrumEngine;
//!
//! let mut engine = SpectrumEngine::new();
//! let spectrum = engine.compute(&samples, 0.01, 2560.0, 0.0, 1000.0)?;
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use super::ProcessingError;
use crate::types::{SpectrumMeta, SpectrumResult};

/// Amplitude correction applied to the raw transform.
///
/// `2` for the single-sided amplitude convention, `√2` for the energy lost
/// to the Hann window.
pub const SPECTRUM_SCALE: f64 = 2.0 * std::f64::consts::SQRT_2;

// ============================================================================
// Building Blocks
// ============================================================================

/// Symmetric Hann window of `len` points.
///
/// `0.5 - 0.5·cos(2πi/(len-1))`; a single point window is `[1.0]`.
pub fn hann_window(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f64;
            (0..len)
                .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
                .collect()
        }
    }
}

/// Transform length for `n` samples: the smallest power of two `>= n`.
pub fn padded_length(n: usize) -> usize {
    n.next_power_of_two()
}

/// Bin frequencies for an `n`-point transform at `sample_rate`.
///
/// Standard FFT layout: non-negative bins first in ascending order, then the
/// negative (wrapped) bins from most to least negative.
pub fn fft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let resolution = sample_rate / n as f64;
    let n_positive = (n - 1) / 2 + 1;
    (0..n)
        .map(|i| {
            if i < n_positive {
                i as f64 * resolution
            } else {
                (i as f64 - n as f64) * resolution
            }
        })
        .collect()
}

// ============================================================================
// Spectrum Engine
// ============================================================================

/// Spectrum computation with a reusable FFT planner.
///
/// Plans are cached by the planner, so computing many spectra of the same
/// length through one engine only plans once.
pub struct SpectrumEngine {
    planner: FftPlanner<f64>,
}

impl Default for SpectrumEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumEngine {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Compute the band-limited spectrum of `samples`.
    ///
    /// All-zero and empty inputs are valid and produce zero magnitudes.
    ///
    /// # Errors
    /// - [`ProcessingError::InvalidSamplingRate`] if `sample_rate` is not a positive finite number
    /// - [`ProcessingError::InvalidBand`] unless `0 <= fmin <= fmax` (finite)
    pub fn compute(
        &mut self,
        samples: &[i16],
        factor: f64,
        sample_rate: f64,
        fmin: f64,
        fmax: f64,
    ) -> Result<SpectrumResult, ProcessingError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ProcessingError::InvalidSamplingRate(sample_rate));
        }
        if !fmin.is_finite() || !fmax.is_finite() || fmin < 0.0 || fmin > fmax {
            return Err(ProcessingError::InvalidBand { fmin, fmax });
        }

        let n_original = samples.len();
        let n_fft = padded_length(n_original);

        let scaled: Vec<f64> = samples.iter().map(|&s| f64::from(s) * factor).collect();
        let mean = if scaled.is_empty() {
            0.0
        } else {
            scaled.iter().sum::<f64>() / scaled.len() as f64
        };

        let window = hann_window(n_original);
        let mut buffer: Vec<Complex<f64>> = Vec::with_capacity(n_fft);
        buffer.extend(
            scaled
                .iter()
                .zip(window.iter())
                .map(|(&x, &w)| Complex::new((x - mean) * w, 0.0)),
        );
        buffer.resize(n_fft, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(n_fft);
        fft.process(&mut buffer);

        let norm = SPECTRUM_SCALE / n_fft as f64;
        let (freqs, spectrum): (Vec<f64>, Vec<f64>) = fft_frequencies(n_fft, sample_rate)
            .into_iter()
            .zip(buffer.iter())
            .filter(|(f, _)| *f >= fmin && *f <= fmax)
            .map(|(f, c)| (f, c.norm() * norm))
            .unzip();

        tracing::debug!(
            n_original,
            n_fft,
            bins = freqs.len(),
            fmin,
            fmax,
            "Computed spectrum"
        );

        Ok(SpectrumResult {
            freqs,
            spectrum,
            meta: SpectrumMeta {
                sample_rate,
                fmin,
                fmax,
                n_original,
                n_fft,
                factor,
            },
        })
    }
}

/// One-shot spectrum computation.
///
/// This is the primary entry point; use [`SpectrumEngine`] directly to reuse
/// FFT plans across many waveforms.
pub fn compute_spectrum(
    samples: &[i16],
    factor: f64,
    sample_rate: f64,
    fmin: f64,
    fmax: f64,
) -> Result<SpectrumResult, ProcessingError> {
    SpectrumEngine::new().compute(samples, factor, sample_rate, fmin, fmax)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(n: usize, freq: f64, sample_rate: f64, amplitude: f64) -> Vec<i16> {
        (0..n)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin()).round() as i16)
            .collect()
    }

    #[test]
    fn test_hann_window_shape() {
        let window = hann_window(5);
        assert_eq!(window.len(), 5);
        assert!(window[0].abs() < 1e-12);
        assert!((window[2] - 1.0).abs() < 1e-12);
        assert!(window[4].abs() < 1e-12);
        assert!((window[1] - window[3]).abs() < 1e-12, "window is symmetric");
        assert_eq!(hann_window(1), vec![1.0]);
        assert!(hann_window(0).is_empty());
    }

    #[test]
    fn test_padded_length() {
        assert_eq!(padded_length(1), 1);
        assert_eq!(padded_length(3), 4);
        assert_eq!(padded_length(1000), 1024);
        assert_eq!(padded_length(1024), 1024);
        assert_eq!(padded_length(1025), 2048);
    }

    #[test]
    fn test_fft_frequencies_layout() {
        let freqs = fft_frequencies(8, 8.0);
        assert_eq!(freqs, vec![0.0, 1.0, 2.0, 3.0, -4.0, -3.0, -2.0, -1.0]);
        assert_eq!(fft_frequencies(1, 100.0), vec![0.0]);
    }

    #[test]
    fn test_on_bin_sine_peak_and_amplitude() {
        // 64 Hz at 1024 Hz over 1024 samples falls exactly on bin 64
        let amplitude = 10_000.0;
        let samples = sine(1024, 64.0, 1024.0, amplitude);
        let result = compute_spectrum(&samples, 1.0, 1024.0, 0.0, 512.0).expect("spectrum");

        let (peak_freq, peak_mag) = result.peak().expect("non-empty");
        assert!((peak_freq - 64.0).abs() < 1e-9);
        // Scaling reports the RMS of the tone
        let expected = amplitude / std::f64::consts::SQRT_2;
        assert!(
            (peak_mag - expected).abs() / expected < 0.01,
            "peak {peak_mag} vs expected {expected}"
        );
    }

    #[test]
    fn test_factor_scales_magnitude_linearly() {
        let samples = sine(512, 50.0, 1000.0, 1000.0);
        let unit = compute_spectrum(&samples, 1.0, 1000.0, 0.0, 500.0).expect("spectrum");
        let doubled = compute_spectrum(&samples, 2.0, 1000.0, 0.0, 500.0).expect("spectrum");
        for (a, b) in unit.spectrum.iter().zip(doubled.spectrum.iter()) {
            assert!((b - 2.0 * a).abs() <= 1e-9 * (1.0 + a.abs()));
        }
        assert_eq!(doubled.meta.factor, 2.0);
    }

    #[test]
    fn test_constant_signal_is_removed() {
        let samples = vec![1200i16; 300];
        let result = compute_spectrum(&samples, 0.5, 1000.0, 0.0, 500.0).expect("spectrum");
        assert!(result.spectrum.iter().all(|m| m.abs() < 1e-9));
        assert_eq!(result.meta.n_fft, 512);
        assert_eq!(result.meta.n_original, 300);
    }

    #[test]
    fn test_zero_and_empty_inputs_proceed() {
        let zeros = compute_spectrum(&[0; 100], 1.0, 100.0, 0.0, 50.0).expect("zeros");
        assert_eq!(zeros.meta.n_fft, 128);
        assert!(!zeros.is_empty());
        assert!(zeros.spectrum.iter().all(|&m| m == 0.0));

        let empty = compute_spectrum(&[], 1.0, 100.0, 0.0, 50.0).expect("empty");
        assert_eq!(empty.meta.n_fft, 1);
        assert_eq!(empty.freqs, vec![0.0]);
        assert_eq!(empty.spectrum, vec![0.0]);
    }

    #[test]
    fn test_band_filter_is_inclusive_and_ascending() {
        let samples = sine(1000, 50.0, 1000.0, 500.0);
        // n_fft = 1024, bins every 0.9765625 Hz; 125 Hz is bin 128 exactly
        let result = compute_spectrum(&samples, 1.0, 1000.0, 0.0, 125.0).expect("spectrum");
        assert_eq!(result.freqs.first().copied(), Some(0.0));
        assert_eq!(result.freqs.last().copied(), Some(125.0));
        assert_eq!(result.len(), 129);
        assert!(result.freqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert!(matches!(
            compute_spectrum(&[1, 2, 3], 1.0, 0.0, 0.0, 10.0),
            Err(ProcessingError::InvalidSamplingRate(_))
        ));
        assert!(matches!(
            compute_spectrum(&[1, 2, 3], 1.0, 100.0, 30.0, 10.0),
            Err(ProcessingError::InvalidBand { .. })
        ));
        assert!(matches!(
            compute_spectrum(&[1, 2, 3], 1.0, 100.0, -5.0, 10.0),
            Err(ProcessingError::InvalidBand { .. })
        ));
    }

    #[test]
    fn test_engine_reuse_matches_one_shot() {
        let samples = sine(700, 120.0, 2000.0, 800.0);
        let mut engine = SpectrumEngine::new();
        let first = engine.compute(&samples, 1.0, 2000.0, 0.0, 1000.0).expect("first");
        let second = engine.compute(&samples, 1.0, 2000.0, 0.0, 1000.0).expect("second");
        assert_eq!(first, second);
        assert_eq!(first, compute_spectrum(&samples, 1.0, 2000.0, 0.0, 1000.0).expect("one-shot"));
    }
}
