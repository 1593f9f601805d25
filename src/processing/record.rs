//! Record-level entry points: waveform → spectrum, stored spectrum → axis

use super::{FrequencySpectrum, ProcessingError, SpectrumEngine};
use crate::codec::{decode_best_effort, decode_samples};
use crate::types::{FrequencyBand, MeasurementRecord, SpectrumResult};

/// Decode a waveform record and compute its spectrum over `band`.
///
/// The record's own `factor` and `sample_rate` are used; an open upper band
/// edge resolves to Nyquist. Payload problems surface as
/// [`ProcessingError::Codec`].
pub fn compute_record_spectrum(
    record: &MeasurementRecord,
    band: FrequencyBand,
) -> Result<SpectrumResult, ProcessingError> {
    let sample_rate = record.sample_rate.ok_or(ProcessingError::MissingSampleRate)?;
    let samples = decode_samples(&record.data)?;
    let (fmin, fmax) = band.resolve(sample_rate);
    SpectrumEngine::new().compute(&samples, record.factor, sample_rate, fmin, fmax)
}

/// Rebuild frequency and magnitude arrays from a pre-computed spectrum record.
///
/// Magnitudes are decoded best-effort (the element type of stored spectra is
/// not fixed) and scaled by `factor`; frequencies are evenly spaced from
/// `min_freq` to `max_freq` inclusive.
pub fn record_spectrum_axis(record: &MeasurementRecord) -> Result<FrequencySpectrum, ProcessingError> {
    let (Some(min_freq), Some(max_freq)) = (record.min_freq, record.max_freq) else {
        return Err(ProcessingError::MissingFrequencyBounds);
    };

    let detected = decode_best_effort(&record.data)?;
    let magnitudes: Vec<f64> = detected.values.iter().map(|v| v * record.factor).collect();
    let frequencies = linspace(min_freq, max_freq, magnitudes.len());

    Ok(FrequencySpectrum {
        frequencies,
        magnitudes,
    })
}

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}
