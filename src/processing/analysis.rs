//! Spectrum analysis helpers
//!
//! Peak picking, overall level and a side-by-side comparison of a spectrum
//! downloaded from the service against one computed locally from the
//! matching waveform.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::FrequencySpectrum;

/// Find the frequency of peak amplitude within a band.
///
/// Returns both the frequency and amplitude of the maximum within the band.
pub fn find_peak_in_band(
    spectrum: &FrequencySpectrum,
    low_freq: f64,
    high_freq: f64,
) -> Option<(f64, f64)> {
    spectrum
        .frequencies
        .iter()
        .zip(spectrum.magnitudes.iter())
        .filter(|(&f, _)| f >= low_freq && f <= high_freq)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(&f, &m)| (f, m))
}

/// RMS of the spectrum magnitudes; `0.0` for an empty spectrum.
pub fn spectrum_rms(spectrum: &FrequencySpectrum) -> f64 {
    if spectrum.magnitudes.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = spectrum.magnitudes.iter().map(|m| m * m).sum();
    (sum_squares / spectrum.magnitudes.len() as f64).sqrt()
}

/// Find the `n_peaks` strongest local maxima.
///
/// A bin counts as a peak when it is strictly greater than both neighbours.
/// Spectra shorter than three bins are returned as-is.
///
/// # Returns
/// Vector of (frequency, magnitude) tuples sorted by magnitude descending
pub fn find_dominant_frequencies(spectrum: &FrequencySpectrum, n_peaks: usize) -> Vec<(f64, f64)> {
    let mags = &spectrum.magnitudes;
    if mags.len() < 3 {
        return spectrum
            .frequencies
            .iter()
            .zip(mags.iter())
            .map(|(&f, &m)| (f, m))
            .take(n_peaks)
            .collect();
    }

    let mut peaks: Vec<(f64, f64)> = mags
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, w)| (spectrum.frequencies[i + 1], w[1]))
        .collect();

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    peaks.truncate(n_peaks);
    peaks
}

// ============================================================================
// Comparison
// ============================================================================

/// Local maxima reported per side of a comparison
const SUMMARY_PEAKS: usize = 5;

/// Summary of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumSummary {
    pub bins: usize,
    /// `(frequency, magnitude)` of the strongest bin
    pub peak: Option<(f64, f64)>,
    /// Strongest local maxima, loudest first
    pub dominant: Vec<(f64, f64)>,
    pub rms: f64,
    pub min_freq: Option<f64>,
    pub max_freq: Option<f64>,
}

impl SpectrumSummary {
    pub fn of(spectrum: &FrequencySpectrum) -> Self {
        let peak = find_peak_in_band(spectrum, f64::NEG_INFINITY, f64::INFINITY);
        let min_freq = spectrum.frequencies.iter().copied().reduce(f64::min);
        let max_freq = spectrum.frequencies.iter().copied().reduce(f64::max);
        Self {
            bins: spectrum.frequencies.len(),
            peak,
            dominant: find_dominant_frequencies(spectrum, SUMMARY_PEAKS),
            rms: spectrum_rms(spectrum),
            min_freq,
            max_freq,
        }
    }
}

/// Service-computed spectrum vs locally computed spectrum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumComparison {
    pub reference: SpectrumSummary,
    pub candidate: SpectrumSummary,
    /// `candidate peak - reference peak` (Hz)
    pub peak_shift_hz: Option<f64>,
    /// `candidate rms / reference rms`; `None` when the reference is silent
    pub rms_ratio: Option<f64>,
}

/// Compare a `candidate` spectrum against a `reference`.
pub fn compare_spectra(reference: &FrequencySpectrum, candidate: &FrequencySpectrum) -> SpectrumComparison {
    let reference = SpectrumSummary::of(reference);
    let candidate = SpectrumSummary::of(candidate);

    let peak_shift_hz = match (reference.peak, candidate.peak) {
        (Some((rf, _)), Some((cf, _))) => Some(cf - rf),
        _ => None,
    };
    let rms_ratio = (reference.rms > 0.0).then(|| candidate.rms / reference.rms);

    tracing::debug!(
        reference_bins = reference.bins,
        candidate_bins = candidate.bins,
        ?peak_shift_hz,
        ?rms_ratio,
        "Compared spectra"
    );

    SpectrumComparison {
        reference,
        candidate,
        peak_shift_hz,
        rms_ratio,
    }
}

fn write_summary(f: &mut fmt::Formatter<'_>, name: &str, s: &SpectrumSummary) -> fmt::Result {
    write!(f, "{name:<10} {:>6} bins", s.bins)?;
    if let (Some(lo), Some(hi)) = (s.min_freq, s.max_freq) {
        write!(f, "  {lo:.1}-{hi:.1} Hz")?;
    }
    match s.peak {
        Some((freq, mag)) => write!(f, "  peak {mag:.4} @ {freq:.2} Hz")?,
        None => write!(f, "  peak n/a")?,
    }
    writeln!(f, "  rms {:.4}", s.rms)?;
    if !s.dominant.is_empty() {
        let peaks: Vec<String> = s
            .dominant
            .iter()
            .map(|(freq, mag)| format!("{freq:.2} Hz ({mag:.4})"))
            .collect();
        writeln!(f, "{:<10} top peaks: {}", "", peaks.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for SpectrumComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Spectrum Comparison (downloaded vs computed)")?;
        writeln!(f, "============================================")?;
        write_summary(f, "downloaded", &self.reference)?;
        write_summary(f, "computed", &self.candidate)?;
        match self.peak_shift_hz {
            Some(shift) => writeln!(f, "peak shift: {shift:+.2} Hz")?,
            None => writeln!(f, "peak shift: n/a")?,
        }
        match self.rms_ratio {
            Some(ratio) => write!(f, "rms ratio:  {ratio:.4}"),
            None => write!(f, "rms ratio:  n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(frequencies: Vec<f64>, magnitudes: Vec<f64>) -> FrequencySpectrum {
        FrequencySpectrum {
            frequencies,
            magnitudes,
        }
    }

    #[test]
    fn test_find_peak_in_band() {
        let s = spectrum(vec![10.0, 20.0, 30.0, 40.0], vec![0.1, 0.9, 0.3, 1.5]);
        assert_eq!(find_peak_in_band(&s, 0.0, 35.0), Some((20.0, 0.9)));
        assert_eq!(find_peak_in_band(&s, 0.0, 100.0), Some((40.0, 1.5)));
        assert_eq!(find_peak_in_band(&s, 50.0, 60.0), None);
    }

    #[test]
    fn test_spectrum_rms() {
        let s = spectrum(vec![1.0, 2.0], vec![3.0, 4.0]);
        assert!((spectrum_rms(&s) - (12.5_f64).sqrt()).abs() < 1e-12);
        assert_eq!(spectrum_rms(&spectrum(vec![], vec![])), 0.0);
    }

    #[test]
    fn test_dominant_frequencies_are_local_maxima() {
        let s = spectrum(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![0.0, 2.0, 1.0, 5.0, 1.0, 3.0, 9.0],
        );
        // The edge bin (9.0) has only one neighbour and is not a peak
        assert_eq!(find_dominant_frequencies(&s, 2), vec![(3.0, 5.0), (5.0, 3.0)]);
        assert_eq!(find_dominant_frequencies(&s, 10).len(), 3);
    }

    #[test]
    fn test_compare_spectra() {
        let reference = spectrum(vec![0.0, 50.0, 100.0], vec![0.0, 2.0, 0.0]);
        let candidate = spectrum(vec![0.0, 49.0, 98.0], vec![0.0, 4.0, 0.0]);
        let cmp = compare_spectra(&reference, &candidate);

        assert_eq!(cmp.reference.peak, Some((50.0, 2.0)));
        assert_eq!(cmp.peak_shift_hz, Some(-1.0));
        assert!((cmp.rms_ratio.expect("ratio") - 2.0).abs() < 1e-12);
        assert_eq!(cmp.candidate.max_freq, Some(98.0));
        assert_eq!(cmp.reference.dominant, vec![(50.0, 2.0)]);
        assert_eq!(cmp.candidate.dominant, vec![(49.0, 4.0)]);

        let report = cmp.to_string();
        assert!(report.contains("peak shift: -1.00 Hz"));
        assert!(report.contains("rms ratio:  2.0000"));
        assert!(report.contains("top peaks: 50.00 Hz (2.0000)"));
        assert!(report.contains("top peaks: 49.00 Hz (4.0000)"));
    }

    #[test]
    fn test_comparison_lists_loudest_peaks_first() {
        let reference = spectrum(
            vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            vec![0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0],
        );
        let cmp = compare_spectra(&reference, &reference);
        assert_eq!(cmp.reference.dominant, vec![(30.0, 3.0), (50.0, 2.0), (10.0, 1.0)]);
        assert!(cmp
            .to_string()
            .contains("top peaks: 30.00 Hz (3.0000), 50.00 Hz (2.0000), 10.00 Hz (1.0000)"));
    }

    #[test]
    fn test_compare_against_silent_reference() {
        let silent = spectrum(vec![0.0, 1.0, 2.0], vec![0.0, 0.0, 0.0]);
        let cmp = compare_spectra(&silent, &silent);
        assert_eq!(cmp.rms_ratio, None);
        // Flat spectra have no local maxima
        assert!(cmp.reference.dominant.is_empty());
        let report = cmp.to_string();
        assert!(report.contains("rms ratio:  n/a"));
        assert!(!report.contains("top peaks"));
    }
}
