//! Measurement Storage
//!
//! Downloaded records and computed spectra are kept as pretty-printed JSON
//! files under a data directory:
//!
//! ```text
//! {root}/waves/{machine}_{point}_{mode}_{label}.json
//! {root}/spectra/{machine}_{point}_{mode}_{label}.json
//! {root}/spectra/{machine}_{point}_{mode}_{label}_computed.json
//! ```
//!
//! `label` is the resolved epoch of the measurement, or `latest` when it
//! could not be resolved.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::processing::{record_spectrum_axis, FrequencySpectrum, ProcessingError};
use crate::types::{MeasurementKey, MeasurementKind, MeasurementRecord, SpectrumResult};

/// Error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored spectrum could not be decoded: {0}")]
    Processing(#[from] ProcessingError),

    #[error("{} is neither a downloaded spectrum nor a computed spectrum file", .0.display())]
    UnrecognizedLayout(PathBuf),
}

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    root: PathBuf,
}

impl MeasurementStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of a downloaded record.
    pub fn record_path(&self, key: &MeasurementKey, kind: MeasurementKind, label: &str) -> PathBuf {
        self.root
            .join(kind.collection())
            .join(format!("{}_{label}.json", key.file_stem()))
    }

    /// Location of a spectrum computed locally from a waveform.
    pub fn computed_path(&self, key: &MeasurementKey, label: &str) -> PathBuf {
        self.root
            .join(MeasurementKind::Spectrum.collection())
            .join(format!("{}_{label}_computed.json", key.file_stem()))
    }

    /// Write a downloaded record, creating directories as needed.
    pub fn save_record(
        &self,
        key: &MeasurementKey,
        kind: MeasurementKind,
        label: &str,
        record: &MeasurementRecord,
    ) -> Result<PathBuf, StorageError> {
        let path = self.record_path(key, kind, label);
        write_json(&path, record)?;
        tracing::info!(%key, %kind, path = %path.display(), "Saved record");
        Ok(path)
    }

    pub fn load_record(&self, path: &Path) -> Result<MeasurementRecord, StorageError> {
        let text = read_text(path)?;
        serde_json::from_str(&text).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write a computed spectrum next to the downloaded spectra.
    pub fn save_spectrum(
        &self,
        key: &MeasurementKey,
        label: &str,
        spectrum: &SpectrumResult,
    ) -> Result<PathBuf, StorageError> {
        let path = self.computed_path(key, label);
        write_json(&path, spectrum)?;
        tracing::info!(%key, bins = spectrum.len(), path = %path.display(), "Saved computed spectrum");
        Ok(path)
    }

    /// Load frequency/magnitude arrays from either a downloaded spectrum
    /// record (`data` + `min_freq`/`max_freq`) or a computed spectrum file
    /// (`freqs` + `spectrum`).
    pub fn load_spectrum_file(&self, path: &Path) -> Result<FrequencySpectrum, StorageError> {
        let text = read_text(path)?;
        let json_err = |source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(&text).map_err(json_err)?;

        if value.get("freqs").is_some() && value.get("spectrum").is_some() {
            let computed: SpectrumResult = serde_json::from_value(value).map_err(json_err)?;
            tracing::debug!(path = %path.display(), "Loaded computed spectrum");
            return Ok(computed.into());
        }

        if value.get("data").is_some() {
            let record: MeasurementRecord = serde_json::from_value(value).map_err(json_err)?;
            if record.is_spectrum() {
                tracing::debug!(path = %path.display(), "Loaded downloaded spectrum");
                return Ok(record_spectrum_axis(&record)?);
            }
        }

        Err(StorageError::UnrecognizedLayout(path.to_path_buf()))
    }
}

fn read_text(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_bytes, encode_samples};
    use crate::processing::compute_record_spectrum;
    use crate::types::FrequencyBand;

    fn key() -> MeasurementKey {
        MeasurementKey::new("LP_Turbine", "MAD31CY005", "AM1")
    }

    #[test]
    fn test_paths_follow_layout() {
        let store = MeasurementStore::new("/data");
        assert_eq!(
            store.record_path(&key(), MeasurementKind::Wave, "1554907724"),
            PathBuf::from("/data/waves/LP_Turbine_MAD31CY005_AM1_1554907724.json")
        );
        assert_eq!(
            store.record_path(&key(), MeasurementKind::Spectrum, "latest"),
            PathBuf::from("/data/spectra/LP_Turbine_MAD31CY005_AM1_latest.json")
        );
        assert_eq!(
            store.computed_path(&key(), "1554907724"),
            PathBuf::from("/data/spectra/LP_Turbine_MAD31CY005_AM1_1554907724_computed.json")
        );
    }

    #[test]
    fn test_record_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MeasurementStore::new(dir.path());
        let record = MeasurementRecord {
            path: "LP_Turbine/MAD31CY005/AM1".to_string(),
            data: encode_samples(&[1, -2, 3]).expect("encode"),
            factor: 0.25,
            sample_rate: Some(2560.0),
            min_freq: None,
            max_freq: None,
        };

        let path = store
            .save_record(&key(), MeasurementKind::Wave, "42", &record)
            .expect("save");
        assert!(path.starts_with(dir.path().join("waves")));
        assert_eq!(store.load_record(&path).expect("load"), record);
    }

    #[test]
    fn test_load_computed_spectrum_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MeasurementStore::new(dir.path());
        let wave = MeasurementRecord {
            path: String::new(),
            data: encode_samples(&[0, 50, 0, -50, 0, 50, 0, -50]).expect("encode"),
            factor: 1.0,
            sample_rate: Some(800.0),
            min_freq: None,
            max_freq: None,
        };
        let computed = compute_record_spectrum(&wave, FrequencyBand::default()).expect("spectrum");

        let path = store.save_spectrum(&key(), "7", &computed).expect("save");
        let loaded = store.load_spectrum_file(&path).expect("load");
        assert_eq!(loaded.frequencies, computed.freqs);
        assert_eq!(loaded.magnitudes, computed.spectrum);
    }

    #[test]
    fn test_load_downloaded_spectrum_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MeasurementStore::new(dir.path());
        let mags: Vec<u8> = [3.0f32, 6.0].iter().flat_map(|m| m.to_le_bytes()).collect();
        let record = MeasurementRecord {
            path: String::new(),
            data: encode_bytes(&mags).expect("encode"),
            factor: 2.0,
            sample_rate: None,
            min_freq: Some(10.0),
            max_freq: Some(20.0),
        };
        let path = store
            .save_record(&key(), MeasurementKind::Spectrum, "9", &record)
            .expect("save");

        let loaded = store.load_spectrum_file(&path).expect("load");
        assert_eq!(loaded.frequencies, vec![10.0, 20.0]);
        assert_eq!(loaded.magnitudes, vec![6.0, 12.0]);
    }

    #[test]
    fn test_unrecognized_and_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MeasurementStore::new(dir.path());

        let odd = dir.path().join("odd.json");
        fs::write(&odd, r#"{"hello": "world"}"#).expect("write");
        assert!(matches!(
            store.load_spectrum_file(&odd),
            Err(StorageError::UnrecognizedLayout(_))
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(store.load_record(&missing), Err(StorageError::Io { .. })));
    }
}
