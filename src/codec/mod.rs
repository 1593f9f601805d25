//! Payload codec for downloaded measurements
//!
//! The service ships samples as base64 text wrapping a zlib stream of
//! little-endian values. Waveforms are always 16-bit signed integers and go
//! through [`decode_samples`], which never guesses. Files of uncertain origin
//! (e.g. spectra saved by other tools) go through [`decode_best_effort`], which tries
//! `f32`, `f64` and `i16` in that order.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors while decoding a measurement payload
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),

    #[error("Payload of {len} bytes is not a multiple of the {width}-byte sample width")]
    Misaligned { len: usize, width: usize },

    #[error("Payload contains no samples")]
    Empty,

    #[error("Unrecognized format: no candidate sample type yields a non-zero array")]
    UnrecognizedFormat,
}

/// Element types the best-effort decoder knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    F32,
    F64,
    I16,
}

impl SampleFormat {
    /// Detection order for [`decode_best_effort`].
    pub const DETECTION_ORDER: [Self; 3] = [Self::F32, Self::F64, Self::I16];

    /// Bytes per element.
    pub fn width(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
            Self::I16 => 2,
        }
    }

    fn read_le(self, bytes: &[u8]) -> Vec<f64> {
        match self {
            Self::F32 => bytes
                .chunks_exact(4)
                .map(|c| f64::from(f32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                .collect(),
            Self::F64 => bytes
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
            Self::I16 => bytes
                .chunks_exact(2)
                .map(|c| f64::from(i16::from_le_bytes([c[0], c[1]])))
                .collect(),
        }
    }
}

/// Result of a best-effort decode: the values and the type they were read as.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedArray {
    pub format: SampleFormat,
    pub values: Vec<f64>,
}

/// Base64-decode and zlib-decompress a payload into raw bytes.
pub fn decompress_payload(payload: &str) -> Result<Vec<u8>, CodecError> {
    // Line-wrapped base64 is common in saved files
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let compressed = STANDARD.decode(compact.as_bytes())?;

    let mut raw = Vec::with_capacity(compressed.len() * 4);
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(CodecError::Decompress)?;
    Ok(raw)
}

/// Decode a waveform payload into 16-bit samples.
///
/// Fails when the payload is not valid base64, not a zlib stream, empty, or
/// decompresses to an odd number of bytes.
pub fn decode_samples(payload: &str) -> Result<Vec<i16>, CodecError> {
    let raw = decompress_payload(payload)?;
    samples_from_bytes(&raw)
}

/// Reinterpret a decompressed buffer as little-endian `i16` samples.
pub fn samples_from_bytes(raw: &[u8]) -> Result<Vec<i16>, CodecError> {
    if raw.len() % 2 != 0 {
        return Err(CodecError::Misaligned {
            len: raw.len(),
            width: 2,
        });
    }
    if raw.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(raw
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect())
}

/// Best-effort decode for payloads of uncertain element type.
///
/// Accepts the first format in [`SampleFormat::DETECTION_ORDER`] whose width
/// divides the buffer length and whose values are non-empty and not all zero.
pub fn decode_best_effort(payload: &str) -> Result<DetectedArray, CodecError> {
    let raw = decompress_payload(payload)?;
    decode_best_effort_bytes(&raw)
}

/// Byte-level half of [`decode_best_effort`].
pub fn decode_best_effort_bytes(raw: &[u8]) -> Result<DetectedArray, CodecError> {
    for format in SampleFormat::DETECTION_ORDER {
        if raw.len() % format.width() != 0 {
            continue;
        }
        let values = format.read_le(raw);
        if !values.is_empty() && values.iter().any(|v| *v != 0.0) {
            tracing::debug!(?format, count = values.len(), "Detected payload format");
            return Ok(DetectedArray { format, values });
        }
    }
    Err(CodecError::UnrecognizedFormat)
}

/// Encode samples the way the service does: little-endian `i16`, zlib, base64.
pub fn encode_samples(samples: &[i16]) -> Result<String, CodecError> {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    encode_bytes(&bytes)
}

/// Compress and base64-encode an arbitrary buffer.
pub fn encode_bytes(bytes: &[u8]) -> Result<String, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(CodecError::Compress)?;
    let compressed = encoder.finish().map_err(CodecError::Compress)?;
    Ok(STANDARD.encode(compressed))
}
