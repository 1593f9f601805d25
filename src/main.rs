//! t8-client - T8 vibration data client
//!
//! Command-line front end for listing and downloading waveforms and spectra
//! from a T8 monitoring unit and computing spectra locally.
//!
//! # Usage
//!
//! ```bash
//! # Check that the unit answers
//! t8-client check-connection
//!
//! # List stored waveforms for a measurement point
//! t8-client list-waves -M LP_Turbine -p MAD31CY005 -m AM1
//!
//! # Download the latest spectrum, or one at a given time
//! t8-client get-spectrum -M LP_Turbine -p MAD31CY005 -m AM1
//! t8-client get-wave -M LP_Turbine -p MAD31CY005 -m AM1 -d 2019-04-10T14:48:44
//!
//! # Compute a spectrum from a waveform and compare it with the unit's own
//! t8-client compute-spectrum -M LP_Turbine -p MAD31CY005 -m AM1 -t 1554907724 --fmax 2000
//! t8-client compare-spectra --downloaded data/spectra/a.json --computed data/spectra/a_computed.json
//! ```
//!
//! # Environment Variables
//!
//! - `T8_HOST`, `T8_USER`, `T8_PASSWORD`: connection (a `.env` file is read too)
//! - `T8_CONFIG`: path to a TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use t8_client::catalog::{Listing, T8Client};
use t8_client::config::defaults;
use t8_client::processing::{compare_spectra, compute_record_spectrum};
use t8_client::time::resolve_timestamp_specifier;
use t8_client::types::{FrequencyBand, MeasurementKey, MeasurementKind};
use t8_client::{AppConfig, MeasurementStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "t8-client")]
#[command(about = "T8 vibration monitoring client")]
#[command(version)]
struct CliArgs {
    /// Base URL of the unit's REST interface (e.g. https://host/rest)
    #[arg(long, global = true, env = defaults::HOST_ENV)]
    host: Option<String>,

    #[arg(long, global = true, env = defaults::USER_ENV)]
    user: Option<String>,

    #[arg(long, global = true, env = defaults::PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Accept invalid TLS certificates (self-signed units)
    #[arg(long, global = true)]
    no_verify_tls: bool,

    /// Path to a TOML config file (overrides T8_CONFIG and ./t8_client.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for downloaded and computed files
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Args, Debug)]
struct MeasurementArgs {
    /// Machine name
    #[arg(short = 'M', long)]
    machine: String,

    /// Measurement point
    #[arg(short = 'p', long)]
    point: String,

    /// Processing mode
    #[arg(short = 'm', long)]
    mode: String,
}

impl MeasurementArgs {
    fn key(&self) -> MeasurementKey {
        MeasurementKey::new(&self.machine, &self.point, &self.mode)
    }
}

#[derive(Args, Debug)]
struct TimeArgs {
    /// Measurement time as ISO-8601 (e.g. 2019-04-10T14:48:44)
    #[arg(short = 'd', long = "datetime", conflicts_with = "timestamp")]
    datetime: Option<String>,

    /// Measurement time as Unix epoch seconds
    #[arg(short = 't', long = "timestamp")]
    timestamp: Option<String>,
}

#[derive(Args, Debug)]
struct ListFormat {
    /// Print only ISO-8601 times
    #[arg(long, conflicts_with = "epoch")]
    iso: bool,

    /// Print only epoch seconds
    #[arg(long)]
    epoch: bool,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Request the unit's root URL and print the response
    CheckConnection,

    /// List available waveform timestamps
    ListWaves {
        #[command(flatten)]
        target: MeasurementArgs,
        #[command(flatten)]
        format: ListFormat,
    },

    /// List available spectrum timestamps
    ListSpectra {
        #[command(flatten)]
        target: MeasurementArgs,
        #[command(flatten)]
        format: ListFormat,
    },

    /// Download a waveform (latest by default)
    GetWave {
        #[command(flatten)]
        target: MeasurementArgs,
        #[command(flatten)]
        time: TimeArgs,
    },

    /// Download a spectrum (latest by default)
    GetSpectrum {
        #[command(flatten)]
        target: MeasurementArgs,
        #[command(flatten)]
        time: TimeArgs,
    },

    /// Download a waveform and compute its spectrum locally
    ComputeSpectrum {
        #[command(flatten)]
        target: MeasurementArgs,
        #[command(flatten)]
        time: TimeArgs,
        /// Lower band edge (Hz)
        #[arg(long)]
        fmin: Option<f64>,
        /// Upper band edge (Hz); defaults to Nyquist
        #[arg(long)]
        fmax: Option<f64>,
    },

    /// Compare a downloaded spectrum file with a computed one
    CompareSpectra {
        #[arg(long, value_name = "PATH")]
        downloaded: PathBuf,
        #[arg(long, value_name = "PATH")]
        computed: PathBuf,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// Config file (or defaults), then environment, then command-line flags.
fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.connection.apply_env();
            config
        }
        None => AppConfig::load(),
    };

    config
        .connection
        .apply_overrides(args.host.clone(), args.user.clone(), args.password.clone());
    if let Some(timeout) = args.timeout {
        config.connection.timeout_secs = timeout;
    }
    if args.no_verify_tls {
        config.connection.verify_tls = false;
    }
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ============================================================================
// Commands
// ============================================================================

fn check_connection(client: &T8Client) -> Result<()> {
    let (status, snippet) = client
        .test_connection()
        .with_context(|| format!("Failed to reach {}", client.host()))?;
    println!("HTTP {status}");
    println!("{snippet}");
    Ok(())
}

fn list(client: &T8Client, target: &MeasurementArgs, kind: MeasurementKind, format: &ListFormat) -> Result<()> {
    let key = target.key();
    let listing = client
        .list_timestamps(&key, kind)
        .with_context(|| format!("Failed to list {kind} measurements for {key}"))?;

    if let Listing::Unavailable { status, .. } = &listing {
        warn!(status, "Service did not return a listing");
    }
    if listing.entries().is_empty() {
        println!("No measurements found for {key}");
        return Ok(());
    }

    for entry in listing.entries() {
        if format.iso {
            println!("{}", entry.iso);
        } else if format.epoch {
            println!("{}", entry.epoch);
        } else {
            println!("{}\t{}", entry.epoch, entry.iso);
        }
    }
    Ok(())
}

fn download(
    client: &T8Client,
    store: &MeasurementStore,
    target: &MeasurementArgs,
    kind: MeasurementKind,
    time: &TimeArgs,
) -> Result<()> {
    let key = target.key();
    let spec = resolve_timestamp_specifier(time.datetime.as_deref().or(time.timestamp.as_deref()))
        .context("Invalid measurement time")?;

    let fetched = client
        .fetch_record(&key, kind, spec)
        .with_context(|| format!("Failed to fetch {kind} {key} at {spec}"))?;
    let path = store
        .save_record(&key, kind, &fetched.label(), &fetched.record)
        .context("Failed to save record")?;

    println!("{}", path.display());
    Ok(())
}

fn compute(
    client: &T8Client,
    store: &MeasurementStore,
    target: &MeasurementArgs,
    time: &TimeArgs,
    band: FrequencyBand,
) -> Result<()> {
    let key = target.key();
    let spec = resolve_timestamp_specifier(time.datetime.as_deref().or(time.timestamp.as_deref()))
        .context("Invalid measurement time")?;

    let fetched = client
        .fetch_record(&key, MeasurementKind::Wave, spec)
        .with_context(|| format!("Failed to fetch wave {key} at {spec}"))?;
    let label = fetched.label();
    store
        .save_record(&key, MeasurementKind::Wave, &label, &fetched.record)
        .context("Failed to save waveform")?;

    let spectrum = compute_record_spectrum(&fetched.record, band)
        .with_context(|| format!("Failed to compute spectrum for {key} at {label}"))?;
    let path = store
        .save_spectrum(&key, &label, &spectrum)
        .context("Failed to save computed spectrum")?;

    info!(
        bins = spectrum.len(),
        n_fft = spectrum.meta.n_fft,
        fmin = spectrum.meta.fmin,
        fmax = spectrum.meta.fmax,
        "Spectrum computed"
    );
    match spectrum.peak() {
        Some((freq, mag)) => println!("Peak {mag:.4} at {freq:.2} Hz"),
        None => println!("Band [{}, {}] Hz holds no bins", spectrum.meta.fmin, spectrum.meta.fmax),
    }
    println!("{}", path.display());
    Ok(())
}

fn compare(store: &MeasurementStore, downloaded: &Path, computed: &Path) -> Result<()> {
    let reference = store
        .load_spectrum_file(downloaded)
        .with_context(|| format!("Failed to load {}", downloaded.display()))?;
    let candidate = store
        .load_spectrum_file(computed)
        .with_context(|| format!("Failed to load {}", computed.display()))?;

    println!("{}", compare_spectra(&reference, &candidate));
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = resolve_config(&args)?;
    let store = MeasurementStore::new(&config.storage.data_dir);

    // Offline command: no connection settings required
    if let SubCommand::CompareSpectra { downloaded, computed } = &args.command {
        return compare(&store, downloaded, computed);
    }

    let client = T8Client::connect(&config.connection).context("Failed to set up client")?;

    match &args.command {
        SubCommand::CheckConnection => check_connection(&client),
        SubCommand::ListWaves { target, format } => list(&client, target, MeasurementKind::Wave, format),
        SubCommand::ListSpectra { target, format } => {
            list(&client, target, MeasurementKind::Spectrum, format)
        }
        SubCommand::GetWave { target, time } => {
            download(&client, &store, target, MeasurementKind::Wave, time)
        }
        SubCommand::GetSpectrum { target, time } => {
            download(&client, &store, target, MeasurementKind::Spectrum, time)
        }
        SubCommand::ComputeSpectrum {
            target,
            time,
            fmin,
            fmax,
        } => {
            let mut band = config.analysis.band();
            if let Some(fmin) = fmin {
                band.fmin = *fmin;
            }
            if fmax.is_some() {
                band.fmax = *fmax;
            }
            compute(&client, &store, target, time, band)
        }
        // Handled before connecting
        SubCommand::CompareSpectra { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flag_long_and_short_forms() {
        for argv in [
            ["t8-client", "list-waves", "-M", "LP_Turbine", "-p", "MAD31CY005", "--mode", "AM1"],
            ["t8-client", "list-waves", "-M", "LP_Turbine", "-p", "MAD31CY005", "-m", "AM1"],
        ] {
            let args = CliArgs::try_parse_from(argv).expect("parse");
            match args.command {
                SubCommand::ListWaves { target, .. } => {
                    assert_eq!(target.key(), MeasurementKey::new("LP_Turbine", "MAD31CY005", "AM1"));
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn test_old_pmode_spelling_is_rejected() {
        let argv = ["t8-client", "list-waves", "-M", "m", "-p", "p", "--pmode", "AM1"];
        assert!(CliArgs::try_parse_from(argv).is_err());
    }
}
