//! Command-line interface definitions shared across binaries

use crate::config::{DrcConfig, Preset, DEFAULT_SAMPLE_RATE, DEFAULT_WINDOW_SHARPNESS};
use crate::error::Result;
use crate::smooth::TransitionSpeed;
use clap::Parser;
use std::path::PathBuf;

/// Design room correction FIRs from measured responses.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Measured responses (.frd or .txt), one per channel.
    /// A name starting with L or R tags the channel.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Default values for the options below.
    #[arg(long, value_enum, default_value_t = Preset::Classic)]
    pub preset: Preset,

    /// YAML configuration file; options given on the command line win.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sample rate of the output FIRs: 44100, 48000 or 96000.
    #[arg(long)]
    pub fs: Option<u32>,

    /// FIR length is 2^N taps (12..=16).
    #[arg(short = 'e', long)]
    pub taps_log2: Option<u32>,

    /// Reference level (dB) mapped to 0 dB; estimated when absent.
    #[arg(long = "ref", allow_negative_numbers = true)]
    pub reference_level: Option<f64>,

    /// Schroeder frequency (Hz).
    #[arg(long, value_parser = parse_strictly_positive_f64)]
    pub schroeder: Option<f64>,

    /// Octaves below the Schroeder frequency where smoothing starts widening.
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub octave_offset: Option<f64>,

    /// Lower edge of the reference band (Hz).
    #[arg(long, value_parser = parse_strictly_positive_f64)]
    pub ref_low: Option<f64>,

    /// Upper edge of the reference band (Hz).
    #[arg(long, value_parser = parse_strictly_positive_f64)]
    pub ref_high: Option<f64>,

    /// Kaiser beta of the linear-phase window.
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub window_beta: Option<f64>,

    /// How fast the target smoothing widens above the transition.
    #[arg(long, value_enum)]
    pub speed: Option<TransitionSpeed>,

    /// Generate and save the FIRs; without it only target and EQ are computed.
    #[arg(long, default_value_t = false)]
    pub do_fir: bool,

    /// Write per-channel diagnostics as JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Directory for the FIRs; defaults to the directory of each input.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl Args {
    /// Configuration for this run: config file or preset, then flags on top
    pub fn to_config(&self) -> Result<DrcConfig> {
        let mut config = match &self.config {
            Some(path) => DrcConfig::from_yaml_file(path)?,
            None => DrcConfig::from_preset(self.preset),
        };
        if let Some(fs) = self.fs {
            config.output_sample_rate = fs;
        }
        if let Some(n) = self.taps_log2 {
            config.taps_log2 = n;
        }
        if let Some(level) = self.reference_level {
            config.reference_level = Some(level);
        }
        if let Some(f) = self.schroeder {
            config.schroeder_frequency = f;
        }
        if let Some(o) = self.octave_offset {
            config.octave_offset = o;
        }
        if let Some(f) = self.ref_low {
            config.reference_band.0 = f;
        }
        if let Some(f) = self.ref_high {
            config.reference_band.1 = f;
        }
        if let Some(b) = self.window_beta {
            config.window_sharpness = b;
        }
        if let Some(s) = self.speed {
            config.transition_speed = s;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Convert Room EQ Wizard parametric filters to FIRs.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Peq2FirArgs {
    /// REW filter settings exported as text.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Sample rate of the output FIRs.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub fs: u32,

    /// FIR length is 2^N taps (12..=16).
    #[arg(short = 'e', long, default_value_t = 15)]
    pub taps_log2: u32,

    /// Kaiser beta of the linear-phase window.
    #[arg(long, default_value_t = DEFAULT_WINDOW_SHARPNESS, value_parser = parse_nonnegative_f64)]
    pub window_beta: f64,
}

impl Peq2FirArgs {
    /// Same checks as a full run, on the options that apply
    pub fn to_config(&self) -> Result<DrcConfig> {
        let mut config = DrcConfig::default();
        config.output_sample_rate = self.fs;
        config.taps_log2 = self.taps_log2;
        config.window_sharpness = self.window_beta;
        config.validate()?;
        Ok(config)
    }
}

// Custom value parser to enforce strictly positive f64 (> 0)
fn parse_strictly_positive_f64(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("invalid float: {s}"))?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err("value must be strictly positive (> 0)".to_string())
    }
}

// Custom value parser to enforce non-negative f64 (>= 0)
fn parse_nonnegative_f64(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("invalid float: {s}"))?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err("value must be non-negative (>= 0)".to_string())
    }
}
