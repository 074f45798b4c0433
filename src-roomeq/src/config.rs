//! Pipeline configuration

use crate::error::{DrcError, Result};
use crate::smooth::TransitionSpeed;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output sample rates a convolver is expected to run at
pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [44100, 48000, 96000];
/// Shortest FIR: 2^12 = 4 Ktaps
pub const MIN_TAPS_LOG2: u32 = 12;
/// Longest FIR: 2^16 = 64 Ktaps
pub const MAX_TAPS_LOG2: u32 = 16;

pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
pub const DEFAULT_SCHROEDER_HZ: f64 = 200.0;
pub const DEFAULT_OCTAVE_OFFSET: f64 = 2.0;
pub const DEFAULT_FINE_BANDWIDTH_OCT: f64 = 1.0 / 96.0;
/// Re-smoothing used to round off clipping elbows, empirically 1/12 octave
pub const DEFAULT_EQ_BANDWIDTH_OCT: f64 = 1.0 / 12.0;
/// Re-smoothed EQ replaces the clipped one only above this level
pub const DEFAULT_EQ_BLEND_THRESHOLD_DB: f64 = -3.0;
pub const DEFAULT_WINDOW_SHARPNESS: f64 = 1.0;

/// Defaults matching the historic command line variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 400-4000 Hz reference band, 16 Ktaps
    #[default]
    Classic,
    /// 500-2000 Hz reference band, 32 Ktaps
    Multipoint,
}

/// Every tunable of a design run; fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrcConfig {
    /// Sample rate of the produced FIRs (Hz)
    pub output_sample_rate: u32,
    /// FIR length is 2^taps_log2
    pub taps_log2: u32,
    /// (low, high) frequencies (Hz) used to estimate the reference level
    pub reference_band: (f64, f64),
    /// Fixed reference level (dB); estimated from the curve when None
    pub reference_level: Option<f64>,
    /// Schroeder frequency (Hz)
    pub schroeder_frequency: f64,
    /// Octaves below the Schroeder frequency where smoothing starts widening
    pub octave_offset: f64,
    /// Target smoothing below the transition (octaves)
    pub smoothing_bandwidth_fine: f64,
    pub transition_speed: TransitionSpeed,
    /// Re-smoothing of the clipped EQ curve (octaves)
    pub eq_smoothing_bandwidth: f64,
    pub eq_blend_threshold_db: f64,
    /// Kaiser beta of the linear-phase window
    pub window_sharpness: f64,
    /// Fail the run when the minimum-phase FIR misses the EQ curve by more
    /// than this (dB, 20 Hz - 20 kHz). Only reported when None.
    pub max_magnitude_error_db: Option<f64>,
}

impl Default for DrcConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Classic)
    }
}

impl DrcConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let (reference_band, taps_log2) = match preset {
            Preset::Classic => ((400.0, 4000.0), 14),
            Preset::Multipoint => ((500.0, 2000.0), 15),
        };
        Self {
            output_sample_rate: DEFAULT_SAMPLE_RATE,
            taps_log2,
            reference_band,
            reference_level: None,
            schroeder_frequency: DEFAULT_SCHROEDER_HZ,
            octave_offset: DEFAULT_OCTAVE_OFFSET,
            smoothing_bandwidth_fine: DEFAULT_FINE_BANDWIDTH_OCT,
            transition_speed: TransitionSpeed::Medium,
            eq_smoothing_bandwidth: DEFAULT_EQ_BANDWIDTH_OCT,
            eq_blend_threshold_db: DEFAULT_EQ_BLEND_THRESHOLD_DB,
            window_sharpness: DEFAULT_WINDOW_SHARPNESS,
            max_magnitude_error_db: None,
        }
    }

    /// Number of FIR taps
    pub fn taps(&self) -> usize {
        1usize << self.taps_log2
    }

    /// Frequency where the target smoothing starts to widen:
    /// `schroeder * 2^-octave_offset`
    pub fn transition_pivot(&self) -> f64 {
        self.schroeder_frequency * 2f64.powf(-self.octave_offset)
    }

    /// Load a configuration from YAML; missing keys take their default value
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: DrcConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every option, before any transform runs
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.output_sample_rate) {
            return Err(DrcError::configuration(format!(
                "output sample rate must be one of {:?}, got {}",
                SUPPORTED_SAMPLE_RATES, self.output_sample_rate
            )));
        }
        if !(MIN_TAPS_LOG2..=MAX_TAPS_LOG2).contains(&self.taps_log2) {
            return Err(DrcError::configuration(format!(
                "taps_log2 must be in {}..={} ({}K..{}K taps), got {}",
                MIN_TAPS_LOG2,
                MAX_TAPS_LOG2,
                (1 << MIN_TAPS_LOG2) / 1024,
                (1 << MAX_TAPS_LOG2) / 1024,
                self.taps_log2
            )));
        }
        let (f_low, f_high) = self.reference_band;
        if !(f_low.is_finite() && f_high.is_finite() && f_low > 0.0 && f_low < f_high) {
            return Err(DrcError::configuration(format!(
                "reference band must satisfy 0 < low < high, got ({}, {})",
                f_low, f_high
            )));
        }
        if f_high > self.output_sample_rate as f64 / 2.0 {
            return Err(DrcError::configuration(format!(
                "reference band upper edge {} Hz is above Nyquist",
                f_high
            )));
        }
        if let Some(level) = self.reference_level {
            if !level.is_finite() {
                return Err(DrcError::configuration("reference level is not finite"));
            }
        }
        if !(self.schroeder_frequency.is_finite() && self.schroeder_frequency > 0.0) {
            return Err(DrcError::configuration(format!(
                "Schroeder frequency must be positive, got {}",
                self.schroeder_frequency
            )));
        }
        if !(self.octave_offset.is_finite() && self.octave_offset >= 0.0) {
            return Err(DrcError::configuration(format!(
                "octave offset must be >= 0, got {}",
                self.octave_offset
            )));
        }
        if !(self.smoothing_bandwidth_fine > 0.0 && self.smoothing_bandwidth_fine <= 1.0) {
            return Err(DrcError::configuration(format!(
                "fine smoothing bandwidth must be in (0, 1] octave, got {}",
                self.smoothing_bandwidth_fine
            )));
        }
        if !(self.eq_smoothing_bandwidth.is_finite() && self.eq_smoothing_bandwidth > 0.0) {
            return Err(DrcError::configuration(format!(
                "EQ smoothing bandwidth must be positive, got {}",
                self.eq_smoothing_bandwidth
            )));
        }
        if !(self.eq_blend_threshold_db.is_finite() && self.eq_blend_threshold_db <= 0.0) {
            return Err(DrcError::configuration(format!(
                "EQ blend threshold must be <= 0 dB, got {}",
                self.eq_blend_threshold_db
            )));
        }
        if !(self.window_sharpness.is_finite() && self.window_sharpness >= 0.0) {
            return Err(DrcError::configuration(format!(
                "window sharpness must be >= 0, got {}",
                self.window_sharpness
            )));
        }
        if let Some(tol) = self.max_magnitude_error_db {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(DrcError::configuration(format!(
                    "magnitude tolerance must be positive, got {}",
                    tol
                )));
            }
        }
        Ok(())
    }
}
