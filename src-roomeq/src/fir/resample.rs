//! Resample an EQ curve onto the uniform grid of an FFT

use crate::error::{DrcError, Result};
use crate::read::{create_linear_frequency_grid, interpolate};
use crate::Curve;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

const STAGE: &str = "resample";

/// Magnitude over [0, Nyquist] on a uniform grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfSpectrum {
    /// Bin frequencies (Hz), first is 0, last is Nyquist
    pub freq: Array1<f64>,
    /// Magnitude (dB)
    pub db: Array1<f64>,
    pub sample_rate: u32,
}

impl HalfSpectrum {
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Linear gains, `10^(dB/20)`
    pub fn gains(&self) -> Vec<f64> {
        self.db.iter().map(|&v| 10f64.powf(v / 20.0)).collect()
    }

    /// Length of the FIR this half spectrum describes
    pub fn taps(&self) -> usize {
        2 * self.len().saturating_sub(1)
    }
}

/// What the resampler noticed about its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampleReport {
    pub source_bins: usize,
    pub target_bins: usize,
    /// The FIR asks for more frequency resolution than the measurement has
    pub exceeds_source_resolution: bool,
    pub source_top_hz: f64,
    /// The measurement stops below the output Nyquist frequency
    pub extrapolated: bool,
}

/// Resample `curve` onto `taps/2 + 1` uniformly spaced bins from 0 Hz to
/// `output_rate / 2` inclusive.
///
/// Values between measured points are linearly interpolated, values beyond
/// the measured range repeat the nearest measured value. Lack of resolution
/// or range in the source is logged and reported, never fatal.
pub fn resample(
    curve: &Curve,
    taps: usize,
    output_rate: u32,
) -> Result<(HalfSpectrum, ResampleReport)> {
    if taps < 2 || !taps.is_power_of_two() {
        return Err(DrcError::configuration(format!(
            "number of taps must be a power of two >= 2, got {}",
            taps
        )));
    }
    if output_rate == 0 {
        return Err(DrcError::configuration("output sample rate is 0"));
    }
    curve.validate()?;

    let target_bins = taps / 2 + 1;
    let nyquist = output_rate as f64 / 2.0;
    let freq = create_linear_frequency_grid(target_bins, nyquist);
    let db = interpolate(&freq, &curve.freq, &curve.spl);

    if db.len() % 2 == 0 {
        return Err(DrcError::geometry(
            STAGE,
            format!("resampled half spectrum has even length {}", db.len()),
        ));
    }

    let source_top_hz = curve.top_frequency();
    let report = ResampleReport {
        source_bins: curve.len(),
        target_bins,
        exceeds_source_resolution: taps / 2 > curve.len(),
        source_top_hz,
        extrapolated: source_top_hz < nyquist,
    };
    if report.exceeds_source_resolution {
        log::warn!(
            "{} taps need {} bins but the curve only has {}: FIR finer than the measurement",
            taps,
            taps / 2,
            curve.len()
        );
    }
    if report.extrapolated {
        log::warn!(
            "curve stops at {:.1} Hz, below Nyquist ({:.1} Hz): last value is held",
            source_top_hz,
            nyquist
        );
    }
    log::debug!(
        "resampled {} bins to {} bins at {} Hz",
        report.source_bins,
        target_bins,
        output_rate
    );

    Ok((
        HalfSpectrum {
            freq,
            db,
            sample_rate: output_rate,
        },
        report,
    ))
}
