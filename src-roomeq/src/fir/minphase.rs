//! Minimum-phase FIR synthesis

use super::fft;
use super::resample::HalfSpectrum;
use super::spectrum::magnitude_to_minimum_phase_spectrum;
use super::window::tail_taper;
use crate::error::{DrcError, Result};
use crate::impulse::{ImpulseResponse, PhaseType};
use ndarray::Array1;

const STAGE: &str = "minimum-phase synthesis";

/// Largest tolerated |imag| relative to the largest |real| after the inverse FFT
pub const MAX_IMAGINARY_RESIDUE: f64 = 1e-6;

/// Floor used when converting magnitudes to dB
const MIN_MAGNITUDE: f64 = 1e-12;

/// Build a causal minimum-phase FIR of `taps` samples from a half spectrum.
///
/// # Arguments
/// * `half` - Magnitude in dB over `taps/2 + 1` bins, 0 Hz to Nyquist
/// * `taps` - FIR length, a power of two
///
/// # Returns
/// * The tapered impulse, energy concentrated at the start
///
/// # Errors
/// * `Geometry` when `half` does not hold `taps/2 + 1` bins
/// * `Numerical` when the inverse transform is not real or not finite
pub fn synthesize_minimum_phase(half: &HalfSpectrum, taps: usize) -> Result<ImpulseResponse> {
    if taps < 2 || half.len() != taps / 2 + 1 {
        return Err(DrcError::geometry(
            STAGE,
            format!(
                "{} taps need {} bins, half spectrum has {}",
                taps,
                taps / 2 + 1,
                half.len()
            ),
        ));
    }

    let mut spectrum = magnitude_to_minimum_phase_spectrum(&half.gains())?;
    fft::inverse(&mut spectrum);

    let max_re = spectrum.iter().fold(0.0f64, |m, c| m.max(c.re.abs()));
    let max_im = spectrum.iter().fold(0.0f64, |m, c| m.max(c.im.abs()));
    if !(max_re.is_finite() && max_im.is_finite()) {
        return Err(DrcError::numerical(STAGE, "impulse is not finite"));
    }
    if max_im > MAX_IMAGINARY_RESIDUE * max_re {
        return Err(DrcError::numerical(
            STAGE,
            format!(
                "imaginary residue {:.3e} is too large for a peak of {:.3e}",
                max_im, max_re
            ),
        ));
    }

    let window = tail_taper(taps);
    let samples: Vec<f64> = spectrum
        .iter()
        .take(taps)
        .zip(window.iter())
        .map(|(c, w)| c.re * w)
        .collect();

    log::debug!(
        "minimum-phase FIR: {} taps, imaginary residue {:.2e}",
        taps,
        if max_re > 0.0 { max_im / max_re } else { 0.0 }
    );

    Ok(ImpulseResponse {
        samples,
        sample_rate: half.sample_rate,
        phase: PhaseType::Minimum,
    })
}

/// Magnitude response of an impulse over [0, Nyquist], in dB
pub fn magnitude_response_db(impulse: &ImpulseResponse) -> HalfSpectrum {
    let n = impulse.len();
    let spectrum = fft::forward_real(&impulse.samples);
    let bins = n / 2 + 1;
    let nyquist = impulse.sample_rate as f64 / 2.0;
    let freq = crate::read::create_linear_frequency_grid(bins, nyquist);
    let db = Array1::from_iter(
        spectrum
            .iter()
            .take(bins)
            .map(|c| 20.0 * c.norm().max(MIN_MAGNITUDE).log10()),
    );
    HalfSpectrum {
        freq,
        db,
        sample_rate: impulse.sample_rate,
    }
}

/// Largest deviation (dB) between two half spectra on the same grid,
/// restricted to `[f_low, f_high]`.
pub fn max_deviation_db(a: &HalfSpectrum, b: &HalfSpectrum, f_low: f64, f_high: f64) -> f64 {
    a.freq
        .iter()
        .zip(a.db.iter().zip(b.db.iter()))
        .filter(|(f, _)| **f >= f_low && **f <= f_high)
        .fold(0.0f64, |m, (_, (x, y))| m.max((x - y).abs()))
}
