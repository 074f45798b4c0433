//! Linear-phase version of a minimum-phase FIR

use super::fft;
use super::spectrum::mirror_half_spectrum;
use super::window::kaiser_centered;
use crate::error::{DrcError, Result};
use crate::impulse::{ImpulseResponse, PhaseType};
use num_complex::Complex64;

const STAGE: &str = "linear-phase conversion";

/// Convert a minimum-phase FIR into a linear-phase FIR of the same length.
///
/// The magnitude of `min_phase` is kept and its phase dropped: the zero-phase
/// kernel is shifted by `taps/2` samples and shaped by a Kaiser window of
/// sharpness `window_beta` centred on that sample. The result is symmetric
/// about `taps/2` and delays the signal by `taps/2` samples.
pub fn convert_to_linear_phase(
    min_phase: &ImpulseResponse,
    window_beta: f64,
) -> Result<ImpulseResponse> {
    let m = min_phase.len();
    if m < 4 || m % 2 != 0 {
        return Err(DrcError::geometry(
            STAGE,
            format!("impulse length must be even and >= 4, got {}", m),
        ));
    }
    if !(window_beta.is_finite() && window_beta >= 0.0) {
        return Err(DrcError::configuration(format!(
            "window sharpness must be >= 0, got {}",
            window_beta
        )));
    }

    let spectrum = fft::forward_real(&min_phase.samples);
    let half: Vec<f64> = spectrum.iter().take(m / 2 + 1).map(|c| c.norm()).collect();
    // exact even symmetry makes the zero-phase kernel exactly symmetric
    let mut kernel: Vec<Complex64> = mirror_half_spectrum(&half)
        .into_iter()
        .map(|g| Complex64::new(g, 0.0))
        .collect();
    fft::inverse(&mut kernel);

    let mut samples: Vec<f64> = kernel.iter().map(|c| c.re).collect();
    samples.rotate_right(m / 2);

    let window = kaiser_centered(m, window_beta);
    for (s, w) in samples.iter_mut().zip(window.iter()) {
        *s *= w;
    }
    // restore the symmetry rounding may have broken
    for k in 1..m / 2 {
        let avg = 0.5 * (samples[m / 2 - k] + samples[m / 2 + k]);
        samples[m / 2 - k] = avg;
        samples[m / 2 + k] = avg;
    }

    if samples.iter().any(|v| !v.is_finite()) {
        return Err(DrcError::numerical(STAGE, "impulse is not finite"));
    }
    log::debug!("linear-phase FIR: {} taps, beta {}", m, window_beta);

    Ok(ImpulseResponse {
        samples,
        sample_rate: min_phase.sample_rate,
        phase: PhaseType::Linear,
    })
}
