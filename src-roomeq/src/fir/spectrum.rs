//! Half/whole spectrum helpers and the cepstral minimum-phase primitive

use super::fft;
use crate::error::{DrcError, Result};
use num_complex::Complex64;

/// Gains are clamped to this range before the logarithm
pub const MIN_GAIN: f64 = 1e-8;
pub const MAX_GAIN: f64 = 1e8;

const STAGE: &str = "minimum-phase spectrum";

/// Length of the whole spectrum matching a half spectrum of `half_len` bins
pub fn whole_len(half_len: usize) -> usize {
    2 * half_len.saturating_sub(1)
}

/// Mirror a half spectrum `[0, Nyquist]` into an even whole spectrum of
/// length `2 (len - 1)`: `whole[N - k] = half[k]` for `k` in `1..len-1`.
pub fn mirror_half_spectrum<T: Copy>(half: &[T]) -> Vec<T> {
    let n = whole_len(half.len());
    let mut whole = Vec::with_capacity(n);
    whole.extend_from_slice(half);
    if half.len() > 2 {
        whole.extend(half[1..half.len() - 1].iter().rev());
    }
    whole.truncate(n);
    whole
}

/// Complex spectrum with magnitude `half_gain` and minimum phase.
///
/// `half_gain` holds linear gains for bins 0..=Nyquist; its length must be
/// odd and at least 3. The whole magnitude spectrum is built by mirroring,
/// its real cepstrum is folded onto the causal side, and the exponential of
/// the folded cepstrum's spectrum is returned (length `2 (len - 1)`).
pub fn magnitude_to_minimum_phase_spectrum(half_gain: &[f64]) -> Result<Vec<Complex64>> {
    let len = half_gain.len();
    if len < 3 || len % 2 == 0 {
        return Err(DrcError::geometry(
            STAGE,
            format!("half spectrum must have an odd length >= 3, got {}", len),
        ));
    }
    if let Some(i) = half_gain.iter().position(|g| g.is_nan()) {
        return Err(DrcError::numerical(STAGE, format!("gain #{} is NaN", i)));
    }

    let whole = mirror_half_spectrum(half_gain);
    let n = whole.len();

    // real cepstrum of the log magnitude
    let mut cepstrum: Vec<Complex64> = whole
        .iter()
        .map(|&g| Complex64::new(g.clamp(MIN_GAIN, MAX_GAIN).ln(), 0.0))
        .collect();
    fft::inverse(&mut cepstrum);

    // fold onto the causal side
    let half = n / 2;
    for (k, c) in cepstrum.iter_mut().enumerate() {
        let re = c.re;
        *c = match k {
            0 => Complex64::new(re, 0.0),
            k if k == half => Complex64::new(re, 0.0),
            k if k < half => Complex64::new(2.0 * re, 0.0),
            _ => Complex64::new(0.0, 0.0),
        };
    }

    fft::forward(&mut cepstrum);
    Ok(cepstrum.into_iter().map(|c| c.exp()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_builds_even_spectrum() {
        let whole = mirror_half_spectrum(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(whole, vec![0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(mirror_half_spectrum(&[5.0, 6.0, 7.0]), vec![5.0, 6.0, 7.0, 6.0]);
    }

    #[test]
    fn even_or_short_lengths_are_rejected() {
        for len in [0usize, 1, 2, 4, 1024] {
            let err = magnitude_to_minimum_phase_spectrum(&vec![1.0; len]).unwrap_err();
            assert!(matches!(err, DrcError::Geometry { .. }), "len {}", len);
        }
    }

    #[test]
    fn unit_gain_gives_unit_spectrum() {
        let spectrum = magnitude_to_minimum_phase_spectrum(&vec![1.0; 129]).unwrap();
        assert_eq!(spectrum.len(), 256);
        for c in spectrum {
            assert!((c.re - 1.0).abs() < 1e-12 && c.im.abs() < 1e-12);
        }
    }

    #[test]
    fn magnitude_is_preserved() {
        // smooth shelf: 0 dB at DC, -12 dB at Nyquist
        let n = 513;
        let gains: Vec<f64> = (0..n)
            .map(|k| {
                let x = k as f64 / (n - 1) as f64;
                10f64.powf(-12.0 * x * x / 20.0)
            })
            .collect();
        let spectrum = magnitude_to_minimum_phase_spectrum(&gains).unwrap();
        for (k, g) in gains.iter().enumerate() {
            let db = 20.0 * (spectrum[k].norm() / g).log10();
            assert!(db.abs() < 1e-6, "bin {} off by {} dB", k, db);
        }
    }

    #[test]
    fn zero_gain_is_clamped() {
        let mut gains = vec![1.0; 65];
        gains[10] = 0.0;
        let spectrum = magnitude_to_minimum_phase_spectrum(&gains).unwrap();
        assert!(spectrum.iter().all(|c| c.re.is_finite() && c.im.is_finite()));
    }
}
