//! Reference level estimation

use crate::config::DrcConfig;
use crate::error::{DrcError, Result};
use crate::smooth::smooth_fixed;
use crate::Curve;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Smoothing applied before the level is read (octaves)
pub const REFERENCE_SMOOTHING_OCT: f64 = 1.0;

/// Weight of the last bin of the band, the first one weighs 1.0.
/// 10^ln(0.5), which is what a base-10 logspace between ln(1) and ln(0.5) ends on.
pub fn reference_weight_floor() -> f64 {
    10f64.powf(0.5f64.ln())
}

/// Level that gets mapped to 0 dB for the rest of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReferenceLevel {
    /// Estimated from the curve over the reference band
    Estimated(f64),
    /// Supplied by the caller
    Fixed(f64),
}

impl ReferenceLevel {
    /// Caller supplied level, rounded to 0.1 dB
    pub fn fixed(db: f64) -> Self {
        ReferenceLevel::Fixed((db * 10.0).round() / 10.0)
    }

    pub fn db(&self) -> f64 {
        match *self {
            ReferenceLevel::Estimated(v) | ReferenceLevel::Fixed(v) => v,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, ReferenceLevel::Estimated(_))
    }

    /// Use the configured override, or estimate from `curve`
    pub fn resolve(curve: &Curve, config: &DrcConfig) -> Result<Self> {
        match config.reference_level {
            Some(db) => Ok(ReferenceLevel::fixed(db)),
            None => {
                let (f_low, f_high) = config.reference_band;
                estimate_reference_level(curve, f_low, f_high).map(ReferenceLevel::Estimated)
            }
        }
    }
}

/// Bins used for the estimate: from the bin nearest `f_low` up to, but
/// excluding, the bin nearest `f_high`.
///
/// Fails when the band does not cover at least one bin of the grid.
pub fn reference_band_indices(curve: &Curve, f_low: f64, f_high: f64) -> Result<Range<usize>> {
    if !(f_low.is_finite() && f_high.is_finite() && f_low > 0.0 && f_low < f_high) {
        return Err(DrcError::configuration(format!(
            "reference band must satisfy 0 < low < high, got ({}, {})",
            f_low, f_high
        )));
    }
    curve.validate()?;
    let start = curve.nearest_index(f_low);
    let end = curve.nearest_index(f_high);
    if end <= start {
        let bottom = curve.freq.first().copied().unwrap_or(0.0);
        return Err(DrcError::configuration(format!(
            "reference band {}-{} Hz is narrower than one bin of the curve \
             ({} points, {:.1}-{:.1} Hz)",
            f_low,
            f_high,
            curve.len(),
            bottom,
            curve.top_frequency()
        )));
    }
    Ok(start..end)
}

/// Weights decaying geometrically from 1.0 to `reference_weight_floor()`
pub fn reference_weights(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let floor = reference_weight_floor();
    (0..n)
        .map(|i| floor.powf(i as f64 / (n - 1) as f64))
        .collect()
}

/// Weighted mean of the band values, favouring the low end, rounded to 0.01 dB
pub fn weighted_reference_level(values: &[f64]) -> f64 {
    let weights = reference_weights(values.len());
    let (sum, norm) = values
        .iter()
        .zip(weights.iter())
        .fold((0.0, 0.0), |(s, n), (v, w)| (s + v * w, n + w));
    if norm == 0.0 {
        return 0.0;
    }
    ((sum / norm) * 100.0).round() / 100.0
}

/// Estimate the reference level of `curve` over `[f_low, f_high]`
///
/// The curve is smoothed at 1 octave first so narrow peaks and dips do not
/// move the estimate.
///
/// # Arguments
/// * `curve` - Measured response
/// * `f_low`, `f_high` - Reference band (Hz)
///
/// # Returns
/// * Level in dB, rounded to two decimals
pub fn estimate_reference_level(curve: &Curve, f_low: f64, f_high: f64) -> Result<f64> {
    let band = reference_band_indices(curve, f_low, f_high)?;
    let rmag = smooth_fixed(curve, REFERENCE_SMOOTHING_OCT);
    let values: Vec<f64> = rmag
        .spl
        .iter()
        .skip(band.start)
        .take(band.len())
        .copied()
        .collect();
    let level = weighted_reference_level(&values);
    log::debug!(
        "reference level {:.2} dB from {} bins ({}-{} Hz)",
        level,
        values.len(),
        f_low,
        f_high
    );
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn flat_band_gives_its_level() {
        assert_eq!(weighted_reference_level(&[-2.0, -2.0, -2.0]), -2.0);
        assert_eq!(weighted_reference_level(&[3.25]), 3.25);
    }

    #[test]
    fn weights_decay_from_one_to_floor() {
        let w = reference_weights(5);
        assert_eq!(w[0], 1.0);
        assert!((w[4] - reference_weight_floor()).abs() < 1e-12);
        assert!((reference_weight_floor() - 0.2026).abs() < 1e-3);
        for pair in w.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn estimate_is_biased_toward_low_end() {
        // a ramp: low end at 0 dB, high end at 10 dB -> estimate below midpoint
        let values: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let level = weighted_reference_level(&values);
        assert!(level < 5.0 && level > 0.0, "level {}", level);
    }

    #[test]
    fn rounding_to_two_decimals() {
        let level = weighted_reference_level(&[1.234567, 1.234567]);
        assert_eq!(level, 1.23);
    }

    #[test]
    fn estimate_on_flat_curve() {
        let freq = Array1::linspace(0.0, 24000.0, 4097);
        let spl = Array1::from_elem(4097, 85.0);
        let curve = Curve::new(freq, spl).unwrap();
        assert_eq!(estimate_reference_level(&curve, 400.0, 4000.0).unwrap(), 85.0);
    }

    #[test]
    fn band_narrower_than_a_bin_is_a_configuration_error() {
        let freq = Array1::linspace(0.0, 24000.0, 33); // 750 Hz bins
        let curve = Curve::new(freq, Array1::zeros(33)).unwrap();
        let err = estimate_reference_level(&curve, 1000.0, 1100.0).unwrap_err();
        assert!(matches!(err, DrcError::Configuration { .. }));
        assert!(estimate_reference_level(&curve, 2000.0, 1000.0).is_err());
    }

    #[test]
    fn empty_curve_is_rejected_without_panicking() {
        let empty = Curve {
            freq: Array1::zeros(0),
            spl: Array1::zeros(0),
        };
        let err = estimate_reference_level(&empty, 400.0, 4000.0).unwrap_err();
        assert!(matches!(err, DrcError::Configuration { .. }));
        assert!(reference_band_indices(&empty, 400.0, 4000.0).is_err());
    }

    #[test]
    fn fixed_level_overrides_estimate() {
        let freq = Array1::linspace(0.0, 24000.0, 4097);
        let curve = Curve::new(freq, Array1::from_elem(4097, 70.0)).unwrap();
        let mut config = DrcConfig::default();
        config.reference_level = Some(80.04);
        let r = ReferenceLevel::resolve(&curve, &config).unwrap();
        assert_eq!(r, ReferenceLevel::Fixed(80.0));
        assert!(!r.is_estimated());

        config.reference_level = None;
        let r = ReferenceLevel::resolve(&curve, &config).unwrap();
        assert_eq!(r.db(), 70.0);
        assert!(r.is_estimated());
    }
}
