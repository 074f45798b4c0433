//! Fractional-octave smoothing with optional variable bandwidth

use crate::Curve;
use clap::ValueEnum;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Curves shorter than this are returned unsmoothed
pub const MIN_SMOOTHING_POINTS: usize = 16;

/// Bandwidth reached at the top of the range in variable mode (octaves)
pub const COARSE_BANDWIDTH_OCT: f64 = 1.0;

/// How fast the bandwidth widens above the transition pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSpeed {
    /// Stay fine for longer, widen close to the top of the range
    Slow,
    /// Widen evenly along the log-frequency axis
    #[default]
    Medium,
    /// Widen quickly just above the pivot
    Fast,
}

impl TransitionSpeed {
    /// Shaping exponent applied to the normalised log-frequency position
    pub fn exponent(self) -> f64 {
        match self {
            TransitionSpeed::Slow => 2.0,
            TransitionSpeed::Medium => 1.0,
            TransitionSpeed::Fast => 0.5,
        }
    }
}

/// Parameters of a fractional-octave smoothing pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingProfile {
    /// Bandwidth in octaves (1/96 oct = 0.0104...)
    pub bandwidth_octaves: f64,
    /// Frequency above which the bandwidth starts to widen toward 1 octave
    pub transition_pivot_hz: Option<f64>,
    /// Preset widening speed
    pub transition_speed: TransitionSpeed,
    /// Custom shaping exponent, overrides `transition_speed` when set
    pub variable_rate: Option<f64>,
}

impl SmoothingProfile {
    /// Constant bandwidth over the whole curve
    pub fn fixed(bandwidth_octaves: f64) -> Self {
        Self {
            bandwidth_octaves,
            transition_pivot_hz: None,
            transition_speed: TransitionSpeed::default(),
            variable_rate: None,
        }
    }

    /// Fine bandwidth below `pivot_hz`, widening to 1 octave at the top
    pub fn variable(bandwidth_octaves: f64, pivot_hz: f64, speed: TransitionSpeed) -> Self {
        Self {
            bandwidth_octaves,
            transition_pivot_hz: Some(pivot_hz),
            transition_speed: speed,
            variable_rate: None,
        }
    }

    /// Effective bandwidth (octaves) at frequency `f` for a curve ending at `f_top`.
    ///
    /// Geometric interpolation between the fine and the coarse bandwidth,
    /// monotonic and continuous in `f`.
    pub fn bandwidth_at(&self, f: f64, f_top: f64) -> f64 {
        let bw0 = self.bandwidth_octaves;
        let pivot = match self.transition_pivot_hz {
            Some(p) if p > 0.0 && f_top > p && bw0 < COARSE_BANDWIDTH_OCT => p,
            _ => return bw0,
        };
        if f <= pivot {
            return bw0;
        }
        let t = ((f / pivot).log2() / (f_top / pivot).log2()).clamp(0.0, 1.0);
        let p = self
            .variable_rate
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or_else(|| self.transition_speed.exponent());
        bw0 * (COARSE_BANDWIDTH_OCT / bw0).powf(t.powf(p))
    }
}

/// Fractional-octave smoothing of a curve
///
/// Every output bin is the raised-cosine weighted mean (weights computed on
/// a log2 frequency axis) of the input bins within +/- bandwidth/2 octaves.
/// Windows are truncated at both ends of the curve. The 0 Hz bin is copied
/// as-is.
///
/// # Arguments
/// * `curve` - Input curve, non-decreasing frequencies
/// * `profile` - Bandwidth and optional transition settings
///
/// # Returns
/// * A curve on the same grid
pub fn smooth(curve: &Curve, profile: &SmoothingProfile) -> Curve {
    let n = curve.len();
    if n < MIN_SMOOTHING_POINTS || !(profile.bandwidth_octaves > 0.0) {
        log::debug!(
            "smoothing skipped ({} points, {} oct)",
            n,
            profile.bandwidth_octaves
        );
        return curve.clone();
    }

    let f_top = curve.top_frequency();
    let log_freq: Vec<f64> = curve
        .freq
        .iter()
        .map(|&f| if f > 0.0 { f.log2() } else { f64::NEG_INFINITY })
        .collect();

    let mut out = Array1::zeros(n);
    for i in 0..n {
        let f = curve.freq[i];
        if f <= 0.0 {
            out[i] = curve.spl[i];
            continue;
        }
        let half = 0.5 * profile.bandwidth_at(f, f_top);
        let center = log_freq[i];
        let lo = log_freq.partition_point(|&lf| lf < center - half);
        let hi = log_freq.partition_point(|&lf| lf <= center + half);

        let mut sum = 0.0;
        let mut weights = 0.0;
        for j in lo..hi {
            let w = 0.5 * (1.0 + (PI * (log_freq[j] - center) / half).cos());
            sum += w * curve.spl[j];
            weights += w;
        }
        out[i] = if weights > 0.0 {
            sum / weights
        } else {
            curve.spl[i]
        };
    }

    curve.with_spl(out)
}

/// Constant-bandwidth smoothing, `bandwidth_octaves` = 1/N for 1/N octave
pub fn smooth_fixed(curve: &Curve, bandwidth_octaves: f64) -> Curve {
    smooth(curve, &SmoothingProfile::fixed(bandwidth_octaves))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_curve(n: usize, f_min: f64, f_max: f64, f: impl Fn(f64) -> f64) -> Curve {
        let freq = Array1::logspace(10.0, f_min.log10(), f_max.log10(), n);
        let spl = freq.mapv(&f);
        Curve::new(freq, spl).unwrap().with_dc()
    }

    #[test]
    fn flat_curve_stays_flat() {
        let curve = log_curve(400, 20.0, 24000.0, |_| -7.5);
        for bw in [1.0 / 96.0, 1.0 / 12.0, 1.0 / 3.0, 1.0] {
            let out = smooth_fixed(&curve, bw);
            for v in out.spl.iter() {
                assert!((v + 7.5).abs() < 1e-12, "bw {} gave {}", bw, v);
            }
        }
        let variable = SmoothingProfile::variable(1.0 / 96.0, 50.0, TransitionSpeed::Fast);
        for v in smooth(&curve, &variable).spl.iter() {
            assert!((v + 7.5).abs() < 1e-12);
        }
    }

    #[test]
    fn short_curves_pass_through() {
        let freq = Array1::from(vec![0.0, 100.0, 200.0, 400.0, 800.0]);
        let spl = Array1::from(vec![0.0, 5.0, -5.0, 5.0, -5.0]);
        let curve = Curve::new(freq, spl).unwrap();
        assert_eq!(smooth_fixed(&curve, 1.0), curve);
    }

    #[test]
    fn output_keeps_grid_and_dc() {
        let curve = log_curve(200, 20.0, 20000.0, |f| (f / 300.0).sin() * 4.0);
        let out = smooth_fixed(&curve, 1.0 / 3.0);
        assert_eq!(out.freq, curve.freq);
        assert_eq!(out.spl[0], curve.spl[0]);
    }

    #[test]
    fn wide_bandwidth_flattens_ripple() {
        // alternating +/-3 dB ripple on a dense log grid
        let n = 600;
        let freq = Array1::logspace(10.0, 20f64.log10(), 20000f64.log10(), n);
        let spl = Array1::from_shape_fn(n, |i| if i % 2 == 0 { 3.0 } else { -3.0 });
        let curve = Curve::new(freq, spl).unwrap();
        let out = smooth_fixed(&curve, 1.0);
        for i in 50..n - 50 {
            assert!(out.spl[i].abs() < 0.2, "bin {} = {}", i, out.spl[i]);
        }
    }

    #[test]
    fn narrow_bandwidth_keeps_detail_below_pivot() {
        // a narrow +6 dB bump at 50 Hz must survive fine smoothing below the pivot
        let curve = log_curve(2000, 10.0, 24000.0, |f| {
            if (f / 50.0).log2().abs() < 0.02 {
                6.0
            } else {
                0.0
            }
        });
        let profile = SmoothingProfile::variable(1.0 / 96.0, 50.0, TransitionSpeed::Medium);
        let out = smooth(&curve, &profile);
        let i = curve.nearest_index(50.0);
        assert!(out.spl[i] > 5.0, "bump flattened to {}", out.spl[i]);
    }

    #[test]
    fn variable_bandwidth_is_monotonic_and_bounded() {
        for speed in [TransitionSpeed::Slow, TransitionSpeed::Medium, TransitionSpeed::Fast] {
            let p = SmoothingProfile::variable(1.0 / 96.0, 50.0, speed);
            let mut last = 0.0;
            for k in 0..200 {
                let f = 10.0 * (2400.0f64).powf(k as f64 / 199.0);
                let bw = p.bandwidth_at(f, 24000.0);
                assert!(bw >= last - 1e-15);
                assert!(bw >= 1.0 / 96.0 - 1e-15 && bw <= 1.0 + 1e-12);
                last = bw;
            }
            assert!((p.bandwidth_at(24000.0, 24000.0) - 1.0).abs() < 1e-12);
            assert_eq!(p.bandwidth_at(40.0, 24000.0), 1.0 / 96.0);
        }
        // faster transitions are wider at the same frequency
        let slow = SmoothingProfile::variable(1.0 / 96.0, 50.0, TransitionSpeed::Slow);
        let fast = SmoothingProfile::variable(1.0 / 96.0, 50.0, TransitionSpeed::Fast);
        assert!(fast.bandwidth_at(1000.0, 24000.0) > slow.bandwidth_at(1000.0, 24000.0));
    }

    #[test]
    fn variable_rate_overrides_speed() {
        let mut p = SmoothingProfile::variable(1.0 / 96.0, 50.0, TransitionSpeed::Slow);
        p.variable_rate = Some(1.0);
        let medium = SmoothingProfile::variable(1.0 / 96.0, 50.0, TransitionSpeed::Medium);
        assert_eq!(p.bandwidth_at(1000.0, 24000.0), medium.bandwidth_at(1000.0, 24000.0));
    }
}
