//! Correction curve synthesis: inversion, cut-only clipping, clip rounding

use crate::config::DrcConfig;
use crate::smooth::smooth_fixed;
use crate::Curve;
use ndarray::Zip;

/// Settings of the EQ synthesis step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqSettings {
    /// Bandwidth of the re-smoothing pass (octaves)
    pub smoothing_bandwidth: f64,
    /// Re-smoothed values replace clipped ones only strictly above this level (dB)
    pub blend_threshold_db: f64,
}

impl From<&DrcConfig> for EqSettings {
    fn from(config: &DrcConfig) -> Self {
        Self {
            smoothing_bandwidth: config.eq_smoothing_bandwidth,
            blend_threshold_db: config.eq_blend_threshold_db,
        }
    }
}

/// Invert the target and keep only cuts: `min(-target, 0)`
pub fn invert_and_clip(target: &Curve) -> Curve {
    target.with_spl(target.spl.mapv(|v| (-v).min(0.0)))
}

/// Round off the elbows left by clipping.
///
/// `clipped` is smoothed at `settings.smoothing_bandwidth`; the smoothed
/// value is taken wherever it is above `settings.blend_threshold_db`, the
/// clipped value is kept unchanged everywhere else, so deep narrow dips are
/// not filled in.
pub fn blend_clip_transitions(clipped: &Curve, settings: &EqSettings) -> Curve {
    let aux = smooth_fixed(clipped, settings.smoothing_bandwidth);
    let threshold = settings.blend_threshold_db;
    let mut eq = clipped.spl.clone();
    Zip::from(&mut eq).and(&aux.spl).for_each(|e, &a| {
        if a > threshold {
            *e = a;
        }
    });
    clipped.with_spl(eq)
}

/// Correction curve for a re-based target: cuts only, no sample above 0 dB
pub fn synthesize_eq_curve(target: &Curve, settings: &EqSettings) -> Curve {
    let clipped = invert_and_clip(target);
    blend_clip_transitions(&clipped, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn settings() -> EqSettings {
        EqSettings::from(&DrcConfig::default())
    }

    fn log_grid(n: usize) -> Array1<f64> {
        Array1::logspace(10.0, 1.0, 24000f64.log10(), n)
    }

    #[test]
    fn eq_never_boosts() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let freq = log_grid(500);
            let spl = Array1::from_shape_fn(500, |_| rng.random_range(-25.0..25.0));
            let target = Curve::new(freq, spl).unwrap().with_dc();
            let eq = synthesize_eq_curve(&target, &settings());
            assert_eq!(eq.len(), target.len());
            assert!(eq.spl.iter().all(|&v| v <= 0.0), "positive gain in EQ");
        }
    }

    #[test]
    fn clipping_keeps_cuts_only() {
        let freq = Array1::from(vec![0.0, 100.0, 200.0, 300.0]);
        let target = Curve::new(freq, Array1::from(vec![-4.0, 0.0, 2.5, 12.0])).unwrap();
        let clipped = invert_and_clip(&target);
        assert_eq!(clipped.spl.to_vec(), vec![0.0, 0.0, -2.5, -12.0]);
    }

    #[test]
    fn deep_correction_is_preserved_exactly() {
        // +20 dB target peak spanning 1/4 octave around 1 kHz
        let freq = log_grid(4000);
        let in_peak = |f: f64| (f / 1000.0).log2().abs() <= 0.125;
        let spl = freq.mapv(|f| if in_peak(f) { 20.0 } else { 0.0 });
        let target = Curve::new(freq, spl).unwrap().with_dc();
        let eq = synthesize_eq_curve(&target, &settings());
        let i = target.nearest_index(1000.0);
        assert_eq!(eq.spl[i], -20.0);
        assert_eq!(eq.spl[i], -target.spl[i]);
    }

    #[test]
    fn blend_only_touches_bins_above_threshold() {
        let mut rng = StdRng::seed_from_u64(42);
        let freq = log_grid(1500);
        let spl = Array1::from_shape_fn(1500, |i| {
            let base = if (i / 100) % 2 == 0 { 15.0 } else { -2.0 };
            base + rng.random_range(-2.0..2.0)
        });
        let target = Curve::new(freq, spl).unwrap().with_dc();
        let s = settings();
        let clipped = invert_and_clip(&target);
        let aux = smooth_fixed(&clipped, s.smoothing_bandwidth);
        let eq = blend_clip_transitions(&clipped, &s);

        let mut kept = 0;
        for i in 0..eq.len() {
            if aux.spl[i] > s.blend_threshold_db {
                assert_eq!(eq.spl[i], aux.spl[i]);
            } else {
                assert_eq!(eq.spl[i].to_bits(), clipped.spl[i].to_bits());
                kept += 1;
            }
        }
        assert!(kept > 0);
        assert!(eq.spl.iter().all(|&v| v <= 0.0));
    }

    #[test]
    fn flat_target_gives_flat_eq() {
        let freq = log_grid(300);
        let target = Curve::new(freq, Array1::zeros(300)).unwrap().with_dc();
        let eq = synthesize_eq_curve(&target, &settings());
        assert!(eq.spl.iter().all(|v| v.abs() < 1e-12));
    }
}
