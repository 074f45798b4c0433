//! Target curve: what the correction equalizes toward

use crate::config::DrcConfig;
use crate::smooth::{smooth, SmoothingProfile};
use crate::Curve;

/// Smoothing used for the target: fine below `schroeder * 2^-offset`,
/// widening to 1 octave at the top of the curve.
pub fn target_profile(config: &DrcConfig) -> SmoothingProfile {
    SmoothingProfile::variable(
        config.smoothing_bandwidth_fine,
        config.transition_pivot(),
        config.transition_speed,
    )
}

/// Build the target curve from the measured one.
///
/// Below the pivot room modes are tracked closely, above it comb-filtering
/// detail is averaged out. The result is re-based so that `reference_db`
/// reads 0 dB.
pub fn build_target_curve(curve: &Curve, profile: &SmoothingProfile, reference_db: f64) -> Curve {
    log::info!(
        "smoothing response for the target (1/{:.0} oct below {:.1} Hz)",
        1.0 / profile.bandwidth_octaves,
        profile.transition_pivot_hz.unwrap_or(0.0)
    );
    smooth(curve, profile).rebased(reference_db)
}
