//! Pipeline steps shared by the RoomEQ binaries
//!
//! A run goes curve -> reference level -> target -> EQ curve -> half
//! spectrum -> minimum-phase FIR -> linear-phase FIR. Each channel runs on
//! its own; channels are designed in parallel.

use crate::config::DrcConfig;
use crate::eq::{synthesize_eq_curve, EqSettings};
use crate::error::{DrcError, Result};
use crate::fir::{
    convert_to_linear_phase, magnitude_response_db, max_deviation_db, resample,
    synthesize_minimum_phase, HalfSpectrum, ResampleReport,
};
use crate::iir::{peq_impulse, peq_spl, Peq};
use crate::impulse::{ImpulseResponse, PhaseType};
use crate::reference::{reference_band_indices, ReferenceLevel};
use crate::target::{build_target_curve, target_profile};
use crate::Curve;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Band where the FIR magnitude is checked against the EQ curve (Hz)
pub const CHECK_BAND: (f64, f64) = (20.0, 20000.0);

/// Target and correction curves of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct EqDesign {
    pub reference: ReferenceLevel,
    /// Bins of the measured curve inside the reference band, when estimated
    pub reference_bins: Option<usize>,
    pub source_bins: usize,
    /// Smoothed response re-based to 0 dB
    pub target: Curve,
    /// Cut-only correction
    pub eq: Curve,
}

/// FIR pair designed from an EQ curve
#[derive(Debug, Clone, PartialEq)]
pub struct FirDesign {
    pub half_spectrum: HalfSpectrum,
    pub resample: ResampleReport,
    pub min_phase: ImpulseResponse,
    pub linear_phase: ImpulseResponse,
    /// Largest deviation of the minimum-phase FIR from the resampled EQ curve
    pub magnitude_error_db: f64,
}

/// Everything a full run produces for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDesign {
    pub eq: EqDesign,
    pub fir: FirDesign,
}

/// One measured channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInput {
    pub name: String,
    pub curve: Curve,
    /// Sample rate announced by the measurement file
    pub source_sample_rate: Option<u32>,
}

/// Result of one channel; `fir` is None when FIR generation was not requested
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDesign {
    pub name: String,
    pub source_sample_rate: Option<u32>,
    pub eq: EqDesign,
    pub fir: Option<FirDesign>,
}

/// Per-channel report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub channel: String,
    pub reference_level_db: f64,
    pub reference_estimated: bool,
    pub reference_bins: Option<usize>,
    pub source_bins: usize,
    pub eq_bins: usize,
    pub source_sample_rate: Option<u32>,
    pub output_sample_rate: u32,
    pub taps: usize,
    pub exceeds_source_resolution: bool,
    pub magnitude_error_db: Option<f64>,
}

impl ChannelDesign {
    pub fn diagnostics(&self, config: &DrcConfig) -> Diagnostics {
        Diagnostics {
            channel: self.name.clone(),
            reference_level_db: self.eq.reference.db(),
            reference_estimated: self.eq.reference.is_estimated(),
            reference_bins: self.eq.reference_bins,
            source_bins: self.eq.source_bins,
            eq_bins: self.eq.eq.len(),
            source_sample_rate: self.source_sample_rate,
            output_sample_rate: config.output_sample_rate,
            taps: config.taps(),
            exceeds_source_resolution: match &self.fir {
                Some(fir) => fir.resample.exceeds_source_resolution,
                None => config.taps() / 2 > self.eq.source_bins,
            },
            magnitude_error_db: self.fir.as_ref().map(|f| f.magnitude_error_db),
        }
    }
}

/// Target and EQ curves for `curve`.
///
/// The configuration and the reference band are checked before any
/// transform runs.
pub fn design_eq(curve: &Curve, config: &DrcConfig) -> Result<EqDesign> {
    config.validate()?;
    curve.validate()?;
    let curve = curve.with_dc();

    let reference_bins = match config.reference_level {
        Some(_) => None,
        None => {
            let (f_low, f_high) = config.reference_band;
            Some(reference_band_indices(&curve, f_low, f_high)?.len())
        }
    };

    let reference = ReferenceLevel::resolve(&curve, config)?;
    log::info!(
        "reference level {} dB --> 0 dB ({})",
        reference.db(),
        if reference.is_estimated() { "estimated" } else { "fixed" }
    );

    let target = build_target_curve(&curve, &target_profile(config), reference.db());
    let eq = synthesize_eq_curve(&target, &EqSettings::from(config));

    Ok(EqDesign {
        reference,
        reference_bins,
        source_bins: curve.len(),
        target,
        eq,
    })
}

/// Minimum and linear-phase FIRs realising `eq`
pub fn design_fir(eq: &Curve, config: &DrcConfig) -> Result<FirDesign> {
    let taps = config.taps();
    log::info!(
        "interpolating spectrum for {} Ktaps @ {} Hz",
        taps / 1024,
        config.output_sample_rate
    );
    let (half_spectrum, report) = resample(eq, taps, config.output_sample_rate)?;

    let min_phase = synthesize_minimum_phase(&half_spectrum, taps)?;
    let (f_low, f_high) = CHECK_BAND;
    let response = magnitude_response_db(&min_phase);
    let magnitude_error_db = max_deviation_db(&response, &half_spectrum, f_low, f_high);
    log::info!(
        "minimum-phase FIR matches the EQ curve within {:.3} dB ({}-{} Hz)",
        magnitude_error_db,
        f_low,
        f_high
    );
    if let Some(tolerance) = config.max_magnitude_error_db {
        if magnitude_error_db > tolerance {
            return Err(DrcError::numerical(
                "minimum-phase synthesis",
                format!(
                    "magnitude error {:.3} dB exceeds tolerance {:.3} dB",
                    magnitude_error_db, tolerance
                ),
            ));
        }
    }

    let linear_phase = convert_to_linear_phase(&min_phase, config.window_sharpness)?;

    Ok(FirDesign {
        half_spectrum,
        resample: report,
        min_phase,
        linear_phase,
        magnitude_error_db,
    })
}

/// FIR pair realising a biquad PEQ
#[derive(Debug, Clone, PartialEq)]
pub struct PeqFirDesign {
    pub min_phase: ImpulseResponse,
    pub linear_phase: ImpulseResponse,
    /// Largest deviation of the truncated impulse from the analytic PEQ response
    pub truncation_error_db: f64,
}

/// Minimum-phase FIR from the impulse response of `peq`, plus its
/// linear-phase version.
///
/// Narrow low-frequency filters ring longer than short FIRs; the truncated
/// impulse is compared with the analytic response over [`CHECK_BAND`] and
/// `max_magnitude_error_db`, when set, bounds the deviation.
pub fn design_peq_fir(peq: &Peq, config: &DrcConfig) -> Result<PeqFirDesign> {
    config.validate()?;
    let min_phase = ImpulseResponse {
        samples: peq_impulse(peq, config.taps()),
        sample_rate: config.output_sample_rate,
        phase: PhaseType::Minimum,
    };
    if !min_phase.is_finite() {
        return Err(DrcError::numerical("PEQ impulse", "filter output is not finite"));
    }

    let response = magnitude_response_db(&min_phase);
    let mut analytic = response.clone();
    analytic.db = peq_spl(&response.freq, peq);
    let (f_low, f_high) = CHECK_BAND;
    let truncation_error_db = max_deviation_db(&response, &analytic, f_low, f_high);
    log::info!(
        "{} Ktaps FIR matches the PEQ within {:.3} dB ({}-{} Hz)",
        config.taps() / 1024,
        truncation_error_db,
        f_low,
        f_high
    );
    if let Some(tolerance) = config.max_magnitude_error_db {
        if truncation_error_db > tolerance {
            return Err(DrcError::numerical(
                "PEQ impulse",
                format!(
                    "truncated impulse deviates by {:.3} dB, tolerance {:.3} dB",
                    truncation_error_db, tolerance
                ),
            ));
        }
    }

    let linear_phase = convert_to_linear_phase(&min_phase, config.window_sharpness)?;
    Ok(PeqFirDesign {
        min_phase,
        linear_phase,
        truncation_error_db,
    })
}

/// Full run for one curve
pub fn design_filters(curve: &Curve, config: &DrcConfig) -> Result<FilterDesign> {
    let eq = design_eq(curve, config)?;
    let fir = design_fir(&eq.eq, config)?;
    Ok(FilterDesign { eq, fir })
}

/// Design every channel in parallel; results keep the input order.
///
/// The first failing channel aborts the whole run.
pub fn design_channels(
    inputs: &[ChannelInput],
    config: &DrcConfig,
    do_fir: bool,
) -> Result<Vec<ChannelDesign>> {
    config.validate()?;
    inputs
        .par_iter()
        .map(|input| -> Result<ChannelDesign> {
            match input.source_sample_rate {
                Some(fs) if fs == config.output_sample_rate => {
                    log::info!("{}: fs={} matches the measurement", input.name, fs)
                }
                Some(fs) => log::warn!(
                    "{}: output fs={} differs from the measurement fs={}",
                    input.name,
                    config.output_sample_rate,
                    fs
                ),
                None => {}
            }
            let eq = design_eq(&input.curve, config)?;
            let fir = if do_fir {
                Some(design_fir(&eq.eq, config)?)
            } else {
                None
            };
            Ok(ChannelDesign {
                name: input.name.clone(),
                source_sample_rate: input.source_sample_rate,
                eq,
                fir,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn small_config() -> DrcConfig {
        let mut config = DrcConfig::default();
        config.taps_log2 = 12;
        config
    }

    fn flat_curve(level: f64) -> Curve {
        let freq = Array1::logspace(10.0, 20f64.log10(), 20000f64.log10(), 400);
        Curve::new(freq, Array1::from_elem(400, level)).unwrap()
    }

    #[test]
    fn invalid_config_fails_before_any_transform() {
        let mut config = small_config();
        config.taps_log2 = 20;
        let err = design_filters(&flat_curve(80.0), &config).unwrap_err();
        assert!(matches!(err, DrcError::Configuration { .. }));
    }

    #[test]
    fn reference_band_outside_the_curve_is_rejected() {
        let freq = Array1::linspace(0.0, 300.0, 64);
        let curve = Curve::new(freq, Array1::zeros(64)).unwrap();
        let err = design_eq(&curve, &small_config()).unwrap_err();
        assert!(matches!(err, DrcError::Configuration { .. }));
    }

    #[test]
    fn flat_curve_gives_flat_eq_and_unit_impulses() {
        let config = small_config();
        let design = design_filters(&flat_curve(83.0), &config).unwrap();
        assert_eq!(design.eq.reference, ReferenceLevel::Estimated(83.0));
        assert_eq!(design.eq.reference_bins.map(|n| n > 0), Some(true));
        assert!(design.eq.eq.spl.iter().all(|v| v.abs() < 1e-9));

        let m = config.taps();
        let mp = &design.fir.min_phase;
        assert_eq!(mp.len(), m);
        assert!((mp.samples[0] - 1.0).abs() < 1e-9);
        assert!(mp.samples[1..].iter().all(|v| v.abs() < 1e-9));

        let lp = &design.fir.linear_phase;
        assert_eq!(lp.len(), m);
        assert!((lp.samples[m / 2] - 1.0).abs() < 1e-9);
        assert!(design.fir.magnitude_error_db < 1e-6);
    }

    #[test]
    fn fixed_reference_skips_band_check() {
        let mut config = small_config();
        config.reference_level = Some(75.0);
        let design = design_eq(&flat_curve(75.0), &config).unwrap();
        assert_eq!(design.reference, ReferenceLevel::Fixed(75.0));
        assert_eq!(design.reference_bins, None);
    }

    #[test]
    fn channels_keep_their_order() {
        let config = small_config();
        let inputs: Vec<ChannelInput> = [("L", 70.0), ("R", 75.0), ("C", 80.0)]
            .iter()
            .map(|(name, level)| ChannelInput {
                name: name.to_string(),
                curve: flat_curve(*level),
                source_sample_rate: Some(44100),
            })
            .collect();
        let designs = design_channels(&inputs, &config, false).unwrap();
        let names: Vec<&str> = designs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["L", "R", "C"]);
        assert_eq!(designs[1].eq.reference.db(), 75.0);
        assert!(designs.iter().all(|d| d.fir.is_none()));

        let diag = designs[2].diagnostics(&config);
        assert_eq!(diag.channel, "C");
        assert_eq!(diag.reference_level_db, 80.0);
        assert_eq!(diag.source_sample_rate, Some(44100));
        assert_eq!(diag.magnitude_error_db, None);
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"reference_level_db\":80.0"));
    }

    #[test]
    fn peq_fir_follows_the_analytic_response() {
        use crate::iir::{Biquad, BiquadFilterType};
        let config = small_config();
        let srate = config.output_sample_rate as f64;
        let peq: Peq = vec![
            (1.0, Biquad::new(BiquadFilterType::Peak, 1_000.0, srate, 1.0, -6.0)),
            (1.0, Biquad::new(BiquadFilterType::Highshelf, 8_000.0, srate, 0.0, -3.0)),
        ];
        let design = design_peq_fir(&peq, &config).unwrap();
        assert_eq!(design.min_phase.len(), config.taps());
        assert_eq!(design.linear_phase.phase, PhaseType::Linear);
        assert!(design.truncation_error_db < 0.1, "{}", design.truncation_error_db);
    }

    #[test]
    fn ringing_peq_exceeds_a_tight_tolerance() {
        use crate::iir::{Biquad, BiquadFilterType};
        let mut config = small_config();
        config.max_magnitude_error_db = Some(0.5);
        let srate = config.output_sample_rate as f64;
        // 4096 taps cannot hold a Q 20 filter at 25 Hz
        let mode = Biquad::new(BiquadFilterType::Peak, 25.0, srate, 20.0, -12.0);
        let peq: Peq = vec![(1.0, mode)];
        let err = design_peq_fir(&peq, &config).unwrap_err();
        assert!(matches!(err, DrcError::Numerical { .. }));
    }

    #[test]
    fn one_bad_channel_fails_the_run() {
        let config = small_config();
        let good = ChannelInput {
            name: "L".to_string(),
            curve: flat_curve(70.0),
            source_sample_rate: None,
        };
        let bad = ChannelInput {
            name: "R".to_string(),
            curve: Curve {
                freq: Array1::from(vec![0.0, 10.0]),
                spl: Array1::from(vec![0.0, f64::NAN]),
            },
            source_sample_rate: None,
        };
        assert!(design_channels(&[good, bad], &config, true).is_err());
    }
}
