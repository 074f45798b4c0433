//! Biquad IIR filters for room correction.
//!
//! RBJ cookbook biquads, parametric EQs built from them, and a reader for
//! the filter lists Room EQ Wizard exports. A PEQ can be run over a unit
//! impulse to obtain the equivalent (minimum-phase) FIR.

use ndarray::Array1;
use std::f64::consts::PI;
use std::fmt;

mod rew;

pub use rew::{load_rew_filters, parse_rew_filters, rew_to_peq, RewFilter};

/// Errors raised while reading filter lists
#[derive(Debug, thiserror::Error)]
pub enum IirError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts bandwidth in octaves to a Q factor.
pub fn bw2q(bw: f64) -> f64 {
    let two_pow_bw = 2.0_f64.powf(bw);
    two_pow_bw.sqrt() / (two_pow_bw - 1.0)
}

/// Converts a Q factor to bandwidth in octaves.
pub fn q2bw(q: f64) -> f64 {
    let q2 = (2.0 * q * q + 1.0) / (2.0 * q * q);
    (q2 + (q2 * q2 - 1.0).sqrt()).log(2.0)
}

/// Default Q factor for high/low pass filters
pub const DEFAULT_Q_HIGH_LOW_PASS: f64 = 1.0 / std::f64::consts::SQRT_2;
/// Default Q factor for high/low shelf filters
pub const DEFAULT_Q_HIGH_LOW_SHELF: f64 = 1.0668676536332304; // Value of bw2q(0.9)
/// Q used by notch filters given without one
pub const DEFAULT_Q_NOTCH: f64 = 30.0;

// -200 dB floor
const MIN_POWER: f64 = 1.0e-20;

/// A parametric EQ: weighted biquads applied in series
pub type Peq = Vec<(f64, Biquad)>;

/// Filter types for biquad filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadFilterType {
    /// Low-pass filter
    Lowpass,
    /// High-pass filter
    Highpass,
    /// Band-pass filter
    Bandpass,
    /// Peaking filter
    Peak,
    /// Notch filter
    Notch,
    /// Low-shelf filter
    Lowshelf,
    /// High-shelf filter
    Highshelf,
}

impl BiquadFilterType {
    /// Returns the short string representation of the filter type (e.g., "LP").
    pub fn short_name(&self) -> &'static str {
        match self {
            BiquadFilterType::Lowpass => "LP",
            BiquadFilterType::Highpass => "HP",
            BiquadFilterType::Bandpass => "BP",
            BiquadFilterType::Peak => "PK",
            BiquadFilterType::Notch => "NO",
            BiquadFilterType::Lowshelf => "LS",
            BiquadFilterType::Highshelf => "HS",
        }
    }

    /// Filter type from a Room EQ Wizard type code (`PK`, `LS`, `HPQ`, ...)
    pub fn from_rew_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "PK" | "PEQ" | "MODAL" => Some(BiquadFilterType::Peak),
            "LP" | "LPQ" => Some(BiquadFilterType::Lowpass),
            "HP" | "HPQ" => Some(BiquadFilterType::Highpass),
            "BP" => Some(BiquadFilterType::Bandpass),
            "NO" => Some(BiquadFilterType::Notch),
            "LS" | "LSQ" | "LSC" => Some(BiquadFilterType::Lowshelf),
            "HS" | "HSQ" | "HSC" => Some(BiquadFilterType::Highshelf),
            _ => None,
        }
    }
}

/// Represents a single biquad IIR filter.
#[derive(Debug, Clone)]
pub struct Biquad {
    /// The type of filter
    pub filter_type: BiquadFilterType,
    /// Center frequency in Hz
    pub freq: f64,
    /// Sample rate in Hz
    pub srate: f64,
    /// Q factor (quality factor)
    pub q: f64,
    /// Gain in dB (for peaking and shelving filters)
    pub db_gain: f64,
    /// Filter coefficients
    a1: f64,
    a2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    /// Filter state (for processing samples)
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    /// Creates and initializes a new Biquad filter.
    pub fn new(filter_type: BiquadFilterType, freq: f64, srate: f64, q: f64, db_gain: f64) -> Self {
        let mut biquad = Biquad {
            filter_type,
            freq,
            srate,
            q,
            db_gain,
            a1: 0.0,
            a2: 0.0,
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };

        if biquad.q == 0.0 {
            biquad.q = match biquad.filter_type {
                BiquadFilterType::Bandpass
                | BiquadFilterType::Highpass
                | BiquadFilterType::Lowpass => DEFAULT_Q_HIGH_LOW_PASS,
                BiquadFilterType::Lowshelf | BiquadFilterType::Highshelf => {
                    DEFAULT_Q_HIGH_LOW_SHELF
                }
                BiquadFilterType::Notch => DEFAULT_Q_NOTCH,
                BiquadFilterType::Peak => biquad.q,
            };
        }

        // strictly positive Q, alpha = sn/(2*q)
        if biquad.q <= 0.0 {
            biquad.q = 1.0e-2;
        }

        biquad.compute_coeffs();
        biquad
    }

    fn compute_coeffs(&mut self) {
        // Intermediate variables
        let a = 10.0_f64.powf(self.db_gain / 40.0);
        let omega = 2.0 * PI * self.freq / self.srate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * self.q);
        let beta = (a + a).sqrt();

        // Raw coefficients
        let (b0, b1, b2, a0, a1, a2);

        match self.filter_type {
            BiquadFilterType::Lowpass => {
                b0 = (1.0 - cs) / 2.0;
                b1 = 1.0 - cs;
                b2 = (1.0 - cs) / 2.0;
                a0 = 1.0 + alpha;
                a1 = -2.0 * cs;
                a2 = 1.0 - alpha;
            }
            BiquadFilterType::Highpass => {
                b0 = (1.0 + cs) / 2.0;
                b1 = -(1.0 + cs);
                b2 = (1.0 + cs) / 2.0;
                a0 = 1.0 + alpha;
                a1 = -2.0 * cs;
                a2 = 1.0 - alpha;
            }
            BiquadFilterType::Bandpass => {
                b0 = alpha;
                b1 = 0.0;
                b2 = -alpha;
                a0 = 1.0 + alpha;
                a1 = -2.0 * cs;
                a2 = 1.0 - alpha;
            }
            BiquadFilterType::Notch => {
                b0 = 1.0;
                b1 = -2.0 * cs;
                b2 = 1.0;
                a0 = 1.0 + alpha;
                a1 = -2.0 * cs;
                a2 = 1.0 - alpha;
            }
            BiquadFilterType::Peak => {
                b0 = 1.0 + (alpha * a);
                b1 = -2.0 * cs;
                b2 = 1.0 - (alpha * a);
                a0 = 1.0 + (alpha / a);
                a1 = -2.0 * cs;
                a2 = 1.0 - (alpha / a);
            }
            BiquadFilterType::Lowshelf => {
                b0 = a * ((a + 1.0) - (a - 1.0) * cs + beta * sn);
                b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cs);
                b2 = a * ((a + 1.0) - (a - 1.0) * cs - beta * sn);
                a0 = (a + 1.0) + (a - 1.0) * cs + beta * sn;
                a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cs);
                a2 = (a + 1.0) + (a - 1.0) * cs - beta * sn;
            }
            BiquadFilterType::Highshelf => {
                b0 = a * ((a + 1.0) + (a - 1.0) * cs + beta * sn);
                b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cs);
                b2 = a * ((a + 1.0) + (a - 1.0) * cs - beta * sn);
                a0 = (a + 1.0) - (a - 1.0) * cs + beta * sn;
                a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cs);
                a2 = (a + 1.0) - (a - 1.0) * cs - beta * sn;
            }
        }

        // Normalize coefficients
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Processes a single audio sample through the filter.
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Clears the filter state.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude response (dB) at each frequency, from `H(z)` on the unit circle
    pub fn response_db(&self, freq: &Array1<f64>) -> Array1<f64> {
        let w = 2.0 * PI / self.srate;
        freq.mapv(|f| {
            let (c1, s1) = ((w * f).cos(), (w * f).sin());
            let (c2, s2) = ((2.0 * w * f).cos(), (2.0 * w * f).sin());
            let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
            let num_im = self.b1 * s1 + self.b2 * s2;
            let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
            let den_im = self.a1 * s1 + self.a2 * s2;
            let power = (num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im);
            10.0 * power.max(MIN_POWER).log10()
        })
    }
}

impl fmt::Display for Biquad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type:{},Freq:{:.1},Rate:{:.1},Q:{:.2},Gain:{:.1},BWoct:{:.3}",
            self.filter_type.short_name(),
            self.freq,
            self.srate,
            self.q,
            self.db_gain,
            q2bw(self.q)
        )
    }
}

/// Response (dB) of the weighted filters of `peq` in series
pub fn peq_spl(freq: &Array1<f64>, peq: &Peq) -> Array1<f64> {
    peq.iter().fold(Array1::zeros(freq.len()), |acc, (weight, biquad)| {
        acc + biquad.response_db(freq) * *weight
    })
}

/// Run `signal` through every filter of `peq` in series, from a cleared state
pub fn apply_peq(peq: &Peq, signal: &[f64]) -> Vec<f64> {
    let mut out = signal.to_vec();
    for (_, biquad) in peq {
        let mut filter = biquad.clone();
        filter.reset();
        for s in out.iter_mut() {
            *s = filter.process(*s);
        }
    }
    out
}

/// Impulse response of `peq` truncated to `taps` samples
pub fn peq_impulse(peq: &Peq, taps: usize) -> Vec<f64> {
    let mut delta = vec![0.0; taps];
    if let Some(first) = delta.first_mut() {
        *first = 1.0;
    }
    apply_peq(peq, &delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_bw_q_roundtrip() {
        let qs = [0.5, 1.0, 2.0, 5.0];
        for &q in &qs {
            let bw = q2bw(q);
            let q2 = bw2q(bw);
            assert!(
                approx_eq(q, q2, 1e-9),
                "roundtrip failed: q={} -> bw={} -> q2={}",
                q,
                bw,
                q2
            );
        }
    }

    #[test]
    fn peak_gain_at_center_frequency() {
        for gain in [-12.0, -3.0, 6.0] {
            let bq = Biquad::new(BiquadFilterType::Peak, 1_000.0, 48_000.0, 2.0, gain);
            let db = bq.response_db(&array![20.0, 1_000.0]);
            assert!(approx_eq(db[1], gain, 1e-6), "{} vs {}", db[1], gain);
            assert!(db[0].abs() < 0.1);
        }
    }

    #[test]
    fn notch_floor_is_finite() {
        let bq = Biquad::new(BiquadFilterType::Notch, 1_000.0, 48_000.0, 0.0, 0.0);
        let resp = bq.response_db(&array![100.0, 1_000.0, 10_000.0]);
        assert!(resp.iter().all(|v| v.is_finite()));
        assert!(resp[1] < -60.0);
        assert!(resp[0].abs() < 0.1);
    }

    #[test]
    fn shelves_reach_their_gain() {
        let srate = 48_000.0;
        let ls = Biquad::new(BiquadFilterType::Lowshelf, 200.0, srate, 0.0, -6.0);
        let hs = Biquad::new(BiquadFilterType::Highshelf, 2_000.0, srate, 0.0, 4.0);
        let freqs = array![20.0, 20_000.0];
        let (l, h) = (ls.response_db(&freqs), hs.response_db(&freqs));
        assert!(approx_eq(l[0], -6.0, 0.1) && l[1].abs() < 0.1, "{:?}", l);
        assert!(approx_eq(h[1], 4.0, 0.1) && h[0].abs() < 0.1, "{:?}", h);
    }

    #[test]
    fn peak_with_zero_q_is_safely_clamped() {
        let bq = Biquad::new(BiquadFilterType::Peak, 1_000.0, 48_000.0, 0.0, 3.0);
        let freqs = array![20.0, 100.0, 1_000.0, 10_000.0, 20_000.0];
        let resp = bq.response_db(&freqs);
        for (i, v) in resp.iter().enumerate() {
            assert!(v.is_finite(), "response at idx {} not finite: {}", i, v);
        }
    }

    #[test]
    fn empty_peq_keeps_the_impulse() {
        let imp = peq_impulse(&Vec::new(), 8);
        assert_eq!(imp, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn impulse_matches_analytic_response() {
        let srate = 48_000.0;
        let peq: Peq = vec![
            (1.0, Biquad::new(BiquadFilterType::Peak, 50.0, srate, 4.0, -8.0)),
            (1.0, Biquad::new(BiquadFilterType::Peak, 120.0, srate, 2.5, -3.5)),
        ];
        let taps = 1 << 15;
        let imp = peq_impulse(&peq, taps);
        assert_eq!(imp.len(), taps);

        // DFT at a few frequencies, compared with the closed form
        for &f in &[50.0, 120.0, 1000.0] {
            let w = 2.0 * PI * f / srate;
            let (re, im) = imp.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, &h)| {
                (re + h * (w * n as f64).cos(), im - h * (w * n as f64).sin())
            });
            let db = 20.0 * (re * re + im * im).sqrt().log10();
            let expected = peq_spl(&array![f], &peq)[0];
            assert!(approx_eq(db, expected, 0.05), "{} Hz: {} vs {}", f, db, expected);
        }
    }

    #[test]
    fn apply_does_not_keep_state_between_calls() {
        let filter = Biquad::new(BiquadFilterType::Peak, 100.0, 48_000.0, 1.0, -6.0);
        let peq: Peq = vec![(1.0, filter)];
        let a = peq_impulse(&peq, 64);
        let b = peq_impulse(&peq, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn rew_codes() {
        assert_eq!(BiquadFilterType::from_rew_code("PK"), Some(BiquadFilterType::Peak));
        assert_eq!(BiquadFilterType::from_rew_code("hpq"), Some(BiquadFilterType::Highpass));
        assert_eq!(BiquadFilterType::from_rew_code("None"), None);
    }
}
