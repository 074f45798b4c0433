//! Frequency response curves

use crate::error::{DrcError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A magnitude-only frequency response: frequencies in Hz, levels in dB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Frequency points (Hz), non-decreasing
    pub freq: Array1<f64>,
    /// Magnitude at each frequency (dB)
    pub spl: Array1<f64>,
}

impl Curve {
    /// Build a curve and check its invariants
    pub fn new(freq: Array1<f64>, spl: Array1<f64>) -> Result<Self> {
        let curve = Curve { freq, spl };
        curve.validate()?;
        Ok(curve)
    }

    /// Check that the curve is usable by the pipeline
    ///
    /// Frequencies must be finite, non-negative and non-decreasing; levels
    /// must be finite; both arrays must have the same non-zero length.
    pub fn validate(&self) -> Result<()> {
        if self.freq.is_empty() {
            return Err(DrcError::configuration("curve is empty"));
        }
        if self.freq.len() != self.spl.len() {
            return Err(DrcError::configuration(format!(
                "curve has {} frequencies but {} magnitudes",
                self.freq.len(),
                self.spl.len()
            )));
        }
        if let Some(i) = self.freq.iter().position(|f| !f.is_finite() || *f < 0.0) {
            return Err(DrcError::configuration(format!(
                "curve frequency #{} is invalid: {}",
                i, self.freq[i]
            )));
        }
        if let Some(i) = self.spl.iter().position(|v| !v.is_finite()) {
            return Err(DrcError::configuration(format!(
                "curve magnitude #{} at {} Hz is not finite",
                i, self.freq[i]
            )));
        }
        if let Some(i) = (1..self.freq.len()).find(|&i| self.freq[i] < self.freq[i - 1]) {
            return Err(DrcError::configuration(format!(
                "curve frequencies decrease at #{}: {} Hz after {} Hz",
                i,
                self.freq[i],
                self.freq[i - 1]
            )));
        }
        Ok(())
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    /// Highest frequency of the curve (Hz)
    pub fn top_frequency(&self) -> f64 {
        self.freq.last().copied().unwrap_or(0.0)
    }

    /// Same curve with a 0 Hz bin prepended when missing.
    ///
    /// The DC value replicates the first measured magnitude.
    pub fn with_dc(&self) -> Curve {
        match (self.freq.first(), self.spl.first()) {
            (Some(&f0), Some(&v0)) if f0 > 0.0 => {
                let mut freq = Vec::with_capacity(self.len() + 1);
                let mut spl = Vec::with_capacity(self.len() + 1);
                freq.push(0.0);
                spl.push(v0);
                freq.extend(self.freq.iter());
                spl.extend(self.spl.iter());
                Curve {
                    freq: Array1::from(freq),
                    spl: Array1::from(spl),
                }
            }
            _ => self.clone(),
        }
    }

    /// Same grid, levels shifted so that `level_db` becomes 0 dB
    pub fn rebased(&self, level_db: f64) -> Curve {
        Curve {
            freq: self.freq.clone(),
            spl: &self.spl - level_db,
        }
    }

    /// Same grid, new levels
    pub fn with_spl(&self, spl: Array1<f64>) -> Curve {
        debug_assert_eq!(spl.len(), self.freq.len());
        Curve {
            freq: self.freq.clone(),
            spl,
        }
    }

    /// Index of the bin whose frequency is closest to `f`
    pub fn nearest_index(&self, f: f64) -> usize {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (i, &fi) in self.freq.iter().enumerate() {
            let d = (fi - f).abs();
            // first minimum wins, as argmin does
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }
}
