//! Impulse responses produced by the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase behaviour of an FIR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    /// Causal, energy at the start, least group delay
    Minimum,
    /// Symmetric, constant group delay of taps/2 samples
    Linear,
}

impl PhaseType {
    /// Short tag used in file names
    pub fn short_name(&self) -> &'static str {
        match self {
            PhaseType::Minimum => "mp",
            PhaseType::Linear => "lp",
        }
    }
}

/// A finite impulse response at a given sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseResponse {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub phase: PhaseType,
}

impl ImpulseResponse {
    /// Number of taps
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the sample with the largest magnitude
    pub fn peak_index(&self) -> usize {
        self.samples
            .iter()
            .enumerate()
            .fold((0usize, 0.0f64), |(bi, bv), (i, &v)| {
                if v.abs() > bv { (i, v.abs()) } else { (bi, bv) }
            })
            .0
    }

    /// True when every sample is finite
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|v| v.is_finite())
    }
}

impl fmt::Display for ImpulseResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} taps @ {} Hz ({}, peak at #{})",
            self.len(),
            self.sample_rate,
            self.phase.short_name(),
            self.peak_index()
        )
    }
}
