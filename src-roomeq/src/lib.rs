//! RoomEQ - FIR room correction from measured in-room responses
//!
//! This crate turns a measured frequency response into a cut-only correction
//! and realises it as a pair of FIR filters (minimum and linear phase):
//!
//! - smoothing, reference level, target and EQ curves on the measured grid
//! - resampling to the FFT grid and cepstral minimum-phase synthesis
//! - linear-phase conversion with a Kaiser window
//!
//! Biquad based corrections (REW filter lists) live in `roomeq_iir`.

// Re-export external crate functionality
pub use roomeq_iir as iir;

/// Common CLI argument definitions shared across binaries
pub mod cli;
/// Run configuration and presets
pub mod config;
/// Frequency response curves
pub mod curve;
/// Correction curve synthesis
pub mod eq;
/// Error types
pub mod error;
/// Spectral resampling and FIR synthesis
pub mod fir;
/// Impulse responses
pub mod impulse;
/// Data reading and parsing functions
pub mod read;
/// Reference level estimation
pub mod reference;
/// Fractional-octave smoothing
pub mod smooth;
/// Target curve construction
pub mod target;
/// Shared workflow steps used by binaries
pub mod workflow;
/// PCM and report output
pub mod write;

// Re-export commonly used items
pub use config::{DrcConfig, Preset};
pub use curve::Curve;
pub use error::{DrcError, Result};
pub use impulse::{ImpulseResponse, PhaseType};
pub use reference::ReferenceLevel;
pub use smooth::{smooth, smooth_fixed, SmoothingProfile, TransitionSpeed};
pub use workflow::{
    design_channels, design_eq, design_filters, design_fir, design_peq_fir, ChannelDesign,
    ChannelInput, Diagnostics, EqDesign, FilterDesign, FirDesign, PeqFirDesign,
};
