mod fft;
pub mod linphase;
pub mod minphase;
pub mod resample;
pub mod spectrum;
pub mod window;

pub use linphase::convert_to_linear_phase;
pub use minphase::{magnitude_response_db, max_deviation_db, synthesize_minimum_phase};
pub use resample::{resample, HalfSpectrum, ResampleReport};
pub use spectrum::magnitude_to_minimum_phase_spectrum;
