mod frd;
mod interpolate;

// Re-export commonly used functions
pub use frd::{guess_sample_rate, load_frd, parse_sample_rate_comment, FrdData};
pub use interpolate::*;
