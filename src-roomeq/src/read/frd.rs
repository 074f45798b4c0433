use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use crate::config::SUPPORTED_SAMPLE_RATES;
use crate::error::{DrcError, Result};
use crate::Curve;
use ndarray::Array1;
use regex::Regex;

/// A measured response and the sample rate announced in its header, if any
#[derive(Debug, Clone, PartialEq)]
pub struct FrdData {
    pub curve: Curve,
    pub sample_rate: Option<u32>,
}

fn sample_rate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:fs|sample\s*rate|samplerate|sampling\s*rate)\s*[:=]?\s*(\d{4,6})")
            .unwrap_or_else(|e| panic!("invalid sample rate pattern: {}", e))
    })
}

/// Strip a comment marker, returning the comment body
fn comment_body(line: &str) -> Option<&str> {
    line.strip_prefix('#')
        .or_else(|| line.strip_prefix('*'))
        .or_else(|| line.strip_prefix("//"))
}

/// Sample rate announced in a comment line, e.g. `# fs=48000`
pub fn parse_sample_rate_comment(comment: &str) -> Option<u32> {
    sample_rate_regex()
        .captures(comment)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Nearest supported sample rate for a measurement ending at `top_hz`
///
/// A measurement usually stops at, or slightly below, its Nyquist frequency.
pub fn guess_sample_rate(top_hz: f64) -> u32 {
    SUPPORTED_SAMPLE_RATES
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (*a as f64 / 2.0 - top_hz).abs();
            let db = (*b as f64 / 2.0 - top_hz).abs();
            da.total_cmp(&db)
        })
        .unwrap_or(crate::config::DEFAULT_SAMPLE_RATE)
}

/// Load a frequency response from an FRD file
///
/// Expected format:
/// - one point per line: frequency (Hz), magnitude (dB), optional phase (ignored)
/// - whitespace, comma or semicolon separated
/// - `#`, `*` and `//` start comment lines; a comment may announce the
///   sample rate (`# fs=48000`, `* Sample rate: 44100`)
/// - lines that do not start with a number are skipped as headers
///
/// A 0 Hz bin is prepended when the file does not start at DC.
pub fn load_frd(path: &Path) -> Result<FrdData> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut frequencies = Vec::new();
    let mut spl_values = Vec::new();
    let mut sample_rate = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if let Some(comment) = comment_body(line) {
            if sample_rate.is_none() {
                sample_rate = parse_sample_rate_comment(comment);
            }
            continue;
        }

        let parts: Vec<&str> = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        let first = match parts.first().map(|s| s.parse::<f64>()) {
            Some(Ok(v)) => v,
            // text header
            _ => continue,
        };
        let spl = match parts.get(1).map(|s| s.parse::<f64>()) {
            Some(Ok(v)) => v,
            _ => {
                return Err(DrcError::Parse {
                    path: path.to_path_buf(),
                    message: format!(
                        "line {}: expected 'frequency magnitude', got '{}'",
                        line_num + 1,
                        line
                    ),
                });
            }
        };
        frequencies.push(first);
        spl_values.push(spl);
    }

    if frequencies.is_empty() {
        return Err(DrcError::Parse {
            path: path.to_path_buf(),
            message: "no valid frequency response data found".to_string(),
        });
    }

    let curve = Curve::new(Array1::from_vec(frequencies), Array1::from_vec(spl_values))
        .map_err(|e| DrcError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .with_dc();

    log::debug!(
        "{}: {} points, {:.1}-{:.1} Hz, fs {:?}",
        path.display(),
        curve.len(),
        curve.freq[0],
        curve.top_frequency(),
        sample_rate
    );

    Ok(FrdData { curve, sample_rate })
}
