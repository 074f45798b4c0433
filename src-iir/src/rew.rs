//! Room EQ Wizard filter lists
//!
//! REW exports its equaliser settings as text, one filter per line:
//!
//! ```text
//! Filter  1: ON  PK       Fc    63.0 Hz  Gain  -5.0 dB  Q  4.000
//! Filter  2: OFF None
//! Filter  3: ON  LS       Fc   100.0 Hz  Gain   3.0 dB
//! ```
//!
//! Any other line (title, date, notes, equaliser name) is ignored.

use crate::{bw2q, Biquad, BiquadFilterType, IirError, Peq};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// One filter line of a REW export
#[derive(Debug, Clone, PartialEq)]
pub struct RewFilter {
    pub index: usize,
    pub enabled: bool,
    pub filter_type: BiquadFilterType,
    pub fc: f64,
    pub gain_db: f64,
    /// 0.0 when the line gives none; the biquad then picks its default
    pub q: f64,
}

struct Patterns {
    line: Regex,
    fc: Regex,
    gain: Regex,
    q: Regex,
    bw: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build =
            |p: &str| Regex::new(p).unwrap_or_else(|e| panic!("invalid pattern {}: {}", p, e));
        Patterns {
            line: build(r"(?i)^\s*filter\s+(\d+)\s*:\s*(ON|OFF)\s+(\S+)(.*)$"),
            fc: build(r"(?i)\bFc\s+([0-9.,]+)\s*(k?Hz)?"),
            gain: build(r"(?i)\bGain\s+([-+]?[0-9.]+)\s*dB"),
            q: build(r"(?i)\bQ\s+([0-9.]+)"),
            bw: build(r"(?i)\bBW\s+([0-9.]+)\s*oct"),
        }
    })
}

fn number(text: &str, line: usize, what: &str) -> Result<f64, IirError> {
    text.replace(',', "")
        .parse::<f64>()
        .map_err(|_| IirError::Parse {
            line,
            message: format!("invalid {} '{}'", what, text),
        })
}

/// Parse the filters of a REW export. Disabled filters are kept with
/// `enabled == false`; `None` slots are skipped.
pub fn parse_rew_filters(text: &str) -> Result<Vec<RewFilter>, IirError> {
    let p = patterns();
    let mut filters = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_num = i + 1;
        let Some(caps) = p.line.captures(raw) else {
            continue;
        };
        let index = number(&caps[1], line_num, "filter number")? as usize;
        let enabled = caps[2].eq_ignore_ascii_case("ON");
        let code = &caps[3];
        let rest = caps.get(4).map_or("", |m| m.as_str());

        if code.eq_ignore_ascii_case("None") {
            continue;
        }
        let Some(filter_type) = BiquadFilterType::from_rew_code(code) else {
            if enabled {
                return Err(IirError::Parse {
                    line: line_num,
                    message: format!("unsupported filter type '{}'", code),
                });
            }
            continue;
        };

        let fc = match p.fc.captures(rest) {
            Some(c) => {
                let v = number(&c[1], line_num, "frequency")?;
                match c.get(2) {
                    Some(unit) if unit.as_str().to_ascii_lowercase().starts_with('k') => v * 1000.0,
                    _ => v,
                }
            }
            None => {
                return Err(IirError::Parse {
                    line: line_num,
                    message: "missing Fc".to_string(),
                });
            }
        };
        let gain_db = match p.gain.captures(rest) {
            Some(c) => number(&c[1], line_num, "gain")?,
            None => 0.0,
        };
        let q = match (p.q.captures(rest), p.bw.captures(rest)) {
            (Some(c), _) => number(&c[1], line_num, "Q")?,
            (None, Some(c)) => bw2q(number(&c[1], line_num, "bandwidth")?),
            (None, None) => 0.0,
        };

        filters.push(RewFilter {
            index,
            enabled,
            filter_type,
            fc,
            gain_db,
            q,
        });
    }

    Ok(filters)
}

/// Read and parse a REW export
pub fn load_rew_filters(path: &Path) -> Result<Vec<RewFilter>, IirError> {
    let text = std::fs::read_to_string(path)?;
    parse_rew_filters(&text)
}

/// Biquads of the enabled filters at sample rate `srate`
pub fn rew_to_peq(filters: &[RewFilter], srate: f64) -> Peq {
    filters
        .iter()
        .filter(|f| f.enabled)
        .map(|f| {
            let biquad = Biquad::new(f.filter_type, f.fc, srate, f.q, f.gain_db);
            (1.0, biquad)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = "Filter Settings file

Room EQ V5.20
Dated: 12 mar. 2019 20:10:33

Notes:

Equaliser: Generic
Filter  1: ON  PK       Fc    50.0 Hz  Gain  -8.0 dB  Q  5.000
Filter  2: ON  PK       Fc   1,200 Hz  Gain  -3.5 dB  Q  2.50
Filter  3: OFF PK       Fc   300.0 Hz  Gain  -6.0 dB  Q  1.00
Filter  4: OFF None
Filter  5: ON  LS       Fc   100.0 Hz  Gain   3.0 dB
Filter  6: ON  PK       Fc    2.5 kHz  Gain  -2.0 dB  BW 1.0 oct
";

    #[test]
    fn parses_a_rew_export() {
        let filters = parse_rew_filters(EXPORT).unwrap();
        assert_eq!(filters.len(), 5);

        assert_eq!(filters[0].index, 1);
        assert_eq!(filters[0].filter_type, BiquadFilterType::Peak);
        assert_eq!(filters[0].fc, 50.0);
        assert_eq!(filters[0].gain_db, -8.0);
        assert_eq!(filters[0].q, 5.0);

        assert_eq!(filters[1].fc, 1200.0);
        assert!(!filters[2].enabled);

        assert_eq!(filters[3].filter_type, BiquadFilterType::Lowshelf);
        assert_eq!(filters[3].q, 0.0);

        assert_eq!(filters[4].fc, 2500.0);
        assert!((filters[4].q - bw2q(1.0)).abs() < 1e-12);
    }

    #[test]
    fn only_enabled_filters_reach_the_peq() {
        let filters = parse_rew_filters(EXPORT).unwrap();
        let peq = rew_to_peq(&filters, 48_000.0);
        assert_eq!(peq.len(), 4);
        assert!(peq.iter().all(|(w, b)| *w == 1.0 && b.srate == 48_000.0));
    }

    #[test]
    fn missing_fc_is_an_error() {
        let err = parse_rew_filters("Filter  1: ON  PK  Gain -3.0 dB  Q 1.0\n").unwrap_err();
        assert!(matches!(err, IirError::Parse { line: 1, .. }));
    }

    #[test]
    fn unsupported_enabled_type_is_an_error() {
        assert!(parse_rew_filters("Filter 1: ON  AP  Fc 100 Hz\n").is_err());
        assert!(parse_rew_filters("Filter 1: OFF AP  Fc 100 Hz\n").unwrap().is_empty());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();
        assert_eq!(load_rew_filters(file.path()).unwrap().len(), 5);
    }
}
