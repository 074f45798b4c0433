//! Output files: raw float32 impulses and JSON reports

use crate::error::{DrcError, Result};
use crate::impulse::{ImpulseResponse, PhaseType};
use byteorder::{LittleEndian, WriteBytesExt};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write samples as headerless little-endian float32
pub fn write_pcm_f32(path: &Path, samples: &[f64]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for &s in samples {
        writer.write_f32::<LittleEndian>(s as f32)?;
    }
    writer.flush()?;
    Ok(())
}

/// Channel tag from the measurement file name: `L` or `R` from its first
/// letter, `C` otherwise
pub fn channel_tag(input: &Path) -> char {
    let first = input
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.chars().next())
        .map(|c| c.to_ascii_uppercase());
    match first {
        Some(c @ ('L' | 'R')) => c,
        _ => 'C',
    }
}

/// `16384` -> `"16Ktaps"`
pub fn ktaps(taps: usize) -> String {
    format!("{}Ktaps", taps / 1024)
}

/// Where the impulses of one channel are written:
/// `<dir>/<fs>_<K>Ktaps/drc.<CH>_{mp,lp}.pcm`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub directory: PathBuf,
    pub channel: char,
}

impl OutputLayout {
    /// Layout next to `input`, or under `output_dir` when given
    pub fn for_input(
        input: &Path,
        output_dir: Option<&Path>,
        sample_rate: u32,
        taps: usize,
    ) -> Self {
        let base = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        OutputLayout {
            directory: base.join(format!("{}_{}", sample_rate, ktaps(taps))),
            channel: channel_tag(input),
        }
    }

    pub fn pcm_path(&self, phase: PhaseType) -> PathBuf {
        self.directory
            .join(format!("drc.{}_{}.pcm", self.channel, phase.short_name()))
    }

    /// Create the directory and write both impulses
    pub fn write_pair(
        &self,
        min_phase: &ImpulseResponse,
        linear_phase: &ImpulseResponse,
    ) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(&self.directory)?;
        let mp = self.pcm_path(PhaseType::Minimum);
        let lp = self.pcm_path(PhaseType::Linear);
        write_pcm_f32(&mp, &min_phase.samples)?;
        write_pcm_f32(&lp, &linear_phase.samples)?;
        log::info!("saved {} and {}", mp.display(), lp.display());
        Ok((mp, lp))
    }
}

/// Fail when two inputs would write the same impulse files.
///
/// `inputs` pairs each measurement path with its layout, in input order.
pub fn check_distinct_outputs(inputs: &[(&Path, &OutputLayout)]) -> Result<()> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for &(input, layout) in inputs {
        let target = layout.pcm_path(PhaseType::Minimum);
        if let Some(first) = seen.insert(target.clone(), input) {
            return Err(DrcError::configuration(format!(
                "{} and {} would both write {}",
                first.display(),
                input.display(),
                target.display()
            )));
        }
    }
    Ok(())
}

/// Pretty-printed JSON report
pub fn write_report_json<T: Serialize + ?Sized>(path: &Path, report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}
