//! RoomEQ - FIR room correction design
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use roomeq::cli::Args;
use roomeq::read;
use roomeq::workflow::{design_channels, ChannelInput, Diagnostics};
use roomeq::write::{check_distinct_outputs, write_report_json, OutputLayout};
use std::error::Error;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Args::parse();
    let config = args.to_config()?;
    log::info!(
        "FIR {} Ktaps @ {} Hz, Schroeder {} Hz, transition at {:.1} Hz",
        config.taps() / 1024,
        config.output_sample_rate,
        config.schroeder_frequency,
        config.transition_pivot()
    );

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let frd = read::load_frd(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        if frd.sample_rate.is_none() {
            log::debug!(
                "{}: no fs in header, top frequency suggests {} Hz",
                name,
                read::guess_sample_rate(frd.curve.top_frequency())
            );
        }
        inputs.push(ChannelInput {
            name,
            curve: frd.curve,
            source_sample_rate: frd.sample_rate,
        });
    }

    let layouts: Vec<OutputLayout> = args
        .inputs
        .iter()
        .map(|path| {
            OutputLayout::for_input(
                path,
                args.output_dir.as_deref(),
                config.output_sample_rate,
                config.taps(),
            )
        })
        .collect();
    if args.do_fir {
        let pairs: Vec<_> = args
            .inputs
            .iter()
            .map(|p| p.as_path())
            .zip(layouts.iter())
            .collect();
        check_distinct_outputs(&pairs)?;
    }

    // nothing is written unless every channel succeeded
    let designs = design_channels(&inputs, &config, args.do_fir)?;

    let mut report: Vec<Diagnostics> = Vec::with_capacity(designs.len());
    for (design, layout) in designs.iter().zip(layouts.iter()) {
        let diagnostics = design.diagnostics(&config);
        log::info!(
            "{}: reference {} dB ({}), {} bins, EQ min {:.1} dB",
            diagnostics.channel,
            diagnostics.reference_level_db,
            if diagnostics.reference_estimated { "estimated" } else { "fixed" },
            diagnostics.source_bins,
            design.eq.eq.spl.iter().cloned().fold(0.0f64, f64::min)
        );
        if let Some(fir) = &design.fir {
            layout.write_pair(&fir.min_phase, &fir.linear_phase)?;
        }
        report.push(diagnostics);
    }
    if !args.do_fir {
        log::info!("FIRs not generated, use --do-fir to save them");
    }

    if let Some(path) = &args.report {
        write_report_json(path, &report)?;
        log::info!("report written to {}", path.display());
    }
    Ok(())
}
