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
use roomeq::cli::Peq2FirArgs;
use roomeq::iir;
use roomeq::workflow::design_peq_fir;
use roomeq::write::write_pcm_f32;
use std::error::Error;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Peq2FirArgs::parse();
    let config = args.to_config()?;
    let srate = config.output_sample_rate as f64;

    for path in &args.inputs {
        let filters = iir::load_rew_filters(path)?;
        let peq = iir::rew_to_peq(&filters, srate);
        log::info!("{}: {} enabled filters", path.display(), peq.len());
        for (_, biquad) in &peq {
            log::info!("  {}", biquad);
        }

        let design = design_peq_fir(&peq, &config)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "peq".to_string());
        let dir = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
        let mp = dir.join(format!("mp-{}.pcm", stem));
        let lp = dir.join(format!("lp-{}.pcm", stem));
        write_pcm_f32(&mp, &design.min_phase.samples)?;
        write_pcm_f32(&lp, &design.linear_phase.samples)?;
        log::info!("saved {} and {}", mp.display(), lp.display());
    }
    Ok(())
}
