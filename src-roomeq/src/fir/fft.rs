use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Shared planner; plans are reused across channels and threads
static FFT_PLANNER: OnceLock<Mutex<FftPlanner<f64>>> = OnceLock::new();

type FftCache = HashMap<(usize, bool), Arc<dyn Fft<f64>>>;

/// Planned FFTs keyed by (size, inverse)
static FFT_CACHE: OnceLock<Mutex<FftCache>> = OnceLock::new();

fn plan(len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>> {
    let key = (len, direction == FftDirection::Inverse);
    let cache = FFT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    // a poisoned lock still holds valid plans
    let mut cache_guard = cache.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(fft) = cache_guard.get(&key) {
        return Arc::clone(fft);
    }

    let planner = FFT_PLANNER.get_or_init(|| Mutex::new(FftPlanner::new()));
    let mut planner_guard = planner.lock().unwrap_or_else(|e| e.into_inner());
    let fft = planner_guard.plan_fft(len, direction);
    cache_guard.insert(key, Arc::clone(&fft));
    fft
}

/// In-place forward FFT, unnormalised
pub fn forward(buffer: &mut [Complex64]) {
    if buffer.is_empty() {
        return;
    }
    plan(buffer.len(), FftDirection::Forward).process(buffer);
}

/// In-place inverse FFT, scaled by 1/N
pub fn inverse(buffer: &mut [Complex64]) {
    if buffer.is_empty() {
        return;
    }
    plan(buffer.len(), FftDirection::Inverse).process(buffer);
    let scale = 1.0 / buffer.len() as f64;
    for v in buffer.iter_mut() {
        *v *= scale;
    }
}

/// Forward FFT of a real signal
pub fn forward_real(samples: &[f64]) -> Vec<Complex64> {
    let mut buffer: Vec<Complex64> = samples.iter().map(|&s| Complex64::new(s, 0.0)).collect();
    forward(&mut buffer);
    buffer
}
