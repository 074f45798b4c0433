use ndarray::Array1;

/// Linear interpolation function
///
/// Targets outside the source range take the value of the nearest end
/// point (flat extrapolation).
///
/// # Arguments
/// * `target_freqs` - Target frequencies to interpolate to
/// * `source_freqs` - Source frequency array, non-decreasing
/// * `source_spls` - Source SPL values
///
/// # Returns
/// * Interpolated SPL values at target frequencies
pub fn interpolate(
    target_freqs: &Array1<f64>,
    source_freqs: &Array1<f64>,
    source_spls: &Array1<f64>,
) -> Array1<f64> {
    let n = source_freqs.len();
    if n == 0 {
        return Array1::zeros(target_freqs.len());
    }
    let source = source_freqs.as_slice();
    let first = source_freqs[0];
    let last = source_freqs[n - 1];

    target_freqs.mapv(|target_freq| {
        if target_freq <= first {
            return source_spls[0];
        }
        if target_freq >= last {
            return source_spls[n - 1];
        }
        // first source point at or above the target
        let right_idx = match source {
            Some(s) => s.partition_point(|&f| f < target_freq),
            None => source_freqs
                .iter()
                .position(|&f| f >= target_freq)
                .unwrap_or(n - 1),
        };
        let left_idx = right_idx - 1;

        let freq_left = source_freqs[left_idx];
        let freq_right = source_freqs[right_idx];
        let spl_left = source_spls[left_idx];
        let spl_right = source_spls[right_idx];

        let t = (target_freq - freq_left) / (freq_right - freq_left);
        spl_left + t * (spl_right - spl_left)
    })
}

/// Create a uniform frequency grid of `n_points` from 0 Hz to `nyquist`
/// inclusive, the last point being exactly `nyquist`.
pub fn create_linear_frequency_grid(n_points: usize, nyquist: f64) -> Array1<f64> {
    let mut grid = Array1::linspace(0.0, nyquist, n_points);
    if let Some(last) = grid.last_mut() {
        *last = nyquist;
    }
    grid
}
