use std::f64::consts::PI;

const BH_A0: f64 = 0.35875;
const BH_A1: f64 = 0.48829;
const BH_A2: f64 = 0.14128;
const BH_A3: f64 = 0.01168;

/// 4-term Blackman-Harris evaluated at phase `theta` (0..2pi spans the window)
fn blackman_harris_at(theta: f64) -> f64 {
    BH_A0 - BH_A1 * theta.cos() + BH_A2 * (2.0 * theta).cos() - BH_A3 * (3.0 * theta).cos()
}

/// Taper for a causal impulse: 1.0 over the first half, then the falling
/// half of a Blackman-Harris window down to ~0 at the last sample.
pub fn tail_taper(n: usize) -> Vec<f64> {
    let flat = n / 2;
    let tail = n - flat;
    let mut w = vec![1.0; flat];
    if tail == 1 {
        w.push(1.0);
        return w;
    }
    let step = PI / (tail - 1) as f64;
    w.extend((0..tail).map(|j| blackman_harris_at(PI + step * j as f64)));
    w
}

/// Kaiser window of length `n` centred on sample `n/2`.
///
/// With `n` even the peak sits on `n/2` and `w[n/2 - k] == w[n/2 + k]`
/// for every `k` in `1..n/2`, which keeps a centred kernel symmetric.
///
/// # Arguments
/// * `n` - Window length
/// * `beta` - Shape parameter, 0 gives a rectangular window
pub fn kaiser_centered(n: usize, beta: f64) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    let half = (n / 2) as f64;
    let denom = bessel_i0(beta);
    (0..n)
        .map(|i| {
            let x = (i as f64 - half) / half;
            let arg = beta * (1.0 - x * x).max(0.0).sqrt();
            bessel_i0(arg) / denom
        })
        .collect()
}

/// Modified Bessel function of the first kind, order 0 (series expansion)
pub fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let x_sq_4 = x * x / 4.0;

    for k in 1..50 {
        term *= x_sq_4 / (k * k) as f64;
        sum += term;
        if term.abs() < 1e-15 * sum.abs() {
            break;
        }
    }

    sum
}
