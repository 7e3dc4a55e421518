//! Fourier features for periodic components

use std::f64::consts::PI;

/// Fourier basis for a seasonal component.
///
/// For each time `t` (in days) returns `2 * order` columns laid out as
/// `sin(2π·1·t/P), cos(2π·1·t/P), …, sin(2π·order·t/P), cos(2π·order·t/P)`.
pub fn fourier_series(t_days: &[f64], period: f64, order: usize) -> Vec<Vec<f64>> {
    t_days
        .iter()
        .map(|&t| {
            (1..=order)
                .flat_map(|k| {
                    let angle = 2.0 * PI * k as f64 * t / period;
                    [angle.sin(), angle.cos()]
                })
                .collect()
        })
        .collect()
}
