//! Least-squares regression
//!
//! Contains the solver behind the forecasting models:
//! - `solve_linear_system`: Gaussian elimination with partial pivoting
//! - `ridge_least_squares`: regularised normal equations `(XᵀX + Λ) β = Xᵀy`

use crate::{MathError, Result};

/// Pivots smaller than this fraction of the largest matrix entry are treated as zero.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Solve the square system `a · x = b`.
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Expected a {}x{} coefficient matrix",
            n, n
        )));
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(MathError::CalculationError(
            "Coefficient matrix is zero or not finite".to_string(),
        ));
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= SINGULAR_TOLERANCE * scale {
            return Err(MathError::CalculationError(format!(
                "Singular system: no usable pivot in column {}",
                col
            )));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    Ok(x)
}

/// Fit `y ≈ X β` minimising `‖y - Xβ‖² + Σ penalties[j] · β[j]²`.
///
/// `x` is row-major, one row per observation. A penalty of zero leaves the
/// corresponding coefficient unregularised.
pub fn ridge_least_squares(x: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(MathError::InsufficientData(
            "No observations to fit".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design matrix has {} rows but target has {} values",
            x.len(),
            y.len()
        )));
    }

    let p = penalties.len();
    if let Some(row) = x.iter().position(|row| row.len() != p) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has {} columns, expected {}",
            row,
            x[row].len(),
            p
        )));
    }
    if penalties.iter().any(|&l| l < 0.0 || !l.is_finite()) {
        return Err(MathError::InvalidInput(
            "Penalties must be finite and non-negative".to_string(),
        ));
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &target) in x.iter().zip(y) {
        for a in 0..p {
            xty[a] += row[a] * target;
            for b in a..p {
                xtx[a][b] += row[a] * row[b];
            }
        }
    }
    for a in 0..p {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
        xtx[a][a] += penalties[a];
    }

    solve_linear_system(xtx, xty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_small_system() {
        // 2x + y = 5, x + 3y = 10  =>  x = 1, y = 3
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve_linear_system(a, vec![5.0, 10.0]).unwrap();

        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let x = solve_linear_system(a, vec![4.0, 7.0]).unwrap();

        assert_eq!(x, vec![7.0, 4.0]);
    }

    #[test]
    fn test_singular_system_rejected() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let result = solve_linear_system(a, vec![1.0, 2.0]);

        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_ordinary_line_fit() {
        // y = 3 + 2t exactly
        let x: Vec<Vec<f64>> = (0..5).map(|t| vec![1.0, t as f64]).collect();
        let y: Vec<f64> = (0..5).map(|t| 3.0 + 2.0 * t as f64).collect();

        let beta = ridge_least_squares(&x, &y, &[0.0, 0.0]).unwrap();

        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficient() {
        let x: Vec<Vec<f64>> = (0..10).map(|t| vec![1.0, t as f64]).collect();
        let y: Vec<f64> = (0..10).map(|t| t as f64).collect();

        let free = ridge_least_squares(&x, &y, &[0.0, 0.0]).unwrap();
        let shrunk = ridge_least_squares(&x, &y, &[0.0, 1_000.0]).unwrap();

        assert!(shrunk[1].abs() < free[1].abs());
    }

    #[test]
    fn test_penalty_makes_underdetermined_fit_solvable() {
        // One observation, two coefficients
        let x = vec![vec![1.0, 1.0]];
        assert!(ridge_least_squares(&x, &[2.0], &[0.0, 0.0]).is_err());
        assert!(ridge_least_squares(&x, &[2.0], &[0.0, 1.0]).is_ok());
    }

    #[test]
    fn test_shape_validation() {
        let x = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            ridge_least_squares(&x, &[1.0, 2.0], &[0.0, 0.0]),
            Err(MathError::InvalidInput(_))
        ));
        assert!(matches!(
            ridge_least_squares(&[], &[], &[]),
            Err(MathError::InsufficientData(_))
        ));
    }
}
