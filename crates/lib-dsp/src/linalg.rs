//! Dense linear algebra for the small systems arising in filter design.
//!
//! Windows rarely exceed a few dozen weights, so plain Gaussian elimination
//! with partial pivoting is used throughout.

use crate::error::{DspError, DspResult};
use ndarray::{s, Array1, Array2};

/// Relative pivot threshold below which a system is declared singular.
const PIVOT_TOLERANCE: f64 = 1e-13;

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
pub fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> DspResult<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(DspError::SingularSystem(format!(
            "Dimension mismatch: {}x{} matrix, {} right-hand side",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if n == 0 {
        return Ok(b);
    }
    if scale == 0.0 {
        return Err(DspError::SingularSystem("Zero matrix".to_string()));
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = a[[col, col]].abs();
        for row in (col + 1)..n {
            if a[[row, col]].abs() > max_val {
                max_val = a[[row, col]].abs();
                max_row = row;
            }
        }
        if max_val < PIVOT_TOLERANCE * scale {
            return Err(DspError::SingularSystem(format!(
                "Pivot {:e} in column {} below tolerance",
                max_val, col
            )));
        }
        if max_row != col {
            for k in 0..n {
                a.swap([col, k], [max_row, k]);
            }
            b.swap(col, max_row);
        }

        let pivot = a[[col, col]];
        for row in (col + 1)..n {
            let factor = a[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[[i, j]] * x[j];
        }
        x[i] = sum / a[[i, i]];
    }
    Ok(x)
}

/// Minimise `xᵀQx - 2cᵀx` subject to `Ax = b`.
///
/// Solves the KKT system
///
/// ```text
/// | Q  Aᵀ | | x |   | c |
/// | A  0  | | λ | = | b |
/// ```
///
/// and returns `x`. Without constraints (`A` has no rows) this is `Q⁻¹c`.
pub fn constrained_minimum(
    q: &Array2<f64>,
    c: &Array1<f64>,
    a: &Array2<f64>,
    b: &Array1<f64>,
) -> DspResult<Array1<f64>> {
    let n = q.nrows();
    let m = a.nrows();
    if q.ncols() != n || c.len() != n || (m > 0 && a.ncols() != n) || b.len() != m {
        return Err(DspError::SingularSystem(format!(
            "Inconsistent KKT dimensions: Q {}x{}, c {}, A {}x{}, b {}",
            q.nrows(),
            q.ncols(),
            c.len(),
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let mut kkt = Array2::zeros((n + m, n + m));
    kkt.slice_mut(s![..n, ..n]).assign(q);
    if m > 0 {
        kkt.slice_mut(s![n.., ..n]).assign(a);
        kkt.slice_mut(s![..n, n..]).assign(&a.t());
    }
    let mut rhs = Array1::zeros(n + m);
    rhs.slice_mut(s![..n]).assign(c);
    rhs.slice_mut(s![n..]).assign(b);

    let solution = solve(kkt, rhs)?;
    Ok(solution.slice(s![..n]).to_owned())
}

/// Moment matrix `A[j][i] = k_i^j` for lags `k_i = lower..=upper`, `j = 0..=degree`.
pub fn moment_matrix(lower: i32, upper: i32, degree: usize) -> Array2<f64> {
    let n = (upper - lower + 1).max(0) as usize;
    Array2::from_shape_fn((degree + 1, n), |(j, i)| {
        let k = (lower + i as i32) as f64;
        k.powi(j as i32)
    })
}

/// Unit vector `e_0` of length `n` (the "preserve constants" right-hand side).
pub fn unit_vector(n: usize) -> Array1<f64> {
    let mut e = Array1::zeros(n);
    if n > 0 {
        e[0] = 1.0;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_with_pivoting() {
        let a = array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [2.0, 0.0, 3.0]];
        let b = array![7.0, 3.0, 11.0];
        let x = solve(a, b).unwrap();
        // x = [1, 2, 3] -> [0+4+3, 1+2, 2+9]
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
        assert!((x[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_detected() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(matches!(solve(a, b), Err(DspError::SingularSystem(_))));
    }

    #[test]
    fn test_constrained_minimum_equal_split() {
        // min Σx² s.t. Σx = 1 -> x = 1/n
        let q = Array2::eye(4);
        let c = Array1::zeros(4);
        let a = Array2::ones((1, 4));
        let b = array![1.0];
        let x = constrained_minimum(&q, &c, &a, &b).unwrap();
        for v in x.iter() {
            assert!((v - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constrained_minimum_without_constraints() {
        let q = array![[2.0, 0.0], [0.0, 4.0]];
        let c = array![2.0, 2.0];
        let a = Array2::zeros((0, 2));
        let b = Array1::zeros(0);
        let x = constrained_minimum(&q, &c, &a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_moment_matrix() {
        let m = moment_matrix(-2, 0, 2);
        assert_eq!(m.shape(), &[3, 3]);
        assert_eq!(m.row(0).to_vec(), vec![1.0, 1.0, 1.0]);
        assert_eq!(m.row(1).to_vec(), vec![-2.0, -1.0, 0.0]);
        assert_eq!(m.row(2).to_vec(), vec![4.0, 1.0, 0.0]);
    }
}
