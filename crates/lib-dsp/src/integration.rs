//! Numerical quadrature over frequency bands.

/// Sub-intervals per band, matching the 601-point diagnostic grid.
pub const DEFAULT_INTERVALS: usize = 600;

/// Composite Simpson rule for `∫_a^b f(x) dx` with `n` sub-intervals.
///
/// `n` is rounded up to the next even number. Returns 0 when `b <= a`.
pub fn simpson<F>(f: F, a: f64, b: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    if b <= a {
        return 0.0;
    }
    let n = (n.max(2) + 1) & !1;
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 1 { 4.0 * f(x) } else { 2.0 * f(x) };
    }
    sum * h / 3.0
}

/// Simpson rule with [`DEFAULT_INTERVALS`] sub-intervals.
pub fn integrate<F>(f: F, a: f64, b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    simpson(f, a, b, DEFAULT_INTERVALS)
}

/// Closed form of `∫_a^b cos(mω) dω`.
pub fn integrated_cos(m: i32, a: f64, b: f64) -> f64 {
    if m == 0 {
        b - a
    } else {
        let m = m as f64;
        ((m * b).sin() - (m * a).sin()) / m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_simpson_exact_for_cubics() {
        let v = simpson(|x| x * x * x - 2.0 * x + 1.0, 0.0, 2.0, 2);
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_simpson_sine() {
        let v = integrate(f64::sin, 0.0, PI);
        assert!((v - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_intervals_rounded_up() {
        let a = simpson(|x| x * x, 0.0, 1.0, 3);
        assert!((a - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_integrated_cos_matches_simpson() {
        for m in [0, 1, -3, 7] {
            let exact = integrated_cos(m, 0.2, 2.5);
            let numeric = simpson(|x| (m as f64 * x).cos(), 0.2, 2.5, 6000);
            assert!((exact - numeric).abs() < 1e-10);
            let coarse = integrate(|x| (m as f64 * x).cos(), 0.2, 2.5);
            assert!((exact - coarse).abs() < 1e-8);
        }
    }

    #[test]
    fn test_empty_interval() {
        assert_eq!(simpson(|_| 1.0, 1.0, 1.0, 10), 0.0);
        assert_eq!(simpson(|_| 1.0, 2.0, 1.0, 10), 0.0);
    }
}
