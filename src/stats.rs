//! Guarded numeric helpers shared by the extractors and estimators
//!
//! Every helper returns 0 instead of NaN or infinity when its input is empty
//! or its denominator vanishes.

/// Divide, returning 0 when the denominator is zero or the result is not finite
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Arithmetic mean (0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with n-1 denominator (0 for fewer than two values)
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation with n-1 denominator
pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Ordinary least squares slope of y against x
///
/// `m = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`, 0 with fewer than two points or a
/// vanishing denominator.
pub fn ols_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < 1e-12 {
        return 0.0;
    }
    safe_div(n * sum_xy - sum_x * sum_y, denominator)
}

/// OLS slope of values against their index (0, 1, 2, ...)
pub fn index_slope(values: &[f64]) -> f64 {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    ols_slope(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_div_guards_zero() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(6.0, 3.0), 2.0);
    }

    #[test]
    fn test_variance_uses_sample_denominator() {
        // mean 5, squared deviations 9+1+1+9 = 20, / 3
        let var = sample_variance(&[2.0, 4.0, 6.0, 8.0]);
        assert!((var - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(sample_variance(&[42.0]), 0.0);
        assert_eq!(sample_variance(&[]), 0.0);
    }

    #[test]
    fn test_ols_slope_exact_line() {
        let slope = ols_slope(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]);
        assert!((slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_ols_slope_degenerate_inputs() {
        assert_eq!(ols_slope(&[]), 0.0);
        assert_eq!(ols_slope(&[(1.0, 5.0)]), 0.0);
        // identical x values
        assert_eq!(ols_slope(&[(0.0, 1.0), (0.0, 9.0)]), 0.0);
    }

    #[test]
    fn test_index_slope() {
        assert!((index_slope(&[10.0, 8.0, 6.0]) + 2.0).abs() < 1e-9);
    }
}
