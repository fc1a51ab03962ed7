//! Least-squares helpers for the group acceptance statistics.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor n, not n-1).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Ordinary least-squares fit of y on x.
///
/// Degenerate inputs (fewer than two points, or zero variance in x) return a
/// flat fit through the mean of y with r² = 0 instead of NaN, so group
/// evaluation can fail the slope check rather than poison the report.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Regression {
    debug_assert_eq!(x.len(), y.len());

    let n = x.len().min(y.len());
    if n < 2 {
        return Regression {
            slope: 0.0,
            intercept: mean(y),
            r_squared: 0.0,
        };
    }

    let x_mean = mean(&x[..n]);
    let y_mean = mean(&y[..n]);

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for i in 0..n {
        let dx = x[i] - x_mean;
        let dy = y[i] - y_mean;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_xx == 0.0 {
        return Regression {
            slope: 0.0,
            intercept: y_mean,
            r_squared: 0.0,
        };
    }

    let slope = ss_xy / ss_xx;
    let intercept = y_mean - slope * x_mean;

    // A vertical spread of zero means y is constant; the fit is exact.
    let r_squared = if ss_yy == 0.0 {
        1.0
    } else {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    };

    Regression {
        slope,
        intercept,
        r_squared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_mean_and_std() {
        assert_close(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_close(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }

    #[test]
    fn test_exact_linear_fit() {
        // y = 2x + 1
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];

        let fit = linear_regression(&x, &y);
        assert_close(fit.slope, 2.0);
        assert_close(fit.intercept, 1.0);
        assert_close(fit.r_squared, 1.0);
    }

    #[test]
    fn test_identity_fit_with_noise() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.01, 1.99, 3.02, 3.98, 5.01];

        let fit = linear_regression(&x, &y);
        assert!((fit.slope - 1.0).abs() < 0.01);
        assert!(fit.intercept.abs() < 0.05);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn test_hand_computed_regression() {
        // Two points define the line exactly: slope 0.5, intercept 0.5.
        let fit = linear_regression(&[1.0, 3.0], &[1.0, 2.0]);
        assert_close(fit.slope, 0.5);
        assert_close(fit.intercept, 0.5);
        assert_close(fit.r_squared, 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let single = linear_regression(&[1.0], &[5.0]);
        assert_eq!(single.slope, 0.0);
        assert_eq!(single.intercept, 5.0);
        assert_eq!(single.r_squared, 0.0);

        let constant_x = linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(constant_x.slope, 0.0);
        assert_eq!(constant_x.r_squared, 0.0);

        let constant_y = linear_regression(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]);
        assert_eq!(constant_y.slope, 0.0);
        assert_eq!(constant_y.intercept, 4.0);
        assert_eq!(constant_y.r_squared, 1.0);
    }
}
