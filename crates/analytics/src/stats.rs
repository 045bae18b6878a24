//! Descriptive statistics over `f64` slices.
//!
//! Empty inputs return `None` rather than NaN so callers must decide what an
//! undefined statistic means for them.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance.
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile with linear interpolation between closest ranks, `q` in `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// `(Q1, Q3)` of the values.
pub fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    Some((quantile(values, 0.25)?, quantile(values, 0.75)?))
}

/// Period-over-period relative changes. Periods starting from zero are skipped.
pub fn returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0].abs())
        .collect()
}

/// Standard deviation divided by the absolute mean.
///
/// Falls back to the plain standard deviation when the mean is (numerically) zero.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let sd = sample_std_dev(values)?;
    let m = mean(values)?;
    if m.abs() < 1e-9 {
        Some(sd)
    } else {
        Some(sd / m.abs())
    }
}

/// Ordinary least squares fit of `values` against their index: returns `(intercept, slope)`.
pub fn linear_fit(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    Some((y_mean - slope * x_mean, slope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_between_ranks() {
        let v = [98.0, 99.0, 100.0, 100.5, 102.0, 103.0, 104.0];
        assert_eq!(quantile(&v, 0.25), Some(99.5));
        assert_eq!(quantile(&v, 0.75), Some(102.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn linear_fit_recovers_line() {
        let v: Vec<f64> = (0..10).map(|i| 5.0 + 2.0 * i as f64).collect();
        let (a, b) = linear_fit(&v).unwrap();
        assert!((a - 5.0).abs() < 1e-9);
        assert!((b - 2.0).abs() < 1e-9);
    }

    #[test]
    fn returns_skip_zero_bases() {
        let r = returns(&[0.0, 10.0, 11.0]);
        assert_eq!(r.len(), 1);
        assert!((r[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn coefficient_of_variation_handles_zero_mean() {
        let cv = coefficient_of_variation(&[-1.0, 1.0]).unwrap();
        assert!((cv - 2f64.sqrt()).abs() < 1e-12);
        assert!(coefficient_of_variation(&[1.0]).is_none());
    }
}
