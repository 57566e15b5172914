//! Incremental statistics shared by the controller and the driver.

/// Folds `x` into a running mean over `n` previous samples.
///
/// Computed as `(n * avg + x) / (n + 1)` rather than from a running sum so
/// that long runs accumulate rounding the same way on every platform.
pub fn online_avg(x: f64, n: u64, avg: f64) -> f64 {
    (n as f64 * avg + x) / (n + 1) as f64
}

/// Arithmetic mean of `xs`; NaN when empty.
pub fn mean(xs: &[f64]) -> f64 {
    let sum: f64 = xs.iter().sum();
    sum / xs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_avg_first_sample_is_the_sample() {
        assert_eq!(online_avg(4.0, 0, 123.0), 4.0);
    }

    #[test]
    fn online_avg_tracks_running_mean() {
        let mut avg = 0.0;
        for (n, x) in [2.0, 4.0, 6.0, 8.0].into_iter().enumerate() {
            avg = online_avg(x, n as u64, avg);
        }
        assert_eq!(avg, 5.0);
    }

    #[test]
    fn mean_of_empty_is_nan() {
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), 3.0);
    }
}
