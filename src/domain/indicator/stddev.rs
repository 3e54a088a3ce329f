//! Rolling mean and rolling sample standard deviation.
//!
//! Both need a full window: the first (window - 1) entries are undefined.

/// Simple moving average over `window` values.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        out.push(if i + 1 >= window {
            Some(sum / window as f64)
        } else {
            None
        });
    }
    out
}

/// Sample (n - 1) standard deviation over `window` values.
pub fn rolling_stddev(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance = slice
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (window - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_warmup() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn mean_window_one_is_identity() {
        assert_eq!(rolling_mean(&[5.0, 6.0], 1), vec![Some(5.0), Some(6.0)]);
    }

    #[test]
    fn mean_zero_window() {
        assert_eq!(rolling_mean(&[5.0, 6.0], 0), vec![None, None]);
    }

    #[test]
    fn stddev_is_sample() {
        // 2, 4, 4, 4, 5, 5, 7, 9: sample variance 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_stddev(&values, 8);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((out[7].unwrap() - expected).abs() < 1e-12);
        assert!(out[6].is_none());
    }

    #[test]
    fn stddev_constant_is_zero() {
        let out = rolling_stddev(&[3.0; 5], 3);
        assert_eq!(out[4], Some(0.0));
    }

    #[test]
    fn stddev_window_one_undefined() {
        assert_eq!(rolling_stddev(&[1.0, 2.0], 1), vec![None, None]);
    }
}
