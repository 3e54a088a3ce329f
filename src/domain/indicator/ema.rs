//! Exponential moving average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k). The first (n-1) entries are undefined.

pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if i + 1 < period {
            sum += v;
            out.push(None);
        } else if i + 1 == period {
            sum += v;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = v * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let out = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(out[0].is_none());
        assert!(out[1].is_none());
        assert!(out[2].is_some());
    }

    #[test]
    fn ema_seed_is_sma() {
        let out = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert!((out[2].unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_step() {
        let out = calculate_ema(&[10.0, 20.0, 30.0, 40.0], 3);
        // k = 0.5: 40*0.5 + 20*0.5
        assert!((out[3].unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_period_one_tracks_input() {
        let out = calculate_ema(&[4.0, 7.0], 1);
        assert_eq!(out, vec![Some(4.0), Some(7.0)]);
    }

    #[test]
    fn ema_period_zero() {
        assert_eq!(calculate_ema(&[1.0], 0), vec![None]);
    }
}
