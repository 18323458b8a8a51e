//! Exponential moving average.
//!
//! Two recurrences share one type:
//! - unadjusted: the first sample seeds the value, then
//!   `value = alpha * x + (1 - alpha) * value`
//! - bias-adjusted: a running weight denominator corrects the
//!   under-weighting of early samples, so the first update returns `x`.

use super::OnlineTransform;

#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    alpha: f64,
    adjust: bool,
    /// Weighted sum of samples (adjusted mode).
    numerator: f64,
    /// Sum of weights (adjusted mode); tends to 1.
    denominator: f64,
    value: Option<f64>,
    n: usize,
    required_n_warmup: usize,
}

impl ExponentialMovingAverage {
    pub fn new(alpha: f64, adjust: bool, required_n_warmup: usize) -> Self {
        Self {
            alpha,
            adjust,
            numerator: 0.0,
            denominator: 0.0,
            value: None,
            n: 0,
            required_n_warmup,
        }
    }

    /// Unadjusted EMA, live from the first sample.
    pub fn unadjusted(alpha: f64) -> Self {
        Self::new(alpha, false, 0)
    }

    /// Bias-adjusted EMA, live from the first sample.
    pub fn adjusted(alpha: f64) -> Self {
        Self::new(alpha, true, 0)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_adjusted(&self) -> bool {
        self.adjust
    }

    /// Current weight denominator (adjusted mode only, 0 otherwise).
    pub fn denominator(&self) -> f64 {
        self.denominator
    }
}

impl OnlineTransform for ExponentialMovingAverage {
    fn update(&mut self, x: f64) {
        let decay = 1.0 - self.alpha;
        if self.adjust {
            self.numerator = self.alpha * x + decay * self.numerator;
            self.denominator = self.alpha + decay * self.denominator;
            self.value = Some(self.numerator / self.denominator);
        } else {
            self.value = Some(match self.value {
                Some(prev) => self.alpha * x + decay * prev,
                None => x,
            });
        }
        self.n += 1;
    }

    fn value(&self) -> Option<f64> {
        self.value
    }

    fn n_updates(&self) -> usize {
        self.n
    }

    fn required_n_warmup(&self) -> usize {
        self.required_n_warmup
    }

    fn reset(&mut self) {
        self.numerator = 0.0;
        self.denominator = 0.0;
        self.value = None;
        self.n = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unadjusted_sequence() {
        let mut ema = ExponentialMovingAverage::unadjusted(0.5);
        let mut values = Vec::new();
        for x in [10.0, 12.0, 8.0] {
            ema.update(x);
            values.push(ema.value().unwrap());
        }
        assert_eq!(values, vec![10.0, 11.0, 9.5]);
    }

    #[test]
    fn test_no_value_before_first_update() {
        let ema = ExponentialMovingAverage::unadjusted(0.5);
        assert!(ema.value().is_none());
        assert_eq!(ema.n_updates(), 0);
    }

    #[test]
    fn test_adjusted_first_update_is_sample() {
        let mut ema = ExponentialMovingAverage::adjusted(0.5);
        ema.update(42.0);
        assert_eq!(ema.value(), Some(42.0));
        assert_eq!(ema.denominator(), 0.5);
    }

    #[test]
    fn test_adjusted_matches_weighted_mean() {
        // Weights (1-a)^(k-i): for a = 0.5 and [1, 2, 3] -> 0.25, 0.5, 1
        let mut ema = ExponentialMovingAverage::adjusted(0.5);
        for x in [1.0, 2.0, 3.0] {
            ema.update(x);
        }
        let expected = (0.25 * 1.0 + 0.5 * 2.0 + 1.0 * 3.0) / 1.75;
        assert_relative_eq!(ema.value().unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_adjusted_denominator_tends_to_one() {
        let mut ema = ExponentialMovingAverage::adjusted(0.1);
        for _ in 0..500 {
            ema.update(1.0);
        }
        assert_relative_eq!(ema.denominator(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_stream_converges() {
        let alpha = 0.2;
        let tolerance: f64 = 1e-6;
        let mut ema = ExponentialMovingAverage::unadjusted(alpha);
        ema.update(0.0);

        // |value - x| = x * (1 - a)^k after k further updates of x
        let needed = (tolerance / 100.0).ln() / (1.0 - alpha).ln();
        for _ in 0..needed.ceil() as usize {
            ema.update(100.0);
        }
        assert!((ema.value().unwrap() - 100.0).abs() <= tolerance);
    }

    #[test]
    fn test_warm_gate() {
        let mut ema = ExponentialMovingAverage::new(0.5, false, 3);
        ema.update(1.0);
        ema.update(1.0);
        assert!(!ema.is_warm());
        assert!(ema.warm_value().is_none());
        ema.update(1.0);
        assert!(ema.is_warm());
        assert_eq!(ema.warm_value(), Some(1.0));
    }

    #[test]
    fn test_reset() {
        let mut ema = ExponentialMovingAverage::adjusted(0.3);
        ema.update(5.0);
        ema.reset();
        assert!(ema.value().is_none());
        assert_eq!(ema.n_updates(), 0);
        ema.update(7.0);
        assert_relative_eq!(ema.value().unwrap(), 7.0, epsilon = 1e-12);
    }
}
