//! Exponentially weighted variance and standard deviation.
//!
//! Keeps four exponentially decayed sums: samples `s`, squared samples `s2`,
//! weights `W` and squared weights `W2`. With `adjust` enabled the biased
//! variance is scaled by `W^2 / (W^2 - W2)`, the usual correction for
//! reliability weights.

use super::OnlineTransform;

#[derive(Debug, Clone)]
pub struct ExponentialMovingStd {
    alpha: f64,
    adjust: bool,
    s: f64,
    s2: f64,
    w: f64,
    w2: f64,
    n: usize,
    required_n_warmup: usize,
}

impl ExponentialMovingStd {
    pub fn new(alpha: f64, adjust: bool, required_n_warmup: usize) -> Self {
        Self {
            alpha,
            adjust,
            s: 0.0,
            s2: 0.0,
            w: 0.0,
            w2: 0.0,
            n: 0,
            required_n_warmup,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Weighted mean, NaN before the first update.
    pub fn mean(&self) -> f64 {
        if self.w == 0.0 {
            return f64::NAN;
        }
        self.s / self.w
    }

    /// Weighted variance floored at zero, NaN before the first update.
    pub fn variance(&self) -> f64 {
        if self.w == 0.0 {
            return f64::NAN;
        }
        let mean = self.s / self.w;
        let mut variance = self.s2 / self.w - mean * mean;

        if self.adjust {
            let w_sq = self.w * self.w;
            let denom = w_sq - self.w2;
            if denom != 0.0 {
                variance *= w_sq / denom;
            }
        }

        variance.max(0.0)
    }

    /// Weighted standard deviation, NaN before the first update.
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl OnlineTransform for ExponentialMovingStd {
    fn update(&mut self, x: f64) {
        let alpha = self.alpha;
        let decay = 1.0 - alpha;

        if self.n == 0 {
            self.s = alpha * x;
            self.s2 = alpha * x * x;
            self.w = alpha;
            self.w2 = alpha * alpha;
        } else {
            self.s = alpha * x + decay * self.s;
            self.s2 = alpha * x * x + decay * self.s2;
            self.w = alpha + decay * self.w;
            self.w2 = alpha * alpha + decay * decay * self.w2;
        }
        self.n += 1;
    }

    fn value(&self) -> Option<f64> {
        if self.n == 0 {
            None
        } else {
            Some(self.std())
        }
    }

    fn n_updates(&self) -> usize {
        self.n
    }

    fn required_n_warmup(&self) -> usize {
        self.required_n_warmup
    }

    fn reset(&mut self) {
        self.s = 0.0;
        self.s2 = 0.0;
        self.w = 0.0;
        self.w2 = 0.0;
        self.n = 0;
    }
}
