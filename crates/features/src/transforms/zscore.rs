//! Z-scores built from exponential sub-transforms.
//!
//! Both variants publish exactly `0.0` when the scaling std is undefined or
//! zero, never NaN or infinity.

use super::{ExponentialMovingAverage, ExponentialMovingStd, OnlineTransform};

#[inline]
fn scaled(deviation: f64, std: f64) -> f64 {
    if std.is_nan() || std == 0.0 {
        0.0
    } else {
        deviation / std
    }
}

/// `(x - ema) / std` with EMA and std on the same alpha.
///
/// Sub-transforms are updated before the score is computed, so the current
/// sample contributes to its own mean and std.
#[derive(Debug, Clone)]
pub struct EwmZScore {
    ema: ExponentialMovingAverage,
    std: ExponentialMovingStd,
    value: Option<f64>,
    n: usize,
    required_n_warmup: usize,
}

impl EwmZScore {
    pub fn new(alpha: f64, adjust: bool, required_n_warmup: usize) -> Self {
        Self {
            ema: ExponentialMovingAverage::new(alpha, adjust, 0),
            std: ExponentialMovingStd::new(alpha, adjust, 0),
            value: None,
            n: 0,
            required_n_warmup,
        }
    }

    pub fn ema(&self) -> &ExponentialMovingAverage {
        &self.ema
    }

    pub fn std(&self) -> &ExponentialMovingStd {
        &self.std
    }
}

impl OnlineTransform for EwmZScore {
    fn update(&mut self, x: f64) {
        self.ema.update(x);
        self.std.update(x);

        let mean = self.ema.value().unwrap_or(x);
        self.value = Some(scaled(x - mean, self.std.std()));
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
        self.ema.reset();
        self.std.reset();
        self.value = None;
        self.n = 0;
    }
}

/// `(ema_short - ema_long) / std_long` over two horizons.
#[derive(Debug, Clone)]
pub struct DualHorizonZScore {
    short_ema: ExponentialMovingAverage,
    long_ema: ExponentialMovingAverage,
    long_std: ExponentialMovingStd,
    value: Option<f64>,
    n: usize,
    required_n_warmup: usize,
}

impl DualHorizonZScore {
    pub fn new(alpha_short: f64, alpha_long: f64, adjust: bool, required_n_warmup: usize) -> Self {
        Self {
            short_ema: ExponentialMovingAverage::new(alpha_short, adjust, 0),
            long_ema: ExponentialMovingAverage::new(alpha_long, adjust, 0),
            long_std: ExponentialMovingStd::new(alpha_long, adjust, 0),
            value: None,
            n: 0,
            required_n_warmup,
        }
    }

    pub fn short_ema(&self) -> &ExponentialMovingAverage {
        &self.short_ema
    }

    pub fn long_ema(&self) -> &ExponentialMovingAverage {
        &self.long_ema
    }

    pub fn long_std(&self) -> &ExponentialMovingStd {
        &self.long_std
    }
}

impl OnlineTransform for DualHorizonZScore {
    fn update(&mut self, x: f64) {
        self.short_ema.update(x);
        self.long_ema.update(x);
        self.long_std.update(x);

        let short = self.short_ema.value().unwrap_or(x);
        let long = self.long_ema.value().unwrap_or(x);
        self.value = Some(scaled(short - long, self.long_std.std()));
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
        self.short_ema.reset();
        self.long_ema.reset();
        self.long_std.reset();
        self.value = None;
        self.n = 0;
    }
}
