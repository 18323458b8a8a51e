//! Fixed-window moving statistics.
//!
//! Both transforms hold the last `window_size` samples and are warm only once
//! the window is full. Running aggregates are rebuilt from the held samples
//! after every `window_size` evictions.

use std::collections::VecDeque;

use super::OnlineTransform;

/// Mean over the last `window_size` samples.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window_size: usize,
    samples: VecDeque<f64>,
    /// Running sum of the samples in the window.
    sum: f64,
    evictions: usize,
    n: usize,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            samples: VecDeque::with_capacity(window_size),
            sum: 0.0,
            evictions: 0,
            n: 0,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Samples currently in the window, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl OnlineTransform for MovingAverage {
    fn update(&mut self, x: f64) {
        if self.samples.len() >= self.window_size {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
                self.evictions += 1;
            }
        }
        self.samples.push_back(x);
        self.sum += x;
        self.n += 1;

        if self.evictions >= self.window_size {
            self.sum = self.samples.iter().sum();
            self.evictions = 0;
        }
    }

    fn value(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum / self.samples.len() as f64)
        }
    }

    fn n_updates(&self) -> usize {
        self.n
    }

    fn required_n_warmup(&self) -> usize {
        self.window_size
    }

    fn is_warm(&self) -> bool {
        self.samples.len() == self.window_size
    }

    fn reset(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
        self.evictions = 0;
        self.n = 0;
    }
}

/// Sample standard deviation (ddof = 1) over the last `window_size` samples.
///
/// Mean and sum of squared deviations are maintained with Welford's update,
/// extended with the matching removal step once the window is full.
#[derive(Debug, Clone)]
pub struct MovingStd {
    window_size: usize,
    samples: VecDeque<f64>,
    mean: f64,
    m2: f64,
    evictions: usize,
    n: usize,
}

impl MovingStd {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            samples: VecDeque::with_capacity(window_size),
            mean: 0.0,
            m2: 0.0,
            evictions: 0,
            n: 0,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Samples currently in the window, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample variance, 0 with fewer than two samples.
    pub fn variance(&self) -> f64 {
        let count = self.samples.len();
        if count < 2 {
            return 0.0;
        }
        (self.m2 / (count - 1) as f64).max(0.0)
    }

    /// Two-pass mean and squared deviations over the held samples.
    fn resync(&mut self) {
        let count = self.samples.len() as f64;
        self.mean = self.samples.iter().sum::<f64>() / count;
        self.m2 = self.samples.iter().map(|x| (x - self.mean).powi(2)).sum();
        self.evictions = 0;
    }
}

impl OnlineTransform for MovingStd {
    fn update(&mut self, x: f64) {
        if self.samples.len() >= self.window_size {
            if let Some(old) = self.samples.pop_front() {
                self.samples.push_back(x);
                let old_mean = self.mean;
                self.mean += (x - old) / self.window_size as f64;
                self.m2 += (x - old) * ((x - self.mean) + (old - old_mean));
                self.evictions += 1;
            }
        } else {
            self.samples.push_back(x);
            let delta = x - self.mean;
            self.mean += delta / self.samples.len() as f64;
            self.m2 += delta * (x - self.mean);
        }
        self.n += 1;

        if self.evictions >= self.window_size {
            self.resync();
        }
    }

    fn value(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.variance().sqrt())
        }
    }

    fn n_updates(&self) -> usize {
        self.n
    }

    fn required_n_warmup(&self) -> usize {
        self.window_size
    }

    fn is_warm(&self) -> bool {
        self.samples.len() == self.window_size
    }

    fn reset(&mut self) {
        self.samples.clear();
        self.mean = 0.0;
        self.m2 = 0.0;
        self.evictions = 0;
        self.n = 0;
    }
}
