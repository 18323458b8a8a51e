//! Online (single-pass) statistical transforms.
//!
//! Every transform implements [`OnlineTransform`]: `update` mutates state in
//! O(1) time, and the warm accessors publish the estimate only after
//! `required_n_warmup` updates. [`Transform`] is the tagged union used by the
//! pipeline so per-tick dispatch is a plain `match`.

pub mod ema;
pub mod ewm;
pub mod windowed;
pub mod zscore;

pub use ema::ExponentialMovingAverage;
pub use ewm::ExponentialMovingStd;
pub use windowed::{MovingAverage, MovingStd};
pub use zscore::{DualHorizonZScore, EwmZScore};

use lob_core::{Reading, TransformKind};

/// Update / warm-value protocol shared by all incremental statistics.
pub trait OnlineTransform {
    /// Consume one sample.
    fn update(&mut self, x: f64);

    /// Current estimate regardless of warmup, `None` before any update.
    fn value(&self) -> Option<f64>;

    /// Number of samples consumed since construction or reset.
    fn n_updates(&self) -> usize;

    /// Samples required before the estimate is published.
    fn required_n_warmup(&self) -> usize;

    /// Drop all state, restarting warmup.
    fn reset(&mut self);

    fn is_warm(&self) -> bool {
        self.n_updates() >= self.required_n_warmup()
    }

    /// Estimate once warm, `None` otherwise.
    fn warm_value(&self) -> Option<f64> {
        if self.is_warm() {
            self.value()
        } else {
            None
        }
    }

    fn reading(&self) -> Reading {
        Reading::from_state(self.is_warm(), self.value())
    }
}

/// Tagged union of all transform variants.
#[derive(Debug, Clone)]
pub enum Transform {
    Ema(ExponentialMovingAverage),
    EwmStd(ExponentialMovingStd),
    EwmZScore(EwmZScore),
    DualZScore(DualHorizonZScore),
    MovingAverage(MovingAverage),
    MovingStd(MovingStd),
}

macro_rules! dispatch {
    ($self:expr, $t:ident => $body:expr) => {
        match $self {
            Transform::Ema($t) => $body,
            Transform::EwmStd($t) => $body,
            Transform::EwmZScore($t) => $body,
            Transform::DualZScore($t) => $body,
            Transform::MovingAverage($t) => $body,
            Transform::MovingStd($t) => $body,
        }
    };
}

impl Transform {
    /// Build a transform from its configured kind.
    pub fn from_kind(kind: &TransformKind) -> Self {
        match *kind {
            TransformKind::Ema {
                alpha,
                adjust,
                required_n_warmup,
            } => Transform::Ema(ExponentialMovingAverage::new(alpha, adjust, required_n_warmup)),
            TransformKind::EwmStd {
                alpha,
                adjust,
                required_n_warmup,
            } => Transform::EwmStd(ExponentialMovingStd::new(alpha, adjust, required_n_warmup)),
            TransformKind::EwmZscore {
                alpha,
                adjust,
                required_n_warmup,
            } => Transform::EwmZScore(EwmZScore::new(alpha, adjust, required_n_warmup)),
            TransformKind::DualZscore {
                alpha_short,
                alpha_long,
                adjust,
                required_n_warmup,
            } => Transform::DualZScore(DualHorizonZScore::new(
                alpha_short,
                alpha_long,
                adjust,
                required_n_warmup,
            )),
            TransformKind::MovingAverage { window_size } => {
                Transform::MovingAverage(MovingAverage::new(window_size))
            }
            TransformKind::MovingStd { window_size } => {
                Transform::MovingStd(MovingStd::new(window_size))
            }
        }
    }
}

impl OnlineTransform for Transform {
    fn update(&mut self, x: f64) {
        dispatch!(self, t => t.update(x))
    }

    fn value(&self) -> Option<f64> {
        dispatch!(self, t => t.value())
    }

    fn n_updates(&self) -> usize {
        dispatch!(self, t => t.n_updates())
    }

    fn required_n_warmup(&self) -> usize {
        dispatch!(self, t => t.required_n_warmup())
    }

    fn reset(&mut self) {
        dispatch!(self, t => t.reset())
    }

    fn is_warm(&self) -> bool {
        dispatch!(self, t => t.is_warm())
    }
}
