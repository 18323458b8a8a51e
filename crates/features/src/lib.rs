//! Order book features and online transforms.
//!
//! This crate handles:
//! - Fixed-depth book snapshots built from normalized venue data
//! - Book-derived metrics (mid, spreads, VWAP, weighted mids)
//! - Streaming transforms (EMA, EWM std, z-scores, windowed stats)
//! - The per-symbol pipeline tying them together

pub mod calculator;
pub mod order_book;
pub mod pipeline;
pub mod transforms;

pub use order_book::{OrderBookSnapshot, UpdateOutcome};
pub use pipeline::{
    BookFeatures, FeaturePipeline, FeatureReport, NamedTransform, SymbolState, TransformReading,
    VwapReading,
};
pub use transforms::{
    DualHorizonZScore, EwmZScore, ExponentialMovingAverage, ExponentialMovingStd, MovingAverage,
    MovingStd, OnlineTransform, Transform,
};
