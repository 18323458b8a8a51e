//! Core data types for the order-book feature system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in seconds since Unix epoch, as delivered by the feed.
pub type TimestampSecs = f64;

/// Size/quantity type.
pub type Size = f64;

/// Book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Whether `price` is strictly better than `reference` on this side.
    #[inline]
    pub fn is_better(self, price: f64, reference: f64) -> bool {
        match self {
            Side::Bid => price > reference,
            Side::Ask => price < reference,
        }
    }
}

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Level price.
    pub price: f64,
    /// Resting quantity at the price.
    pub quantity: Size,
}

impl Level {
    pub fn new(price: f64, quantity: Size) -> Self {
        Self { price, quantity }
    }
}

/// Venue-agnostic book produced by a venue normalizer.
///
/// Levels are ordered best first and may hold more or fewer entries than the
/// configured depth; the order book truncates or zero-fills.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedBook {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub exchange_timestamp: TimestampSecs,
    pub receipt_timestamp: TimestampSecs,
    pub sequence_number: Option<i64>,
}

/// Supported venues. Each one has its own raw snapshot shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    /// Gate.io: price-keyed maps under `book.bid` / `book.ask`.
    #[serde(rename = "gateio")]
    GateIo,
    /// Binance partial depth: `b` / `a` arrays, event time `E` in ms.
    Binance,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::GateIo => write!(f, "gateio"),
            Venue::Binance => write!(f, "binance"),
        }
    }
}

/// Optional extraction paths enabled per book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalFeature {
    SequenceNumber,
}

/// Scalar book features a transform can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookFeature {
    Mid,
    TobSpreadAbsolute,
    TobSpreadBps,
    TotalBidSize,
    TotalAskSize,
    BidPrice,
    AskPrice,
    TobWeightedMid,
    BookWeightedMid,
}

impl BookFeature {
    pub const ALL: [BookFeature; 9] = [
        BookFeature::Mid,
        BookFeature::TobSpreadAbsolute,
        BookFeature::TobSpreadBps,
        BookFeature::TotalBidSize,
        BookFeature::TotalAskSize,
        BookFeature::BidPrice,
        BookFeature::AskPrice,
        BookFeature::TobWeightedMid,
        BookFeature::BookWeightedMid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookFeature::Mid => "mid",
            BookFeature::TobSpreadAbsolute => "tob_spread_absolute",
            BookFeature::TobSpreadBps => "tob_spread_bps",
            BookFeature::TotalBidSize => "total_bid_size",
            BookFeature::TotalAskSize => "total_ask_size",
            BookFeature::BidPrice => "bid_price",
            BookFeature::AskPrice => "ask_price",
            BookFeature::TobWeightedMid => "tob_weighted_mid",
            BookFeature::BookWeightedMid => "book_weighted_mid",
        }
    }
}

impl fmt::Display for BookFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published transform reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading {
    /// Warm, finite estimate.
    Value(f64),
    /// Fewer than `required_n_warmup` updates so far.
    NotWarm,
    /// Warm but no defined estimate (e.g. never updated).
    Undefined,
}

impl Reading {
    /// Build a reading from warm status and the raw estimate.
    pub fn from_state(is_warm: bool, value: Option<f64>) -> Self {
        if !is_warm {
            return Reading::NotWarm;
        }
        match value {
            Some(v) if !v.is_nan() => Reading::Value(v),
            _ => Reading::Undefined,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Outcome of the per-symbol sequence number check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceCheck {
    /// Sequence tracking not enabled for this book.
    Disabled,
    /// First sequence number seen.
    First { received: i64 },
    /// Exactly one past the previous number.
    InOrder { received: i64 },
    /// Increasing, but numbers were skipped.
    Gap { last: i64, received: i64 },
    /// Equal to or below the previous number.
    Regression { last: i64, received: i64 },
    /// Tracking enabled but the snapshot carried no usable sequence number.
    Missing,
}

impl SequenceCheck {
    /// Classify `received` against the previous number.
    pub fn classify(last: Option<i64>, received: i64) -> Self {
        match last {
            None => SequenceCheck::First { received },
            Some(last) if received <= last => SequenceCheck::Regression { last, received },
            Some(last) if received == last + 1 => SequenceCheck::InOrder { received },
            Some(last) => SequenceCheck::Gap { last, received },
        }
    }

    pub fn is_regression(self) -> bool {
        matches!(self, SequenceCheck::Regression { .. })
    }

    pub fn is_anomaly(self) -> bool {
        matches!(
            self,
            SequenceCheck::Gap { .. } | SequenceCheck::Regression { .. } | SequenceCheck::Missing
        )
    }
}
