//! Fixed-depth order book snapshot.
//!
//! Holds the normalized top-N levels of one symbol on one venue plus the
//! top-of-book scalars recomputed on every update. Missing inputs surface as
//! NaN in the derived scalars rather than as errors.

use lob_core::{
    BookConfig, BookFeature, Error, Level, NormalizedBook, Result, SequenceCheck, Side,
    TimestampSecs, Venue,
};
use lob_ingestion::normalizer_for;
use serde_json::Value;
use tracing::{debug, warn};

pub(crate) const BPS: f64 = 10_000.0;

/// What a single update observed besides the new book state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Bid levels zero-filled because the snapshot was shallower than the book.
    pub missing_bid_levels: usize,
    /// Ask levels zero-filled because the snapshot was shallower than the book.
    pub missing_ask_levels: usize,
    /// Sequence number check result.
    pub sequence: SequenceCheck,
}

impl UpdateOutcome {
    /// Whether both sides filled every configured level.
    pub fn is_full_depth(&self) -> bool {
        self.missing_bid_levels == 0 && self.missing_ask_levels == 0
    }
}

/// Normalized book state for one (symbol, venue).
#[derive(Debug, Clone)]
pub struct OrderBookSnapshot {
    symbol: String,
    venue: Venue,
    config: BookConfig,

    pub(crate) bid_prices: Vec<f64>,
    pub(crate) bid_quantity: Vec<f64>,
    pub(crate) ask_prices: Vec<f64>,
    pub(crate) ask_quantity: Vec<f64>,

    mid: f64,
    tob_spread_absolute: f64,
    tob_spread_bps: f64,
    total_bid_size: f64,
    total_ask_size: f64,
    bid_price: f64,
    ask_price: f64,

    exchange_timestamp: TimestampSecs,
    receipt_timestamp: TimestampSecs,
    sequence_number: Option<i64>,
    last_sequence_number: Option<i64>,

    update_count: u64,
    sequence_anomalies: u64,
}

impl OrderBookSnapshot {
    /// Create an empty book; every derived scalar starts as NaN.
    pub fn new(symbol: impl Into<String>, venue: Venue, config: BookConfig) -> Result<Self> {
        config.validate()?;
        let n = config.n_levels;

        Ok(Self {
            symbol: symbol.into(),
            venue,
            config,
            bid_prices: vec![0.0; n],
            bid_quantity: vec![0.0; n],
            ask_prices: vec![0.0; n],
            ask_quantity: vec![0.0; n],
            mid: f64::NAN,
            tob_spread_absolute: f64::NAN,
            tob_spread_bps: f64::NAN,
            total_bid_size: f64::NAN,
            total_ask_size: f64::NAN,
            bid_price: f64::NAN,
            ask_price: f64::NAN,
            exchange_timestamp: f64::NAN,
            receipt_timestamp: f64::NAN,
            sequence_number: None,
            last_sequence_number: None,
            update_count: 0,
            sequence_anomalies: 0,
        })
    }

    /// Normalize a raw venue snapshot and recompute the book.
    ///
    /// A malformed snapshot returns an error and leaves the book untouched.
    pub fn update(&mut self, raw: &Value) -> Result<UpdateOutcome> {
        let book = normalizer_for(self.venue).normalize(raw, &self.config)?;
        Ok(self.apply(&book))
    }

    /// Replace the book with an already normalized snapshot.
    pub fn apply(&mut self, book: &NormalizedBook) -> UpdateOutcome {
        let n = self.config.n_levels;
        let missing_bid_levels = fill_side(&mut self.bid_prices, &mut self.bid_quantity, &book.bids);
        let missing_ask_levels = fill_side(&mut self.ask_prices, &mut self.ask_quantity, &book.asks);
        if missing_bid_levels > 0 || missing_ask_levels > 0 {
            debug!(
                symbol = %self.symbol,
                n_levels = n,
                missing_bid_levels,
                missing_ask_levels,
                "Snapshot shallower than book depth, zero-filled"
            );
        }

        self.exchange_timestamp = book.exchange_timestamp;
        self.receipt_timestamp = book.receipt_timestamp;
        let sequence = self.check_sequence(book.sequence_number);

        self.recompute();
        self.update_count += 1;

        UpdateOutcome {
            missing_bid_levels,
            missing_ask_levels,
            sequence,
        }
    }

    fn check_sequence(&mut self, received: Option<i64>) -> SequenceCheck {
        if !self.config.tracks_sequence() {
            return SequenceCheck::Disabled;
        }

        let check = match received {
            Some(seq) => {
                let check = SequenceCheck::classify(self.last_sequence_number, seq);
                self.sequence_number = Some(seq);
                self.last_sequence_number = Some(seq);
                check
            }
            None => SequenceCheck::Missing,
        };

        match check {
            SequenceCheck::Regression { last, received } => warn!(
                symbol = %self.symbol,
                last,
                received,
                "Sequence number regression"
            ),
            SequenceCheck::Gap { last, received } => debug!(
                symbol = %self.symbol,
                last,
                received,
                "Sequence number gap"
            ),
            SequenceCheck::Missing => debug!(
                symbol = %self.symbol,
                "Snapshot missing sequence number"
            ),
            _ => {}
        }
        if check.is_anomaly() {
            self.sequence_anomalies += 1;
        }
        check
    }

    fn recompute(&mut self) {
        self.total_bid_size = self.bid_quantity.iter().sum();
        self.total_ask_size = self.ask_quantity.iter().sum();
        self.bid_price = present_price(self.bid_prices[0]);
        self.ask_price = present_price(self.ask_prices[0]);

        self.mid = if self.bid_price.is_nan() || self.ask_price.is_nan() {
            f64::NAN
        } else {
            0.5 * (self.bid_price + self.ask_price)
        };

        self.tob_spread_absolute = if self.bid_prices[0] != 0.0 && self.ask_prices[0] != 0.0 {
            self.ask_prices[0] - self.bid_prices[0]
        } else {
            f64::NAN
        };

        self.tob_spread_bps = if self.mid.is_nan() {
            f64::NAN
        } else {
            self.tob_spread_absolute / self.mid * BPS
        };
    }

    /// Look up a scalar feature by name.
    pub fn feature(&self, feature: BookFeature) -> f64 {
        match feature {
            BookFeature::Mid => self.mid,
            BookFeature::TobSpreadAbsolute => self.tob_spread_absolute,
            BookFeature::TobSpreadBps => self.tob_spread_bps,
            BookFeature::TotalBidSize => self.total_bid_size,
            BookFeature::TotalAskSize => self.total_ask_size,
            BookFeature::BidPrice => self.bid_price,
            BookFeature::AskPrice => self.ask_price,
            BookFeature::TobWeightedMid => self.top_of_book_weighted_mid(),
            BookFeature::BookWeightedMid => self.book_weighted_mid(),
        }
    }

    /// Price at a level, best level being 0.
    pub fn price_at_level(&self, level: usize, side: Side) -> Result<f64> {
        let (prices, _) = self.side(side);
        prices.get(level).copied().ok_or(Error::LevelOutOfRange {
            level,
            n_levels: self.config.n_levels,
        })
    }

    /// Quantity at a level, best level being 0.
    pub fn quantity_at_level(&self, level: usize, side: Side) -> Result<f64> {
        let (_, quantities) = self.side(side);
        quantities.get(level).copied().ok_or(Error::LevelOutOfRange {
            level,
            n_levels: self.config.n_levels,
        })
    }

    pub(crate) fn side(&self, side: Side) -> (&[f64], &[f64]) {
        match side {
            Side::Bid => (&self.bid_prices, &self.bid_quantity),
            Side::Ask => (&self.ask_prices, &self.ask_quantity),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn venue(&self) -> Venue {
        self.venue
    }

    pub fn n_levels(&self) -> usize {
        self.config.n_levels
    }

    pub fn bid_prices(&self) -> &[f64] {
        &self.bid_prices
    }

    pub fn bid_quantity(&self) -> &[f64] {
        &self.bid_quantity
    }

    pub fn ask_prices(&self) -> &[f64] {
        &self.ask_prices
    }

    pub fn ask_quantity(&self) -> &[f64] {
        &self.ask_quantity
    }

    pub fn mid(&self) -> f64 {
        self.mid
    }

    pub fn tob_spread_absolute(&self) -> f64 {
        self.tob_spread_absolute
    }

    pub fn tob_spread_bps(&self) -> f64 {
        self.tob_spread_bps
    }

    pub fn total_bid_size(&self) -> f64 {
        self.total_bid_size
    }

    pub fn total_ask_size(&self) -> f64 {
        self.total_ask_size
    }

    /// Best bid, NaN when absent.
    pub fn bid_price(&self) -> f64 {
        self.bid_price
    }

    /// Best ask, NaN when absent.
    pub fn ask_price(&self) -> f64 {
        self.ask_price
    }

    pub fn exchange_timestamp(&self) -> TimestampSecs {
        self.exchange_timestamp
    }

    pub fn receipt_timestamp(&self) -> TimestampSecs {
        self.receipt_timestamp
    }

    pub fn sequence_number(&self) -> Option<i64> {
        self.sequence_number
    }

    pub fn last_sequence_number(&self) -> Option<i64> {
        self.last_sequence_number
    }

    /// Snapshots applied so far.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Gaps, regressions and missing sequence numbers seen so far.
    pub fn sequence_anomalies(&self) -> u64 {
        self.sequence_anomalies
    }
}

/// Copy up to `prices.len()` levels, zero-filling the rest.
/// Returns the number of zero-filled levels.
fn fill_side(prices: &mut [f64], quantities: &mut [f64], levels: &[Level]) -> usize {
    let empty = Level::new(0.0, 0.0);
    for (i, (price, quantity)) in prices.iter_mut().zip(quantities.iter_mut()).enumerate() {
        let level = levels.get(i).copied().unwrap_or(empty);
        *price = level.price;
        *quantity = level.quantity;
    }
    prices.len().saturating_sub(levels.len())
}

/// A zero price marks an absent level.
#[inline]
fn present_price(price: f64) -> f64 {
    if price == 0.0 {
        f64::NAN
    } else {
        price
    }
}
