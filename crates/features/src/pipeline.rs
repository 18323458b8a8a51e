//! Per-symbol feature pipeline.
//!
//! Owns one [`OrderBookSnapshot`] and one set of configured transforms per
//! subscribed symbol. Each snapshot is applied to the book, then every
//! transform consumes its input feature, then a [`FeatureReport`] is built.
//! Symbols share no state.

use std::collections::HashMap;

use lob_core::{
    BookFeature, Error, PipelineConfig, Reading, Result, SequenceCheck, SequencePolicy, Side,
    TimestampSecs, TransformConfig, Venue,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::order_book::{OrderBookSnapshot, UpdateOutcome};
use crate::transforms::{OnlineTransform, Transform};

/// A transform bound to its input feature and published name.
#[derive(Debug, Clone)]
pub struct NamedTransform {
    name: String,
    input: BookFeature,
    transform: Transform,
}

impl NamedTransform {
    pub fn from_config(config: &TransformConfig) -> Self {
        Self {
            name: config.name(),
            input: config.input_feature,
            transform: Transform::from_kind(&config.kind),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> BookFeature {
        self.input
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn reading(&self) -> TransformReading {
        TransformReading {
            name: self.name.clone(),
            reading: self.transform.reading(),
            n_updates: self.transform.n_updates(),
        }
    }
}

/// State held for one subscribed symbol.
#[derive(Debug, Clone)]
pub struct SymbolState {
    book: OrderBookSnapshot,
    transforms: Vec<NamedTransform>,
    /// Transform inputs dropped because they were NaN or infinite.
    skipped_inputs: u64,
}

impl SymbolState {
    fn new(symbol: &str, config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            book: OrderBookSnapshot::new(symbol, config.venue, config.book.clone())?,
            transforms: config.transforms.iter().map(NamedTransform::from_config).collect(),
            skipped_inputs: 0,
        })
    }

    pub fn book(&self) -> &OrderBookSnapshot {
        &self.book
    }

    pub fn transforms(&self) -> &[NamedTransform] {
        &self.transforms
    }

    pub fn transform(&self, name: &str) -> Option<&NamedTransform> {
        self.transforms.iter().find(|t| t.name == name)
    }

    pub fn skipped_inputs(&self) -> u64 {
        self.skipped_inputs
    }

    fn reset_transforms(&mut self) {
        for named in &mut self.transforms {
            named.transform.reset();
        }
    }

    fn feed_transforms(&mut self) {
        let symbol = self.book.symbol();
        for named in &mut self.transforms {
            let x = self.book.feature(named.input);
            if !x.is_finite() {
                self.skipped_inputs += 1;
                debug!(
                    symbol,
                    transform = %named.name,
                    input = %named.input,
                    "Skipping non-finite transform input"
                );
                continue;
            }

            let was_warm = named.transform.is_warm();
            named.transform.update(x);
            if !was_warm && named.transform.is_warm() {
                debug!(
                    symbol,
                    transform = %named.name,
                    n = named.transform.n_updates(),
                    "Transform warmup complete"
                );
            }
        }
    }
}

/// Scalar book features at the time of a report.
#[derive(Debug, Clone, Serialize)]
pub struct BookFeatures {
    pub mid: f64,
    pub tob_spread_absolute: f64,
    pub tob_spread_bps: f64,
    pub total_bid_size: f64,
    pub total_ask_size: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub tob_weighted_mid: f64,
    pub book_weighted_mid: f64,
}

impl BookFeatures {
    pub fn from_book(book: &OrderBookSnapshot) -> Self {
        Self {
            mid: book.mid(),
            tob_spread_absolute: book.tob_spread_absolute(),
            tob_spread_bps: book.tob_spread_bps(),
            total_bid_size: book.total_bid_size(),
            total_ask_size: book.total_ask_size(),
            bid_price: book.bid_price(),
            ask_price: book.ask_price(),
            tob_weighted_mid: book.top_of_book_weighted_mid(),
            book_weighted_mid: book.book_weighted_mid(),
        }
    }
}

/// VWAP readings at one target size.
#[derive(Debug, Clone, Serialize)]
pub struct VwapReading {
    pub size: f64,
    /// Whether a book too thin to fill `size` yields NaN.
    pub executable: bool,
    pub bid: f64,
    pub ask: f64,
    /// `ask - bid` under the same `executable` rule.
    pub spread: f64,
    pub spread_bps: f64,
}

/// One transform's published value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformReading {
    pub name: String,
    #[serde(flatten)]
    pub reading: Reading,
    pub n_updates: usize,
}

/// Read-only view of a symbol after an update. NaN fields serialize as null.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub symbol: String,
    pub venue: Venue,
    pub exchange_timestamp: TimestampSecs,
    pub receipt_timestamp: TimestampSecs,
    pub sequence: SequenceCheck,
    pub missing_bid_levels: usize,
    pub missing_ask_levels: usize,
    pub book: BookFeatures,
    pub vwap: Vec<VwapReading>,
    pub transforms: Vec<TransformReading>,
}

impl FeatureReport {
    /// Reading of the named transform, if configured.
    pub fn transform(&self, name: &str) -> Option<Reading> {
        self.transforms.iter().find(|t| t.name == name).map(|t| t.reading)
    }
}

/// Registry of per-symbol books and transforms.
pub struct FeaturePipeline {
    config: PipelineConfig,
    symbols: HashMap<String, SymbolState>,
}

impl FeaturePipeline {
    /// Create a pipeline after validating its configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            symbols: HashMap::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start tracking a symbol. Returns false if it was already tracked.
    pub fn subscribe(&mut self, symbol: &str) -> Result<bool> {
        if self.symbols.contains_key(symbol) {
            return Ok(false);
        }
        let state = SymbolState::new(symbol, &self.config)?;
        self.symbols.insert(symbol.to_string(), state);
        info!(
            symbol,
            venue = %self.config.venue,
            transforms = self.config.transforms.len(),
            "Subscribed symbol"
        );
        Ok(true)
    }

    /// Stop tracking a symbol and drop its state.
    pub fn unsubscribe(&mut self, symbol: &str) -> bool {
        let removed = self.symbols.remove(symbol).is_some();
        if removed {
            info!(symbol, "Unsubscribed symbol");
        }
        removed
    }

    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn state(&self, symbol: &str) -> Option<&SymbolState> {
        self.symbols.get(symbol)
    }

    pub fn book(&self, symbol: &str) -> Option<&OrderBookSnapshot> {
        self.symbols.get(symbol).map(|s| &s.book)
    }

    /// Apply one raw snapshot for `symbol` and report the updated features.
    ///
    /// A malformed snapshot is returned as an error and changes nothing.
    pub fn on_snapshot(&mut self, symbol: &str, raw: &Value) -> Result<FeatureReport> {
        let policy = self.config.sequence_policy;
        let state = self
            .symbols
            .get_mut(symbol)
            .ok_or_else(|| Error::unknown_symbol(symbol))?;

        let outcome = state.book.update(raw)?;

        if outcome.sequence.is_regression() && policy == SequencePolicy::ResetTransforms {
            warn!(symbol, "Resetting transforms after sequence regression");
            state.reset_transforms();
        }

        state.feed_transforms();
        Ok(self.build_report(symbol, outcome))
    }

    fn build_report(&self, symbol: &str, outcome: UpdateOutcome) -> FeatureReport {
        let state = &self.symbols[symbol];
        let book = &state.book;
        let executable = self.config.output.executable_vwap;

        let vwap = self
            .config
            .output
            .vwap_sizes
            .iter()
            .map(|&size| {
                let spread = book.volume_weighted_spread_with(size, executable);
                VwapReading {
                    size,
                    executable,
                    bid: book.volume_weighted_price(Side::Bid, size, executable),
                    ask: book.volume_weighted_price(Side::Ask, size, executable),
                    spread,
                    spread_bps: book.spread_in_bps(spread),
                }
            })
            .collect();

        FeatureReport {
            symbol: symbol.to_string(),
            venue: book.venue(),
            exchange_timestamp: book.exchange_timestamp(),
            receipt_timestamp: book.receipt_timestamp(),
            sequence: outcome.sequence,
            missing_bid_levels: outcome.missing_bid_levels,
            missing_ask_levels: outcome.missing_ask_levels,
            book: BookFeatures::from_book(book),
            vwap,
            transforms: state.transforms.iter().map(NamedTransform::reading).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lob_core::TransformKind;
    use serde_json::json;

    fn snapshot(bid: f64, ask: f64, ts: f64) -> Value {
        json!({
            "book": {
                "bid": { bid.to_string(): "2" },
                "ask": { ask.to_string(): "1" }
            },
            "timestamp": ts,
            "receipt_timestamp": ts + 0.01
        })
    }

    fn pipeline(transforms: Vec<TransformConfig>) -> FeaturePipeline {
        let mut config = PipelineConfig::default();
        config.book.n_levels = 2;
        config.transforms = transforms;
        FeaturePipeline::new(config).unwrap()
    }

    fn ema(alpha: f64, warmup: usize) -> TransformConfig {
        TransformConfig {
            input_feature: BookFeature::Mid,
            kind: TransformKind::Ema {
                alpha,
                adjust: false,
                required_n_warmup: warmup,
            },
        }
    }

    #[test]
    fn test_subscribe_idempotent() {
        let mut p = pipeline(vec![ema(0.5, 0)]);
        assert!(p.subscribe("BTC_USDT").unwrap());
        assert!(!p.subscribe("BTC_USDT").unwrap());
        assert!(p.is_subscribed("BTC_USDT"));
        assert!(p.unsubscribe("BTC_USDT"));
        assert!(!p.unsubscribe("BTC_USDT"));
        assert_eq!(p.symbols().count(), 0);
    }

    #[test]
    fn test_unknown_symbol() {
        let mut p = pipeline(vec![]);
        let err = p.on_snapshot("ETH_USDT", &snapshot(10.0, 11.0, 1.0)).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(_)));
    }

    #[test]
    fn test_ema_on_mid() {
        let mut p = pipeline(vec![ema(0.5, 0)]);
        p.subscribe("BTC_USDT").unwrap();

        let mids = [(9.5, 10.5), (11.5, 12.5), (7.5, 8.5)];
        let mut values = Vec::new();
        for (i, (bid, ask)) in mids.iter().enumerate() {
            let report = p.on_snapshot("BTC_USDT", &snapshot(*bid, *ask, i as f64)).unwrap();
            values.push(report.transform("mid_ema_0.5").and_then(Reading::value).unwrap());
        }
        assert_eq!(values, vec![10.0, 11.0, 9.5]);
    }

    #[test]
    fn test_warmup_reported() {
        let mut p = pipeline(vec![ema(0.5, 2)]);
        p.subscribe("S").unwrap();
        let first = p.on_snapshot("S", &snapshot(10.0, 11.0, 1.0)).unwrap();
        assert_eq!(first.transform("mid_ema_0.5"), Some(Reading::NotWarm));
        let second = p.on_snapshot("S", &snapshot(10.0, 11.0, 2.0)).unwrap();
        assert_eq!(second.transform("mid_ema_0.5"), Some(Reading::Value(10.5)));
    }

    #[test]
    fn test_nan_input_skipped() {
        let mut p = pipeline(vec![ema(0.5, 0)]);
        p.subscribe("S").unwrap();
        p.on_snapshot("S", &snapshot(10.0, 11.0, 1.0)).unwrap();

        let one_sided = json!({
            "book": {"bid": {"10": "1"}, "ask": {}},
            "timestamp": 2.0,
            "receipt_timestamp": 2.0
        });
        let report = p.on_snapshot("S", &one_sided).unwrap();
        assert!(report.book.mid.is_nan());
        assert_eq!(report.transform("mid_ema_0.5"), Some(Reading::Value(10.5)));
        assert_eq!(p.state("S").unwrap().skipped_inputs(), 1);
    }

    #[test]
    fn test_malformed_snapshot_changes_nothing() {
        let mut p = pipeline(vec![ema(0.5, 0)]);
        p.subscribe("S").unwrap();
        p.on_snapshot("S", &snapshot(10.0, 11.0, 1.0)).unwrap();

        assert!(p.on_snapshot("S", &json!({"book": {"bid": "10"}})).is_err());
        let state = p.state("S").unwrap();
        assert_eq!(state.book().update_count(), 1);
        assert_eq!(state.transform("mid_ema_0.5").unwrap().transform().n_updates(), 1);
    }

    #[test]
    fn test_vwap_outputs() {
        let mut config = PipelineConfig::default();
        config.book.n_levels = 2;
        config.output.vwap_sizes = vec![1.0, 5.0];
        let mut p = FeaturePipeline::new(config).unwrap();
        p.subscribe("S").unwrap();

        let report = p.on_snapshot("S", &snapshot(10.0, 11.0, 1.0)).unwrap();
        assert_eq!(report.vwap.len(), 2);
        assert_eq!(report.vwap[0].bid, 10.0);
        assert_eq!(report.vwap[0].ask, 11.0);
        assert_eq!(report.vwap[0].spread, 1.0);
        // Executable by default: the book holds 2 bid and 1 ask
        assert!(report.vwap[1].executable);
        assert!(report.vwap[1].bid.is_nan());
        assert!(report.vwap[1].spread_bps.is_nan());
    }

    #[test]
    fn test_indicative_vwap_matches_calculator() {
        let mut config = PipelineConfig::default();
        config.book.n_levels = 2;
        config.output.vwap_sizes = vec![5.0];
        config.output.executable_vwap = false;
        let mut p = FeaturePipeline::new(config).unwrap();
        p.subscribe("S").unwrap();

        let report = p.on_snapshot("S", &snapshot(10.0, 11.0, 1.0)).unwrap();
        let book = p.book("S").unwrap();
        let vwap = &report.vwap[0];
        assert!(!vwap.executable);
        assert_eq!(vwap.spread, book.volume_weighted_spread(5.0));
        assert_eq!(vwap.spread_bps, book.volume_weighted_spread_bps(5.0));
        assert_eq!(vwap.spread, 1.0);
    }

    #[test]
    fn test_symbols_isolated() {
        let mut p = pipeline(vec![ema(0.5, 0)]);
        p.subscribe("A").unwrap();
        p.subscribe("B").unwrap();
        p.on_snapshot("A", &snapshot(10.0, 11.0, 1.0)).unwrap();

        assert_eq!(p.book("A").unwrap().update_count(), 1);
        assert_eq!(p.book("B").unwrap().update_count(), 0);
        let b = p.state("B").unwrap();
        assert_eq!(b.transform("mid_ema_0.5").unwrap().transform().n_updates(), 0);
    }
}
