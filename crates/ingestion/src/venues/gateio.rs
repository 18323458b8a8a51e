//! Gate.io book snapshots.
//!
//! Levels arrive as price-keyed maps:
//!
//! ```text
//! {"book": {"bid": {"100.5": "2.0", ...}, "ask": {...}},
//!  "timestamp": 1700000000.123, "receipt_timestamp": 1700000000.130}
//! ```
//!
//! JSON object keys carry no numeric order, so each side is sorted here.

use lob_core::{BookConfig, Error, Level, Result, Side, Venue};
use ordered_float::OrderedFloat;
use serde_json::{Map, Value};

use crate::normalizer::{
    optional_sequence, parse_number, required_field, timestamp_or_nan, BookTimestamps,
    VenueNormalizer,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GateIoNormalizer;

impl GateIoNormalizer {
    fn side_levels(book: &Value, key: &str, side: Side) -> Result<Vec<Level>> {
        let levels = match book.get(key) {
            Some(Value::Object(map)) => parse_price_map(map)?,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(Error::data(format!(
                    "book.{key} must be an object, got {other}"
                )))
            }
        };
        Ok(sort_best_first(levels, side))
    }
}

impl VenueNormalizer for GateIoNormalizer {
    fn venue(&self) -> Venue {
        Venue::GateIo
    }

    fn extract_levels(&self, raw: &Value, _config: &BookConfig) -> Result<(Vec<Level>, Vec<Level>)> {
        let book = required_field(raw, "book")?;
        let bids = Self::side_levels(book, "bid", Side::Bid)?;
        let asks = Self::side_levels(book, "ask", Side::Ask)?;
        Ok((bids, asks))
    }

    fn extract_timestamps(&self, raw: &Value, config: &BookConfig) -> Result<BookTimestamps> {
        Ok(BookTimestamps {
            exchange_timestamp: timestamp_or_nan(raw, &config.exchange_timestamp_field),
            receipt_timestamp: timestamp_or_nan(raw, &config.receipt_timestamp_field),
            sequence_number: optional_sequence(raw, &config.sequence_number_field, config),
        })
    }
}

fn parse_price_map(map: &Map<String, Value>) -> Result<Vec<Level>> {
    map.iter()
        .map(|(price, quantity)| {
            let price = price
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::data(format!("invalid price key '{price}'")))?;
            Ok(Level::new(price, parse_number(quantity, "quantity")?))
        })
        .collect()
}

/// Bids descending, asks ascending.
fn sort_best_first(mut levels: Vec<Level>, side: Side) -> Vec<Level> {
    match side {
        Side::Bid => levels.sort_by_key(|l| std::cmp::Reverse(OrderedFloat(l.price))),
        Side::Ask => levels.sort_by_key(|l| OrderedFloat(l.price)),
    }
    levels
}
