//! Binance partial depth snapshots.
//!
//! ```text
//! {"E": 1700000000123, "u": 4051, "b": [["100.5", "2.0"], ...], "a": [...],
//!  "receipt_timestamp": 1700000000.130}
//! ```
//!
//! Levels are already ordered best first. Event time `E` is in milliseconds;
//! the last update id `u` serves as the sequence number.

use lob_core::{BookConfig, Error, Level, Result, Venue};
use serde_json::Value;

use crate::normalizer::{
    optional_sequence, parse_number, timestamp_or_nan, BookTimestamps, VenueNormalizer,
};

const EVENT_TIME_FIELD: &str = "E";
const UPDATE_ID_FIELD: &str = "u";

#[derive(Debug, Clone, Copy, Default)]
pub struct BinanceNormalizer;

impl BinanceNormalizer {
    fn side_levels(raw: &Value, key: &str) -> Result<Vec<Level>> {
        let entries = match raw.get(key) {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(other) => return Err(Error::data(format!("'{key}' must be an array, got {other}"))),
        };

        entries
            .iter()
            .map(|entry| match entry.as_array().map(Vec::as_slice) {
                Some([price, quantity, ..]) => Ok(Level::new(
                    parse_number(price, "price")?,
                    parse_number(quantity, "quantity")?,
                )),
                _ => Err(Error::data(format!("invalid level entry {entry}"))),
            })
            .collect()
    }
}

impl VenueNormalizer for BinanceNormalizer {
    fn venue(&self) -> Venue {
        Venue::Binance
    }

    fn extract_levels(&self, raw: &Value, _config: &BookConfig) -> Result<(Vec<Level>, Vec<Level>)> {
        Ok((Self::side_levels(raw, "b")?, Self::side_levels(raw, "a")?))
    }

    fn extract_timestamps(&self, raw: &Value, config: &BookConfig) -> Result<BookTimestamps> {
        Ok(BookTimestamps {
            exchange_timestamp: timestamp_or_nan(raw, EVENT_TIME_FIELD) / 1000.0,
            receipt_timestamp: timestamp_or_nan(raw, &config.receipt_timestamp_field),
            sequence_number: optional_sequence(raw, UPDATE_ID_FIELD, config),
        })
    }
}
