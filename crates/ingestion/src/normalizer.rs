//! Venue normalization contract and dispatch table.
//!
//! Each venue implements level extraction and timestamp/sequence extraction
//! against its own raw message shape. Everything downstream of
//! [`NormalizedBook`] is venue-agnostic.

use lob_core::{BookConfig, Error, Level, NormalizedBook, Result, TimestampSecs, Venue};
use serde_json::Value;
use tracing::{debug, trace};

use crate::venues::{BinanceNormalizer, GateIoNormalizer};

/// Timestamps and sequence number carried by a raw snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookTimestamps {
    pub exchange_timestamp: TimestampSecs,
    pub receipt_timestamp: TimestampSecs,
    /// Present only when sequence tracking is enabled and the field exists.
    pub sequence_number: Option<i64>,
}

/// Converts a venue's raw snapshot into a [`NormalizedBook`].
pub trait VenueNormalizer: Send + Sync {
    /// Venue this normalizer understands.
    fn venue(&self) -> Venue;

    /// Extract bid and ask levels, each ordered best first.
    fn extract_levels(&self, raw: &Value, config: &BookConfig) -> Result<(Vec<Level>, Vec<Level>)>;

    /// Extract exchange/receipt timestamps and the optional sequence number.
    fn extract_timestamps(&self, raw: &Value, config: &BookConfig) -> Result<BookTimestamps>;

    /// Full normalization of one raw snapshot.
    fn normalize(&self, raw: &Value, config: &BookConfig) -> Result<NormalizedBook> {
        let (bids, asks) = self.extract_levels(raw, config)?;
        let ts = self.extract_timestamps(raw, config)?;
        trace!(
            venue = %self.venue(),
            bids = bids.len(),
            asks = asks.len(),
            exchange_ts = ts.exchange_timestamp,
            "Normalized snapshot"
        );
        Ok(NormalizedBook {
            bids,
            asks,
            exchange_timestamp: ts.exchange_timestamp,
            receipt_timestamp: ts.receipt_timestamp,
            sequence_number: ts.sequence_number,
        })
    }
}

static GATEIO: GateIoNormalizer = GateIoNormalizer;
static BINANCE: BinanceNormalizer = BinanceNormalizer;

/// Dispatch table from venue identifier to its normalizer.
pub fn normalizer_for(venue: Venue) -> &'static dyn VenueNormalizer {
    match venue {
        Venue::GateIo => &GATEIO,
        Venue::Binance => &BINANCE,
    }
}

/// Look up a required field on a JSON object.
pub(crate) fn required_field<'a>(raw: &'a Value, field: &str) -> Result<&'a Value> {
    raw.get(field)
        .ok_or_else(|| Error::data(format!("missing field '{field}'")))
}

/// Parse a number that may arrive as a JSON number or a decimal string.
pub(crate) fn parse_number(value: &Value, what: &str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::data(format!("invalid {what}: {value}")))
}

/// Parse an integer sequence number from a JSON number or string.
pub(crate) fn parse_sequence(value: &Value) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::data(format!("invalid sequence number: {value}")))
}

/// Timestamp at `field` in seconds; NaN when absent, null or unparsable.
pub(crate) fn timestamp_or_nan(raw: &Value, field: &str) -> TimestampSecs {
    match raw.get(field) {
        None | Some(Value::Null) => {
            debug!(field, "Snapshot has no timestamp");
            f64::NAN
        }
        Some(value) => parse_number(value, field).unwrap_or_else(|e| {
            debug!(field, error = %e, "Unparsable timestamp");
            f64::NAN
        }),
    }
}

/// Sequence number at `field`, if tracking is enabled and the value is a
/// usable integer. Anything else is left for the sequence check to report.
pub(crate) fn optional_sequence(raw: &Value, field: &str, config: &BookConfig) -> Option<i64> {
    if !config.tracks_sequence() {
        return None;
    }
    match raw.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => match parse_sequence(value) {
            Ok(seq) => Some(seq),
            Err(e) => {
                debug!(field, error = %e, "Ignoring unparsable sequence number");
                None
            }
        },
    }
}
