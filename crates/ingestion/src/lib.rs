//! Snapshot ingestion and normalization for the order-book feature system.
//!
//! This crate handles:
//! - Venue-specific raw snapshot parsing
//! - Level ordering (best first) per side
//! - Timestamp and sequence number extraction
//! - Venue dispatch

pub mod normalizer;
pub mod venues;

pub use normalizer::{normalizer_for, BookTimestamps, VenueNormalizer};
pub use venues::{BinanceNormalizer, GateIoNormalizer};
