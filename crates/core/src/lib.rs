//! Core types and configuration for the order-book feature system.
//!
//! This crate provides shared types used across all other crates:
//! - Book levels, sides, venues and feature names
//! - Transform readings and sequence checks
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BookConfig, OutputConfig, PipelineConfig, SequencePolicy, TransformConfig, TransformKind,
};
pub use error::{Error, Result};
pub use types::*;
