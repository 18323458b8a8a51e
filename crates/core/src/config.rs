//! Configuration structures for the order-book feature system.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{BookFeature, OptionalFeature, Venue};

/// Main configuration for a feature pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Venue whose raw snapshot shape is expected.
    pub venue: Venue,
    /// Order book configuration.
    #[serde(default)]
    pub book: BookConfig,
    /// Online transforms instantiated for every symbol.
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
    /// Extra outputs included in each report.
    #[serde(default)]
    pub output: OutputConfig,
    /// What to do with transform state on a sequence regression.
    #[serde(default)]
    pub sequence_policy: SequencePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            venue: Venue::GateIo,
            book: BookConfig::default(),
            transforms: vec![TransformConfig {
                input_feature: BookFeature::Mid,
                kind: TransformKind::Ema {
                    alpha: 0.5,
                    adjust: false,
                    required_n_warmup: 100,
                },
            }],
            output: OutputConfig::default(),
            sequence_policy: SequencePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check parameter ranges and transform name uniqueness.
    pub fn validate(&self) -> Result<()> {
        self.book.validate()?;
        self.output.validate()?;

        let mut names = HashSet::new();
        for transform in &self.transforms {
            transform.kind.validate()?;
            let name = transform.name();
            if !names.insert(name.clone()) {
                return Err(Error::config(format!("duplicate transform '{name}'")));
            }
        }
        Ok(())
    }
}

/// Order book normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Fixed book depth per side.
    pub n_levels: usize,
    /// Raw field holding the exchange timestamp (seconds).
    pub exchange_timestamp_field: String,
    /// Raw field holding the receipt timestamp (seconds).
    pub receipt_timestamp_field: String,
    /// Raw field holding the sequence number.
    pub sequence_number_field: String,
    /// Optional extraction paths.
    pub optional_features: Vec<OptionalFeature>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            n_levels: 10,
            exchange_timestamp_field: "timestamp".to_string(),
            receipt_timestamp_field: "receipt_timestamp".to_string(),
            sequence_number_field: "sequence_number".to_string(),
            optional_features: Vec::new(),
        }
    }
}

impl BookConfig {
    pub fn tracks_sequence(&self) -> bool {
        self.optional_features.contains(&OptionalFeature::SequenceNumber)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_levels == 0 {
            return Err(Error::config("n_levels must be at least 1"));
        }
        Ok(())
    }
}

/// One transform bound to a book feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Book feature consumed on each update.
    pub input_feature: BookFeature,
    /// Transform variant and parameters.
    #[serde(flatten)]
    pub kind: TransformKind,
}

impl TransformConfig {
    /// Published name, e.g. `mid_ema_0.5`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.input_feature, self.kind.suffix())
    }
}

/// Transform variants and their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformKind {
    /// Exponential moving average.
    Ema {
        alpha: f64,
        #[serde(default)]
        adjust: bool,
        #[serde(default)]
        required_n_warmup: usize,
    },
    /// Exponentially weighted standard deviation.
    EwmStd {
        alpha: f64,
        #[serde(default)]
        adjust: bool,
        #[serde(default)]
        required_n_warmup: usize,
    },
    /// Z-score against an EMA and EWM std on the same alpha.
    EwmZscore {
        alpha: f64,
        #[serde(default)]
        adjust: bool,
        #[serde(default)]
        required_n_warmup: usize,
    },
    /// Short EMA minus long EMA, scaled by the long EWM std.
    DualZscore {
        alpha_short: f64,
        alpha_long: f64,
        #[serde(default)]
        adjust: bool,
        #[serde(default)]
        required_n_warmup: usize,
    },
    /// Mean over a fixed window.
    MovingAverage { window_size: usize },
    /// Sample standard deviation over a fixed window.
    MovingStd { window_size: usize },
}

impl TransformKind {
    fn suffix(&self) -> String {
        match self {
            TransformKind::Ema { alpha, adjust: false, .. } => format!("ema_{alpha}"),
            TransformKind::Ema { alpha, adjust: true, .. } => format!("ema_adj_{alpha}"),
            TransformKind::EwmStd { alpha, .. } => format!("ewm_std_{alpha}"),
            TransformKind::EwmZscore { alpha, .. } => format!("zscore_{alpha}"),
            TransformKind::DualZscore {
                alpha_short,
                alpha_long,
                ..
            } => format!("zscore_{alpha_short}_{alpha_long}"),
            TransformKind::MovingAverage { window_size } => format!("ma_{window_size}"),
            TransformKind::MovingStd { window_size } => format!("mstd_{window_size}"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            TransformKind::Ema { alpha, .. }
            | TransformKind::EwmStd { alpha, .. }
            | TransformKind::EwmZscore { alpha, .. } => validate_alpha(alpha),
            TransformKind::DualZscore {
                alpha_short,
                alpha_long,
                ..
            } => {
                validate_alpha(alpha_short)?;
                validate_alpha(alpha_long)
            }
            TransformKind::MovingAverage { window_size }
            | TransformKind::MovingStd { window_size } => {
                if window_size == 0 {
                    Err(Error::config("window_size must be at least 1"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(Error::config(format!("alpha must be in (0, 1], got {alpha}")))
    }
}

/// Additional report outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Target sizes for VWAP and VW spread readings.
    pub vwap_sizes: Vec<f64>,
    /// Require full depth for VWAP readings.
    pub executable_vwap: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            vwap_sizes: Vec::new(),
            executable_vwap: true,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.vwap_sizes.iter().find(|s| !(**s > 0.0)) {
            return Err(Error::config(format!("vwap size must be positive, got {size}")));
        }
        Ok(())
    }
}

/// Transform handling on a sequence number regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePolicy {
    /// Report the anomaly and keep transform state.
    #[default]
    Report,
    /// Report the anomaly and restart every transform's warmup.
    ResetTransforms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.book.n_levels, 10);
        assert_eq!(config.transforms[0].name(), "mid_ema_0.5");
        assert_eq!(config.sequence_policy, SequencePolicy::Report);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "venue": "gateio",
            "book": { "n_levels": 5, "optional_features": ["sequence_number"] },
            "transforms": [
                { "input_feature": "mid", "kind": "ema", "alpha": 0.1, "adjust": true },
                { "input_feature": "mid", "kind": "dual_zscore", "alpha_short": 0.5, "alpha_long": 0.05 },
                { "input_feature": "tob_spread_bps", "kind": "moving_std", "window_size": 20 }
            ],
            "sequence_policy": "reset_transforms"
        }"#;

        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.book.n_levels, 5);
        assert!(config.book.tracks_sequence());
        assert_eq!(config.book.exchange_timestamp_field, "timestamp");
        assert_eq!(config.transforms[0].name(), "mid_ema_adj_0.1");
        assert_eq!(config.transforms[1].name(), "mid_zscore_0.5_0.05");
        assert_eq!(config.transforms[2].name(), "tob_spread_bps_mstd_20");
        assert_eq!(config.sequence_policy, SequencePolicy::ResetTransforms);
    }

    #[test]
    fn test_rejects_bad_alpha() {
        for alpha in [0.0, -0.1, 1.5, f64::NAN] {
            let kind = TransformKind::Ema {
                alpha,
                adjust: false,
                required_n_warmup: 0,
            };
            assert!(kind.validate().is_err(), "alpha {alpha} accepted");
        }
        let kind = TransformKind::EwmStd {
            alpha: 1.0,
            adjust: true,
            required_n_warmup: 0,
        };
        assert!(kind.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_window_and_depth() {
        assert!(TransformKind::MovingAverage { window_size: 0 }.validate().is_err());

        let mut config = PipelineConfig::default();
        config.book.n_levels = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut config = PipelineConfig::default();
        config.transforms.push(config.transforms[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_feature() {
        let json = r#"{
            "venue": "binance",
            "transforms": [{ "input_feature": "microprice", "kind": "ema", "alpha": 0.1 }]
        }"#;
        assert!(matches!(PipelineConfig::from_json_str(json), Err(Error::Json(_))));
    }

    #[test]
    fn test_rejects_non_positive_vwap_size() {
        let mut config = PipelineConfig::default();
        config.output.vwap_sizes = vec![1.0, 0.0];
        assert!(config.validate().is_err());
    }
}
