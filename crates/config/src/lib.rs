//! Parser configuration for arcparse.
//!
//! A [`ParserConfig`] carries every tunable the transition system, the
//! headless repair pass, and the evaluation counter read at run time. All
//! fields have defaults, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or validating a parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON deserialization failed.
    #[error("invalid config JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is out of its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },
}

/// Relation label given to nodes the repair pass attaches to the root.
pub const DEFAULT_ROOT_LABEL: &str = "root";

/// Score margin under which a runner-up prediction becomes a secondary head.
pub const DEFAULT_MARGIN: f64 = 1.0;

/// Upper bound reported by the stack-to-input distance query.
pub const DEFAULT_LOOKBACK_CAP: usize = 6;

/// Runtime configuration for one parser instance.
///
/// # Example
/// ```
/// let config = arcparse_config::ParserConfig {
///     root_label: "ROOT".into(),
///     margin: 0.5,
///     ..Default::default()
/// };
/// assert_eq!(config.lookback_cap, 6);
/// assert_eq!(config.step_ceiling(4), 16);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Relation label used when a headless node falls back to the root.
    pub root_label: String,
    /// Maximum score gap between the best and a runner-up prediction for the
    /// runner-up to be kept as a secondary-head candidate.
    pub margin: f64,
    /// Cap applied to the stack-to-input distance exposed to feature extractors.
    pub lookback_cap: usize,
    /// Multiplier for the per-sentence step ceiling (`factor × size²`).
    pub step_limit_factor: usize,
    /// Keep a per-step transition history on the parser state.
    pub record_history: bool,
    /// Count punctuation tokens when scoring attachments.
    pub evaluate_punctuation: bool,
    /// POS tags treated as punctuation when `evaluate_punctuation` is off.
    pub punctuation_tags: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            root_label: DEFAULT_ROOT_LABEL.into(),
            margin: DEFAULT_MARGIN,
            lookback_cap: DEFAULT_LOOKBACK_CAP,
            step_limit_factor: 1,
            record_history: true,
            evaluate_punctuation: false,
            punctuation_tags: [".", ",", ":", "``", "''", "-LRB-", "-RRB-", "HYPH", "NFP"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ParserConfig {
    /// Hard ceiling on transitions for a tree of `size` nodes (root included).
    ///
    /// The list-based system needs at most `size²` steps for any label
    /// sequence, so the default factor of 1 never truncates a healthy parse.
    pub fn step_ceiling(&self, size: usize) -> usize {
        self.step_limit_factor
            .saturating_mul(size)
            .saturating_mul(size)
            .max(1)
    }

    /// Whether `pos` is one of the configured punctuation tags.
    pub fn is_punctuation(&self, pos: &str) -> bool {
        self.punctuation_tags.iter().any(|t| t == pos)
    }

    /// Check field ranges. Called by [`load_config_from_str`]; callers that
    /// build a config in code can use it directly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_label.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "root_label".into(),
                reason: "must not be empty".into(),
            });
        }
        if !self.margin.is_finite() {
            return Err(ConfigError::InvalidField {
                field: "margin".into(),
                reason: format!("{} is not a finite number", self.margin),
            });
        }
        if self.margin < 0.0 {
            return Err(ConfigError::InvalidField {
                field: "margin".into(),
                reason: format!("{} must be >= 0", self.margin),
            });
        }
        if self.lookback_cap == 0 {
            return Err(ConfigError::InvalidField {
                field: "lookback_cap".into(),
                reason: "must be > 0".into(),
            });
        }
        if self.step_limit_factor == 0 {
            return Err(ConfigError::InvalidField {
                field: "step_limit_factor".into(),
                reason: "must be > 0".into(),
            });
        }
        if let Some(tag) = self.punctuation_tags.iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidField {
                field: "punctuation_tags".into(),
                reason: format!("contains an empty tag ({tag:?})"),
            });
        }
        Ok(())
    }
}

/// Load and validate a [`ParserConfig`] from a JSON string.
///
/// Missing fields take their defaults. After deserialization:
/// - `root_label` must be non-empty
/// - `margin` must be finite and >= 0
/// - `lookback_cap` and `step_limit_factor` must be > 0
/// - `punctuation_tags` must not contain empty strings
pub fn load_config_from_str(s: &str) -> Result<ParserConfig, ConfigError> {
    let config: ParserConfig = serde_json::from_str(s)?;
    config.validate()?;
    Ok(config)
}
