//! arcparse core library.
//!
//! A transition-based dependency parser built on a list-based transition
//! system that can produce non-projective trees. The main entry points are
//! [`Parser::decode`] for inference, [`Parser::train`] and [`OnlineTrainer`]
//! for learning from gold trees, and [`replay_oracle`] for checking that the
//! oracle rebuilds a gold tree.
//!
//! The statistical model and feature templates are supplied by the caller
//! through the [`Classifier`] and [`FeatureExtractor`] traits.

#![warn(missing_docs)]

/// Error types for tree mutation and label decoding.
pub mod error;
/// Attachment-score accounting.
pub mod eval;
/// Collaborator traits: feature extraction and classification.
pub mod model;
/// Parse driver and headless repair.
pub mod parser;
/// Parser state, oracle and feature-query surface.
pub mod state;
/// Online trainer.
pub mod train;
/// Transition labels and label masks.
pub mod transition;
/// Arena-backed dependency tree.
pub mod tree;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Tree
pub use tree::{HeadArc, HeadSnapshot, Node, Tree};

// Transitions
pub use transition::{ArcType, LabelIndex, LabelMask, ListAction, TransitionLabel};

// State and oracle
pub use state::{
    FeatureSource, FeatureToken, NodeRelation, OracleReplay, ParserState, SecondaryHead,
    TransitionRecord, replay_oracle,
};

// Driver
pub use parser::{ParseMode, ParseOutcome, Parser};
pub use train::{OnlineTrainer, TrainReport};

// Models and evaluation
pub use eval::{AttachmentScore, Evaluator};
pub use model::{Classifier, FeatureExtractor, Instance, OnlineModel, Prediction};

// Errors
pub use error::{LabelError, TreeError};

// Configuration (re-exported from the config crate)
pub use arcparse_config::{ConfigError, ParserConfig, load_config_from_str};
