//! Attachment-score accounting for decoded trees.

use arcparse_config::ParserConfig;
use serde::Serialize;

use crate::tree::{HeadSnapshot, Tree};

/// Accumulates attachment statistics from decoded trees.
pub trait Evaluator {
    /// Compare the heads on `tree` against `gold`.
    fn count_correct(&mut self, tree: &Tree, gold: &HeadSnapshot);
}

/// Running unlabeled / labeled attachment counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentScore {
    /// Tokens scored.
    pub total: usize,
    /// Tokens with the correct head.
    pub unlabeled: usize,
    /// Tokens with the correct head and relation.
    pub labeled: usize,
    /// Tokens with the correct relation, head ignored.
    pub label_only: usize,
    #[serde(skip)]
    skip_punctuation: Option<Vec<String>>,
}

impl AttachmentScore {
    /// Count every token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow `config`: punctuation tokens are skipped unless
    /// `evaluate_punctuation` is set.
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            skip_punctuation: (!config.evaluate_punctuation).then(|| config.punctuation_tags.clone()),
            ..Self::default()
        }
    }

    /// Unlabeled attachment score in `[0, 1]`; 0 when nothing was scored.
    pub fn uas(&self) -> f64 {
        ratio(self.unlabeled, self.total)
    }

    /// Labeled attachment score.
    pub fn las(&self) -> f64 {
        ratio(self.labeled, self.total)
    }

    /// Label accuracy.
    pub fn ls(&self) -> f64 {
        ratio(self.label_only, self.total)
    }

    fn skips(&self, pos: &str) -> bool {
        self.skip_punctuation
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == pos))
    }
}

impl Evaluator for AttachmentScore {
    fn count_correct(&mut self, tree: &Tree, gold: &HeadSnapshot) {
        for node in tree.tokens() {
            if self.skips(&node.pos) {
                continue;
            }
            self.total += 1;
            let (Some(predicted), Some(expected)) = (node.head.as_ref(), gold.get(node.id)) else {
                continue;
            };
            let same_label = predicted.label == expected.label;
            if predicted.head == expected.head {
                self.unlabeled += 1;
                if same_label {
                    self.labeled += 1;
                }
            }
            if same_label {
                self.label_only += 1;
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
