//! Seams to the collaborators the parser drives but does not implement:
//! the feature extractor and the statistical classifier.

use serde::Serialize;

use crate::state::ParserState;
use crate::transition::{LabelMask, TransitionLabel};

/// A scored label returned by a [`Classifier`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The predicted transition.
    pub label: TransitionLabel,
    /// Model score; higher is better.
    pub score: f64,
}

impl Prediction {
    /// Create a prediction.
    pub fn new(label: TransitionLabel, score: f64) -> Self {
        Self { label, score }
    }
}

/// One training decision: the features seen and the oracle's label.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance<V> {
    /// Feature vector extracted from the state at decision time.
    pub vector: V,
    /// Gold transition for that state.
    pub label: TransitionLabel,
}

impl<V> Instance<V> {
    /// Create an instance.
    pub fn new(vector: V, label: TransitionLabel) -> Self {
        Self { vector, label }
    }
}

/// Turns a parser configuration into a feature vector.
///
/// Extraction must be a pure function of the state; it is called once per
/// decision and once per candidate during headless repair.
pub trait FeatureExtractor {
    /// The vector type handed to the classifier.
    type Vector;

    /// Extract features from the current state.
    fn extract(&self, state: &ParserState<'_>) -> Self::Vector;
}

/// A statistical model scoring transition labels.
pub trait Classifier<V> {
    /// The model's label inventory; positions in this list are what a
    /// [`LabelMask`] refers to.
    fn labels(&self) -> Vec<TransitionLabel>;

    /// The best two predictions (fewer if the mask admits fewer labels),
    /// ordered by descending score. `None` means every label is allowed.
    fn predict_top2(&self, vector: &V, mask: Option<&LabelMask>) -> Vec<Prediction>;

    /// The single best prediction among the labels in `mask`.
    fn predict_best(&self, vector: &V, mask: &LabelMask) -> Option<Prediction> {
        self.predict_top2(vector, Some(mask)).into_iter().next()
    }

    /// Accumulate one training instance.
    fn add_instance(&mut self, instance: Instance<V>);

    /// Accumulate a batch of training instances, in order.
    fn add_instances(&mut self, instances: Vec<Instance<V>>) {
        for instance in instances {
            self.add_instance(instance);
        }
    }

    /// Translate labels into positions of [`labels`](Self::labels). Labels the
    /// model does not know are skipped.
    fn labels_to_indices(&self, labels: &[TransitionLabel]) -> LabelMask {
        let inventory = self.labels();
        labels
            .iter()
            .filter_map(|l| inventory.iter().position(|known| known == l))
            .collect()
    }
}

/// A classifier that can take an incremental weight update from one
/// sentence's worth of instances.
pub trait OnlineModel<V>: Classifier<V> {
    /// Update the weights from `instances`, given in decision order.
    fn update(&mut self, instances: &[Instance<V>]);
}
