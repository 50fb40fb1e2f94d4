//! Online training: one incremental model update per gold sentence.

use serde::Serialize;
use tracing::{debug, info};

use crate::model::{FeatureExtractor, OnlineModel};
use crate::parser::{ParseMode, Parser};
use crate::tree::Tree;

/// Totals for one pass over a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrainReport {
    /// Sentences processed.
    pub sentences: usize,
    /// Instances handed to the model.
    pub instances: usize,
    /// Sentences cut short by the step ceiling.
    pub truncated: usize,
}

impl TrainReport {
    fn absorb(&mut self, other: TrainReport) {
        self.sentences += other.sentences;
        self.instances += other.instances;
        self.truncated += other.truncated;
    }
}

/// Walks a gold corpus in order, updating the model after each sentence.
#[derive(Debug)]
pub struct OnlineTrainer<'p, F> {
    parser: &'p Parser<F>,
    bootstrap: bool,
}

impl<'p, F: FeatureExtractor> OnlineTrainer<'p, F> {
    /// A trainer that follows the oracle on every pass.
    pub fn new(parser: &'p Parser<F>) -> Self {
        Self {
            parser,
            bootstrap: false,
        }
    }

    /// Follow the model's own predictions after the first epoch of
    /// [`train_epochs`](Self::train_epochs).
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// One pass over `trees` following the oracle.
    pub fn train<M>(&self, trees: &mut [Tree], model: &mut M) -> TrainReport
    where
        M: OnlineModel<F::Vector> + ?Sized,
    {
        self.pass(trees, model, ParseMode::Train)
    }

    /// `epochs` passes over `trees`. The first always follows the oracle;
    /// later ones bootstrap when enabled.
    pub fn train_epochs<M>(&self, trees: &mut [Tree], model: &mut M, epochs: usize) -> TrainReport
    where
        M: OnlineModel<F::Vector> + ?Sized,
    {
        let mut total = TrainReport::default();
        for epoch in 0..epochs {
            let mode = if epoch > 0 && self.bootstrap {
                ParseMode::Bootstrap
            } else {
                ParseMode::Train
            };
            let report = self.pass(trees, model, mode);
            info!(
                epoch,
                ?mode,
                sentences = report.sentences,
                instances = report.instances,
                "finished epoch"
            );
            total.absorb(report);
        }
        total
    }

    fn pass<M>(&self, trees: &mut [Tree], model: &mut M, mode: ParseMode) -> TrainReport
    where
        M: OnlineModel<F::Vector> + ?Sized,
    {
        let mut report = TrainReport::default();
        for (i, tree) in trees.iter_mut().enumerate() {
            let outcome = self.parser.process(tree, &*model, mode);
            debug!(
                sentence = i,
                instances = outcome.instances.len(),
                steps = outcome.steps,
                "updating model"
            );
            model.update(&outcome.instances);

            report.sentences += 1;
            report.instances += outcome.instances.len();
            report.truncated += usize::from(outcome.truncated);
        }
        report
    }
}
