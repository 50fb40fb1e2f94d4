//! The parse driver: one loop of extract, choose, apply per sentence,
//! followed by headless repair when decoding.

mod repair;

use arcparse_config::ParserConfig;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::eval::Evaluator;
use crate::model::{Classifier, FeatureExtractor, Instance, Prediction};
use crate::state::{ParserState, TransitionRecord};
use crate::transition::{ArcType, LabelIndex, ListAction, TransitionLabel};
use crate::tree::{HeadSnapshot, Tree};

/// How [`Parser::process`] picks each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// Follow the oracle and record `(features, gold label)` instances.
    Train,
    /// Record `(features, gold label)` instances but follow the model, so the
    /// recorded states include the model's own mistakes.
    Bootstrap,
    /// Follow the model and repair headless nodes. Heads already on the tree
    /// are kept.
    Decode,
    /// Like [`Decode`](Self::Decode), but gold heads are hidden first and
    /// returned in [`ParseOutcome::gold`].
    Evaluate,
}

impl ParseMode {
    /// Whether the mode needs the gold heads hidden behind an oracle.
    pub fn uses_oracle(self) -> bool {
        !matches!(self, ParseMode::Decode)
    }

    /// Whether the mode records training instances.
    pub fn records_instances(self) -> bool {
        matches!(self, ParseMode::Train | ParseMode::Bootstrap)
    }
}

/// Result of processing one sentence.
#[derive(Debug, Clone)]
pub struct ParseOutcome<V> {
    /// Training instances in decision order; empty unless training.
    pub instances: Vec<Instance<V>>,
    /// Transitions applied in the main loop.
    pub steps: usize,
    /// Whether the step ceiling stopped the main loop.
    pub truncated: bool,
    /// Gold heads captured before parsing, in every mode except decode.
    pub gold: Option<HeadSnapshot>,
    /// Per-step configurations, when history is enabled.
    pub history: Vec<TransitionRecord>,
    /// Nodes attached by headless repair.
    pub repaired: usize,
}

/// A transition-based dependency parser bound to a configuration and a
/// feature extractor. The model is passed per call.
#[derive(Debug, Clone)]
pub struct Parser<F> {
    config: ParserConfig,
    extractor: F,
}

impl<F: FeatureExtractor> Parser<F> {
    /// Create a parser.
    pub fn new(config: ParserConfig, extractor: F) -> Self {
        Self { config, extractor }
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The feature extractor.
    pub fn extractor(&self) -> &F {
        &self.extractor
    }

    /// Parse one sentence in `mode`.
    ///
    /// In train and bootstrap modes the tree's heads are identical before and
    /// after the call. In decode and evaluate modes the tree ends with every
    /// token attached and no cycles.
    pub fn process<M>(&self, tree: &mut Tree, model: &M, mode: ParseMode) -> ParseOutcome<F::Vector>
    where
        M: Classifier<F::Vector> + ?Sized,
    {
        let index = match mode {
            ParseMode::Train => LabelIndex::default(),
            _ => LabelIndex::new::<F::Vector, M>(model),
        };
        self.run(tree, model, &index, mode)
    }

    /// Parse one gold sentence with the oracle and hand its instances to
    /// the model. The tree's heads are left unchanged.
    pub fn train<M>(&self, tree: &mut Tree, model: &mut M) -> ParseOutcome<F::Vector>
    where
        M: Classifier<F::Vector> + ?Sized,
    {
        let mut outcome = self.process(tree, &*model, ParseMode::Train);
        model.add_instances(std::mem::take(&mut outcome.instances));
        outcome
    }

    /// Decode one sentence.
    pub fn decode<M>(&self, tree: &mut Tree, model: &M) -> ParseOutcome<F::Vector>
    where
        M: Classifier<F::Vector> + ?Sized,
    {
        self.process(tree, model, ParseMode::Decode)
    }

    /// Decode a gold sentence with its heads hidden and score the result.
    ///
    /// The tree is left holding the predicted heads; the gold heads are in
    /// the returned outcome.
    pub fn evaluate<M, E>(&self, tree: &mut Tree, model: &M, evaluator: &mut E) -> ParseOutcome<F::Vector>
    where
        M: Classifier<F::Vector> + ?Sized,
        E: Evaluator + ?Sized,
    {
        let outcome = self.process(tree, model, ParseMode::Evaluate);
        if let Some(gold) = &outcome.gold {
            evaluator.count_correct(tree, gold);
        }
        outcome
    }

    /// Decode independent sentences in parallel, sharing one model across a
    /// rayon pool of `workers` threads (0 picks rayon's default). Outcomes
    /// come back in input order.
    pub fn decode_batch<M>(&self, trees: &mut [Tree], model: &M, workers: usize) -> Vec<ParseOutcome<F::Vector>>
    where
        M: Classifier<F::Vector> + Sync + ?Sized,
        F: Sync,
        F::Vector: Send,
    {
        if trees.is_empty() {
            return Vec::new();
        }
        let index = LabelIndex::new::<F::Vector, M>(model);
        let mut decode_all = || {
            trees
                .par_iter_mut()
                .map(|tree| self.run(tree, model, &index, ParseMode::Decode))
                .collect::<Vec<_>>()
        };

        match ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(decode_all),
            Err(e) => {
                warn!(error = %e, workers, "could not build decode pool, using the global pool");
                decode_all()
            }
        }
    }

    // ── Main loop ───────────────────────────────────────────────────────

    fn run<M>(&self, tree: &mut Tree, model: &M, index: &LabelIndex, mode: ParseMode) -> ParseOutcome<F::Vector>
    where
        M: Classifier<F::Vector> + ?Sized,
    {
        let tokens = tree.token_count();
        let ceiling = self.config.step_ceiling(tree.len());
        let mut state = if mode.uses_oracle() {
            ParserState::with_oracle(tree, &self.config)
        } else {
            ParserState::new(tree, &self.config)
        };

        let mut instances = Vec::new();
        let mut steps = 0;
        let mut truncated = false;

        while !state.is_terminal() {
            if steps >= ceiling {
                warn!(tokens, steps, ?mode, "step ceiling reached, stopping sentence");
                truncated = true;
                break;
            }
            let vector = self.extractor.extract(&state);

            let label = match mode {
                ParseMode::Train => {
                    let Some(gold) = state.gold_label() else {
                        break;
                    };
                    instances.push(Instance::new(vector, gold.clone()));
                    gold
                }
                ParseMode::Bootstrap => {
                    let Some(gold) = state.gold_label() else {
                        break;
                    };
                    let predictions = model.predict_top2(&vector, state.legal_mask(index));
                    instances.push(Instance::new(vector, gold));
                    top_label(&predictions)
                }
                ParseMode::Decode | ParseMode::Evaluate => {
                    let predictions = model.predict_top2(&vector, state.legal_mask(index));
                    let label = top_label(&predictions);
                    if label.arc == ArcType::NoArc {
                        state.save_secondary_heads(&predictions);
                    }
                    label
                }
            };

            state.apply_transition(&label);
            steps += 1;
        }

        let repaired = if mode.records_instances() {
            0
        } else {
            repair::repair_headless(&mut state, &self.extractor, model, index)
        };
        let gold = state.gold().cloned();
        if mode.records_instances() {
            state.reset_oracle();
        }

        debug!(?mode, tokens, steps, truncated, repaired, "parsed sentence");
        ParseOutcome {
            instances,
            steps,
            truncated,
            gold,
            history: state.into_history(),
            repaired,
        }
    }
}

fn top_label(predictions: &[Prediction]) -> TransitionLabel {
    match predictions.first() {
        Some(p) => p.label.clone(),
        None => {
            warn!("model returned no prediction, shifting");
            TransitionLabel::no_arc(ListAction::Shift)
        }
    }
}
