//! Shared test helpers for `arcparse_core` integration tests.

#![allow(unreachable_pub)]

use arcparse_core::{
    Classifier, FeatureExtractor, Instance, LabelMask, ListAction, Node, OnlineModel,
    ParserState, Prediction, Tree, TransitionLabel,
};

// ─── Deterministic RNG ──────────────────────────────────────────────────────

/// Minimal LCG so randomized tests are reproducible without extra crates.
pub struct SimpleRng(u64);

#[allow(dead_code)]
impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    pub fn gen_range(&mut self, max: usize) -> usize {
        ((self.next() >> 33) as usize) % max
    }

    #[allow(dead_code)]
    pub fn gen_bool(&mut self) -> bool {
        self.next() >> 63 == 1
    }
}

// ─── Trees ──────────────────────────────────────────────────────────────────

/// Relations used by generated trees.
pub const RELATIONS: [&str; 3] = ["nsubj", "obj", "amod"];

/// A random gold tree over `n` tokens, projective or not.
///
/// Tokens are attached in random order, each to a node already in the tree,
/// so the result is always a tree rooted at position 0.
#[allow(dead_code)]
pub fn random_tree(rng: &mut SimpleRng, n: usize) -> Tree {
    let mut order: Vec<usize> = (1..=n).collect();
    for i in (1..order.len()).rev() {
        order.swap(i, rng.gen_range(i + 1));
    }

    let mut heads = vec![0; n + 1];
    let mut placed = vec![0];
    for &id in &order {
        heads[id] = placed[rng.gen_range(placed.len())];
        placed.push(id);
    }

    Tree::from_nodes((1..=n).map(|id| {
        let relation = if heads[id] == 0 {
            "root"
        } else {
            RELATIONS[rng.gen_range(RELATIONS.len())]
        };
        Node::new(format!("w{id}"), format!("w{id}"), "NN").with_head(heads[id], relation)
    }))
}

/// `[root, A, B, C]` with A the root child, B nsubj of A and C dobj of A.
#[allow(dead_code)]
pub fn abc_tree() -> Tree {
    Tree::from_nodes([
        Node::new("A", "a", "VB").with_head(0, "root"),
        Node::new("B", "b", "NN").with_head(1, "nsubj"),
        Node::new("C", "c", "NN").with_head(1, "dobj"),
    ])
}

/// Assert every token has exactly one head and no head chain loops.
#[allow(dead_code)]
pub fn assert_well_formed(tree: &Tree) {
    for id in 1..tree.len() {
        let head = tree
            .head_id(id)
            .unwrap_or_else(|| panic!("node {id} has no head"));
        assert!(head < tree.len(), "node {id} has out-of-range head {head}");
        assert!(
            !tree.is_descendant_of(id, id),
            "node {id} is its own ancestor"
        );
        assert!(tree.is_descendant_of(id, 0), "node {id} does not reach the root");
    }
}

// ─── Label inventory ────────────────────────────────────────────────────────

/// Every label the transition system can produce over `relations`.
#[allow(dead_code)]
pub fn inventory(relations: &[&str]) -> Vec<TransitionLabel> {
    let mut labels = vec![
        TransitionLabel::no_arc(ListAction::Shift),
        TransitionLabel::no_arc(ListAction::Reduce),
        TransitionLabel::no_arc(ListAction::Pass),
    ];
    for rel in relations {
        labels.push(TransitionLabel::left(ListAction::Reduce, *rel));
        labels.push(TransitionLabel::left(ListAction::Pass, *rel));
        labels.push(TransitionLabel::right(ListAction::Shift, *rel));
        labels.push(TransitionLabel::right(ListAction::Pass, *rel));
    }
    labels
}

/// Inventory covering [`RELATIONS`] plus `root`.
#[allow(dead_code)]
pub fn full_inventory() -> Vec<TransitionLabel> {
    let mut relations = RELATIONS.to_vec();
    relations.push("root");
    relations.push("dobj");
    inventory(&relations)
}

#[allow(dead_code)]
fn top2(
    labels: &[TransitionLabel],
    mask: Option<&LabelMask>,
    mut score: impl FnMut(usize, &TransitionLabel) -> f64,
) -> Vec<Prediction> {
    let mut scored: Vec<Prediction> = labels
        .iter()
        .enumerate()
        .filter(|(i, _)| mask.is_none_or(|m| m.contains(*i)))
        .map(|(i, l)| Prediction::new(l.clone(), score(i, l)))
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(2);
    scored
}

// ─── Feature extraction ─────────────────────────────────────────────────────

/// The features our fake models look at: the window positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub stack: usize,
    pub input: usize,
    pub distance: usize,
    pub depth: usize,
    pub stack_has_head: bool,
}

/// Extracts a [`Window`] from the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowExtractor;

impl FeatureExtractor for WindowExtractor {
    type Vector = Window;

    fn extract(&self, state: &ParserState<'_>) -> Window {
        let stack = state.stack_top();
        Window {
            stack,
            input: state.input(),
            distance: state.distance(),
            depth: state.stack().len(),
            stack_has_head: state.tree().has_head(stack),
        }
    }
}

// ─── Models ─────────────────────────────────────────────────────────────────

/// Deterministic pseudo-random scores keyed on the window and label, so
/// predictions are adversarial but reproducible and thread-safe.
#[allow(dead_code)]
pub struct HashModel {
    pub labels: Vec<TransitionLabel>,
    pub seed: u64,
}

#[allow(dead_code)]
impl HashModel {
    pub fn new(labels: Vec<TransitionLabel>, seed: u64) -> Self {
        Self { labels, seed }
    }

    fn score(&self, window: &Window, index: usize) -> f64 {
        let mut h = self.seed
            ^ (window.stack as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (window.input as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ (index as u64).wrapping_mul(0x1656_67B1_9E37_79F9)
            ^ u64::from(window.stack_has_head);
        h ^= h >> 30;
        h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h ^= h >> 27;
        h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
        (h >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl Classifier<Window> for HashModel {
    fn labels(&self) -> Vec<TransitionLabel> {
        self.labels.clone()
    }

    fn predict_top2(&self, vector: &Window, mask: Option<&LabelMask>) -> Vec<Prediction> {
        top2(&self.labels, mask, |i, _| self.score(vector, i))
    }

    fn add_instance(&mut self, _instance: Instance<Window>) {}
}

/// Which kind of call a scripted model is answering.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A decision in the main loop (the mask always admits a no-arc move).
    Parse,
    /// Headless repair scoring one direction (the mask holds arcs only).
    Rescore,
}

/// A model whose scores come from a closure over the window and label.
#[allow(dead_code)]
pub struct ScriptedModel<S> {
    pub labels: Vec<TransitionLabel>,
    pub script: S,
}

impl<S> Classifier<Window> for ScriptedModel<S>
where
    S: Fn(&Window, &TransitionLabel, Phase) -> f64,
{
    fn labels(&self) -> Vec<TransitionLabel> {
        self.labels.clone()
    }

    fn predict_top2(&self, vector: &Window, mask: Option<&LabelMask>) -> Vec<Prediction> {
        let arcs_only = mask.is_some_and(|m| {
            m.indices()
                .iter()
                .all(|&i| self.labels[i].arc != arcparse_core::ArcType::NoArc)
        });
        let phase = if arcs_only { Phase::Rescore } else { Phase::Parse };
        top2(&self.labels, mask, |_, l| (self.script)(vector, l, phase))
    }

    fn add_instance(&mut self, _instance: Instance<Window>) {}
}

/// A model that never predicts anything.
#[allow(dead_code)]
pub struct SilentModel;

impl Classifier<Window> for SilentModel {
    fn labels(&self) -> Vec<TransitionLabel> {
        Vec::new()
    }

    fn predict_top2(&self, _vector: &Window, _mask: Option<&LabelMask>) -> Vec<Prediction> {
        Vec::new()
    }

    fn add_instance(&mut self, _instance: Instance<Window>) {}
}

/// Records every instance and update it receives; predicts like a
/// [`HashModel`] so bootstrap passes have something to follow.
#[allow(dead_code)]
pub struct RecordingModel {
    pub inner: HashModel,
    pub added: Vec<Instance<Window>>,
    pub updates: Vec<Vec<TransitionLabel>>,
}

#[allow(dead_code)]
impl RecordingModel {
    pub fn new(labels: Vec<TransitionLabel>) -> Self {
        Self {
            inner: HashModel::new(labels, 7),
            added: Vec::new(),
            updates: Vec::new(),
        }
    }
}

impl Classifier<Window> for RecordingModel {
    fn labels(&self) -> Vec<TransitionLabel> {
        self.inner.labels()
    }

    fn predict_top2(&self, vector: &Window, mask: Option<&LabelMask>) -> Vec<Prediction> {
        self.inner.predict_top2(vector, mask)
    }

    fn add_instance(&mut self, instance: Instance<Window>) {
        self.added.push(instance);
    }
}

impl OnlineModel<Window> for RecordingModel {
    fn update(&mut self, instances: &[Instance<Window>]) {
        self.updates.push(instances.iter().map(|i| i.label.clone()).collect());
    }
}
