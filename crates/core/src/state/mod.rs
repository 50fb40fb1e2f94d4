//! Parser configuration for one sentence: stack, buffer cursor,
//! intermediate queue, secondary-head candidates and transition history.
//!
//! The state borrows its [`Tree`] mutably for its whole life. Heads are
//! written straight into the tree, so the tree is the single source of truth
//! for attachments; the state only tracks which node sits where.

mod feature;
mod history;
mod oracle;

pub use feature::{FeatureSource, FeatureToken, NodeRelation};
pub use history::TransitionRecord;
pub use oracle::{OracleReplay, replay_oracle};

use arcparse_config::ParserConfig;
use serde::Serialize;
use tracing::trace;

use crate::model::Prediction;
use crate::transition::{ArcType, LabelIndex, LabelMask, LegalMoves, ListAction, TransitionLabel};
use crate::tree::{HeadSnapshot, Tree};

/// An alternative head proposed by a close runner-up prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryHead {
    /// Proposed head position.
    pub head: usize,
    /// Relation the runner-up label carried.
    pub relation: String,
    /// Score of the runner-up prediction.
    pub score: f64,
}

/// The mutable configuration of the transition system for one sentence.
pub struct ParserState<'a> {
    tree: &'a mut Tree,
    config: &'a ParserConfig,
    stack: Vec<usize>,
    queue: Vec<usize>,
    cursor: usize,
    gold: Option<HeadSnapshot>,
    secondary_heads: Vec<Vec<SecondaryHead>>,
    history: Vec<TransitionRecord>,
}

impl<'a> ParserState<'a> {
    /// Create a state for decoding. Heads already present on the tree are
    /// kept and respected; no oracle is available.
    pub fn new(tree: &'a mut Tree, config: &'a ParserConfig) -> Self {
        let size = tree.len();
        let mut state = Self {
            tree,
            config,
            stack: Vec::with_capacity(size),
            queue: Vec::new(),
            cursor: 0,
            gold: None,
            secondary_heads: vec![Vec::new(); size],
            history: Vec::new(),
        };
        state.shift();
        state
    }

    /// Create a state with an oracle: the tree's heads are captured as the
    /// gold table and then cleared, so feature extraction never sees them.
    pub fn with_oracle(tree: &'a mut Tree, config: &'a ParserConfig) -> Self {
        let gold = tree.heads();
        tree.clear_heads();
        let mut state = Self::new(tree, config);
        state.gold = Some(gold);
        state
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// The tree being parsed.
    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        self.config
    }

    /// Stack contents, bottom first.
    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    /// Intermediate queue contents, oldest first.
    pub fn queue(&self) -> &[usize] {
        &self.queue
    }

    /// Position of the next unconsumed token.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every token has been consumed.
    pub fn is_terminal(&self) -> bool {
        self.cursor >= self.tree.len()
    }

    /// The node on top of the stack.
    ///
    /// # Panics
    /// Panics on an empty stack; between transitions the stack is never
    /// empty, so this signals a transition-system bug.
    pub fn stack_top(&self) -> usize {
        match self.stack.last() {
            Some(&id) => id,
            None => panic!("stack underflow: parser state has an empty stack"),
        }
    }

    /// The node at the cursor.
    pub fn input(&self) -> usize {
        self.cursor
    }

    /// Stack lookup: `k >= 0` counts down from the top (0 is the top),
    /// `k < 0` counts up from the bottom (-1 is the bottom).
    pub fn peek(&self, k: isize) -> Option<usize> {
        peek_list(&self.stack, k)
    }

    /// Intermediate queue lookup, with the same offset convention as
    /// [`peek`](Self::peek); 0 is the most recently passed node.
    pub fn peek_queue(&self, k: isize) -> Option<usize> {
        peek_list(&self.queue, k)
    }

    /// Distance from the stack top to the input, capped at the configured
    /// lookback.
    pub fn distance(&self) -> usize {
        self.cursor
            .saturating_sub(self.stack_top())
            .min(self.config.lookback_cap)
    }

    /// The gold head table, when the state was built with an oracle.
    pub fn gold(&self) -> Option<&HeadSnapshot> {
        self.gold.as_ref()
    }

    /// Put the gold heads back onto the tree.
    pub fn reset_oracle(&mut self) {
        if let Some(gold) = &self.gold {
            self.tree.restore_heads(gold);
        }
    }

    /// Secondary-head candidates recorded for `id`.
    pub fn secondary_heads(&self, id: usize) -> &[SecondaryHead] {
        self.secondary_heads.get(id).map_or(&[], Vec::as_slice)
    }

    /// Record a secondary-head candidate for `id`.
    pub fn add_secondary_head(&mut self, id: usize, candidate: SecondaryHead) {
        if let Some(list) = self.secondary_heads.get_mut(id) {
            list.push(candidate);
        }
    }

    /// Transitions applied so far (empty when history is disabled).
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// History as tab-separated lines: label, stack, queue, cursor.
    pub fn history_text(&self) -> String {
        self.history.iter().map(|r| format!("{r}\n")).collect()
    }

    /// Consume the state, keeping only its history.
    pub fn into_history(self) -> Vec<TransitionRecord> {
        self.history
    }

    // ── Legality ────────────────────────────────────────────────────────

    /// Whether `head` may become the head of `dependent` without breaking
    /// the single-head or acyclicity invariants.
    pub fn can_attach(&self, dependent: usize, head: usize) -> bool {
        dependent != 0
            && dependent != head
            && !self.tree.has_head(dependent)
            && !self.tree.is_descendant_of(head, dependent)
    }

    /// Which moves the current configuration admits.
    pub fn legal_moves(&self) -> LegalMoves {
        let s = self.stack_top();
        let b = self.cursor;
        LegalMoves {
            left: self.can_attach(s, b),
            right: self.can_attach(b, s),
            reduce: self.tree.has_head(s),
        }
    }

    /// The label mask for the current configuration, or `None` when every
    /// label is legal.
    pub fn legal_mask<'i>(&self, index: &'i LabelIndex) -> Option<&'i LabelMask> {
        index.mask_for(self.legal_moves())
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Apply `label` to the configuration.
    ///
    /// An arc that would give a node a second head, attach the root, or close
    /// a cycle is ignored and the move becomes a pass; so is a no-arc reduce
    /// of a headless stack top. A stack left empty is refilled by a shift.
    ///
    /// # Panics
    /// Panics if the state is already terminal.
    pub fn apply_transition(&mut self, label: &TransitionLabel) {
        assert!(
            !self.is_terminal(),
            "no transition applies: cursor {} is past the last token",
            self.cursor
        );
        let s = self.stack_top();
        let b = self.cursor;
        if self.config.record_history {
            self.history.push(TransitionRecord {
                label: label.clone(),
                stack: self.stack.clone(),
                queue: self.queue.clone(),
                cursor: self.cursor,
            });
        }

        match label.arc {
            ArcType::Left if self.can_attach(s, b) => {
                self.tree.set_head(s, b, label.relation.clone());
                match label.list {
                    ListAction::Reduce => self.reduce(),
                    _ => self.pass(),
                }
            }
            ArcType::Right if self.can_attach(b, s) => {
                self.tree.set_head(b, s, label.relation.clone());
                match label.list {
                    ListAction::Shift => self.shift(),
                    _ => self.pass(),
                }
            }
            ArcType::NoArc => match label.list {
                ListAction::Shift => self.shift(),
                ListAction::Reduce if self.tree.has_head(s) => self.reduce(),
                ListAction::Reduce => {
                    trace!(stack = s, "reduce of a headless node, passing instead");
                    self.pass();
                }
                ListAction::Pass => self.pass(),
            },
            _ => {
                trace!(%label, stack = s, input = b, "illegal arc, passing instead");
                self.pass();
            }
        }

        if self.stack.is_empty() {
            self.shift();
        }
    }

    fn shift(&mut self) {
        if !self.queue.is_empty() {
            self.stack.extend(self.queue.drain(..).rev());
        }
        if self.cursor < self.tree.len() {
            self.stack.push(self.cursor);
            self.cursor += 1;
        }
    }

    fn reduce(&mut self) {
        self.stack.pop();
    }

    fn pass(&mut self) {
        if let Some(id) = self.stack.pop() {
            self.queue.push(id);
        }
    }

    // ── Secondary heads and repair support ──────────────────────────────

    /// Keep close runner-ups of a no-arc decision as secondary-head
    /// candidates for whichever of the stack top and input still lacks a head.
    ///
    /// `predictions` must be ordered by descending score. Runner-ups are
    /// considered while `best - runner < margin`.
    pub fn save_secondary_heads(&mut self, predictions: &[Prediction]) {
        let Some((best, rest)) = predictions.split_first() else {
            return;
        };
        let s = self.stack_top();
        let b = self.cursor;

        for p in rest {
            if best.score - p.score >= self.config.margin {
                break;
            }
            match p.label.arc {
                ArcType::Left if s != 0 && !self.tree.has_head(s) => {
                    self.add_secondary_head(
                        s,
                        SecondaryHead {
                            head: b,
                            relation: p.label.relation.clone(),
                            score: p.score,
                        },
                    );
                }
                ArcType::Right if !self.tree.has_head(b) => {
                    self.add_secondary_head(
                        b,
                        SecondaryHead {
                            head: s,
                            relation: p.label.relation.clone(),
                            score: p.score,
                        },
                    );
                }
                _ => {}
            }
        }
    }

    /// Attach `id` to its best-scoring secondary candidate that would not
    /// create a cycle. Returns whether a candidate was accepted.
    pub fn accept_secondary_head(&mut self, id: usize) -> bool {
        let mut candidates: Vec<&SecondaryHead> = self.secondary_heads(id).iter().collect();
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let choice = candidates
            .into_iter()
            .find(|c| c.head != id && c.head < self.tree.len() && !self.tree.is_descendant_of(c.head, id))
            .map(|c| (c.head, c.relation.clone()));

        match choice {
            Some((head, relation)) => {
                self.tree.set_head(id, head, relation);
                true
            }
            None => false,
        }
    }

    /// Point the state at an arbitrary `(stack top, input)` pair so features
    /// can be extracted for it. Used by headless repair once parsing is over.
    pub fn reset_window(&mut self, stack: usize, input: usize) {
        self.stack.clear();
        self.stack.push(stack);
        self.queue.clear();
        self.cursor = input;
    }

    pub(crate) fn attach(&mut self, dependent: usize, head: usize, relation: String) {
        self.tree.set_head(dependent, head, relation);
    }
}

fn peek_list(list: &[usize], k: isize) -> Option<usize> {
    if k >= 0 {
        let k = k.unsigned_abs();
        list.len().checked_sub(k + 1).map(|i| list[i])
    } else {
        list.get(k.unsigned_abs() - 1).copied()
    }
}
