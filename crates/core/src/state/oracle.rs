use arcparse_config::ParserConfig;
use serde::Serialize;
use tracing::warn;

use super::{ParserState, TransitionRecord};
use crate::transition::{ListAction, TransitionLabel};
use crate::tree::{HeadSnapshot, Tree};

impl ParserState<'_> {
    /// The correct transition for the current configuration, or `None` when
    /// the state has no oracle.
    ///
    /// Checks run in a fixed order: left arc, right arc, shift, reduce, pass.
    pub fn gold_label(&self) -> Option<TransitionLabel> {
        let gold = self.gold()?;
        let s = self.stack_top();
        let b = self.cursor();
        let label = if gold.head_id(s) == Some(b) {
            let relation = gold.get(s).map(|a| a.label.clone()).unwrap_or_default();
            let list = if self.is_gold_reduce(true) {
                ListAction::Reduce
            } else {
                ListAction::Pass
            };
            TransitionLabel::left(list, relation)
        } else if gold.head_id(b) == Some(s) {
            let relation = gold.get(b).map(|a| a.label.clone()).unwrap_or_default();
            let list = if self.is_gold_shift() {
                ListAction::Shift
            } else {
                ListAction::Pass
            };
            TransitionLabel::right(list, relation)
        } else if self.is_gold_shift() {
            TransitionLabel::no_arc(ListAction::Shift)
        } else if self.is_gold_reduce(false) {
            TransitionLabel::no_arc(ListAction::Reduce)
        } else {
            TransitionLabel::no_arc(ListAction::Pass)
        };
        Some(label)
    }

    /// Whether consuming the input now is consistent with the gold tree.
    ///
    /// False when the input's gold head lies left of the stack top, or when a
    /// node below the stack top still waits for the input as its head.
    /// Always false without an oracle.
    pub fn is_gold_shift(&self) -> bool {
        let Some(gold) = self.gold() else {
            return false;
        };
        let s = self.stack_top();
        let b = self.cursor();
        if gold.head_id(b).is_some_and(|h| h < s) {
            return false;
        }
        let below_top = &self.stack()[..self.stack().len() - 1];
        !below_top.iter().any(|&id| gold.head_id(id) == Some(b))
    }

    /// Whether popping the stack top is consistent with the gold tree.
    ///
    /// `has_head` says whether the move being considered attaches the stack
    /// top itself. False when the stack top would leave headless, or when a
    /// node after the input still takes the stack top as its gold head.
    /// Always false without an oracle.
    pub fn is_gold_reduce(&self, has_head: bool) -> bool {
        let Some(gold) = self.gold() else {
            return false;
        };
        let s = self.stack_top();
        if !has_head && !self.tree().has_head(s) {
            return false;
        }
        !(self.cursor() + 1..gold.len()).any(|id| gold.head_id(id) == Some(s))
    }
}

/// What a pure oracle run over one gold tree produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleReplay {
    /// Labels chosen, in order.
    pub labels: Vec<TransitionLabel>,
    /// Heads the transitions built.
    pub heads: HeadSnapshot,
    /// Heads of the input tree.
    pub gold: HeadSnapshot,
    /// Transitions applied.
    pub steps: usize,
    /// Whether the step ceiling cut the run short.
    pub truncated: bool,
    /// Per-step configurations, when history is enabled.
    pub history: Vec<TransitionRecord>,
}

impl OracleReplay {
    /// Whether the replay rebuilt every gold arc and nothing else.
    pub fn reproduces_gold(&self) -> bool {
        self.heads == self.gold
    }

    /// Positions whose built arc differs from the gold arc.
    pub fn mismatches(&self) -> Vec<usize> {
        (1..self.gold.len().max(self.heads.len()))
            .filter(|&id| self.heads.get(id) != self.gold.get(id))
            .collect()
    }
}

/// Drive the transition system with oracle labels only and report what it
/// built. The tree's heads are left as they were.
pub fn replay_oracle(tree: &mut Tree, config: &ParserConfig) -> OracleReplay {
    let ceiling = config.step_ceiling(tree.len());
    let mut state = ParserState::with_oracle(tree, config);
    let mut labels = Vec::new();
    let mut truncated = false;

    while !state.is_terminal() {
        if labels.len() >= ceiling {
            warn!(steps = labels.len(), "oracle replay hit the step ceiling");
            truncated = true;
            break;
        }
        let Some(label) = state.gold_label() else {
            break;
        };
        state.apply_transition(&label);
        labels.push(label);
    }

    let heads = state.tree().heads();
    let gold = state.gold().cloned().unwrap_or_default();
    state.reset_oracle();
    OracleReplay {
        steps: labels.len(),
        labels,
        heads,
        gold,
        truncated,
        history: state.into_history(),
    }
}
