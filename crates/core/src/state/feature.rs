use serde::{Deserialize, Serialize};

use super::ParserState;

/// Where a feature template looks for its node.
///
/// Offsets follow [`ParserState::peek`]: non-negative offsets count from the
/// near end (stack top, cursor, most recently passed), negative ones from
/// the far end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "offset", rename_all = "lowercase")]
pub enum FeatureSource {
    /// Stack, 0 is the top.
    Stack(isize),
    /// Unconsumed input, 0 is the cursor, negative looks behind it.
    Buffer(isize),
    /// Intermediate queue, 0 is the most recently passed node.
    Queue(isize),
}

/// A structural step from a resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRelation {
    /// The node's current head.
    Head,
    /// Its leftmost dependent to the left.
    LeftmostDependent,
    /// Its rightmost dependent to the right.
    RightmostDependent,
}

/// A source plus an optional relation, e.g. "head of the stack top".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureToken {
    /// Base node.
    pub source: FeatureSource,
    /// Step taken from the base node.
    pub relation: Option<NodeRelation>,
}

impl FeatureToken {
    /// A token reading the base node directly.
    pub fn new(source: FeatureSource) -> Self {
        Self {
            source,
            relation: None,
        }
    }

    /// A token following `relation` from the base node.
    pub fn with_relation(source: FeatureSource, relation: NodeRelation) -> Self {
        Self {
            source,
            relation: Some(relation),
        }
    }
}

impl ParserState<'_> {
    /// Resolve a feature source to a node position, if one exists there.
    pub fn resolve(&self, source: FeatureSource) -> Option<usize> {
        match source {
            FeatureSource::Stack(k) => self.peek(k),
            FeatureSource::Queue(k) => self.peek_queue(k),
            FeatureSource::Buffer(k) => {
                let id = self.cursor().checked_add_signed(k)?;
                (id < self.tree().len()).then_some(id)
            }
        }
    }

    /// Resolve a full feature token.
    pub fn resolve_token(&self, token: FeatureToken) -> Option<usize> {
        let id = self.resolve(token.source)?;
        match token.relation {
            None => Some(id),
            Some(NodeRelation::Head) => self.tree().head_id(id),
            Some(NodeRelation::LeftmostDependent) => self.tree().leftmost_dependent(id),
            Some(NodeRelation::RightmostDependent) => self.tree().rightmost_dependent(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::{ListAction, TransitionLabel};
    use crate::tree::Tree;
    use arcparse_config::ParserConfig;

    #[test]
    fn sources_resolve_against_state() {
        let mut tree = Tree::from_tokens(["the", "big", "dog", "barked"]);
        let config = ParserConfig::default();
        let mut state = ParserState::new(&mut tree, &config);
        state.apply_transition(&TransitionLabel::no_arc(ListAction::Shift));
        state.apply_transition(&TransitionLabel::no_arc(ListAction::Shift));
        state.apply_transition(&TransitionLabel::no_arc(ListAction::Pass));
        // stack [0, 1], queue [2], cursor 3

        assert_eq!(state.resolve(FeatureSource::Stack(0)), Some(1));
        assert_eq!(state.resolve(FeatureSource::Stack(-1)), Some(0));
        assert_eq!(state.resolve(FeatureSource::Queue(0)), Some(2));
        assert_eq!(state.resolve(FeatureSource::Buffer(0)), Some(3));
        assert_eq!(state.resolve(FeatureSource::Buffer(1)), Some(4));
        assert_eq!(state.resolve(FeatureSource::Buffer(2)), None);
        assert_eq!(state.resolve(FeatureSource::Buffer(-1)), Some(2));
        assert_eq!(state.resolve(FeatureSource::Buffer(-4)), None);
    }

    #[test]
    fn relations_follow_current_arcs() {
        let mut tree = Tree::from_tokens(["the", "big", "dog"]);
        tree.set_head(1, 3, "det");
        tree.set_head(2, 3, "amod");
        let config = ParserConfig::default();
        let mut state = ParserState::new(&mut tree, &config);
        state.reset_window(3, 3);

        let stack_top = FeatureSource::Stack(0);
        assert_eq!(
            state.resolve_token(FeatureToken::with_relation(stack_top, NodeRelation::LeftmostDependent)),
            Some(1)
        );
        assert_eq!(
            state.resolve_token(FeatureToken::with_relation(stack_top, NodeRelation::RightmostDependent)),
            None
        );
        assert_eq!(
            state.resolve_token(FeatureToken::with_relation(FeatureSource::Queue(0), NodeRelation::Head)),
            None
        );
        assert_eq!(state.resolve_token(FeatureToken::new(stack_top)), Some(3));
    }

    #[test]
    fn tokens_serialize_compactly() {
        let token = FeatureToken::with_relation(FeatureSource::Stack(1), NodeRelation::Head);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"source":{"kind":"stack","offset":1},"relation":"head"}"#);

        let back: FeatureToken =
            serde_json::from_str(r#"{"source":{"kind":"queue","offset":-2},"relation":null}"#).unwrap();
        assert_eq!(back, FeatureToken::new(FeatureSource::Queue(-2)));
    }
}
