use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LabelError;

/// Separator between the three fields of a label's string form.
pub const LABEL_DELIM: char = '_';

/// Direction of the arc a transition adds between the stack top and the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcType {
    /// The input becomes the head of the stack top.
    Left,
    /// The stack top becomes the head of the input.
    Right,
    /// No arc.
    NoArc,
}

impl ArcType {
    /// One-letter code used in the label string form.
    pub fn code(self) -> &'static str {
        match self {
            ArcType::Left => "L",
            ArcType::Right => "R",
            ArcType::NoArc => "N",
        }
    }
}

/// What happens to the stack top / input after the arc is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListAction {
    /// Consume the input onto the stack (draining the intermediate queue first).
    Shift,
    /// Pop the stack top.
    Reduce,
    /// Move the stack top to the intermediate queue.
    Pass,
}

impl ListAction {
    /// One-letter code used in the label string form.
    pub fn code(self) -> &'static str {
        match self {
            ListAction::Shift => "S",
            ListAction::Reduce => "R",
            ListAction::Pass => "P",
        }
    }
}

/// The decision applied at one parsing step.
///
/// The string form is `<arc>_<list>_<relation>`, e.g. `L_R_nsubj` or `N_S_`.
/// The relation is everything after the second separator, so it may itself
/// contain `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionLabel {
    /// Arc direction.
    pub arc: ArcType,
    /// List action.
    pub list: ListAction,
    /// Dependency relation; empty for [`ArcType::NoArc`].
    pub relation: String,
}

impl TransitionLabel {
    /// A left arc (input heads stack top) followed by `list`.
    pub fn left(list: ListAction, relation: impl Into<String>) -> Self {
        Self {
            arc: ArcType::Left,
            list,
            relation: relation.into(),
        }
    }

    /// A right arc (stack top heads input) followed by `list`.
    pub fn right(list: ListAction, relation: impl Into<String>) -> Self {
        Self {
            arc: ArcType::Right,
            list,
            relation: relation.into(),
        }
    }

    /// A move without an arc.
    pub fn no_arc(list: ListAction) -> Self {
        Self {
            arc: ArcType::NoArc,
            list,
            relation: String::new(),
        }
    }

    /// Whether the label carries the given arc direction.
    pub fn is_arc(&self, arc: ArcType) -> bool {
        self.arc == arc
    }

    /// Whether the label carries the given list action.
    pub fn is_list(&self, list: ListAction) -> bool {
        self.list == list
    }
}

impl fmt::Display for TransitionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{LABEL_DELIM}{}{LABEL_DELIM}{}",
            self.arc.code(),
            self.list.code(),
            self.relation
        )
    }
}

impl FromStr for TransitionLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, LABEL_DELIM);
        let (Some(arc), Some(list), Some(relation)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(LabelError::Shape(s.to_string()));
        };

        let arc = match arc {
            "L" => ArcType::Left,
            "R" => ArcType::Right,
            "N" => ArcType::NoArc,
            other => return Err(LabelError::Arc(other.to_string())),
        };
        let list = match list {
            "S" => ListAction::Shift,
            "R" => ListAction::Reduce,
            "P" => ListAction::Pass,
            other => return Err(LabelError::List(other.to_string())),
        };
        if arc == ArcType::NoArc && !relation.is_empty() {
            return Err(LabelError::RelationOnNoArc(s.to_string()));
        }

        Ok(Self {
            arc,
            list,
            relation: relation.to_string(),
        })
    }
}
