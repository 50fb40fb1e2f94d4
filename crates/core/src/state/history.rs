use std::fmt;

use serde::Serialize;

use crate::transition::TransitionLabel;

/// One applied transition and the configuration it was applied to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    /// The label as chosen (before any fallback to pass).
    pub label: TransitionLabel,
    /// Stack before the move, bottom first.
    pub stack: Vec<usize>,
    /// Intermediate queue before the move.
    pub queue: Vec<usize>,
    /// Cursor before the move.
    pub cursor: usize,
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{:?}\t{:?}\t{}",
            self.label, self.stack, self.queue, self.cursor
        )
    }
}
