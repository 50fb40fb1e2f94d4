//! Error types for the parser core.
//!
//! Structural misuse of a [`Tree`](crate::tree::Tree) through the panicking
//! API is a programming error; the `try_*` counterparts and the decoders
//! below report through these enums instead.

use thiserror::Error;

/// Errors raised by fallible tree mutation and tree deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TreeError {
    /// Insert position outside `1..=len`.
    #[error("cannot insert at position {position} in a tree of size {len}")]
    InsertOutOfRange {
        /// Requested position.
        position: usize,
        /// Tree size including the root.
        len: usize,
    },

    /// Remove position outside `1..len`.
    #[error("cannot remove position {position} from a tree of size {len}")]
    RemoveOutOfRange {
        /// Requested position.
        position: usize,
        /// Tree size including the root.
        len: usize,
    },

    /// A deserialized node list does not describe a tree.
    #[error("malformed tree at node {id}: {reason}")]
    Malformed {
        /// Offending node position.
        id: usize,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors raised when decoding a [`TransitionLabel`](crate::transition::TransitionLabel)
/// from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LabelError {
    /// Fewer than three `_`-separated fields.
    #[error("label {0:?} is not of the form <arc>_<list>_<relation>")]
    Shape(String),

    /// Unknown arc code.
    #[error("unknown arc code {0:?} (expected L, R or N)")]
    Arc(String),

    /// Unknown list-action code.
    #[error("unknown list action {0:?} (expected S, R or P)")]
    List(String),

    /// A no-arc label carrying a relation.
    #[error("no-arc label {0:?} must not carry a relation")]
    RelationOnNoArc(String),
}
