/// Transition labels and their string form.
pub mod label;
/// Label masks restricting predictions to legal moves.
pub mod index;

pub use index::{LabelIndex, LabelMask, LegalMoves};
pub use label::{ArcType, LABEL_DELIM, ListAction, TransitionLabel};
