use serde::Serialize;

use super::label::{ArcType, ListAction, TransitionLabel};
use crate::model::Classifier;

/// A set of positions into a classifier's label inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelMask(Vec<usize>);

impl LabelMask {
    /// Create a mask from label positions.
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Label positions in this mask.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Whether `index` is in the mask.
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    /// Number of labels in the mask.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mask admits no label at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<usize> for LabelMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which kinds of move a parser state currently admits.
///
/// Shift and pass moves without an arc are always legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalMoves {
    /// A left arc (input heads stack top) is legal.
    pub left: bool,
    /// A right arc (stack top heads input) is legal.
    pub right: bool,
    /// A reduce without an arc is legal (the stack top already has a head).
    pub reduce: bool,
}

impl LegalMoves {
    /// Every move is legal.
    pub const ALL: Self = Self {
        left: true,
        right: true,
        reduce: true,
    };

    /// Whether nothing is ruled out.
    pub fn is_unrestricted(self) -> bool {
        self == Self::ALL
    }

    /// Whether `label` is legal under these moves.
    pub fn permits(self, label: &TransitionLabel) -> bool {
        match label.arc {
            ArcType::Left => self.left,
            ArcType::Right => self.right,
            ArcType::NoArc => label.list != ListAction::Reduce || self.reduce,
        }
    }

    fn slot(self) -> usize {
        usize::from(self.left) | usize::from(self.right) << 1 | usize::from(self.reduce) << 2
    }

    fn from_slot(slot: usize) -> Self {
        Self {
            left: slot & 1 != 0,
            right: slot & 2 != 0,
            reduce: slot & 4 != 0,
        }
    }
}

/// Pre-computed masks over a classifier's labels, built once per model
/// inventory and consulted at every inference step.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    left: LabelMask,
    right: LabelMask,
    legal: [LabelMask; 8],
}

impl LabelIndex {
    /// Partition the model's label inventory.
    pub fn new<V, M>(model: &M) -> Self
    where
        M: Classifier<V> + ?Sized,
    {
        let labels = model.labels();
        let select = |keep: &dyn Fn(&TransitionLabel) -> bool| {
            let subset: Vec<TransitionLabel> = labels.iter().filter(|&l| keep(l)).cloned().collect();
            model.labels_to_indices(&subset)
        };

        Self {
            left: select(&|l: &TransitionLabel| l.arc == ArcType::Left),
            right: select(&|l: &TransitionLabel| l.arc == ArcType::Right),
            legal: std::array::from_fn(|slot| {
                let moves = LegalMoves::from_slot(slot);
                select(&|l: &TransitionLabel| moves.permits(l))
            }),
        }
    }

    /// All left-arc labels.
    pub fn left_arcs(&self) -> &LabelMask {
        &self.left
    }

    /// All right-arc labels.
    pub fn right_arcs(&self) -> &LabelMask {
        &self.right
    }

    /// The mask for `moves`, or `None` when every label is legal.
    pub fn mask_for(&self, moves: LegalMoves) -> Option<&LabelMask> {
        (!moves.is_unrestricted()).then(|| &self.legal[moves.slot()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Instance, Prediction};

    struct Inventory(Vec<TransitionLabel>);

    impl Classifier<()> for Inventory {
        fn labels(&self) -> Vec<TransitionLabel> {
            self.0.clone()
        }

        fn predict_top2(&self, _: &(), _: Option<&LabelMask>) -> Vec<Prediction> {
            Vec::new()
        }

        fn add_instance(&mut self, _: Instance<()>) {}
    }

    fn inventory() -> Inventory {
        Inventory(vec![
            TransitionLabel::no_arc(ListAction::Shift),
            TransitionLabel::no_arc(ListAction::Reduce),
            TransitionLabel::no_arc(ListAction::Pass),
            TransitionLabel::left(ListAction::Reduce, "nsubj"),
            TransitionLabel::left(ListAction::Pass, "nsubj"),
            TransitionLabel::right(ListAction::Shift, "dobj"),
            TransitionLabel::right(ListAction::Pass, "dobj"),
        ])
    }

    #[test]
    fn partitions_arc_labels() {
        let index = LabelIndex::new::<(), _>(&inventory());
        assert_eq!(index.left_arcs().indices(), &[3, 4]);
        assert_eq!(index.right_arcs().indices(), &[5, 6]);
    }

    #[test]
    fn unrestricted_state_has_no_mask() {
        let index = LabelIndex::new::<(), _>(&inventory());
        assert!(index.mask_for(LegalMoves::ALL).is_none());
    }

    #[test]
    fn masks_drop_illegal_moves() {
        let index = LabelIndex::new::<(), _>(&inventory());
        let only_shift_pass = LegalMoves {
            left: false,
            right: false,
            reduce: false,
        };
        assert_eq!(
            index.mask_for(only_shift_pass).unwrap().indices(),
            &[0, 2]
        );

        let no_left = LegalMoves {
            left: false,
            right: true,
            reduce: true,
        };
        assert_eq!(index.mask_for(no_left).unwrap().indices(), &[0, 1, 2, 5, 6]);
    }

    #[test]
    fn slots_round_trip() {
        for slot in 0..8 {
            assert_eq!(LegalMoves::from_slot(slot).slot(), slot);
        }
    }
}
