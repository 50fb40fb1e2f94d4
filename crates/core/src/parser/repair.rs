use tracing::trace;

use crate::model::{Classifier, FeatureExtractor};
use crate::state::ParserState;
use crate::transition::LabelIndex;

/// Best head found by scoring candidate windows for one headless node.
struct Candidate {
    head: usize,
    relation: String,
    score: f64,
}

/// Give every headless token a head. Returns how many were attached.
///
/// Per node: accept a secondary head if one is acyclic; otherwise score
/// every non-descendant position with the model (right arcs for positions
/// to the left, left arcs for positions to the right) and keep the best;
/// otherwise attach to the root with the configured root label.
pub(crate) fn repair_headless<F, M>(
    state: &mut ParserState<'_>,
    extractor: &F,
    model: &M,
    index: &LabelIndex,
) -> usize
where
    F: FeatureExtractor,
    M: Classifier<F::Vector> + ?Sized,
{
    let size = state.tree().len();
    let mut repaired = 0;

    for id in 1..size {
        if state.tree().has_head(id) {
            continue;
        }
        repaired += 1;

        if state.accept_secondary_head(id) {
            trace!(id, head = ?state.tree().head_id(id), "attached to secondary head");
            continue;
        }

        match best_candidate(state, extractor, model, index, id) {
            Some(best) => {
                trace!(id, head = best.head, score = best.score, "attached by rescoring");
                state.attach(id, best.head, best.relation);
            }
            None => {
                let label = state.config().root_label.clone();
                trace!(id, "no candidate head, attaching to root");
                state.attach(id, 0, label);
            }
        }
    }
    repaired
}

fn best_candidate<F, M>(
    state: &mut ParserState<'_>,
    extractor: &F,
    model: &M,
    index: &LabelIndex,
    id: usize,
) -> Option<Candidate>
where
    F: FeatureExtractor,
    M: Classifier<F::Vector> + ?Sized,
{
    let size = state.tree().len();
    let mut best: Option<Candidate> = None;
    let mut consider = |candidate: Candidate| {
        if best.as_ref().is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    };

    if !index.right_arcs().is_empty() {
        for head in (0..id).rev() {
            if state.tree().is_descendant_of(head, id) {
                continue;
            }
            state.reset_window(head, id);
            let vector = extractor.extract(state);
            if let Some(p) = model.predict_best(&vector, index.right_arcs()) {
                consider(Candidate {
                    head,
                    relation: p.label.relation,
                    score: p.score,
                });
            }
        }
    }

    if !index.left_arcs().is_empty() {
        for head in id + 1..size {
            if state.tree().is_descendant_of(head, id) {
                continue;
            }
            state.reset_window(id, head);
            let vector = extractor.extract(state);
            if let Some(p) = model.predict_best(&vector, index.left_arcs()) {
                consider(Candidate {
                    head,
                    relation: p.label.relation,
                    score: p.score,
                });
            }
        }
    }

    best
}
