//! Headless repair after decoding.

mod common;

use arcparse_core::{ArcType, ListAction, Parser, ParserConfig, Tree, TransitionLabel};
use common::{Phase, ScriptedModel, Window, WindowExtractor, assert_well_formed, inventory};

/// Always shifts while parsing. Two runner-ups are close enough to be kept
/// as secondary heads for node 2: head 1 at 0.9 and head 3 at 0.95. When
/// rescoring, only `dep` arcs score, and closer heads score higher.
fn script(w: &Window, l: &TransitionLabel, phase: Phase) -> f64 {
    let gap = w.input.abs_diff(w.stack) as f64;
    let window = (w.stack, w.input);
    match (phase, l.arc, l.list, l.relation.as_str()) {
        (_, ArcType::NoArc, ListAction::Shift, _) => 1.0,
        (_, ArcType::NoArc, _, _) => 0.0,
        (Phase::Parse, ArcType::Right, ListAction::Shift, "low") if window == (1, 2) => 0.9,
        (Phase::Parse, ArcType::Left, ListAction::Reduce, "high") if window == (2, 3) => 0.95,
        (Phase::Rescore, _, _, "dep") => 5.0 - gap,
        _ => -100.0,
    }
}

fn model() -> ScriptedModel<fn(&Window, &TransitionLabel, Phase) -> f64> {
    ScriptedModel {
        labels: inventory(&["dep", "low", "high"]),
        script,
    }
}

#[test]
fn highest_scoring_secondary_head_wins() {
    let parser = Parser::new(ParserConfig::default(), WindowExtractor);
    let mut tree = Tree::from_tokens(["a", "b", "c", "d"]);

    let outcome = parser.decode(&mut tree, &model());
    assert_eq!(outcome.steps, 4);
    assert_eq!(outcome.repaired, 4);

    // 0.95 beats both the 0.9 candidate and the nearest rescored head (1).
    assert_eq!(tree.head_id(2), Some(3));
    assert_eq!(tree.head(2).map(|a| a.label.as_str()), Some("high"));

    // Rescored nodes take the closest non-descendant, leftward first on ties.
    assert_eq!(tree.head_id(1), Some(0));
    assert_eq!(tree.head_id(3), Some(4));
    assert_eq!(tree.head_id(4), Some(1));
    assert_eq!(tree.head(4).map(|a| a.label.as_str()), Some("dep"));
    assert_well_formed(&tree);
}

#[test]
fn margin_controls_which_runner_ups_are_kept() {
    let config = ParserConfig {
        margin: 0.07,
        ..ParserConfig::default()
    };
    let parser = Parser::new(config, WindowExtractor);
    let mut tree = Tree::from_tokens(["a", "b", "c", "d"]);
    parser.decode(&mut tree, &model());
    assert_eq!(tree.head_id(2), Some(3));

    let config = ParserConfig {
        margin: 0.01,
        ..ParserConfig::default()
    };
    let parser = Parser::new(config, WindowExtractor);
    let mut tree = Tree::from_tokens(["a", "b", "c", "d"]);
    parser.decode(&mut tree, &model());
    // No secondary heads: node 2 is rescored and takes its left neighbour.
    assert_eq!(tree.head_id(2), Some(1));
    assert_eq!(tree.head(2).map(|a| a.label.as_str()), Some("dep"));
}

#[test]
fn nodes_without_candidates_go_to_root_label() {
    let config = ParserConfig {
        root_label: "ROOT".into(),
        ..ParserConfig::default()
    };
    let parser = Parser::new(config, WindowExtractor);
    // Only no-arc labels, so repair has nothing to score.
    let model = ScriptedModel {
        labels: inventory(&[]),
        script: |_: &Window, l: &TransitionLabel, _: Phase| {
            if l.list == ListAction::Shift { 1.0 } else { 0.0 }
        },
    };
    let mut tree = Tree::from_tokens(["a", "b"]);
    parser.decode(&mut tree, &model);
    assert_eq!(tree.roots(), vec![1, 2]);
    assert_eq!(tree.head(1).map(|a| a.label.as_str()), Some("ROOT"));
}
