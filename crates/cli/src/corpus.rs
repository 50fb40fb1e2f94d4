//! JSON gold corpora: an array of sentences, each an array of tokens.
//!
//! ```json
//! [[{"form": "Dogs", "pos": "NNS", "head": 2, "deprel": "nsubj"},
//!   {"form": "bark", "pos": "VBP", "head": 0, "deprel": "root"}]]
//! ```
//!
//! `head` counts tokens from 1; 0 is the artificial root.

use anyhow::{Context, Result, bail};
use arcparse_core::{Node, Tree};
use serde::Deserialize;

/// One token of a gold sentence.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CorpusToken {
    pub(crate) form: String,
    #[serde(default)]
    pub(crate) lemma: Option<String>,
    #[serde(default)]
    pub(crate) pos: Option<String>,
    pub(crate) head: usize,
    pub(crate) deprel: String,
}

/// Parse a corpus into gold trees.
pub(crate) fn parse_corpus(source: &str) -> serde_json::Result<Vec<Vec<CorpusToken>>> {
    serde_json::from_str(source)
}

/// Build a gold tree, rejecting heads outside the sentence, self-loops and
/// cyclic head chains.
pub(crate) fn to_tree(sentence: usize, tokens: &[CorpusToken]) -> Result<Tree> {
    let mut nodes = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let id = i + 1;
        if token.head > tokens.len() {
            bail!(
                "sentence {sentence}, token {id} ({:?}): head {} is outside a sentence of {} tokens",
                token.form,
                token.head,
                tokens.len()
            );
        }
        if token.head == id {
            bail!("sentence {sentence}, token {id} ({:?}): token is its own head", token.form);
        }
        let lemma = token.lemma.clone().unwrap_or_else(|| token.form.to_lowercase());
        let pos = token.pos.clone().unwrap_or_default();
        nodes.push(Node::new(token.form.clone(), lemma, pos).with_head(token.head, token.deprel.clone()));
    }
    Tree::try_from_nodes(nodes).with_context(|| format!("sentence {sentence}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[[
        {"form": "Dogs", "pos": "NNS", "head": 2, "deprel": "nsubj"},
        {"form": "bark", "head": 0, "deprel": "root"}
    ]]"#;

    #[test]
    fn builds_gold_tree() {
        let corpus = parse_corpus(SAMPLE).unwrap();
        let tree = to_tree(1, &corpus[0]).unwrap();
        assert_eq!(tree.token_count(), 2);
        assert_eq!(tree.head_id(1), Some(2));
        assert_eq!(tree.node(1).lemma, "dogs");
        assert_eq!(tree.node(1).pos, "NNS");
        assert_eq!(tree.roots(), vec![2]);
    }

    #[test]
    fn rejects_out_of_range_head() {
        let corpus = parse_corpus(r#"[[{"form": "x", "head": 5, "deprel": "dep"}]]"#).unwrap();
        let err = to_tree(3, &corpus[0]).unwrap_err();
        assert!(err.to_string().contains("sentence 3, token 1"));
        assert!(err.to_string().contains("head 5"));
    }

    #[test]
    fn rejects_self_loop() {
        let corpus = parse_corpus(r#"[[{"form": "x", "head": 1, "deprel": "dep"}]]"#).unwrap();
        assert!(to_tree(1, &corpus[0]).is_err());
    }

    #[test]
    fn rejects_cyclic_heads() {
        let corpus = parse_corpus(
            r#"[[
                {"form": "a", "head": 2, "deprel": "x"},
                {"form": "b", "head": 1, "deprel": "x"},
                {"form": "c", "head": 0, "deprel": "root"}
            ]]"#,
        )
        .unwrap();
        let err = to_tree(2, &corpus[0]).unwrap_err();
        assert!(format!("{err:#}").contains("cycle"), "{err:#}");
        assert!(err.to_string().contains("sentence 2"));
    }

    #[test]
    fn missing_fields_are_json_errors() {
        assert!(parse_corpus(r#"[[{"form": "x"}]]"#).is_err());
    }
}
