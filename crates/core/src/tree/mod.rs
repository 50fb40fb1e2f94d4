//! Array-backed dependency tree.
//!
//! A [`Tree`] is an arena of [`Node`]s whose position 0 holds an artificial
//! root. Every cross-node relation (heads, parser stack entries, secondary
//! heads) is an integer position into the arena, so a node's `id` always
//! equals its index and insert/remove only have to renumber integers.

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Surface form given to the artificial root node.
pub const ROOT_FORM: &str = "<root>";

/// A head assignment: the governing node and the relation label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadArc {
    /// Position of the head node.
    pub head: usize,
    /// Dependency relation of the dependent to its head.
    pub label: String,
}

impl HeadArc {
    /// Create a head arc.
    pub fn new(head: usize, label: impl Into<String>) -> Self {
        Self {
            head,
            label: label.into(),
        }
    }
}

/// A single token of the sentence (or the artificial root at position 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// 1-based position in the sentence; 0 for the root.
    pub id: usize,
    /// Surface form.
    pub form: String,
    /// Lemma, if the upstream pipeline provided one.
    #[serde(default)]
    pub lemma: String,
    /// Part-of-speech tag, if the upstream pipeline provided one.
    #[serde(default)]
    pub pos: String,
    /// Primary head, absent until assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<HeadArc>,
}

impl Node {
    /// Create an unattached node. Its `id` is assigned when it enters a tree.
    pub fn new(form: impl Into<String>, lemma: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            id: 0,
            form: form.into(),
            lemma: lemma.into(),
            pos: pos.into(),
            head: None,
        }
    }

    /// Create an unattached node that only has a surface form.
    pub fn from_form(form: impl Into<String>) -> Self {
        Self::new(form, "", "")
    }

    /// Builder-style head assignment, for constructing gold trees.
    pub fn with_head(mut self, head: usize, label: impl Into<String>) -> Self {
        self.head = Some(HeadArc::new(head, label));
        self
    }

    /// Whether this node has a primary head.
    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    fn root() -> Self {
        Self::new(ROOT_FORM, ROOT_FORM, ROOT_FORM)
    }
}

/// A copy of every node's head arc, indexed by position.
///
/// Used as the canonical gold table: the parser captures one before hiding
/// gold heads from feature extraction and restores it on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSnapshot(Vec<Option<HeadArc>>);

impl HeadSnapshot {
    /// Build a snapshot from explicit per-position arcs (position 0 is the root).
    pub fn from_arcs(arcs: Vec<Option<HeadArc>>) -> Self {
        Self(arcs)
    }

    /// Number of positions, root included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot covers no positions at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The arc recorded for `id`, if any.
    pub fn get(&self, id: usize) -> Option<&HeadArc> {
        self.0.get(id).and_then(Option::as_ref)
    }

    /// The head position recorded for `id`, if any.
    pub fn head_id(&self, id: usize) -> Option<usize> {
        self.get(id).map(|arc| arc.head)
    }

    /// Iterate `(position, arc)` over every position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&HeadArc>)> {
        self.0.iter().enumerate().map(|(i, a)| (i, a.as_ref()))
    }
}

/// An ordered sequence of nodes beginning with an artificial root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Node>", into = "Vec<Node>")]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the artificial root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }

    /// Create a tree from surface forms, all unattached.
    pub fn from_tokens<I, S>(forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tree = Self::new();
        for form in forms {
            tree.append(Node::from_form(form));
        }
        tree
    }

    /// Create a tree from token nodes (root excluded). Ids are reassigned by
    /// position; head references are kept as given.
    ///
    /// # Panics
    /// Panics if a head reference points outside the tree, or if the heads
    /// form a self-loop or a cycle.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        match Self::try_from_nodes(nodes) {
            Ok(tree) => tree,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible [`from_nodes`](Self::from_nodes).
    pub fn try_from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for node in nodes {
            tree.append(node);
        }
        check_heads(&tree.nodes)?;
        Ok(tree)
    }

    /// Number of nodes, root included (token count + 1).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no tokens besides the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Number of real tokens.
    pub fn token_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// All nodes, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Real tokens in sentence order.
    pub fn tokens(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().skip(1)
    }

    /// The node at `id`.
    ///
    /// # Panics
    /// Panics if `id` is out of range.
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// The node at `id`, if in range.
    pub fn get(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to the node at `id`, if in range. The `id` field must
    /// not be changed through this reference.
    pub fn get_mut(&mut self, id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    // ── Structural mutation ─────────────────────────────────────────────

    /// Append a node at the end of the sentence and return its position.
    pub fn append(&mut self, mut node: Node) -> usize {
        let id = self.nodes.len();
        node.id = id;
        self.nodes.push(node);
        id
    }

    /// Insert `node` at `position`, shifting later ids and every head
    /// reference `>= position` up by one.
    ///
    /// # Panics
    /// Panics if `position` is 0 (the root) or greater than `len()`.
    pub fn insert(&mut self, position: usize, node: Node) {
        if let Err(e) = self.try_insert(position, node) {
            panic!("{e}");
        }
    }

    /// Fallible [`insert`](Self::insert). Also fails, leaving the tree
    /// untouched, if the node's head does not name an existing node.
    pub fn try_insert(&mut self, position: usize, mut node: Node) -> Result<(), TreeError> {
        let len = self.nodes.len();
        if position == 0 || position > len {
            return Err(TreeError::InsertOutOfRange { position, len });
        }
        if let Some(arc) = node.head.as_mut() {
            if arc.head >= position {
                arc.head += 1;
            }
            if arc.head > len {
                return Err(TreeError::Malformed {
                    id: position,
                    reason: format!("head {} is out of range", arc.head),
                });
            }
        }

        for n in &mut self.nodes {
            if let Some(arc) = n.head.as_mut()
                && arc.head >= position
            {
                arc.head += 1;
            }
        }
        self.nodes.insert(position, node);
        self.renumber_from(position);
        Ok(())
    }

    /// Remove and return the node at `position`, shifting later ids and
    /// every head reference `> position` down by one. Dependents of the
    /// removed node lose their head.
    ///
    /// # Panics
    /// Panics if `position` is 0 (the root) or not smaller than `len()`.
    pub fn remove(&mut self, position: usize) -> Node {
        match self.try_remove(position) {
            Ok(node) => node,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible [`remove`](Self::remove).
    pub fn try_remove(&mut self, position: usize) -> Result<Node, TreeError> {
        let len = self.nodes.len();
        if position == 0 || position >= len {
            return Err(TreeError::RemoveOutOfRange { position, len });
        }

        let removed = self.nodes.remove(position);
        for n in &mut self.nodes {
            match n.head.as_ref().map(|arc| arc.head) {
                Some(h) if h == position => n.head = None,
                Some(h) if h > position => {
                    if let Some(arc) = n.head.as_mut() {
                        arc.head -= 1;
                    }
                }
                _ => {}
            }
        }
        self.renumber_from(position);
        Ok(removed)
    }

    fn renumber_from(&mut self, position: usize) {
        for (i, n) in self.nodes.iter_mut().enumerate().skip(position) {
            n.id = i;
        }
    }

    // ── Heads ───────────────────────────────────────────────────────────

    /// The head arc of `id`, if assigned.
    pub fn head(&self, id: usize) -> Option<&HeadArc> {
        self.nodes.get(id).and_then(|n| n.head.as_ref())
    }

    /// The head position of `id`, if assigned.
    pub fn head_id(&self, id: usize) -> Option<usize> {
        self.head(id).map(|arc| arc.head)
    }

    /// Whether `id` has a head.
    pub fn has_head(&self, id: usize) -> bool {
        self.head(id).is_some()
    }

    /// Assign `head` as the head of `dependent`, replacing any previous arc.
    ///
    /// This does not check for cycles; callers that need acyclicity test
    /// [`is_descendant_of`](Self::is_descendant_of) first.
    ///
    /// # Panics
    /// Panics if `dependent` is the root or either position is out of range.
    pub fn set_head(&mut self, dependent: usize, head: usize, label: impl Into<String>) {
        let len = self.nodes.len();
        assert!(
            dependent != 0 && dependent < len && head < len,
            "cannot attach {dependent} to {head} in a tree of size {len}"
        );
        self.nodes[dependent].head = Some(HeadArc::new(head, label));
    }

    /// Remove the head of `id`, if any.
    pub fn clear_head(&mut self, id: usize) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.head = None;
        }
    }

    /// Whether `node` lies strictly below `ancestor` on its head chain.
    ///
    /// The walk is bounded by the tree size, so a malformed (cyclic) input
    /// cannot make it loop.
    pub fn is_descendant_of(&self, node: usize, ancestor: usize) -> bool {
        let mut current = node;
        for _ in 0..self.nodes.len() {
            match self.head_id(current) {
                Some(h) if h == ancestor => return true,
                Some(h) => current = h,
                None => return false,
            }
        }
        false
    }

    /// Positions of all nodes whose head is `id`, ascending.
    pub fn dependents_of(&self, id: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.head.as_ref().is_some_and(|arc| arc.head == id))
            .map(|n| n.id)
            .collect()
    }

    /// Leftmost dependent of `id` that precedes it.
    pub fn leftmost_dependent(&self, id: usize) -> Option<usize> {
        self.nodes[..id.min(self.nodes.len())]
            .iter()
            .find(|n| n.head.as_ref().is_some_and(|arc| arc.head == id))
            .map(|n| n.id)
    }

    /// Rightmost dependent of `id` that follows it.
    pub fn rightmost_dependent(&self, id: usize) -> Option<usize> {
        self.nodes
            .iter()
            .skip(id + 1)
            .rev()
            .find(|n| n.head.as_ref().is_some_and(|arc| arc.head == id))
            .map(|n| n.id)
    }

    /// Nodes attached directly to the artificial root, ordered by position.
    pub fn roots(&self) -> Vec<usize> {
        self.dependents_of(0)
    }

    /// Capture every node's head arc.
    pub fn heads(&self) -> HeadSnapshot {
        HeadSnapshot(self.nodes.iter().map(|n| n.head.clone()).collect())
    }

    /// Put back the arcs captured by [`heads`](Self::heads).
    ///
    /// # Panics
    /// Panics if the snapshot was taken from a tree of a different size.
    pub fn restore_heads(&mut self, snapshot: &HeadSnapshot) {
        assert_eq!(
            snapshot.len(),
            self.nodes.len(),
            "head snapshot size does not match the tree"
        );
        for (node, arc) in self.nodes.iter_mut().zip(&snapshot.0) {
            node.head = arc.clone();
        }
    }

    /// Remove every head.
    pub fn clear_heads(&mut self) {
        for n in &mut self.nodes {
            n.head = None;
        }
    }
}

impl TryFrom<Vec<Node>> for Tree {
    type Error = TreeError;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        let len = nodes.len();
        if len == 0 {
            return Err(TreeError::Malformed {
                id: 0,
                reason: "missing artificial root".into(),
            });
        }
        for (i, n) in nodes.iter().enumerate() {
            if n.id != i {
                return Err(TreeError::Malformed {
                    id: i,
                    reason: format!("id {} does not match its position", n.id),
                });
            }
            if i == 0 && n.head.is_some() {
                return Err(TreeError::Malformed {
                    id: 0,
                    reason: "the root cannot have a head".into(),
                });
            }
        }
        check_heads(&nodes)?;
        Ok(Self { nodes })
    }
}

/// Every head must be in range and every head chain must reach a node
/// without a head (normally the root) without revisiting a node.
fn check_heads(nodes: &[Node]) -> Result<(), TreeError> {
    let len = nodes.len();
    for (i, n) in nodes.iter().enumerate() {
        let Some(arc) = &n.head else {
            continue;
        };
        if arc.head >= len {
            return Err(TreeError::Malformed {
                id: i,
                reason: format!("head {} is out of range", arc.head),
            });
        }
        if arc.head == i {
            return Err(TreeError::Malformed {
                id: i,
                reason: "node is its own head".into(),
            });
        }
    }

    for start in 1..len {
        let mut current = start;
        let mut steps = 0;
        while let Some(arc) = &nodes[current].head {
            current = arc.head;
            steps += 1;
            if current == start || steps >= len {
                return Err(TreeError::Malformed {
                    id: start,
                    reason: "head chain forms a cycle".into(),
                });
            }
        }
    }
    Ok(())
}

impl From<Tree> for Vec<Node> {
    fn from(tree: Tree) -> Self {
        tree.nodes
    }
}
