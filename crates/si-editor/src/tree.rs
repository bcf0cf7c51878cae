//! The tree widget capability and its headless implementation.
//!
//! `TreeState` keeps the same node forest a UI tree would show, in a
//! `petgraph` `StableDiGraph` under a hidden root. It tracks open nodes
//! across reloads, an ordered node selection, drag-and-drop moves and a
//! search filter. Hosts with a real tree UI implement `TreeWidget` over
//! their own widget instead.

use crate::mirror::{MirrorKind, MirrorNode};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use si_core::NodeKey;
use std::collections::{HashMap, HashSet};

/// What the inspector needs to know about one tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNodeInfo {
    pub key: NodeKey,
    pub kind: MirrorKind,
    pub text: String,
    /// Composite id recorded for reparent bookkeeping.
    pub owner: u32,
}

/// The tree-UI widget capability.
///
/// Selection calls never echo back as selection-change notifications;
/// only user interaction does.
pub trait TreeWidget {
    /// Replace the whole forest. Open state and selection of keys that
    /// survive are kept.
    fn load(&mut self, forest: &[MirrorNode]);
    fn open_all(&mut self);
    fn is_open(&self, key: NodeKey) -> bool;

    /// Selected keys in selection order.
    fn selected(&self) -> Vec<NodeKey>;
    /// Returns `false` if the key is not in the tree.
    fn select(&mut self, key: NodeKey) -> bool;
    fn deselect(&mut self, key: NodeKey);
    fn deselect_all(&mut self);

    fn node(&self, key: NodeKey) -> Option<TreeNodeInfo>;
    fn parent(&self, key: NodeKey) -> Option<NodeKey>;
    fn children(&self, key: NodeKey) -> Vec<NodeKey>;

    /// Filter to nodes whose text contains `query` (case-insensitive) plus
    /// their ancestors. An empty query clears the filter; any other query
    /// stays active across `load`. Returns the number of direct matches.
    fn search(&mut self, query: &str) -> usize;
    fn is_visible(&self, key: NodeKey) -> bool;

    /// Drag-and-drop: move `key` under `new_parent`. Category nodes only
    /// accept their own item kind.
    fn move_node(&mut self, key: NodeKey, new_parent: NodeKey) -> Result<(), String>;
}

/// Headless tree widget.
#[derive(Debug, Clone)]
pub struct TreeState {
    graph: StableDiGraph<Option<TreeNodeInfo>, ()>,
    /// Hidden root; the loaded forest hangs below it.
    root: NodeIndex,
    index: HashMap<NodeKey, NodeIndex>,
    /// Explicit child order per parent, set by `move_node`.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
    opened: HashSet<NodeKey>,
    selected: Vec<NodeKey>,
    /// `None` when no search filter is active.
    visible: Option<HashSet<NodeKey>>,
    /// Active search query, re-applied after every `load`.
    query: Option<String>,
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeState {
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(None);
        Self {
            graph,
            root,
            index: HashMap::new(),
            child_order: HashMap::new(),
            opened: HashSet::new(),
            selected: Vec::new(),
            visible: None,
            query: None,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Top-level keys in order.
    pub fn roots(&self) -> Vec<NodeKey> {
        self.keys_of(self.root)
    }

    pub fn open(&mut self, key: NodeKey) {
        if self.index.contains_key(&key) {
            self.opened.insert(key);
        }
    }

    pub fn close(&mut self, key: NodeKey) {
        self.opened.remove(&key);
    }

    /// Pre-order walk of every key.
    pub fn walk(&self) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.walk_from(self.root, &mut out);
        out
    }

    fn walk_from(&self, idx: NodeIndex, out: &mut Vec<NodeKey>) {
        for child in self.child_indices(idx) {
            if let Some(Some(entry)) = self.graph.node_weight(child) {
                out.push(entry.key);
            }
            self.walk_from(child, out);
        }
    }

    /// Children in insertion order, unless a move fixed an explicit order.
    fn child_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        if let Some(order) = self.child_order.get(&idx) {
            return order.clone();
        }
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    fn keys_of(&self, idx: NodeIndex) -> Vec<NodeKey> {
        self.child_indices(idx)
            .into_iter()
            .filter_map(|c| self.key_at(c))
            .collect()
    }

    fn key_at(&self, idx: NodeIndex) -> Option<NodeKey> {
        self.graph
            .node_weight(idx)
            .and_then(|w| w.as_ref())
            .map(|e| e.key)
    }

    fn parent_index(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    fn insert(&mut self, parent: NodeIndex, node: &MirrorNode) {
        let idx = self.graph.add_node(Some(TreeNodeInfo {
            key: node.key,
            kind: node.kind,
            text: node.text.clone(),
            owner: node.owner,
        }));
        self.graph.add_edge(parent, idx, ());
        if self.index.insert(node.key, idx).is_some() {
            log::warn!("duplicate tree key {}", node.key);
        }
        for child in &node.children {
            self.insert(idx, child);
        }
    }
}

impl TreeWidget for TreeState {
    fn load(&mut self, forest: &[MirrorNode]) {
        self.graph.clear();
        self.root = self.graph.add_node(None);
        self.index.clear();
        self.child_order.clear();
        let root = self.root;
        for node in forest {
            self.insert(root, node);
        }
        self.opened.retain(|k| self.index.contains_key(k));
        self.selected.retain(|k| self.index.contains_key(k));
        self.visible = None;
        if let Some(query) = self.query.take() {
            self.search(&query);
        }
        log::trace!("tree loaded: {} nodes", self.index.len());
    }

    fn open_all(&mut self) {
        self.opened.extend(self.index.keys().copied());
    }

    fn is_open(&self, key: NodeKey) -> bool {
        self.opened.contains(&key)
    }

    fn selected(&self) -> Vec<NodeKey> {
        self.selected.clone()
    }

    fn select(&mut self, key: NodeKey) -> bool {
        if !self.index.contains_key(&key) {
            return false;
        }
        if !self.selected.contains(&key) {
            self.selected.push(key);
        }
        true
    }

    fn deselect(&mut self, key: NodeKey) {
        self.selected.retain(|k| *k != key);
    }

    fn deselect_all(&mut self) {
        self.selected.clear();
    }

    fn node(&self, key: NodeKey) -> Option<TreeNodeInfo> {
        let idx = self.index.get(&key)?;
        self.graph
            .node_weight(*idx)
            .and_then(|w| w.as_ref())
            .cloned()
    }

    fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        let idx = self.index.get(&key)?;
        self.parent_index(*idx).and_then(|p| self.key_at(p))
    }

    fn children(&self, key: NodeKey) -> Vec<NodeKey> {
        match self.index.get(&key) {
            Some(idx) => self.keys_of(*idx),
            None => Vec::new(),
        }
    }

    fn search(&mut self, query: &str) -> usize {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            self.visible = None;
            self.query = None;
            return 0;
        }
        self.query = Some(query.clone());

        let matches: Vec<NodeIndex> = self
            .index
            .values()
            .copied()
            .filter(|idx| {
                self.graph
                    .node_weight(*idx)
                    .and_then(|w| w.as_ref())
                    .is_some_and(|e| e.text.to_lowercase().contains(&query))
            })
            .collect();

        let mut visible = HashSet::new();
        for idx in &matches {
            let mut current = Some(*idx);
            while let Some(i) = current {
                match self.key_at(i) {
                    Some(key) => {
                        visible.insert(key);
                    }
                    None => break,
                }
                current = self.parent_index(i);
            }
        }
        log::debug!("tree search {query:?}: {} matches", matches.len());
        self.visible = Some(visible);
        matches.len()
    }

    fn is_visible(&self, key: NodeKey) -> bool {
        match &self.visible {
            Some(visible) => visible.contains(&key),
            None => self.index.contains_key(&key),
        }
    }

    fn move_node(&mut self, key: NodeKey, new_parent: NodeKey) -> Result<(), String> {
        let node = self.node(key).ok_or_else(|| format!("Unknown node: {key}"))?;
        let parent = self
            .node(new_parent)
            .ok_or_else(|| format!("Unknown node: {new_parent}"))?;
        if parent.kind.accepts() != Some(node.kind) {
            return Err(format!(
                "{:?} node {key} cannot be dropped into {:?} node {new_parent}",
                node.kind, parent.kind
            ));
        }

        let (Some(&idx), Some(&parent_idx)) = (self.index.get(&key), self.index.get(&new_parent))
        else {
            return Err(format!("Unknown node: {key}"));
        };

        // A composite cannot be dropped into its own subtree.
        let mut current = Some(parent_idx);
        while let Some(i) = current {
            if i == idx {
                return Err(format!("Cannot drop {key} into its own subtree"));
            }
            current = self.parent_index(i);
        }

        if let Some(old_parent) = self.parent_index(idx) {
            let mut siblings = self.child_indices(old_parent);
            siblings.retain(|c| *c != idx);
            if let Some(edge) = self.graph.find_edge(old_parent, idx) {
                self.graph.remove_edge(edge);
            }
            self.child_order.insert(old_parent, siblings);
        }
        let mut siblings = self.child_indices(parent_idx);
        siblings.push(idx);
        self.graph.add_edge(parent_idx, idx, ());
        self.child_order.insert(parent_idx, siblings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(key: &str, kind: MirrorKind, owner: u32) -> MirrorNode {
        MirrorNode {
            key: NodeKey::intern(key),
            kind,
            text: key.to_string(),
            owner,
            children: Vec::new(),
        }
    }

    fn forest() -> Vec<MirrorNode> {
        let mut comp = leaf("composite_2", MirrorKind::Composite, 1);
        let mut composites = leaf("composites_2", MirrorKind::Composites, 2);
        composites
            .children
            .push(leaf("composite_5", MirrorKind::Composite, 2));
        let mut bodies = leaf("bodies_2", MirrorKind::Bodies, 2);
        bodies.children.push(leaf("body_3", MirrorKind::Body, 2));
        bodies.children.push(leaf("body_4", MirrorKind::Body, 2));
        let constraints = leaf("constraints_2", MirrorKind::Constraints, 2);
        comp.children = vec![composites, bodies, constraints];
        vec![comp]
    }

    fn k(s: &str) -> NodeKey {
        NodeKey::intern(s)
    }

    #[test]
    fn load_keeps_document_order() {
        let mut t = TreeState::new();
        t.load(&forest());
        assert_eq!(t.roots(), vec![k("composite_2")]);
        assert_eq!(t.children(k("bodies_2")), vec![k("body_3"), k("body_4")]);
        assert_eq!(t.parent(k("body_4")), Some(k("bodies_2")));
        assert_eq!(t.parent(k("composite_2")), None);
        assert_eq!(t.len(), 7);
    }

    #[test]
    fn open_state_and_selection_survive_reload() {
        let mut t = TreeState::new();
        t.load(&forest());
        t.open_all();
        t.select(k("body_4"));
        t.select(k("body_3"));
        t.load(&forest());
        assert!(t.is_open(k("bodies_2")));
        assert_eq!(t.selected(), vec![k("body_4"), k("body_3")]);
    }

    #[test]
    fn select_unknown_fails() {
        let mut t = TreeState::new();
        t.load(&forest());
        assert!(!t.select(k("body_99")));
        assert!(t.selected().is_empty());
    }

    #[test]
    fn move_node_is_type_checked() {
        let mut t = TreeState::new();
        t.load(&forest());
        assert!(t.move_node(k("body_3"), k("constraints_2")).is_err());
        assert!(t.move_node(k("body_3"), k("composites_2")).is_err());
        t.move_node(k("composite_5"), k("composites_2")).unwrap();
    }

    #[test]
    fn move_node_appends_to_new_parent() {
        let mut nodes = forest();
        let mut other = leaf("composite_9", MirrorKind::Composite, 1);
        other.children.push(leaf("bodies_9", MirrorKind::Bodies, 9));
        nodes.push(other);

        let mut t = TreeState::new();
        t.load(&nodes);
        t.move_node(k("body_3"), k("bodies_9")).unwrap();
        assert_eq!(t.children(k("bodies_9")), vec![k("body_3")]);
        assert_eq!(t.children(k("bodies_2")), vec![k("body_4")]);
        // recorded owner is unchanged until the mirror rebuilds
        assert_eq!(t.node(k("body_3")).unwrap().owner, 2);
    }

    #[test]
    fn search_keeps_ancestors_visible() {
        let mut t = TreeState::new();
        t.load(&forest());
        assert_eq!(t.search("BODY_4"), 1);
        assert!(t.is_visible(k("body_4")));
        assert!(t.is_visible(k("bodies_2")));
        assert!(t.is_visible(k("composite_2")));
        assert!(!t.is_visible(k("body_3")));
        t.search("");
        assert!(t.is_visible(k("body_3")));
    }

    #[test]
    fn search_filter_survives_reload() {
        let mut t = TreeState::new();
        t.load(&forest());
        t.search("body_4");
        t.load(&forest());
        assert!(t.is_visible(k("body_4")));
        assert!(t.is_visible(k("composite_2")));
        assert!(!t.is_visible(k("body_3")));

        t.search("  ");
        t.load(&forest());
        assert!(t.is_visible(k("body_3")));
    }
}
