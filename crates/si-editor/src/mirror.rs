//! Scene graph mirror: the world's composite tree as tree-widget nodes.
//!
//! Every composite becomes a node with three category children
//! (`Composites`, `Bodies`, `Constraints`, in that order) holding its
//! sub-composites, bodies and constraints. The forest is rebuilt from
//! scratch whenever the world's modified flag is seen set; there is no
//! incremental patching.
//!
//! Each node records a composite id (`owner`) for reparent bookkeeping:
//! leaves and composite nodes record the composite that owns them,
//! category nodes record the composite they belong to. Dropping a node
//! into a category therefore compares `node.owner` with `category.owner`.

use crate::tree::TreeWidget;
use serde::Serialize;
use si_core::{NodeKey, ObjectId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorKind {
    Composite,
    Composites,
    Bodies,
    Constraints,
    Body,
    Constraint,
}

impl MirrorKind {
    /// The item kind a category node accepts as children on drop.
    pub fn accepts(&self) -> Option<MirrorKind> {
        match self {
            MirrorKind::Composites => Some(MirrorKind::Composite),
            MirrorKind::Bodies => Some(MirrorKind::Body),
            MirrorKind::Constraints => Some(MirrorKind::Constraint),
            _ => None,
        }
    }

    pub fn is_category(&self) -> bool {
        self.accepts().is_some()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, MirrorKind::Body | MirrorKind::Constraint)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirrorNode {
    pub key: NodeKey,
    pub kind: MirrorKind,
    pub text: String,
    pub owner: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MirrorNode>,
}

impl MirrorNode {
    fn category(kind: MirrorKind, prefix: &str, text: &str, composite: u32) -> Self {
        Self {
            key: NodeKey::intern(&format!("{prefix}_{composite}")),
            kind,
            text: text.to_string(),
            owner: composite,
            children: Vec::new(),
        }
    }

    /// The object this node stands for. `None` for category nodes.
    pub fn object(&self) -> Option<ObjectId> {
        if self.kind.is_category() {
            None
        } else {
            self.key.object()
        }
    }

    /// Number of body and constraint nodes in this subtree.
    pub fn leaf_count(&self) -> usize {
        usize::from(self.kind.is_leaf())
            + self.children.iter().map(MirrorNode::leaf_count).sum::<usize>()
    }

    /// Pre-order visit of this node and its descendants.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a MirrorNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

fn display_text(label: &str, fallback: &str, id: u32) -> String {
    if label.is_empty() {
        format!("{fallback} {id}")
    } else {
        format!("{label} {id}")
    }
}

/// Build the forest for everything under `root`: one composite node per
/// direct sub-composite of `root`.
pub fn build_forest(world: &World, root: u32) -> Vec<MirrorNode> {
    world
        .composite(root)
        .map(|c| {
            c.composites
                .iter()
                .filter_map(|id| composite_node(world, *id, root))
                .collect()
        })
        .unwrap_or_default()
}

fn composite_node(world: &World, id: u32, owner: u32) -> Option<MirrorNode> {
    let composite = world.composite(id)?;

    let mut composites =
        MirrorNode::category(MirrorKind::Composites, "composites", "Composites", id);
    composites.children = composite
        .composites
        .iter()
        .filter_map(|sub| composite_node(world, *sub, id))
        .collect();

    let mut bodies = MirrorNode::category(MirrorKind::Bodies, "bodies", "Bodies", id);
    bodies.children = composite
        .bodies
        .iter()
        .filter_map(|b| world.body(*b))
        .map(|b| MirrorNode {
            key: b.object_id().key(),
            kind: MirrorKind::Body,
            text: display_text(&b.label, "Body", b.id),
            owner: id,
            children: Vec::new(),
        })
        .collect();

    let mut constraints =
        MirrorNode::category(MirrorKind::Constraints, "constraints", "Constraints", id);
    constraints.children = composite
        .constraints
        .iter()
        .filter_map(|c| world.constraint(*c))
        .map(|c| MirrorNode {
            key: c.object_id().key(),
            kind: MirrorKind::Constraint,
            text: display_text(&c.label, "Constraint", c.id),
            owner: id,
            children: Vec::new(),
        })
        .collect();

    Some(MirrorNode {
        key: composite.object_id().key(),
        kind: MirrorKind::Composite,
        text: display_text(&composite.label, "Composite", id),
        owner,
        children: vec![composites, bodies, constraints],
    })
}

/// Keeps a tree widget in step with the world.
#[derive(Debug, Clone)]
pub struct SceneGraphMirror {
    auto_expand: bool,
    has_expanded: bool,
    forest: Vec<MirrorNode>,
}

impl SceneGraphMirror {
    pub fn new(auto_expand: bool) -> Self {
        Self {
            auto_expand,
            has_expanded: false,
            forest: Vec::new(),
        }
    }

    pub fn forest(&self) -> &[MirrorNode] {
        &self.forest
    }

    pub fn leaf_count(&self) -> usize {
        self.forest.iter().map(MirrorNode::leaf_count).sum()
    }

    /// The recorded owner of the node for `object`, from the last rebuild.
    pub fn owner_of(&self, object: ObjectId) -> Option<u32> {
        let key = object.key();
        let mut found = None;
        for root in &self.forest {
            root.visit(&mut |n| {
                if n.key == key {
                    found = Some(n.owner);
                }
            });
        }
        found
    }

    /// Rebuild if the world's modified flag is set, clearing the flag.
    /// Returns whether a rebuild happened.
    pub fn sync(&mut self, world: &mut World, root: u32, tree: &mut dyn TreeWidget) -> bool {
        if !world.take_modified() {
            return false;
        }
        self.rebuild(world, root, tree);
        true
    }

    /// Unconditional full rebuild. The first rebuild opens every node when
    /// auto-expand is on; later ones leave open state to the widget.
    pub fn rebuild(&mut self, world: &World, root: u32, tree: &mut dyn TreeWidget) {
        self.forest = build_forest(world, root);
        tree.load(&self.forest);
        if self.auto_expand && !self.has_expanded {
            self.has_expanded = true;
            tree.open_all();
        }
        log::debug!(
            "mirror rebuilt: {} roots, {} leaves",
            self.forest.len(),
            self.leaf_count()
        );
    }
}
