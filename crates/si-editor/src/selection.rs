//! Selection model.
//!
//! An ordered list of selected objects, kept in agreement with the tree
//! widget's selected object nodes, plus the region (rubber-band) gesture.
//! Entries only ever reference live objects: anything that deletes from the
//! world must call `purge` afterwards.

use crate::tree::TreeWidget;
use kurbo::{Point, Rect, Vec2};
use si_core::{ObjectId, ObjectKind, World};

/// How many selected objects get a detailed diagnostic line.
pub const LOGGED_SELECTION_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionEntry {
    pub object: ObjectId,
    /// Pointer minus anchor, recorded when a translate gesture starts.
    /// `None` outside a gesture and for objects without a free anchor.
    pub mousedown_offset: Option<Vec2>,
}

impl SelectionEntry {
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            mousedown_offset: None,
        }
    }
}

/// An in-progress region selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionGesture {
    pub start: Point,
    pub end: Point,
}

impl RegionGesture {
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    entries: Vec<SelectionEntry>,
    region: Option<RegionGesture>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [SelectionEntry] {
        &mut self.entries
    }

    pub fn objects(&self) -> Vec<ObjectId> {
        self.entries.iter().map(|e| e.object).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.entries.iter().any(|e| e.object == object)
    }

    /// Replace the selection with `objects`, in order.
    ///
    /// Prior entries are deselected in the tree first. Dead or repeated
    /// objects are skipped.
    pub fn replace(&mut self, objects: &[ObjectId], world: &World, tree: &mut dyn TreeWidget) {
        for entry in self.entries.drain(..) {
            tree.deselect(entry.object.key());
        }

        for (i, object) in objects.iter().enumerate() {
            if !self.add(*object, world, tree) {
                continue;
            }
            if i < LOGGED_SELECTION_LIMIT {
                log::info!("{}", describe(world, *object));
            }
        }
        if objects.len() > LOGGED_SELECTION_LIMIT {
            log::warn!(
                "Omitted inspecting {} more objects",
                objects.len() - LOGGED_SELECTION_LIMIT
            );
        }
    }

    /// Append one object. No-op (returns `false`) for dead or already
    /// selected objects.
    pub fn add(&mut self, object: ObjectId, world: &World, tree: &mut dyn TreeWidget) -> bool {
        if !world.is_live(object) || self.contains(object) {
            return false;
        }
        self.entries.push(SelectionEntry::new(object));
        tree.select(object.key());
        true
    }

    pub fn clear(&mut self, world: &World, tree: &mut dyn TreeWidget) {
        self.replace(&[], world, tree);
    }

    /// Drop entries whose objects are no longer live.
    pub fn purge(&mut self, world: &World, tree: &mut dyn TreeWidget) {
        self.entries.retain(|e| {
            let live = world.is_live(e.object);
            if !live {
                tree.deselect(e.object.key());
            }
            live
        });
    }

    /// Re-select every entry in the tree, e.g. after it was reloaded.
    pub fn reapply(&self, tree: &mut dyn TreeWidget) {
        for entry in &self.entries {
            tree.select(entry.object.key());
        }
    }

    pub fn clear_offsets(&mut self) {
        for entry in &mut self.entries {
            entry.mousedown_offset = None;
        }
    }

    // ─── Region gesture ──────────────────────────────────────────────────

    pub fn begin_region(&mut self, at: Point) {
        self.region = Some(RegionGesture { start: at, end: at });
    }

    pub fn update_region(&mut self, to: Point) {
        if let Some(region) = self.region.as_mut() {
            region.end = to;
        }
    }

    /// End the gesture, returning its final bounds if one was active.
    pub fn end_region(&mut self) -> Option<Rect> {
        self.region.take().map(|r| r.bounds())
    }

    pub fn cancel_region(&mut self) {
        self.region = None;
    }

    pub fn region(&self) -> Option<Rect> {
        self.region.map(|r| r.bounds())
    }

    pub fn is_region_active(&self) -> bool {
        self.region.is_some()
    }
}

/// One-line description of an object for the selection log.
pub fn describe(world: &World, object: ObjectId) -> String {
    let label = world.label(object).unwrap_or("?");
    match object.kind {
        ObjectKind::Body => match world.body(object.id) {
            Some(b) => format!(
                "{label} {}: position ({:.1}, {:.1}), angle {:.3}, static {}",
                b.id, b.position.x, b.position.y, b.angle, b.is_static
            ),
            None => format!("{label} {}", object.id),
        },
        ObjectKind::Constraint => match world.constraint(object.id) {
            Some(c) => format!(
                "{label} {}: body_a {:?}, body_b {:?}, length {:.1}, stiffness {}",
                c.id, c.body_a, c.body_b, c.length, c.stiffness
            ),
            None => format!("{label} {}", object.id),
        },
        ObjectKind::Composite => match world.composite(object.id) {
            Some(c) => format!(
                "{label} {}: {} composites, {} bodies, {} constraints",
                c.id,
                c.composites.len(),
                c.bodies.len(),
                c.constraints.len()
            ),
            None => format!("{label} {}", object.id),
        },
    }
}
