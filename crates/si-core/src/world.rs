//! The live world: flat object tables plus an owner lookup table.
//!
//! Composites hold ordered id lists; nothing holds a pointer to anything
//! else. Every attached object has exactly one entry in `owners`, so a
//! move is two list edits and one table update. Composites without an
//! owner are roots (the simulation world, the inspector's own root, or a
//! freshly created group that has not been attached yet).
//!
//! Structural edits set the `modified` flag; geometry edits do not.

use crate::error::SceneError;
use crate::id::{ObjectId, ObjectKind};
use crate::model::{Body, Composite, CompositeData, Constraint};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct World {
    bodies: HashMap<u32, Body>,
    constraints: HashMap<u32, Constraint>,
    composites: HashMap<u32, Composite>,
    owners: HashMap<ObjectId, u32>,
    /// The simulation root composite.
    root: u32,
    next_id: u32,
    modified: bool,
}

impl World {
    /// Create an empty world with a root composite labelled "World".
    #[must_use]
    pub fn new() -> Self {
        let mut world = Self {
            bodies: HashMap::new(),
            constraints: HashMap::new(),
            composites: HashMap::new(),
            owners: HashMap::new(),
            root: 0,
            next_id: 1,
            modified: true,
        };
        world.root = world.create_composite("World");
        world
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    /// Allocate a fresh numeric id. Ids are never handed out twice.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn reserve(&mut self, id: u32) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }

    // ─── Modified flag ───────────────────────────────────────────────────

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self) {
        self.modified = true;
    }

    /// Read and clear the modified flag.
    pub fn take_modified(&mut self) -> bool {
        std::mem::take(&mut self.modified)
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn is_live(&self, object: ObjectId) -> bool {
        match object.kind {
            ObjectKind::Body => self.bodies.contains_key(&object.id),
            ObjectKind::Constraint => self.constraints.contains_key(&object.id),
            ObjectKind::Composite => self.composites.contains_key(&object.id),
        }
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: u32) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn constraint(&self, id: u32) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    pub fn constraint_mut(&mut self, id: u32) -> Option<&mut Constraint> {
        self.constraints.get_mut(&id)
    }

    pub fn composite(&self, id: u32) -> Option<&Composite> {
        self.composites.get(&id)
    }

    pub fn composite_mut(&mut self, id: u32) -> Option<&mut Composite> {
        self.composites.get_mut(&id)
    }

    pub fn label(&self, object: ObjectId) -> Option<&str> {
        match object.kind {
            ObjectKind::Body => self.bodies.get(&object.id).map(|b| b.label.as_str()),
            ObjectKind::Constraint => self.constraints.get(&object.id).map(|c| c.label.as_str()),
            ObjectKind::Composite => self.composites.get(&object.id).map(|c| c.label.as_str()),
        }
    }

    /// The composite that currently owns `object`, if it is attached.
    pub fn owner_of(&self, object: ObjectId) -> Option<u32> {
        self.owners.get(&object).copied()
    }

    /// Whether `ancestor` owns `object` directly or through sub-composites.
    pub fn is_ancestor(&self, ancestor: u32, object: ObjectId) -> bool {
        let mut current = self.owner_of(object);
        while let Some(owner) = current {
            if owner == ancestor {
                return true;
            }
            current = self.owner_of(ObjectId::composite(owner));
        }
        false
    }

    /// Lookup scoped to a subtree; `scope` itself is not part of its scope.
    pub fn find_in(&self, scope: u32, object: ObjectId) -> bool {
        self.is_live(object) && self.is_ancestor(scope, object)
    }

    /// Number of owners above `object` (0 for roots).
    pub fn depth(&self, object: ObjectId) -> usize {
        let mut depth = 0;
        let mut current = self.owner_of(object);
        while let Some(owner) = current {
            depth += 1;
            current = self.owner_of(ObjectId::composite(owner));
        }
        depth
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn composite_count(&self) -> usize {
        self.composites.len()
    }

    pub fn object_count(&self) -> usize {
        self.body_count() + self.constraint_count() + self.composite_count()
    }

    /// Every live object id, in no particular order.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.bodies
            .keys()
            .map(|id| ObjectId::body(*id))
            .chain(self.constraints.keys().map(|id| ObjectId::constraint(*id)))
            .chain(self.composites.keys().map(|id| ObjectId::composite(*id)))
    }

    // ─── Traversal ───────────────────────────────────────────────────────

    /// All bodies under `scope`: its own bodies first, then each
    /// sub-composite's in order.
    pub fn all_bodies(&self, scope: u32) -> Vec<u32> {
        let mut out = Vec::new();
        self.walk(scope, &mut |c| out.extend_from_slice(&c.bodies));
        out
    }

    pub fn all_constraints(&self, scope: u32) -> Vec<u32> {
        let mut out = Vec::new();
        self.walk(scope, &mut |c| out.extend_from_slice(&c.constraints));
        out
    }

    /// All composites under `scope`, excluding `scope`.
    pub fn all_composites(&self, scope: u32) -> Vec<u32> {
        let mut out = Vec::new();
        self.walk(scope, &mut |c| out.extend_from_slice(&c.composites));
        out
    }

    fn walk(&self, scope: u32, visit: &mut dyn FnMut(&Composite)) {
        if let Some(c) = self.composites.get(&scope) {
            visit(c);
            for sub in &c.composites {
                self.walk(*sub, visit);
            }
        }
    }

    /// Union of the bounds of every body under `scope`.
    pub fn composite_bounds(&self, scope: u32) -> Option<Rect> {
        self.all_bodies(scope)
            .iter()
            .filter_map(|id| self.bodies.get(id))
            .map(|b| b.bounds)
            .reduce(|a, b| a.union(b))
    }

    /// World-space endpoints of a constraint. A bound end is its body's
    /// position plus the local anchor; a free end is the anchor itself.
    pub fn constraint_endpoints(&self, constraint: &Constraint) -> (Point, Point) {
        let resolve = |body: Option<u32>, point: Point| {
            match body.and_then(|id| self.bodies.get(&id)) {
                Some(b) => b.position + point.to_vec2(),
                None => point,
            }
        };
        (
            resolve(constraint.body_a, constraint.point_a),
            resolve(constraint.body_b, constraint.point_b),
        )
    }

    // ─── Structural edits ────────────────────────────────────────────────

    /// Create a detached composite.
    pub fn create_composite(&mut self, label: impl Into<String>) -> u32 {
        let id = self.next_id();
        self.composites.insert(id, Composite::new(id, label));
        self.modified = true;
        id
    }

    pub fn add_body(&mut self, parent: u32, body: Body) -> Result<ObjectId, SceneError> {
        let object = body.object_id();
        self.check_insert(parent, object)?;
        self.reserve(body.id);
        self.bodies.insert(body.id, body);
        self.attach(parent, object, false);
        Ok(object)
    }

    pub fn add_constraint(
        &mut self,
        parent: u32,
        constraint: Constraint,
    ) -> Result<ObjectId, SceneError> {
        let object = constraint.object_id();
        self.check_insert(parent, object)?;
        self.reserve(constraint.id);
        self.constraints.insert(constraint.id, constraint);
        self.attach(parent, object, false);
        Ok(object)
    }

    /// Attach a detached composite under `parent`, at the end of its list or
    /// at the front.
    pub fn add_composite(
        &mut self,
        parent: u32,
        child: u32,
        at_front: bool,
    ) -> Result<(), SceneError> {
        let object = ObjectId::composite(child);
        if !self.composites.contains_key(&parent) {
            return Err(SceneError::UnknownComposite(parent));
        }
        if !self.composites.contains_key(&child) {
            return Err(SceneError::UnknownObject(object));
        }
        if self.owners.contains_key(&object) {
            return Err(SceneError::IdCollision(object));
        }
        if child == parent || self.is_ancestor(child, ObjectId::composite(parent)) {
            return Err(SceneError::Cycle(object));
        }
        self.attach(parent, object, at_front);
        Ok(())
    }

    /// Detach `object` from its owner without destroying it.
    pub fn detach(&mut self, object: ObjectId) -> Result<(), SceneError> {
        if !self.is_live(object) {
            return Err(SceneError::UnknownObject(object));
        }
        self.unlink(object);
        self.modified = true;
        Ok(())
    }

    /// Remove `object` from the world. Composites are removed with their
    /// whole subtree.
    pub fn remove(&mut self, object: ObjectId) -> Result<(), SceneError> {
        if !self.is_live(object) {
            return Err(SceneError::UnknownObject(object));
        }
        self.unlink(object);
        self.purge(object);
        self.modified = true;
        log::debug!("removed {object}");
        Ok(())
    }

    /// Transfer ownership of `object` from `from` to `to`, keeping its id.
    pub fn move_object(&mut self, object: ObjectId, from: u32, to: u32) -> Result<(), SceneError> {
        if !self.is_live(object) {
            return Err(SceneError::UnknownObject(object));
        }
        if !self.composites.contains_key(&to) {
            return Err(SceneError::UnknownComposite(to));
        }
        if self.owner_of(object) != Some(from) {
            return Err(SceneError::NotOwned {
                object,
                expected: from,
            });
        }
        if object.kind == ObjectKind::Composite
            && (object.id == to || self.is_ancestor(object.id, ObjectId::composite(to)))
        {
            return Err(SceneError::Cycle(object));
        }
        self.unlink(object);
        self.attach(to, object, false);
        log::debug!("moved {object} from composite_{from} to composite_{to}");
        Ok(())
    }

    fn check_insert(&self, parent: u32, object: ObjectId) -> Result<(), SceneError> {
        if !self.composites.contains_key(&parent) {
            return Err(SceneError::UnknownComposite(parent));
        }
        if self.is_live(object) {
            return Err(SceneError::IdCollision(object));
        }
        Ok(())
    }

    fn attach(&mut self, parent: u32, object: ObjectId, at_front: bool) {
        if let Some(c) = self.composites.get_mut(&parent) {
            let list = c.list_mut(object.kind);
            if at_front {
                list.insert(0, object.id);
            } else {
                list.push(object.id);
            }
            self.owners.insert(object, parent);
            self.modified = true;
        }
    }

    fn unlink(&mut self, object: ObjectId) {
        if let Some(owner) = self.owners.remove(&object)
            && let Some(c) = self.composites.get_mut(&owner)
        {
            c.list_mut(object.kind).retain(|id| *id != object.id);
        }
    }

    fn purge(&mut self, object: ObjectId) {
        match object.kind {
            ObjectKind::Body => {
                self.bodies.remove(&object.id);
            }
            ObjectKind::Constraint => {
                self.constraints.remove(&object.id);
            }
            ObjectKind::Composite => {
                if let Some(c) = self.composites.remove(&object.id) {
                    let children = c
                        .composites
                        .iter()
                        .map(|id| ObjectId::composite(*id))
                        .chain(c.bodies.iter().map(|id| ObjectId::body(*id)))
                        .chain(c.constraints.iter().map(|id| ObjectId::constraint(*id)));
                    for child in children {
                        self.owners.remove(&child);
                        self.purge(child);
                    }
                }
            }
        }
    }

    // ─── Detached subtrees ───────────────────────────────────────────────

    /// Deep copy of the subtree rooted at `scope`, ids preserved.
    pub fn extract(&self, scope: u32) -> Option<CompositeData> {
        let c = self.composites.get(&scope)?;
        Some(CompositeData {
            id: c.id,
            label: c.label.clone(),
            composites: c.composites.iter().filter_map(|id| self.extract(*id)).collect(),
            bodies: c
                .bodies
                .iter()
                .filter_map(|id| self.bodies.get(id).cloned())
                .collect(),
            constraints: c
                .constraints
                .iter()
                .filter_map(|id| self.constraints.get(id).cloned())
                .collect(),
        })
    }

    /// Insert a detached subtree under `parent`, keeping its ids.
    ///
    /// Fails without touching the world if any id in the subtree is already
    /// live (rebase first) or repeated.
    pub fn insert_fragment(
        &mut self,
        parent: u32,
        data: CompositeData,
        at_front: bool,
    ) -> Result<u32, SceneError> {
        if !self.composites.contains_key(&parent) {
            return Err(SceneError::UnknownComposite(parent));
        }
        let mut seen = HashSet::new();
        for id in data.object_ids() {
            if self.is_live(id) || !seen.insert(id) {
                return Err(SceneError::IdCollision(id));
            }
        }
        let top = data.id;
        self.insert_detached(data);
        self.attach(parent, ObjectId::composite(top), at_front);
        Ok(top)
    }

    fn insert_detached(&mut self, data: CompositeData) {
        let CompositeData {
            id,
            label,
            composites,
            bodies,
            constraints,
        } = data;
        self.reserve(id);
        let mut composite = Composite::new(id, label);
        for sub in composites {
            composite.composites.push(sub.id);
            self.owners.insert(ObjectId::composite(sub.id), id);
            self.insert_detached(sub);
        }
        for body in bodies {
            self.reserve(body.id);
            composite.bodies.push(body.id);
            self.owners.insert(body.object_id(), id);
            self.bodies.insert(body.id, body);
        }
        for constraint in constraints {
            self.reserve(constraint.id);
            composite.constraints.push(constraint.id);
            self.owners.insert(constraint.object_id(), id);
            self.constraints.insert(constraint.id, constraint);
        }
        self.composites.insert(id, composite);
        self.modified = true;
    }

    /// Replace everything under `scope` with the children of `data`, keeping
    /// the ids stored in `data`. Used to restore snapshots.
    pub fn replace_contents(&mut self, scope: u32, data: CompositeData) -> Result<(), SceneError> {
        if !self.composites.contains_key(&scope) {
            return Err(SceneError::UnknownComposite(scope));
        }
        for id in data.object_ids().into_iter().skip(1) {
            if self.is_live(id) && !self.is_ancestor(scope, id) {
                return Err(SceneError::IdCollision(id));
            }
        }

        let children: Vec<ObjectId> = self
            .composites
            .get(&scope)
            .map(|c| {
                c.composites
                    .iter()
                    .map(|id| ObjectId::composite(*id))
                    .chain(c.bodies.iter().map(|id| ObjectId::body(*id)))
                    .chain(c.constraints.iter().map(|id| ObjectId::constraint(*id)))
                    .collect()
            })
            .unwrap_or_default();
        for child in children {
            self.unlink(child);
            self.purge(child);
        }

        let mut shell = CompositeData::new(scope, data.label);
        shell.bodies = data.bodies;
        shell.constraints = data.constraints;
        for sub in data.composites {
            let sub_id = sub.id;
            self.insert_detached(sub);
            self.attach(scope, ObjectId::composite(sub_id), false);
        }
        for body in shell.bodies {
            let object = body.object_id();
            self.reserve(body.id);
            self.bodies.insert(body.id, body);
            self.attach(scope, object, false);
        }
        for constraint in shell.constraints {
            let object = constraint.object_id();
            self.reserve(constraint.id);
            self.constraints.insert(constraint.id, constraint);
            self.attach(scope, object, false);
        }
        self.modified = true;
        Ok(())
    }

    /// Renumber every id in `data` from this world's allocator.
    ///
    /// Constraint ends bound to bodies inside `data` follow the renumbering;
    /// ends bound to bodies outside it are unbound, so their anchor is read
    /// as a world point from then on.
    pub fn rebase(&mut self, data: &mut CompositeData) {
        let mut body_map = HashMap::new();
        self.renumber(data, &mut body_map);
        remap_constraints(data, &body_map);
    }

    fn renumber(&mut self, data: &mut CompositeData, body_map: &mut HashMap<u32, u32>) {
        data.id = self.next_id();
        for sub in &mut data.composites {
            self.renumber(sub, body_map);
        }
        for body in &mut data.bodies {
            let fresh = self.next_id();
            body_map.insert(body.id, fresh);
            body.id = fresh;
        }
        for constraint in &mut data.constraints {
            constraint.id = self.next_id();
        }
    }
}

fn remap_constraints(data: &mut CompositeData, body_map: &HashMap<u32, u32>) {
    for c in &mut data.constraints {
        c.body_a = c.body_a.and_then(|id| body_map.get(&id).copied());
        c.body_b = c.body_b.and_then(|id| body_map.get(&id).copied());
    }
    for sub in &mut data.composites {
        remap_constraints(sub, body_map);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Simulation clock settings the inspector touches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// 1.0 = real time, 0.0 = frozen.
    pub time_scale: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self { time_scale: 1.0 }
    }
}

/// The simulation handle: the world plus its clock.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub world: World,
    pub timing: Timing,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn world_with_group() -> (World, u32, ObjectId) {
        let mut w = World::new();
        let root = w.root();
        let group = w.create_composite("Stack");
        w.add_composite(root, group, false).unwrap();
        let id = w.next_id();
        let body = w
            .add_body(group, Body::rectangle(id, Point::new(10.0, 10.0), 4.0, 4.0))
            .unwrap();
        (w, group, body)
    }

    #[test]
    fn add_sets_owner_and_modified() {
        let (mut w, group, body) = world_with_group();
        assert!(w.take_modified());
        assert!(!w.is_modified());
        assert_eq!(w.owner_of(body), Some(group));
        assert!(w.is_ancestor(w.root(), body));
        assert_eq!(w.depth(body), 2);
    }

    #[test]
    fn all_bodies_order_is_own_first() {
        let mut w = World::new();
        let root = w.root();
        let sub = w.create_composite("sub");
        w.add_composite(root, sub, false).unwrap();
        let a = w.next_id();
        w.add_body(sub, Body::rectangle(a, Point::ZERO, 1.0, 1.0)).unwrap();
        let b = w.next_id();
        w.add_body(root, Body::rectangle(b, Point::ZERO, 1.0, 1.0)).unwrap();
        assert_eq!(w.all_bodies(root), vec![b, a]);
        assert_eq!(w.all_composites(root), vec![sub]);
    }

    #[test]
    fn move_is_atomic_and_keeps_identity() {
        let (mut w, group, body) = world_with_group();
        let root = w.root();
        w.move_object(body, group, root).unwrap();
        assert_eq!(w.owner_of(body), Some(root));
        assert!(w.composite(group).unwrap().bodies.is_empty());
        assert_eq!(w.composite(root).unwrap().bodies, vec![body.id]);
        assert!(w.is_live(body));
    }

    #[test]
    fn move_rejects_wrong_owner_and_cycles() {
        let (mut w, group, body) = world_with_group();
        let root = w.root();
        assert_eq!(
            w.move_object(body, root, group),
            Err(SceneError::NotOwned {
                object: body,
                expected: root
            })
        );
        let inner = w.create_composite("inner");
        w.add_composite(group, inner, false).unwrap();
        assert_eq!(
            w.move_object(ObjectId::composite(group), root, inner),
            Err(SceneError::Cycle(ObjectId::composite(group)))
        );
    }

    #[test]
    fn remove_composite_is_deep() {
        let (mut w, group, body) = world_with_group();
        w.remove(ObjectId::composite(group)).unwrap();
        assert!(!w.is_live(body));
        assert_eq!(w.owner_of(body), None);
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn id_collision_rejected() {
        let (mut w, group, body) = world_with_group();
        let dup = Body::rectangle(body.id, Point::ZERO, 1.0, 1.0);
        assert_eq!(w.add_body(group, dup), Err(SceneError::IdCollision(body)));
    }

    #[test]
    fn rebase_renumbers_and_remaps_constraints() {
        let (mut w, group, body) = world_with_group();
        let cid = w.next_id();
        let mut link = Constraint::new(cid);
        link.body_a = Some(body.id);
        link.body_b = Some(9999);
        w.add_constraint(group, link).unwrap();

        let mut data = w.extract(group).unwrap();
        let before: HashSet<ObjectId> = w.object_ids().collect();
        w.rebase(&mut data);
        for id in data.object_ids() {
            assert!(!before.contains(&id), "{id} collides after rebase");
        }
        let c = &data.constraints[0];
        assert_eq!(c.body_a, Some(data.bodies[0].id));
        assert_eq!(c.body_b, None);

        let root = w.root();
        let top = w.insert_fragment(root, data, true).unwrap();
        assert_eq!(w.composite(root).unwrap().composites[0], top);
        assert_eq!(w.body_count(), 2);
    }

    #[test]
    fn replace_contents_restores_snapshot() {
        let (mut w, group, body) = world_with_group();
        let root = w.root();
        let snapshot = w.extract(root).unwrap();

        w.body_mut(body.id).unwrap().translate(kurbo::Vec2::new(100.0, 0.0));
        w.remove(ObjectId::composite(group)).unwrap();
        let extra = w.next_id();
        w.add_body(root, Body::rectangle(extra, Point::ZERO, 1.0, 1.0))
            .unwrap();

        w.replace_contents(root, snapshot.clone()).unwrap();
        assert_eq!(w.extract(root).unwrap(), snapshot);
        assert!(!w.is_live(ObjectId::body(extra)));
        assert_eq!(w.owner_of(body), Some(group));
    }

    #[test]
    fn constraint_endpoints_resolve_bound_ends() {
        let (mut w, group, body) = world_with_group();
        let mut link = Constraint::new(w.next_id());
        link.body_a = Some(body.id);
        link.point_a = Point::new(1.0, 0.0);
        link.point_b = Point::new(30.0, 30.0);
        let id = w.add_constraint(group, link).unwrap();
        let c = w.constraint(id.id).unwrap();
        assert_eq!(
            w.constraint_endpoints(c),
            (Point::new(11.0, 10.0), Point::new(30.0, 30.0))
        );
    }
}
