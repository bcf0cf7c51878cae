//! Core object model for inspected worlds.
//!
//! A world is made of three kinds of object: rigid `Body` values, `Constraint`
//! links between two anchor points, and `Composite` groups that own ordered
//! lists of the other two (and of sub-composites). Groups store ids, never
//! live references; ownership is tracked by `World` in a separate table.
//!
//! `CompositeData` is the detached, owned form of a composite subtree. It is
//! what export, import, cloning and state snapshots move around.

use crate::geometry::{bounds_of, scale_about};
use crate::id::{ObjectId, ObjectKind};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f64::consts::TAU;

/// Label substring marking the simulation's own pointer-tracking constraint.
pub const POINTER_CONSTRAINT_LABEL: &str = "Mouse Constraint";

// ─── Body ────────────────────────────────────────────────────────────────

/// A rigid body. Vertices are stored in world space and kept in sync with
/// `position`, `angle` and scale by the transform primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub label: String,
    pub position: Point,
    /// Position at the previous step. Kept equal to `position` after a
    /// teleport so the integrator does not infer a velocity from it.
    pub position_prev: Point,
    pub angle: f64,
    pub vertices: SmallVec<[Point; 8]>,
    pub bounds: Rect,
    pub circle_radius: Option<f64>,
    pub is_static: bool,
}

impl Body {
    /// Build a body from world-space vertices; position is their centroid.
    pub fn from_vertices(id: u32, label: impl Into<String>, vertices: &[Point]) -> Self {
        let n = vertices.len().max(1) as f64;
        let sum = vertices
            .iter()
            .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        let position = (sum / n).to_point();
        Self {
            id,
            label: label.into(),
            position,
            position_prev: position,
            angle: 0.0,
            vertices: SmallVec::from_slice(vertices),
            bounds: bounds_of(vertices),
            circle_radius: None,
            is_static: false,
        }
    }

    /// Axis-aligned rectangle centered on `center`.
    pub fn rectangle(id: u32, center: Point, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        let verts = [
            Point::new(center.x - hw, center.y - hh),
            Point::new(center.x + hw, center.y - hh),
            Point::new(center.x + hw, center.y + hh),
            Point::new(center.x - hw, center.y + hh),
        ];
        Self::from_vertices(id, "Rectangle Body", &verts)
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`.
    pub fn polygon(id: u32, center: Point, sides: usize, radius: f64) -> Self {
        let sides = sides.max(3);
        let verts: Vec<Point> = (0..sides)
            .map(|i| {
                let theta = TAU * i as f64 / sides as f64;
                center + Vec2::from_angle(theta) * radius
            })
            .collect();
        let mut body = Self::from_vertices(id, "Polygon Body", &verts);
        body.position = center;
        body.position_prev = center;
        body
    }

    /// Circle approximated by a 24-gon, with the exact radius recorded.
    pub fn circle(id: u32, center: Point, radius: f64) -> Self {
        let mut body = Self::polygon(id, center, 24, radius);
        body.label = "Circle Body".into();
        body.circle_radius = Some(radius);
        body
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::body(self.id)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Move by `delta`, keeping the previous position in step.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        self.position_prev = self.position;
        for v in &mut self.vertices {
            *v += delta;
        }
        self.bounds = bounds_of(&self.vertices);
    }

    /// Set the position absolutely (a teleport).
    pub fn set_position(&mut self, position: Point) {
        let delta = position - self.position;
        self.translate(delta);
    }

    /// Rotate about the body's own position.
    pub fn rotate(&mut self, angle: f64) {
        let t = Affine::rotate_about(angle, self.position);
        self.apply(t);
        self.angle += angle;
    }

    /// Non-uniform scale about `origin`. Circle radii follow the X factor.
    pub fn scale(&mut self, sx: f64, sy: f64, origin: Point) {
        self.apply(scale_about(origin, sx, sy));
        self.position = scale_about(origin, sx, sy) * self.position;
        self.position_prev = self.position;
        if let Some(r) = self.circle_radius.as_mut() {
            *r *= sx;
        }
    }

    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        self.position_prev = self.position;
    }

    fn apply(&mut self, t: Affine) {
        for v in &mut self.vertices {
            *v = t * *v;
        }
        self.bounds = bounds_of(&self.vertices);
    }
}

// ─── Constraint ──────────────────────────────────────────────────────────

/// A link between two anchor points.
///
/// When an end is bound to a body, its point is an offset from that body's
/// position; when free, the point is in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: u32,
    pub label: String,
    pub body_a: Option<u32>,
    pub body_b: Option<u32>,
    pub point_a: Point,
    pub point_b: Point,
    pub length: f64,
    pub stiffness: f64,
}

impl Constraint {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            label: "Constraint".into(),
            body_a: None,
            body_b: None,
            point_a: Point::ZERO,
            point_b: Point::ZERO,
            length: 0.0,
            stiffness: 1.0,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::constraint(self.id)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Whether this is the simulation's internal pointer-tracking link,
    /// which the inspector never selects.
    pub fn is_pointer_constraint(&self) -> bool {
        self.label.contains(POINTER_CONSTRAINT_LABEL)
    }
}

// ─── Composite ───────────────────────────────────────────────────────────

/// A group owning ordered id lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    pub id: u32,
    pub label: String,
    pub composites: Vec<u32>,
    pub bodies: Vec<u32>,
    pub constraints: Vec<u32>,
}

impl Composite {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::composite(self.id)
    }

    /// The child list that holds objects of `kind`.
    pub fn list(&self, kind: ObjectKind) -> &Vec<u32> {
        match kind {
            ObjectKind::Body => &self.bodies,
            ObjectKind::Constraint => &self.constraints,
            ObjectKind::Composite => &self.composites,
        }
    }

    pub fn list_mut(&mut self, kind: ObjectKind) -> &mut Vec<u32> {
        match kind {
            ObjectKind::Body => &mut self.bodies,
            ObjectKind::Constraint => &mut self.constraints,
            ObjectKind::Composite => &mut self.composites,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.composites.is_empty() && self.bodies.is_empty() && self.constraints.is_empty()
    }
}

// ─── Detached subtrees ───────────────────────────────────────────────────

/// An owned composite subtree, detached from any world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeData {
    pub id: u32,
    pub label: String,
    #[serde(default)]
    pub composites: Vec<CompositeData>,
    #[serde(default)]
    pub bodies: Vec<Body>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl CompositeData {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            ..Default::default()
        }
    }

    /// Whether `object` appears anywhere in this subtree (including itself).
    pub fn contains(&self, object: ObjectId) -> bool {
        match object.kind {
            ObjectKind::Composite if self.id == object.id => true,
            ObjectKind::Body if self.bodies.iter().any(|b| b.id == object.id) => true,
            ObjectKind::Constraint if self.constraints.iter().any(|c| c.id == object.id) => true,
            _ => self.composites.iter().any(|c| c.contains(object)),
        }
    }

    /// Pre-order listing of every object id in the subtree: the composite,
    /// then its sub-composites (recursively), then bodies, then constraints.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<ObjectId>) {
        out.push(ObjectId::composite(self.id));
        for c in &self.composites {
            c.collect_ids(out);
        }
        out.extend(self.bodies.iter().map(Body::object_id));
        out.extend(self.constraints.iter().map(Constraint::object_id));
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len() + self.composites.iter().map(|c| c.body_count()).sum::<usize>()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
            + self
                .composites
                .iter()
                .map(|c| c.constraint_count())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rectangle_geometry() {
        let b = Body::rectangle(1, Point::new(50.0, 50.0), 20.0, 10.0);
        assert_eq!(b.position, Point::new(50.0, 50.0));
        assert_eq!(b.bounds, Rect::new(40.0, 45.0, 60.0, 55.0));
    }

    #[test]
    fn translate_moves_vertices_and_prev() {
        let mut b = Body::rectangle(1, Point::new(0.0, 0.0), 10.0, 10.0);
        b.translate(Vec2::new(50.0, 50.0));
        assert_eq!(b.position, Point::new(50.0, 50.0));
        assert_eq!(b.position_prev, b.position);
        assert_eq!(b.bounds, Rect::new(45.0, 45.0, 55.0, 55.0));
    }

    #[test]
    fn rotate_quarter_turn_swaps_extent() {
        let mut b = Body::rectangle(1, Point::new(0.0, 0.0), 20.0, 10.0);
        b.rotate(std::f64::consts::FRAC_PI_2);
        assert!(approx(b.angle, std::f64::consts::FRAC_PI_2));
        assert!(approx(b.bounds.width(), 10.0));
        assert!(approx(b.bounds.height(), 20.0));
        assert_eq!(b.position, Point::new(0.0, 0.0));
    }

    #[test]
    fn scale_x_only_and_circle_radius() {
        let mut b = Body::circle(1, Point::new(10.0, 10.0), 5.0);
        let before = b.bounds;
        b.scale(2.0, 1.0, b.position);
        assert!(approx(b.bounds.width(), before.width() * 2.0));
        assert!(approx(b.bounds.height(), before.height()));
        assert_eq!(b.circle_radius, Some(10.0));
        assert_eq!(b.position, Point::new(10.0, 10.0));
    }

    #[test]
    fn pointer_constraint_flag() {
        let c = Constraint::new(3).with_label("Mouse Constraint");
        assert!(c.is_pointer_constraint());
        assert!(!Constraint::new(4).is_pointer_constraint());
    }

    #[test]
    fn composite_data_contains_nested() {
        let mut inner = CompositeData::new(2, "inner");
        inner.bodies.push(Body::rectangle(5, Point::ZERO, 1.0, 1.0));
        let mut outer = CompositeData::new(1, "outer");
        outer.composites.push(inner);
        assert!(outer.contains(ObjectId::body(5)));
        assert!(outer.contains(ObjectId::composite(2)));
        assert!(!outer.contains(ObjectId::constraint(5)));
        assert_eq!(
            outer.object_ids(),
            vec![
                ObjectId::composite(1),
                ObjectId::composite(2),
                ObjectId::body(5)
            ]
        );
    }
}
