//! Hit testing: point → object lookup.
//!
//! Bodies are tested first, in `World::all_bodies` order, against their
//! bounds and then their exact polygon. Constraints are only tested when no
//! body was hit; a constraint is hit when the pointer is near either
//! resolved endpoint. First match wins in both passes.

use kurbo::{Point, Rect};
use si_core::geometry::{bounds_contains, bounds_overlap, vertices_contain};
use si_core::{ObjectId, World};

/// Squared pick radius around a constraint endpoint.
pub const CONSTRAINT_PICK_RADIUS_SQ: f64 = 100.0;

/// Find the object under `point` among everything owned by `scope`.
/// Returns `None` on background.
pub fn hit_test(world: &World, scope: u32, point: Point) -> Option<ObjectId> {
    hit_test_bodies(world, scope, point).or_else(|| hit_test_constraints(world, scope, point))
}

pub fn hit_test_bodies(world: &World, scope: u32, point: Point) -> Option<ObjectId> {
    world
        .all_bodies(scope)
        .into_iter()
        .filter_map(|id| world.body(id))
        .find(|b| bounds_contains(&b.bounds, point) && vertices_contain(&b.vertices, point))
        .map(|b| b.object_id())
}

/// Pointer-tracking constraints are never picked.
pub fn hit_test_constraints(world: &World, scope: u32, point: Point) -> Option<ObjectId> {
    world
        .all_constraints(scope)
        .into_iter()
        .filter_map(|id| world.constraint(id))
        .filter(|c| !c.is_pointer_constraint())
        .find(|c| {
            let (a, b) = world.constraint_endpoints(c);
            (point - a).hypot2() < CONSTRAINT_PICK_RADIUS_SQ
                || (point - b).hypot2() < CONSTRAINT_PICK_RADIUS_SQ
        })
        .map(|c| c.object_id())
}

/// Every body under `scope` whose bounds intersect `region`.
/// Used for region (rubber-band) selection.
pub fn hit_test_region(world: &World, scope: u32, region: Rect) -> Vec<ObjectId> {
    let region = region.abs();
    world
        .all_bodies(scope)
        .into_iter()
        .filter_map(|id| world.body(id))
        .filter(|b| bounds_overlap(&b.bounds, &region))
        .map(|b| b.object_id())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use si_core::{Body, Constraint};

    fn scene() -> (World, ObjectId, ObjectId) {
        let mut w = World::new();
        let root = w.root();
        let id = w.next_id();
        let body = w
            .add_body(root, Body::rectangle(id, Point::new(100.0, 100.0), 40.0, 40.0))
            .unwrap();
        let mut link = Constraint::new(w.next_id());
        link.point_a = Point::new(300.0, 300.0);
        link.point_b = Point::new(400.0, 300.0);
        let constraint = w.add_constraint(root, link).unwrap();
        (w, body, constraint)
    }

    #[test]
    fn body_wins_over_background() {
        let (w, body, _) = scene();
        assert_eq!(hit_test(&w, w.root(), Point::new(110.0, 90.0)), Some(body));
        assert_eq!(hit_test(&w, w.root(), Point::new(200.0, 200.0)), None);
    }

    #[test]
    fn constraint_endpoint_pick_radius() {
        let (w, _, constraint) = scene();
        assert_eq!(
            hit_test(&w, w.root(), Point::new(305.0, 305.0)),
            Some(constraint)
        );
        assert_eq!(
            hit_test(&w, w.root(), Point::new(400.0, 309.0)),
            Some(constraint)
        );
        // distance squared exactly 100 is outside
        assert_eq!(hit_test(&w, w.root(), Point::new(310.0, 300.0)), None);
    }

    #[test]
    fn pointer_constraint_is_skipped() {
        let mut w = World::new();
        let root = w.root();
        let mut link = Constraint::new(w.next_id()).with_label("Mouse Constraint");
        link.point_a = Point::new(5.0, 5.0);
        w.add_constraint(root, link).unwrap();
        assert_eq!(hit_test(&w, root, Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn bound_endpoint_follows_body() {
        let (mut w, body, _) = scene();
        let root = w.root();
        let mut link = Constraint::new(w.next_id());
        link.body_a = Some(body.id);
        link.point_a = Point::new(0.0, 50.0);
        link.point_b = Point::new(900.0, 900.0);
        let id = w.add_constraint(root, link).unwrap();
        assert_eq!(hit_test(&w, root, Point::new(100.0, 151.0)), Some(id));
    }

    #[test]
    fn region_selects_intersecting_bodies_only() {
        let (w, body, _) = scene();
        let hits = hit_test_region(&w, w.root(), Rect::new(0.0, 0.0, 80.0, 80.0));
        assert_eq!(hits, vec![body]);
        // Dragging up-left yields a negative rect.
        let hits = hit_test_region(&w, w.root(), Rect::new(80.0, 80.0, 0.0, 0.0));
        assert_eq!(hits, vec![body]);
        assert!(hit_test_region(&w, w.root(), Rect::new(0.0, 0.0, 79.0, 79.0)).is_empty());
    }
}
