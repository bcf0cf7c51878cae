//! Transform controller: per-tick rotate, scale and translate of the
//! selection.
//!
//! The combined delta for a tick is the pointer's X movement since the last
//! tick plus the keyboard axis, clamped to `[-DELTA_LIMIT, DELTA_LIMIT]`.
//! Rotation and scale only touch bodies. Translation moves bodies and free
//! constraint endpoints to `pointer - mousedown_offset`.

use crate::input::{ModeFlags, ScaleAxis};
use crate::selection::SelectionModel;
use kurbo::Point;
use si_core::{ObjectKind, World};

pub const DELTA_LIMIT: f64 = 2.0;
pub const ROTATE_SPEED: f64 = 0.03;
pub const SCALE_SPEED: f64 = 0.02;

/// What the host should show as the pointer cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    Rotate,
    Scale,
    Move,
}

pub fn clamp_delta(raw: f64) -> f64 {
    raw.clamp(-DELTA_LIMIT, DELTA_LIMIT)
}

/// Rotation in radians for one tick.
pub fn rotation_step(raw: f64) -> f64 {
    clamp_delta(raw) * ROTATE_SPEED
}

/// `(scale_x, scale_y)` for one tick.
pub fn scale_factors(raw: f64, axis: ScaleAxis) -> (f64, f64) {
    let factor = 1.0 + clamp_delta(raw) * SCALE_SPEED;
    match axis {
        ScaleAxis::Both => (factor, factor),
        ScaleAxis::X => (factor, 1.0),
        ScaleAxis::Y => (1.0, factor),
    }
}

pub fn rotate_selected(world: &mut World, selection: &SelectionModel, angle: f64) {
    for entry in selection.entries() {
        if entry.object.kind == ObjectKind::Body
            && let Some(body) = world.body_mut(entry.object.id)
        {
            body.rotate(angle);
        }
    }
}

/// Scale every selected body about its own position. Circle radii follow
/// the X factor.
pub fn scale_selected(world: &mut World, selection: &SelectionModel, sx: f64, sy: f64) {
    for entry in selection.entries() {
        if entry.object.kind == ObjectKind::Body
            && let Some(body) = world.body_mut(entry.object.id)
        {
            let origin = body.position;
            body.scale(sx, sy, origin);
        }
    }
}

/// Record each entry's offset from its anchor to `pointer`.
///
/// Bodies anchor on their position. Constraints anchor on endpoint A when
/// body A is unbound, else on endpoint B when body B is unbound; a
/// constraint bound at both ends gets no offset and is not moved.
pub fn begin_translate(world: &World, selection: &mut SelectionModel, pointer: Point) {
    for entry in selection.entries_mut() {
        let anchor = match entry.object.kind {
            ObjectKind::Body => world.body(entry.object.id).map(|b| b.position),
            ObjectKind::Constraint => world.constraint(entry.object.id).and_then(|c| {
                if c.body_a.is_none() {
                    Some(c.point_a)
                } else if c.body_b.is_none() {
                    Some(c.point_b)
                } else {
                    None
                }
            }),
            ObjectKind::Composite => None,
        };
        entry.mousedown_offset = anchor.map(|a| pointer - a);
    }
}

/// Move every entry that has an offset so its anchor sits at
/// `pointer - offset`.
pub fn translate_selected(world: &mut World, selection: &SelectionModel, pointer: Point) {
    for entry in selection.entries() {
        let Some(offset) = entry.mousedown_offset else {
            continue;
        };
        let target = pointer - offset;
        match entry.object.kind {
            ObjectKind::Body => {
                if let Some(body) = world.body_mut(entry.object.id) {
                    body.set_position(target);
                }
            }
            ObjectKind::Constraint => move_constraint_end(world, entry.object.id, target),
            ObjectKind::Composite => {}
        }
    }
}

/// Move the free end (A if body A is unbound, else B) and recompute the
/// rest length from the resolved endpoints.
fn move_constraint_end(world: &mut World, id: u32, target: Point) {
    let Some(constraint) = world.constraint_mut(id) else {
        return;
    };
    if constraint.body_a.is_none() {
        constraint.point_a = target;
    } else {
        constraint.point_b = target;
    }
    let snapshot = constraint.clone();
    let (a, b) = world.constraint_endpoints(&snapshot);
    if let Some(constraint) = world.constraint_mut(id) {
        constraint.length = (a - b).hypot();
    }
}

/// Per-tick driver. Holds the pointer position seen at the end of the
/// previous tick.
#[derive(Debug, Clone, Default)]
pub struct TransformController {
    prev_pointer: Point,
}

impl TransformController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prev_pointer(&self) -> Point {
        self.prev_pointer
    }

    /// Raw (unclamped) delta for this tick.
    pub fn delta(&self, pointer: Point, key_axis: f64) -> f64 {
        (pointer.x - self.prev_pointer.x) + key_axis
    }

    /// Apply every active mode, then remember `pointer` for the next tick.
    pub fn tick(
        &mut self,
        world: &mut World,
        selection: &SelectionModel,
        modes: ModeFlags,
        pointer: Point,
        key_axis: f64,
    ) -> CursorHint {
        let delta = self.delta(pointer, key_axis);
        let mut hint = CursorHint::Default;

        if modes.translating {
            translate_selected(world, selection, pointer);
            hint = CursorHint::Move;
        }
        if modes.scaling {
            let (sx, sy) = scale_factors(delta, modes.scale_axis);
            scale_selected(world, selection, sx, sy);
            hint = CursorHint::Scale;
        }
        if modes.rotating {
            rotate_selected(world, selection, rotation_step(delta));
            hint = CursorHint::Rotate;
        }
        if modes.any() && !selection.is_empty() {
            log::trace!("transform tick: delta {delta:.2}, modes {modes:?}");
        }

        self.prev_pointer = pointer;
        hint
    }

    /// Forget pointer history, e.g. when the pointer source changes.
    pub fn reset(&mut self, pointer: Point) {
        self.prev_pointer = pointer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeState;
    use kurbo::Vec2;
    use pretty_assertions::assert_eq;
    use si_core::{Body, Constraint, ObjectId};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clamp_table() {
        for (raw, clamped, angle) in [
            (-5.0, -2.0, -0.06),
            (0.0, 0.0, 0.0),
            (2.0, 2.0, 0.06),
            (5.0, 2.0, 0.06),
        ] {
            assert_eq!(clamp_delta(raw), clamped);
            assert!(approx(rotation_step(raw), angle), "{raw} → {angle}");
        }
    }

    #[test]
    fn scale_axis_factors() {
        let (sx, sy) = scale_factors(1.0, ScaleAxis::Both);
        assert!(approx(sx, 1.02) && approx(sy, 1.02));
        let (sx, sy) = scale_factors(-9.0, ScaleAxis::X);
        assert!(approx(sx, 0.96) && sy == 1.0);
        let (sx, sy) = scale_factors(2.0, ScaleAxis::Y);
        assert!(sx == 1.0 && approx(sy, 1.04));
    }

    fn world_with(body_pos: Point) -> (World, ObjectId, SelectionModel) {
        let mut w = World::new();
        let root = w.root();
        let id = w.next_id();
        let body = w
            .add_body(root, Body::rectangle(id, body_pos, 10.0, 10.0))
            .unwrap();
        let mut sel = SelectionModel::new();
        let mut tree = TreeState::new();
        sel.add(body, &w, &mut tree);
        (w, body, sel)
    }

    #[test]
    fn translate_keeps_grab_offset() {
        let (mut w, body, mut sel) = world_with(Point::new(100.0, 100.0));
        begin_translate(&w, &mut sel, Point::new(103.0, 98.0));
        assert_eq!(sel.entries()[0].mousedown_offset, Some(Vec2::new(3.0, -2.0)));
        translate_selected(&mut w, &sel, Point::new(203.0, 48.0));
        let b = w.body(body.id).unwrap();
        assert_eq!(b.position, Point::new(200.0, 50.0));
        assert_eq!(b.position_prev, b.position);
    }

    #[test]
    fn translate_free_constraint_end_updates_length() {
        let mut w = World::new();
        let root = w.root();
        let id = w.next_id();
        let anchor = w
            .add_body(root, Body::rectangle(id, Point::new(0.0, 0.0), 2.0, 2.0))
            .unwrap();
        let mut link = Constraint::new(w.next_id());
        link.body_a = Some(anchor.id);
        link.point_b = Point::new(10.0, 0.0);
        let c = w.add_constraint(root, link).unwrap();

        let mut sel = SelectionModel::new();
        let mut tree = TreeState::new();
        sel.add(c, &w, &mut tree);
        begin_translate(&w, &mut sel, Point::new(10.0, 0.0));
        translate_selected(&mut w, &sel, Point::new(0.0, 30.0));

        let c = w.constraint(c.id).unwrap();
        assert_eq!(c.point_b, Point::new(0.0, 30.0));
        assert!(approx(c.length, 30.0));
    }

    #[test]
    fn rotate_tick_uses_pointer_and_keys() {
        let (mut w, body, sel) = world_with(Point::new(0.0, 0.0));
        let mut ctl = TransformController::new();
        let modes = ModeFlags {
            rotating: true,
            ..Default::default()
        };
        // pointer moved +1 and one arrow held: delta 2
        let hint = ctl.tick(&mut w, &sel, modes, Point::new(1.0, 0.0), 1.0);
        assert_eq!(hint, CursorHint::Rotate);
        assert!(approx(w.body(body.id).unwrap().angle, 0.06));
        assert_eq!(ctl.prev_pointer(), Point::new(1.0, 0.0));
    }

    #[test]
    fn empty_selection_is_a_noop() {
        let mut w = World::new();
        let sel = SelectionModel::new();
        let mut ctl = TransformController::new();
        let modes = ModeFlags {
            scaling: true,
            translating: true,
            ..Default::default()
        };
        let hint = ctl.tick(&mut w, &sel, modes, Point::new(5.0, 5.0), 0.0);
        assert_eq!(hint, CursorHint::Scale);
        assert_eq!(w.body_count(), 0);
    }
}
