//! Selection overlays, painted after the host has rendered the world.
//!
//! Painting goes through the `OverlayCanvas` trait so any backend can draw
//! it; `DisplayList` records the commands instead, which is what the
//! headless host and the tests use.

use kurbo::{Point, Rect};
use si_core::geometry::bounds_overlap;
use si_core::{ObjectId, ObjectKind, World};

/// Padding around selected body and group bounds.
pub const SELECTION_PADDING: f64 = 3.0;
/// Radius of the circles marking selected constraint endpoints.
pub const ENDPOINT_RADIUS: f64 = 8.0;

/// Colors for the overlay painter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTheme {
    pub selection: &'static str,
    pub region_fill: &'static str,
    pub region_stroke: &'static str,
}

impl OverlayTheme {
    pub fn light() -> Self {
        Self {
            selection: "rgba(0, 0, 0, 0.8)",
            region_fill: "rgba(79, 195, 247, 0.08)",
            region_stroke: "#4FC3F7",
        }
    }

    pub fn dark() -> Self {
        Self {
            selection: "rgba(255, 255, 255, 0.9)",
            region_fill: "rgba(255, 255, 255, 0.05)",
            region_stroke: "rgba(255, 255, 255, 0.6)",
        }
    }
}

impl Default for OverlayTheme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Minimal drawing surface for overlays.
pub trait OverlayCanvas {
    fn stroke_rect(&mut self, rect: Rect, color: &'static str);
    fn stroke_circle(&mut self, center: Point, radius: f64, color: &'static str);
    fn fill_rect(&mut self, rect: Rect, color: &'static str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    StrokeRect {
        rect: Rect,
        color: &'static str,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        color: &'static str,
    },
    FillRect {
        rect: Rect,
        color: &'static str,
    },
}

/// A canvas that records what would have been drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl OverlayCanvas for DisplayList {
    fn stroke_rect(&mut self, rect: Rect, color: &'static str) {
        self.commands.push(DrawCommand::StrokeRect { rect, color });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: &'static str) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: &'static str) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }
}

/// Paint selection highlights plus the active region rectangle.
///
/// Objects entirely outside `viewport` are skipped; dead ids are ignored.
pub fn paint_overlay(
    canvas: &mut dyn OverlayCanvas,
    world: &World,
    selected: &[ObjectId],
    region: Option<Rect>,
    viewport: Rect,
    theme: &OverlayTheme,
) {
    for object in selected {
        match object.kind {
            ObjectKind::Body => {
                if let Some(body) = world.body(object.id)
                    && bounds_overlap(&body.bounds, &viewport)
                {
                    canvas.stroke_rect(
                        body.bounds.inflate(SELECTION_PADDING, SELECTION_PADDING),
                        theme.selection,
                    );
                }
            }
            ObjectKind::Constraint => {
                if let Some(constraint) = world.constraint(object.id) {
                    let (a, b) = world.constraint_endpoints(constraint);
                    for end in [a, b] {
                        if viewport.inflate(ENDPOINT_RADIUS, ENDPOINT_RADIUS).contains(end) {
                            canvas.stroke_circle(end, ENDPOINT_RADIUS, theme.selection);
                        }
                    }
                }
            }
            ObjectKind::Composite => {
                if let Some(bounds) = world.composite_bounds(object.id)
                    && bounds_overlap(&bounds, &viewport)
                {
                    canvas.stroke_rect(
                        bounds.inflate(SELECTION_PADDING, SELECTION_PADDING),
                        theme.selection,
                    );
                }
            }
        }
    }

    if let Some(region) = region {
        paint_region(canvas, region.abs(), theme);
    }

    log::trace!("overlay: {} selected, region {:?}", selected.len(), region);
}

fn paint_region(canvas: &mut dyn OverlayCanvas, region: Rect, theme: &OverlayTheme) {
    if region.width() < 1.0 && region.height() < 1.0 {
        return;
    }
    canvas.fill_rect(region, theme.region_fill);
    canvas.stroke_rect(region, theme.region_stroke);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use si_core::{Body, Constraint};

    const VIEW: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn selected_body_gets_padded_bounds() {
        let mut w = World::new();
        let root = w.root();
        let id = w.next_id();
        let body = w
            .add_body(root, Body::rectangle(id, Point::new(50.0, 50.0), 20.0, 20.0))
            .unwrap();
        let mut list = DisplayList::new();
        let theme = OverlayTheme::default();
        paint_overlay(&mut list, &w, &[body], None, VIEW, &theme);
        assert_eq!(
            list.commands,
            vec![DrawCommand::StrokeRect {
                rect: Rect::new(37.0, 37.0, 63.0, 63.0),
                color: theme.selection
            }]
        );
    }

    #[test]
    fn constraint_gets_two_endpoint_circles() {
        let mut w = World::new();
        let root = w.root();
        let mut link = Constraint::new(w.next_id());
        link.point_a = Point::new(10.0, 10.0);
        link.point_b = Point::new(90.0, 10.0);
        let c = w.add_constraint(root, link).unwrap();
        let mut list = DisplayList::new();
        paint_overlay(&mut list, &w, &[c], None, VIEW, &OverlayTheme::light());
        assert_eq!(list.len(), 2);
        assert!(matches!(
            list.commands[1],
            DrawCommand::StrokeCircle { radius, .. } if radius == ENDPOINT_RADIUS
        ));
    }

    #[test]
    fn offscreen_and_dead_objects_are_culled() {
        let mut w = World::new();
        let root = w.root();
        let id = w.next_id();
        let far = w
            .add_body(root, Body::rectangle(id, Point::new(5000.0, 50.0), 20.0, 20.0))
            .unwrap();
        let mut list = DisplayList::new();
        paint_overlay(
            &mut list,
            &w,
            &[far, ObjectId::body(999)],
            None,
            VIEW,
            &OverlayTheme::default(),
        );
        assert!(list.is_empty());
    }

    #[test]
    fn region_is_filled_and_stroked() {
        let w = World::new();
        let mut list = DisplayList::new();
        paint_overlay(
            &mut list,
            &w,
            &[],
            Some(Rect::new(100.0, 100.0, 20.0, 20.0)),
            VIEW,
            &OverlayTheme::default(),
        );
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.commands[0],
            DrawCommand::FillRect {
                rect: Rect::new(20.0, 20.0, 100.0, 100.0),
                color: OverlayTheme::default().region_fill
            }
        );
    }
}
