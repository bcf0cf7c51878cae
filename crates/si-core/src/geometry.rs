//! Small geometry helpers on top of `kurbo`.
//!
//! Bounds are inclusive on every edge, so a point on the outline of a body
//! counts as inside and two boxes that only touch count as overlapping.

use kurbo::{Affine, Point, Rect};

/// Axis-aligned bounds of a vertex list. Empty input yields a zero rect.
pub fn bounds_of(vertices: &[Point]) -> Rect {
    let mut iter = vertices.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

pub fn bounds_contains(bounds: &Rect, point: Point) -> bool {
    point.x >= bounds.x0 && point.x <= bounds.x1 && point.y >= bounds.y0 && point.y <= bounds.y1
}

pub fn bounds_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Convex polygon containment.
///
/// Every edge cross product must have the same sign; either winding is
/// accepted. Fewer than three vertices never contain anything.
pub fn vertices_contain(vertices: &[Point], point: Point) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let cross = (b - a).cross(point - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Scale about `origin` with independent X/Y factors.
pub fn scale_about(origin: Point, sx: f64, sy: f64) -> Affine {
    Affine::translate(origin.to_vec2())
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(-origin.to_vec2())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn bounds_of_square() {
        let b = bounds_of(&square());
        assert_eq!(b, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(bounds_of(&[]), Rect::ZERO);
    }

    #[test]
    fn containment_either_winding() {
        let cw = square();
        let mut ccw = square();
        ccw.reverse();
        for verts in [&cw, &ccw] {
            assert!(vertices_contain(verts, Point::new(5.0, 5.0)));
            assert!(vertices_contain(verts, Point::new(10.0, 5.0)));
            assert!(!vertices_contain(verts, Point::new(11.0, 5.0)));
        }
    }

    #[test]
    fn triangle_excludes_bounding_box_corner() {
        let tri = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        let p = Point::new(9.0, 9.0);
        assert!(bounds_contains(&bounds_of(&tri), p));
        assert!(!vertices_contain(&tri, p));
    }

    #[test]
    fn touching_bounds_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 20.0, 20.0);
        let c = Rect::new(10.1, 0.0, 20.0, 5.0);
        assert!(bounds_overlap(&a, &b));
        assert!(!bounds_overlap(&a, &c));
    }

    #[test]
    fn scale_about_keeps_origin_fixed() {
        let origin = Point::new(5.0, 5.0);
        let t = scale_about(origin, 2.0, 1.0);
        assert_eq!(t * origin, origin);
        assert_eq!(t * Point::new(6.0, 6.0), Point::new(7.0, 6.0));
    }
}
