//! Point-in-ring and point-in-polygon tests.
//!
//! Rings may be passed open or closed; a closing duplicate contributes a
//! zero-length edge and does not change the result.

use geo::{Coord, MultiPolygon, Polygon};

use crate::geometry::math::dist_point_to_seg_sq;

/// Winding number of `p` around `ring`.
/// - Positive = counter-clockwise winding
/// - Negative = clockwise winding
/// - Zero = point is outside
pub fn winding_number(p: Coord<f64>, ring: &[Coord<f64>]) -> i32 {
    if ring.len() < 3 {
        return 0;
    }
    let mut winding = 0i32;
    let n = ring.len();
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        if p1.y <= p.y {
            if p2.y > p.y && cross_product(p1.x - p.x, p1.y - p.y, p2.x - p.x, p2.y - p.y) > 0.0 {
                winding += 1;
            }
        } else if p2.y <= p.y && cross_product(p1.x - p.x, p1.y - p.y, p2.x - p.x, p2.y - p.y) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Number of ring edges crossed by the ray from `p` towards +x.
pub fn crossing_number(p: Coord<f64>, ring: &[Coord<f64>]) -> i32 {
    if ring.len() < 3 {
        return 0;
    }
    let mut crossings = 0i32;
    let n = ring.len();
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        let y_crosses = (p1.y <= p.y && p2.y > p.y) || (p2.y <= p.y && p1.y > p.y);
        if y_crosses {
            let t = (p.y - p1.y) / (p2.y - p1.y);
            let x_intersect = p1.x + t * (p2.x - p1.x);
            if p.x < x_intersect {
                crossings += 1;
            }
        }
    }
    crossings
}

#[inline]
fn cross_product(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

#[inline]
pub fn point_in_ring(p: Coord<f64>, ring: &[Coord<f64>]) -> bool {
    winding_number(p, ring) != 0
}

/// True when `p` lies within `tol` of any ring edge.
pub fn point_on_ring_edge(p: Coord<f64>, ring: &[Coord<f64>], tol: f64) -> bool {
    if ring.is_empty() {
        return false;
    }
    let tol_sq = tol * tol;
    let n = ring.len();
    (0..n).any(|i| {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        dist_point_to_seg_sq(p.x, p.y, a.x, a.y, b.x, b.y) <= tol_sq
    })
}

/// Where a point sits relative to a polygon with holes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Inside,
    Boundary,
    Outside,
}

pub fn locate(p: Coord<f64>, poly: &Polygon<f64>, tol: f64) -> Location {
    let rings = std::iter::once(poly.exterior()).chain(poly.interiors().iter());
    for r in rings {
        if point_on_ring_edge(p, &r.0, tol) {
            return Location::Boundary;
        }
    }
    if !point_in_ring(p, &poly.exterior().0) {
        return Location::Outside;
    }
    if poly.interiors().iter().any(|h| point_in_ring(p, &h.0)) {
        return Location::Outside;
    }
    Location::Inside
}

/// Boundary-inclusive containment.
pub fn polygon_covers(poly: &Polygon<f64>, p: Coord<f64>, tol: f64) -> bool {
    locate(p, poly, tol) != Location::Outside
}

pub fn multi_covers(mp: &MultiPolygon<f64>, p: Coord<f64>, tol: f64) -> bool {
    mp.0.iter().any(|poly| polygon_covers(poly, p, tol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, LineString};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square() -> Vec<Coord<f64>> {
        vec![c(0.0, 0.0), c(10.0, 0.0), c(10.0, 10.0), c(0.0, 10.0)]
    }

    #[test]
    fn test_winding_number_square() {
        assert_eq!(winding_number(c(5.0, 5.0), &square()), 1);
        assert_eq!(winding_number(c(-5.0, 5.0), &square()), 0);
        assert_eq!(winding_number(c(15.0, 5.0), &square()), 0);
        assert_eq!(winding_number(c(5.0, 15.0), &square()), 0);
    }

    #[test]
    fn test_winding_number_clockwise() {
        let mut sq = square();
        sq.reverse();
        assert_eq!(winding_number(c(5.0, 5.0), &sq), -1);
    }

    #[test]
    fn test_closed_ring_same_answer() {
        let mut sq = square();
        sq.push(sq[0]);
        assert_eq!(winding_number(c(5.0, 5.0), &sq), 1);
        assert_eq!(crossing_number(c(-5.0, 5.0), &sq), 2);
    }

    #[test]
    fn test_concave_polygon() {
        let l_shape = vec![c(0.0, 0.0), c(10.0, 0.0), c(10.0, 5.0), c(5.0, 5.0), c(5.0, 10.0), c(0.0, 10.0)];
        assert_eq!(winding_number(c(2.0, 2.0), &l_shape), 1);
        assert_eq!(winding_number(c(2.0, 7.0), &l_shape), 1);
        assert_eq!(winding_number(c(7.0, 7.0), &l_shape), 0);
    }

    #[test]
    fn test_point_on_edge() {
        assert!(point_on_ring_edge(c(5.0, 0.0), &square(), 0.001));
        assert!(point_on_ring_edge(c(0.0, 0.0), &square(), 0.001));
        assert!(!point_on_ring_edge(c(5.0, 5.0), &square(), 0.001));
    }

    #[test]
    fn holes_are_outside() {
        let hole: LineString<f64> = vec![(4.0, 4.0), (4.0, 6.0), (6.0, 6.0), (6.0, 4.0), (4.0, 4.0)].into();
        let poly = Polygon::new(LineString::from(square()), vec![hole]);
        assert_eq!(locate(c(5.0, 5.0), &poly, 1e-9), Location::Outside);
        assert_eq!(locate(c(4.0, 5.0), &poly, 1e-9), Location::Boundary);
        assert_eq!(locate(c(2.0, 5.0), &poly, 1e-9), Location::Inside);
        let plain = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert!(polygon_covers(&plain, c(1.0, 0.5), 1e-9));
        assert!(!multi_covers(&MultiPolygon::new(vec![plain]), c(0.0, 1.0), 1e-9));
    }

    #[test]
    fn test_empty_and_degenerate() {
        assert_eq!(winding_number(c(0.0, 0.0), &[]), 0);
        assert_eq!(winding_number(c(0.0, 0.0), &[c(0.0, 0.0), c(1.0, 1.0)]), 0);
    }
}
