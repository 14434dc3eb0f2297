// Segment/segment classification with tolerances.

use geo::Coord;

use super::math::cross;
use super::tolerance::{clamp01, EPS_DENOM, EPS_POS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegIntersection {
    None,
    // Crossing strictly inside both segments
    Proper { t: f64, u: f64, x: f64, y: f64 },
    // Meeting at an endpoint of at least one segment
    Touch { t: f64, u: f64, x: f64, y: f64 },
    // Shared span; t on AB, u on CD, both ranges ordered
    CollinearOverlap { t0: f64, t1: f64, u0: f64, u1: f64 },
}

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

// Parameter of `p` along `a -> b`, unclamped.
fn param_on(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> Option<f64> {
    let d = b - a;
    let len2 = dot(d, d);
    if len2 <= EPS_DENOM {
        return None;
    }
    Some(dot(p - a, d) / len2)
}

fn collinear(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, d: Coord<f64>, eps: f64) -> SegIntersection {
    let Some(tc) = param_on(a, b, c) else {
        // AB is a point lying on CD's line
        let u = param_on(c, d, a).unwrap_or(0.0);
        if u < -eps || u > 1.0 + eps {
            return SegIntersection::None;
        }
        return SegIntersection::Touch { t: 0.0, u: clamp01(u), x: a.x, y: a.y };
    };
    let Some(td) = param_on(a, b, d) else {
        return SegIntersection::Touch { t: clamp01(tc), u: 0.0, x: c.x, y: c.y };
    };
    let lo = tc.min(td).max(0.0);
    let hi = tc.max(td).min(1.0);
    if hi < lo - eps {
        return SegIntersection::None;
    }
    let at = |t: f64| a + (b - a) * t;
    let (p0, p1) = (at(lo), at(hi));
    let ua = param_on(c, d, p0).unwrap_or(0.0);
    let ub = param_on(c, d, p1).unwrap_or(0.0);
    if hi - lo <= eps {
        return SegIntersection::Touch { t: lo, u: clamp01(ua), x: p0.x, y: p0.y };
    }
    SegIntersection::CollinearOverlap { t0: lo, t1: hi, u0: ua.min(ub), u1: ua.max(ub) }
}

/// Classify AB against CD. `eps` is the orientation/parameter slack,
/// `denom_eps` guards the parallel test.
pub fn intersect_segments(
    a: Coord<f64>,
    b: Coord<f64>,
    c: Coord<f64>,
    d: Coord<f64>,
    eps: f64,
    denom_eps: f64,
) -> SegIntersection {
    let (o1, o2) = (cross(a, b, c), cross(a, b, d));
    let (o3, o4) = (cross(c, d, a), cross(c, d, b));
    let flat = |o: f64| o.abs() <= eps;
    if flat(o1) && flat(o2) && flat(o3) && flat(o4) {
        return collinear(a, b, c, d, eps);
    }
    let straddles = |p: f64, q: f64| p * q < 0.0 || flat(p) || flat(q);
    if !straddles(o1, o2) || !straddles(o3, o4) {
        return SegIntersection::None;
    }

    let r = b - a;
    let s = d - c;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() <= denom_eps {
        return SegIntersection::None;
    }
    let qp = c - a;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    let outside = |v: f64| v < -eps || v > 1.0 + eps;
    if outside(t) || outside(u) {
        return SegIntersection::None;
    }
    let at_end = |v: f64| v.abs() <= eps || (1.0 - v).abs() <= eps;
    let p = a + r * t;
    if at_end(t) || at_end(u) {
        SegIntersection::Touch { t: clamp01(t), u: clamp01(u), x: p.x, y: p.y }
    } else {
        SegIntersection::Proper { t, u, x: p.x, y: p.y }
    }
}

/// [`intersect_segments`] with the crate tolerances.
pub fn intersect_coords(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, d: Coord<f64>) -> SegIntersection {
    intersect_segments(a, b, c, d, EPS_POS, EPS_DENOM)
}
