use geo::{Coord, LineString};

use super::tolerance::{approx_eq, clamp01, EPS_POS};

pub fn seg_distance_sq(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> (f64, f64) {
    let vx = x2 - x1; let vy = y2 - y1;
    let wx = px - x1; let wy = py - y1;
    let vv = vx*vx + vy*vy;
    let t = if vv > 0.0 { clamp01((wx*vx + wy*vy) / vv) } else { 0.0 };
    let projx = x1 + t * vx; let projy = y1 + t * vy;
    let dx = px - projx; let dy = py - projy;
    (dx*dx + dy*dy, t)
}

pub fn dist_point_to_seg_sq(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let (d2, _) = seg_distance_sq(px, py, x1, y1, x2, y2);
    d2
}

#[inline]
pub fn dist(a: Coord<f64>, b: Coord<f64>) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

#[inline]
pub fn same_point(a: Coord<f64>, b: Coord<f64>, eps: f64) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps)
}

/// z component of (b - a) x (p - a); positive when `p` is left of a->b.
#[inline]
pub fn cross(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

pub fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t }
}

/// Nearest segment of a polyline to `p`: (segment index, squared distance, t on segment).
pub fn nearest_segment(line: &LineString<f64>, p: Coord<f64>) -> Option<(usize, f64, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, w) in line.0.windows(2).enumerate() {
        let (d2, t) = seg_distance_sq(p.x, p.y, w[0].x, w[0].y, w[1].x, w[1].y);
        if best.map_or(true, |(_, bd, _)| d2 < bd) {
            best = Some((i, d2, t));
        }
    }
    best
}

pub fn distance_to_line(line: &LineString<f64>, p: Coord<f64>) -> f64 {
    match nearest_segment(line, p) {
        Some((_, d2, _)) => d2.sqrt(),
        None => line.0.first().map_or(f64::INFINITY, |c| dist(*c, p)),
    }
}

/// Drop consecutive duplicates (within EPS_POS) and non-finite coordinates.
pub fn dedup_coords(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        if !c.x.is_finite() || !c.y.is_finite() { continue; }
        if out.last().map_or(false, |l| same_point(*l, *c, EPS_POS)) { continue; }
        out.push(*c);
    }
    out
}
