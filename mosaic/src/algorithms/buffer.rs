//! One-sided offset bands and point disks.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::algorithm::orient::{Direction, Orient};
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::algorithms::boolean::{difference, union_all};
use crate::error::GeometryError;
use crate::geometry::math::{cross, dedup_coords, nearest_segment};
use crate::geometry::tolerance::{norm2, EPS_POS};
use crate::model::Geometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Which side of `line` the `reference` point is on, judged against the
/// nearest segment. A point exactly on that segment's supporting line is Right.
pub fn resolve_side(line: &LineString<f64>, reference: Coord<f64>) -> Side {
    match nearest_segment(line, reference) {
        Some((i, _, _)) if cross(line.0[i], line.0[i + 1], reference) > 0.0 => Side::Left,
        _ => Side::Right,
    }
}

fn unit_normal(a: Coord<f64>, b: Coord<f64>, side: Side) -> Option<Coord<f64>> {
    let ((ux, uy), len) = norm2(b.x - a.x, b.y - a.y);
    if len <= EPS_POS {
        return None;
    }
    Some(match side {
        Side::Left => Coord { x: -uy, y: ux },
        Side::Right => Coord { x: uy, y: -ux },
    })
}

fn arc(center: Coord<f64>, radius: f64, from: f64, sweep: f64, segments: u32) -> Vec<Coord<f64>> {
    let steps = ((sweep.abs() / FRAC_PI_2) * segments as f64).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|k| {
            let a = from + sweep * (k as f64) / (steps as f64);
            Coord { x: center.x + radius * a.cos(), y: center.y + radius * a.sin() }
        })
        .collect()
}

// Region across `a -> b` from the buffered side: `reach` deep, overhanging
// each end by `overhang`.
fn wrong_side(a: Coord<f64>, b: Coord<f64>, n: Coord<f64>, overhang: f64, reach: f64) -> Geometry {
    let ((ux, uy), _) = norm2(b.x - a.x, b.y - a.y);
    let u = Coord { x: ux, y: uy };
    let (p, q) = (a - u * overhang, b + u * overhang);
    let ring = LineString::from(vec![p, q, q - n * reach, p - n * reach]);
    Geometry::polygon(Polygon::new(ring, Vec::new()).orient(Direction::Default))
}

/// Offset band of width `distance` on one side of `line`: flat end caps and
/// round joins with `segments` chords per quarter turn. A non-positive
/// distance or a zero-length line gives an empty polygon.
///
/// Where the line turns toward the buffered side, each of the two segment
/// bands is trimmed to the buffered side of its neighbour, so nothing spills
/// across the line at sharp turns.
pub fn single_sided_buffer(
    line: &LineString<f64>,
    distance: f64,
    side: Side,
    segments: u32,
) -> Result<Geometry, GeometryError> {
    if !distance.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    let pts = dedup_coords(&line.0);
    if distance <= EPS_POS || pts.len() < 2 {
        return Ok(Geometry::empty_polygon());
    }
    let segments = segments.max(1);
    let mut segs: Vec<(Coord<f64>, Coord<f64>, Coord<f64>)> = Vec::with_capacity(pts.len());
    let mut quads: Vec<Geometry> = Vec::with_capacity(pts.len());
    for w in pts.windows(2) {
        let Some(n) = unit_normal(w[0], w[1], side) else { continue };
        let quad = vec![w[0], w[1], w[1] + n * distance, w[0] + n * distance];
        quads.push(Geometry::polygon(Polygon::new(LineString::from(quad), Vec::new()).orient(Direction::Default)));
        segs.push((w[0], w[1], n));
    }
    let reach = distance + segs.iter().map(|(a, b, _)| norm2(b.x - a.x, b.y - a.y).1).sum::<f64>();

    let mut wedges: Vec<Geometry> = Vec::new();
    for j in 1..segs.len() {
        let ((a0, b0, n0), (a1, b1, n1)) = (segs[j - 1], segs[j]);
        let turn = n0.x * n1.y - n0.y * n1.x;
        let outer = match side {
            Side::Left => turn < 0.0,
            Side::Right => turn > 0.0,
        };
        if outer {
            // Round join filling the gap on the outer side of the turn.
            let from = n0.y.atan2(n0.x);
            let mut sweep = n1.y.atan2(n1.x) - from;
            if sweep > PI {
                sweep -= 2.0 * PI;
            } else if sweep <= -PI {
                sweep += 2.0 * PI;
            }
            let mut ring = vec![b0];
            ring.extend(arc(b0, distance, from, sweep, segments));
            if ring.len() >= 3 {
                wedges.push(Geometry::polygon(
                    Polygon::new(LineString::from(ring), Vec::new()).orient(Direction::Default),
                ));
            }
        } else if turn != 0.0 || n0.x * n1.x + n0.y * n1.y < 0.0 {
            quads[j - 1] = difference(&quads[j - 1], &wrong_side(a1, b1, n1, distance, reach))?;
            quads[j] = difference(&quads[j], &wrong_side(a0, b0, n0, distance, reach))?;
        }
    }
    quads.extend(wedges);
    union_all(&quads)
}

/// Disk around `center` with `4 * segments` vertices.
pub fn buffer_point(center: Coord<f64>, radius: f64, segments: u32) -> Geometry {
    let n = 4 * segments.max(1) as usize;
    let ring: Vec<Coord<f64>> = (0..n)
        .map(|k| {
            let a = 2.0 * PI * (k as f64) / (n as f64);
            Coord { x: center.x + radius * a.cos(), y: center.y + radius * a.sin() }
        })
        .collect();
    Geometry::from_ring(&ring)
}
