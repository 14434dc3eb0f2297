//! Arc-length addressing along polylines.

use geo::{Coord, LineString, MultiPolygon};

use crate::error::GeometryError;
use crate::geometry::math::{dedup_coords, dist, distance_to_line, lerp, nearest_segment};
use crate::geometry::tolerance::{clamp01, EPS_LEN};

pub fn line_length(line: &LineString<f64>) -> f64 {
    line.0.windows(2).map(|w| dist(w[0], w[1])).sum()
}

/// Arc-length position of the point on `line` nearest to `p`.
pub fn line_locate_point(line: &LineString<f64>, p: Coord<f64>) -> f64 {
    let Some((idx, _, t)) = nearest_segment(line, p) else { return 0.0 };
    let before: f64 = line.0[..=idx].windows(2).map(|w| dist(w[0], w[1])).sum();
    before + t * dist(line.0[idx], line.0[idx + 1])
}

/// Point at arc-length `s`, clamped to the line's extent.
pub fn interpolate(line: &LineString<f64>, s: f64) -> Option<Coord<f64>> {
    let first = *line.0.first()?;
    if s <= 0.0 {
        return Some(first);
    }
    let mut acc = 0.0;
    for w in line.0.windows(2) {
        let l = dist(w[0], w[1]);
        if acc + l >= s && l > 0.0 {
            return Some(lerp(w[0], w[1], clamp01((s - acc) / l)));
        }
        acc += l;
    }
    line.0.last().copied()
}

// Vertices strictly between arc positions a <= b, bracketed by the interpolated ends.
fn span(line: &LineString<f64>, a: f64, b: f64, out: &mut Vec<Coord<f64>>) {
    if let Some(p) = interpolate(line, a) {
        out.push(p);
    }
    let mut acc = 0.0;
    for w in line.0.windows(2) {
        acc += dist(w[0], w[1]);
        if acc > a && acc < b {
            out.push(w[1]);
        }
    }
    if let Some(p) = interpolate(line, b) {
        out.push(p);
    }
}

/// The arc walked forward from `a` to `b`, wrapping through the line's end
/// and start when `a > b`.
pub fn forward_arc(line: &LineString<f64>, a: f64, b: f64) -> LineString<f64> {
    let total = line_length(line);
    let a = a.clamp(0.0, total);
    let b = b.clamp(0.0, total);
    let mut pts = Vec::new();
    if a <= b {
        span(line, a, b, &mut pts);
    } else {
        span(line, a, total, &mut pts);
        span(line, 0.0, b, &mut pts);
    }
    LineString::from(dedup_coords(&pts))
}

/// Shorter of the two arcs joining `start` and `end`; on a tie the forward
/// (`start` to `end`) arc wins.
pub fn line_substring(line: &LineString<f64>, start: f64, end: f64) -> Result<LineString<f64>, GeometryError> {
    let one = forward_arc(line, start, end);
    let second = forward_arc(line, end, start);
    let picked = if line_length(&second) < line_length(&one) { second } else { one };
    if picked.0.len() < 2 || line_length(&picked) <= EPS_LEN {
        return Err(GeometryError::Degenerate("substring has no length"));
    }
    Ok(picked)
}

/// Ring of any part (shell or hole) closest to `cursor`, as a closed line.
pub fn nearest_ring(mp: &MultiPolygon<f64>, cursor: Coord<f64>) -> Option<LineString<f64>> {
    mp.0.iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors().iter()))
        .map(|r| (distance_to_line(r, cursor), r))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, r)| r.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    fn ring() -> LineString<f64> {
        // 10 x 10 square walked counter-clockwise from the origin, perimeter 40
        line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)]
    }

    #[test]
    fn locate_and_interpolate_agree() {
        let r = ring();
        assert!((line_locate_point(&r, Coord { x: 12.0, y: 5.0 }) - 15.0).abs() < 1e-12);
        let p = interpolate(&r, 25.0).unwrap();
        assert!((p.x - 5.0).abs() < 1e-12 && (p.y - 10.0).abs() < 1e-12);
        assert_eq!(interpolate(&r, 99.0), Some(Coord { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn wrap_arc_passes_through_start() {
        let arc = forward_arc(&ring(), 35.0, 5.0);
        assert!((line_length(&arc) - 10.0).abs() < 1e-9);
        assert!(arc.0.contains(&Coord { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn picks_shorter_arc() {
        let r = ring();
        let s = line_substring(&r, 5.0, 35.0).unwrap();
        assert!((line_length(&s) - 10.0).abs() < 1e-9);
        assert_eq!(s.0.first().copied(), Some(Coord { x: 0.0, y: 5.0 }));
    }

    #[test]
    fn tie_goes_forward() {
        let r = ring();
        let s = line_substring(&r, 0.0, 20.0).unwrap();
        assert!(s.0.contains(&Coord { x: 10.0, y: 0.0 }), "forward arc runs along the bottom edge");
        let back = line_substring(&r, 20.0, 0.0).unwrap();
        assert!(back.0.contains(&Coord { x: 0.0, y: 10.0 }));
    }

    #[test]
    fn zero_length_is_degenerate() {
        assert!(matches!(line_substring(&ring(), 7.0, 7.0), Err(GeometryError::Degenerate(_))));
    }

    #[test]
    fn nearest_ring_prefers_hole() {
        let p = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 4.0, y: 6.0), (x: 6.0, y: 6.0), (x: 6.0, y: 4.0)]],
        );
        let r = nearest_ring(&MultiPolygon::new(vec![p]), Coord { x: 3.5, y: 5.0 }).unwrap();
        assert!(r.is_closed());
        assert!(r.0.contains(&Coord { x: 4.0, y: 4.0 }));
    }
}
