//! Validity checks, single-pass repair and degenerate-part filtering.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon};

use crate::algorithms::winding::{point_in_ring, point_on_ring_edge};
use crate::error::GeometryError;
use crate::geometry::intersect::{intersect_coords, SegIntersection};
use crate::geometry::math::{dedup_coords, same_point};
use crate::geometry::tolerance::{EPS_FACE_AREA, EPS_POS};
use crate::model::{Geometry, Shape};

pub fn is_valid(shape: &Shape) -> bool {
    validate(shape).is_ok()
}

/// Like [`is_valid`] but names the first defect found.
pub fn validate(shape: &Shape) -> Result<(), GeometryError> {
    match shape {
        Shape::Line(l) => validate_line(l),
        Shape::Polygon(mp) => validate_multi(mp),
    }
}

fn finite(c: &Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite()
}

fn validate_line(l: &LineString<f64>) -> Result<(), GeometryError> {
    if !l.0.iter().all(finite) {
        return Err(GeometryError::NonFinite);
    }
    if dedup_coords(&l.0).len() < 2 {
        return Err(GeometryError::Degenerate("line needs two distinct vertices"));
    }
    Ok(())
}

fn ring_area(ring: &[Coord<f64>]) -> f64 {
    let n = ring.len();
    let mut a = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        a += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    0.5 * a
}

fn validate_ring(ring: &LineString<f64>) -> Result<(), GeometryError> {
    let pts = &ring.0;
    if !pts.iter().all(finite) {
        return Err(GeometryError::NonFinite);
    }
    if pts.len() < 4 {
        return Err(GeometryError::Invalid(format!("ring has {} coordinates", pts.len())));
    }
    if !ring.is_closed() {
        return Err(GeometryError::Invalid("ring is not closed".into()));
    }
    if dedup_coords(pts).len() != pts.len() {
        return Err(GeometryError::Invalid("ring repeats a vertex".into()));
    }
    if ring_area(pts).abs() <= EPS_FACE_AREA {
        return Err(GeometryError::Invalid("ring has no area".into()));
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct Seg {
    a: Coord<f64>,
    b: Coord<f64>,
    ring: usize,
    idx: usize,
}

fn ring_segments(rings: &[&LineString<f64>]) -> (Vec<Seg>, Vec<usize>) {
    let mut segs = Vec::new();
    let mut counts = Vec::new();
    for (r, ring) in rings.iter().enumerate() {
        let mut n = 0;
        for w in ring.0.windows(2) {
            if same_point(w[0], w[1], EPS_POS) {
                continue;
            }
            segs.push(Seg { a: w[0], b: w[1], ring: r, idx: n });
            n += 1;
        }
        counts.push(n);
    }
    (segs, counts)
}

#[inline]
fn seg_boxes_apart(s: &Seg, t: &Seg) -> bool {
    let e = EPS_POS;
    s.a.x.max(s.b.x) < t.a.x.min(t.b.x) - e
        || t.a.x.max(t.b.x) < s.a.x.min(s.b.x) - e
        || s.a.y.max(s.b.y) < t.a.y.min(t.b.y) - e
        || t.a.y.max(t.b.y) < s.a.y.min(s.b.y) - e
}

fn validate_polygon(poly: &Polygon<f64>) -> Result<(), GeometryError> {
    validate_ring(poly.exterior())?;
    for h in poly.interiors() {
        validate_ring(h)?;
    }
    let rings: Vec<&LineString<f64>> = std::iter::once(poly.exterior()).chain(poly.interiors().iter()).collect();
    let (segs, counts) = ring_segments(&rings);
    for i in 0..segs.len() {
        for j in (i + 1)..segs.len() {
            let (s, t) = (&segs[i], &segs[j]);
            if seg_boxes_apart(s, t) {
                continue;
            }
            let hit = intersect_coords(s.a, s.b, t.a, t.b);
            if hit == SegIntersection::None {
                continue;
            }
            let overlap = matches!(hit, SegIntersection::CollinearOverlap { t0, t1, .. } if t1 - t0 > EPS_POS);
            if s.ring == t.ring {
                let n = counts[s.ring];
                let adjacent = t.idx == s.idx + 1 || (s.idx == 0 && t.idx + 1 == n);
                if adjacent && !overlap {
                    continue;
                }
                return Err(GeometryError::Invalid(format!("ring {} self-intersects", s.ring)));
            }
            // Rings of one polygon may meet in isolated points only.
            if overlap || matches!(hit, SegIntersection::Proper { .. }) {
                return Err(GeometryError::Invalid(format!("rings {} and {} cross", s.ring, t.ring)));
            }
        }
    }
    let ext = &poly.exterior().0;
    for h in poly.interiors() {
        let probe = h.0.iter().find(|c| !point_on_ring_edge(**c, ext, EPS_POS));
        if let Some(p) = probe {
            if !point_in_ring(*p, ext) {
                return Err(GeometryError::Invalid("hole outside its shell".into()));
            }
        }
    }
    Ok(())
}

fn validate_multi(mp: &MultiPolygon<f64>) -> Result<(), GeometryError> {
    if mp.0.is_empty() {
        return Err(GeometryError::Empty);
    }
    for p in &mp.0 {
        validate_polygon(p)?;
    }
    // Parts must not overlap: no crossing shells and no shell vertex inside another part.
    for (i, a) in mp.0.iter().enumerate() {
        for b in mp.0.iter().skip(i + 1) {
            for w in a.exterior().0.windows(2) {
                for v in b.exterior().0.windows(2) {
                    if matches!(intersect_coords(w[0], w[1], v[0], v[1]), SegIntersection::Proper { .. }) {
                        return Err(GeometryError::Invalid("parts overlap".into()));
                    }
                }
            }
            let inside = |p: &Polygon<f64>, c: Coord<f64>| {
                !point_on_ring_edge(c, &p.exterior().0, EPS_POS)
                    && point_in_ring(c, &p.exterior().0)
                    && !p.interiors().iter().any(|h| point_in_ring(c, &h.0) || point_on_ring_edge(c, &h.0, EPS_POS))
            };
            if b.exterior().0.iter().any(|c| inside(a, *c)) || a.exterior().0.iter().any(|c| inside(b, *c)) {
                return Err(GeometryError::Invalid("parts overlap".into()));
            }
        }
    }
    Ok(())
}

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut pts = dedup_coords(&ring.0);
    while pts.len() > 1 && pts.first().zip(pts.last()).map_or(false, |(a, b)| same_point(*a, *b, EPS_POS)) {
        pts.pop();
    }
    if pts.len() < 3 {
        return None;
    }
    let first = pts[0];
    pts.push(first);
    Some(LineString::from(pts))
}

fn clean_polygon(poly: &Polygon<f64>) -> Option<Polygon<f64>> {
    let ext = clean_ring(poly.exterior())?;
    let holes = poly.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(ext, holes))
}

/// One repair attempt. Valid input is returned unchanged; otherwise rings are
/// cleaned, self-intersections are resolved by a self-union and rings are
/// re-oriented (shell counter-clockwise, holes clockwise).
pub fn repair(g: &Geometry) -> Result<Geometry, GeometryError> {
    if g.is_valid() {
        return Ok(g.clone());
    }
    let out = match g.shape() {
        Shape::Line(l) => {
            let pts = dedup_coords(&l.0);
            if pts.len() < 2 {
                return Err(GeometryError::Degenerate("line collapses to a point"));
            }
            Geometry::line(LineString::from(pts))
        }
        Shape::Polygon(mp) => {
            let cleaned: Vec<Polygon<f64>> = mp.0.iter().filter_map(clean_polygon).collect();
            if cleaned.is_empty() {
                return Err(GeometryError::Empty);
            }
            let cleaned = MultiPolygon::new(cleaned);
            let candidate = Geometry::multi_polygon(cleaned.clone());
            if candidate.is_valid() {
                candidate
            } else {
                let resolved = cleaned.union(&MultiPolygon::<f64>::new(Vec::new()));
                let resolved = MultiPolygon::new(
                    resolved.0.into_iter().filter(|p| p.unsigned_area() > EPS_FACE_AREA).collect(),
                );
                if resolved.0.is_empty() {
                    return Err(GeometryError::Empty);
                }
                Geometry::multi_polygon(resolved.orient(Direction::Default))
            }
        }
    };
    validate(out.shape())?;
    Ok(out)
}

/// Repair invalid parts once, split repaired results into single parts, and
/// drop everything still invalid or (for polygons) smaller than `min_area`.
pub fn filter_degenerate(parts: Vec<Geometry>, min_area: f64) -> Vec<Geometry> {
    let mut kept = Vec::with_capacity(parts.len());
    for part in parts {
        let fixed = match repair(&part) {
            Ok(g) => g,
            Err(e) => {
                log::debug!("dropping part: {}", e);
                continue;
            }
        };
        for piece in crate::algorithms::boolean::explode(&fixed) {
            if piece.as_polygon().is_some() && piece.area() < min_area {
                log::debug!("dropping part with area {:.6} below {}", piece.area(), min_area);
                continue;
            }
            kept.push(piece);
        }
    }
    kept
}
