//! Cross-layer vertex synchronization.
//!
//! After a geometry is committed, neighbours whose boundary runs within the
//! snap tolerance of one of its vertices get that vertex inserted on their
//! nearest edge, so shared borders stay vertex-aligned.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::StoreError;
use crate::geometry::math::{dist, seg_distance_sq};
use crate::layers::LayerId;
use crate::model::{FeatureId, Geometry, Shape};
use crate::store::FeatureStore;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncReport {
    /// Vertices inserted across all touched features.
    pub inserted: usize,
    pub touched: Vec<(LayerId, FeatureId)>,
}

fn has_vertex_near(shape: &Shape, v: Coord<f64>, tol: f64) -> bool {
    let near = |ls: &LineString<f64>| ls.0.iter().any(|c| dist(*c, v) <= tol);
    match shape {
        Shape::Line(l) => near(l),
        Shape::Polygon(mp) => mp
            .0
            .iter()
            .any(|p| near(p.exterior()) || p.interiors().iter().any(near)),
    }
}

// (ring slot, segment index, squared distance); slot 0 is a line or a shell,
// k > 0 the hole k - 1, counted per polygon part.
fn nearest_edge(lines: &[&LineString<f64>], v: Coord<f64>) -> Option<(usize, usize, f64, f64)> {
    let mut best: Option<(usize, usize, f64, f64)> = None;
    for (slot, ls) in lines.iter().enumerate() {
        for (i, w) in ls.0.windows(2).enumerate() {
            let (d2, t) = seg_distance_sq(v.x, v.y, w[0].x, w[0].y, w[1].x, w[1].y);
            if best.map_or(true, |(_, _, bd, _)| d2 < bd) {
                best = Some((slot, i, d2, t));
            }
        }
    }
    best
}

fn with_vertex(ls: &LineString<f64>, seg: usize, v: Coord<f64>) -> LineString<f64> {
    let mut pts = ls.0.clone();
    pts.insert(seg + 1, v);
    LineString::from(pts)
}

/// `shape` with `v` inserted on its nearest edge when that edge passes within
/// `tolerance` and no existing vertex is already that close. `None` when
/// nothing changes.
pub fn insert_vertex(shape: &Shape, v: Coord<f64>, tolerance: f64) -> Option<Shape> {
    if has_vertex_near(shape, v, tolerance) {
        return None;
    }
    let tol2 = tolerance * tolerance;
    match shape {
        Shape::Line(l) => {
            let (_, seg, d2, t) = nearest_edge(&[l], v)?;
            if d2 > tol2 || t <= 0.0 || t >= 1.0 {
                return None;
            }
            Some(Shape::Line(with_vertex(l, seg, v)))
        }
        Shape::Polygon(mp) => {
            let mut best: Option<(usize, usize, usize, f64)> = None;
            for (pi, p) in mp.0.iter().enumerate() {
                let rings: Vec<&LineString<f64>> = std::iter::once(p.exterior()).chain(p.interiors().iter()).collect();
                if let Some((slot, seg, d2, t)) = nearest_edge(&rings, v) {
                    if d2 <= tol2 && t > 0.0 && t < 1.0 && best.map_or(true, |b| d2 < b.3) {
                        best = Some((pi, slot, seg, d2));
                    }
                }
            }
            let (pi, slot, seg, _) = best?;
            let parts = mp
                .0
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    if i != pi {
                        return p.clone();
                    }
                    let ext = if slot == 0 { with_vertex(p.exterior(), seg, v) } else { p.exterior().clone() };
                    let holes = p
                        .interiors()
                        .iter()
                        .enumerate()
                        .map(|(h, r)| if slot == h + 1 { with_vertex(r, seg, v) } else { r.clone() })
                        .collect();
                    Polygon::new(ext, holes)
                })
                .collect();
            Some(Shape::Polygon(MultiPolygon::new(parts)))
        }
    }
}

/// Insert every vertex of `geometry` into the features of `layers` whose
/// boundary passes within `tolerance` of it. Running it again is a no-op.
pub fn sync(
    store: &mut dyn FeatureStore,
    geometry: &Geometry,
    layers: &[LayerId],
    tolerance: f64,
) -> Result<SyncReport, StoreError> {
    let mut report = SyncReport::default();
    let Some(bbox) = geometry.bbox() else { return Ok(report) };
    let vertices = geometry.vertices();
    let area = bbox.pad(tolerance);
    for &layer in layers {
        for feature in store.query(layer, &area)? {
            let mut shape = feature.geometry.shape().clone();
            let mut count = 0;
            for v in &vertices {
                if let Some(next) = insert_vertex(&shape, *v, tolerance) {
                    shape = next;
                    count += 1;
                }
            }
            if count == 0 {
                continue;
            }
            if !store.is_editable(layer)? {
                store.start_editing(layer)?;
            }
            log::trace!("sync: {} vertices into {} {}", count, layer, feature.id);
            store.change_geometry(layer, feature.id, Geometry::new(shape))?;
            report.inserted += count;
            report.touched.push((layer, feature.id));
        }
    }
    if report.inserted > 0 {
        log::debug!("sync inserted {} vertices into {} features", report.inserted, report.touched.len());
    }
    Ok(report)
}
