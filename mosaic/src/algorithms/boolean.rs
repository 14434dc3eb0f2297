//! Polygon set algebra (union, intersection, difference).
//!
//! The overlay itself is geo's `BooleanOps`; this module adds the operand
//! checks, sliver pruning and the split into single-part geometries that
//! callers need before writing features.

use geo::{Area, BooleanOps, MultiPolygon};

use crate::error::GeometryError;
use crate::geometry::tolerance::EPS_FACE_AREA;
use crate::model::{Geometry, Shape};

/// Boolean operation type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOp {
    /// A ∪ B
    Union,
    /// A ∩ B
    Intersection,
    /// A - B
    Difference,
}

impl BoolOp {
    fn name(self) -> &'static str {
        match self {
            BoolOp::Union => "union",
            BoolOp::Intersection => "intersection",
            BoolOp::Difference => "difference",
        }
    }
}

fn polygon_operand(g: &Geometry, op: BoolOp) -> Result<&MultiPolygon<f64>, GeometryError> {
    match g.shape() {
        Shape::Polygon(p) => Ok(p),
        Shape::Line(_) => Err(GeometryError::Unsupported { op: op.name(), kind: g.geometry_type() }),
    }
}

pub fn boolean_op(a: &Geometry, b: &Geometry, op: BoolOp) -> Result<Geometry, GeometryError> {
    let pa = polygon_operand(a, op)?;
    let pb = polygon_operand(b, op)?;
    let out = match op {
        BoolOp::Union => pa.union(pb),
        BoolOp::Intersection => pa.intersection(pb),
        BoolOp::Difference => pa.difference(pb),
    };
    // Noding leaves zero-area crumbs along shared edges.
    let parts = out.0.into_iter().filter(|p| p.unsigned_area() > EPS_FACE_AREA).collect();
    Ok(Geometry::multi_polygon(MultiPolygon::new(parts)))
}

pub fn intersection(a: &Geometry, b: &Geometry) -> Result<Geometry, GeometryError> {
    boolean_op(a, b, BoolOp::Intersection)
}

pub fn difference(a: &Geometry, b: &Geometry) -> Result<Geometry, GeometryError> {
    boolean_op(a, b, BoolOp::Difference)
}

pub fn union(a: &Geometry, b: &Geometry) -> Result<Geometry, GeometryError> {
    boolean_op(a, b, BoolOp::Union)
}

/// Union of every part; an empty input gives an empty polygon.
pub fn union_all(parts: &[Geometry]) -> Result<Geometry, GeometryError> {
    parts.iter().try_fold(Geometry::empty_polygon(), |acc, g| union(&acc, g))
}

/// Split a multi-part polygon into single-part geometries. Lines pass through.
pub fn explode(g: &Geometry) -> Vec<Geometry> {
    match g.shape() {
        Shape::Polygon(mp) => mp.0.iter().cloned().map(Geometry::polygon).collect(),
        Shape::Line(_) => vec![g.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        Geometry::polygon(polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)])
    }

    #[test]
    fn notch_difference_and_intersection() {
        let f = rect(0.0, 0.0, 10.0, 10.0);
        let c = rect(8.0, 4.0, 12.0, 6.0);
        let inter = intersection(&f, &c).unwrap();
        let diff = difference(&f, &c).unwrap();
        assert!((inter.area() - 4.0).abs() < 1e-6);
        assert!((diff.area() - 96.0).abs() < 1e-6);
        assert!(diff.is_valid());
        assert_eq!(explode(&diff).len(), 1);
    }

    #[test]
    fn split_into_parts() {
        let f = rect(0.0, 0.0, 10.0, 2.0);
        let c = rect(4.0, -1.0, 6.0, 3.0);
        let parts = explode(&difference(&f, &c).unwrap());
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| (p.area() - 8.0).abs() < 1e-6));
    }

    #[test]
    fn union_all_merges_neighbours() {
        let u = union_all(&[rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 0.0, 2.0, 1.0), rect(5.0, 5.0, 6.0, 6.0)]).unwrap();
        assert_eq!(explode(&u).len(), 2);
        assert!((u.area() - 3.0).abs() < 1e-6);
        assert!(union_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn lines_are_rejected() {
        let l = Geometry::line(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        let err = union(&rect(0.0, 0.0, 1.0, 1.0), &l).unwrap_err();
        assert!(matches!(err, GeometryError::Unsupported { op: "union", .. }));
    }
}
