use std::fmt;

use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::algorithms::validity;
use crate::geometry::bbox::Bbox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Line,
    Polygon,
}

/// Raw geometry payload. Polygons are always carried as multi-polygons;
/// a single-part polygon is a multi-polygon with one member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Shape {
    Line(LineString<f64>),
    Polygon(MultiPolygon<f64>),
}

impl Shape {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Shape::Line(_) => GeometryType::Line,
            Shape::Polygon(_) => GeometryType::Polygon,
        }
    }
}

/// Immutable geometry value with its validity computed once at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Shape", into = "Shape")]
pub struct Geometry {
    shape: Shape,
    valid: bool,
}

impl From<Shape> for Geometry {
    fn from(shape: Shape) -> Self { Geometry::new(shape) }
}

impl From<Geometry> for Shape {
    fn from(g: Geometry) -> Self { g.shape }
}

impl Geometry {
    pub fn new(shape: Shape) -> Self {
        let valid = validity::is_valid(&shape);
        Geometry { shape, valid }
    }

    pub fn line(line: LineString<f64>) -> Self { Geometry::new(Shape::Line(line)) }

    pub fn polygon(poly: Polygon<f64>) -> Self {
        Geometry::new(Shape::Polygon(MultiPolygon::new(vec![poly])))
    }

    pub fn multi_polygon(mp: MultiPolygon<f64>) -> Self { Geometry::new(Shape::Polygon(mp)) }

    pub fn empty_polygon() -> Self { Geometry::multi_polygon(MultiPolygon::new(Vec::new())) }

    /// Closed polygon from an open or closed ring of points.
    pub fn from_ring(points: &[Coord<f64>]) -> Self {
        Geometry::polygon(Polygon::new(LineString::from(points.to_vec()), Vec::new()))
    }

    pub fn shape(&self) -> &Shape { &self.shape }
    pub fn into_shape(self) -> Shape { self.shape }
    pub fn is_valid(&self) -> bool { self.valid }
    pub fn geometry_type(&self) -> GeometryType { self.shape.geometry_type() }

    pub fn as_polygon(&self) -> Option<&MultiPolygon<f64>> {
        match &self.shape {
            Shape::Polygon(p) => Some(p),
            Shape::Line(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineString<f64>> {
        match &self.shape {
            Shape::Line(l) => Some(l),
            Shape::Polygon(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.shape {
            Shape::Line(l) => l.0.is_empty(),
            Shape::Polygon(p) => p.0.is_empty(),
        }
    }

    /// Unsigned area; zero for lines.
    pub fn area(&self) -> f64 {
        match &self.shape {
            Shape::Line(_) => 0.0,
            Shape::Polygon(p) => p.unsigned_area(),
        }
    }

    pub fn bbox(&self) -> Option<Bbox> {
        let rect = match &self.shape {
            Shape::Line(l) => l.bounding_rect(),
            Shape::Polygon(p) => p.bounding_rect(),
        };
        rect.map(Bbox::from)
    }

    /// Every stored coordinate, ring closures included.
    pub fn coords(&self) -> Box<dyn Iterator<Item = Coord<f64>> + '_> {
        match &self.shape {
            Shape::Line(l) => Box::new(l.0.iter().copied()),
            Shape::Polygon(p) => Box::new(p.0.iter().flat_map(|poly| {
                std::iter::once(poly.exterior())
                    .chain(poly.interiors().iter())
                    .flat_map(|r| r.0.iter().copied())
            })),
        }
    }

    /// Distinct vertices: ring closing coordinates are skipped.
    pub fn vertices(&self) -> Vec<Coord<f64>> {
        match &self.shape {
            Shape::Line(l) => l.0.clone(),
            Shape::Polygon(p) => {
                let mut out = Vec::new();
                for poly in &p.0 {
                    for ring in std::iter::once(poly.exterior()).chain(poly.interiors().iter()) {
                        let n = ring.0.len();
                        let open = if n > 1 && ring.is_closed() { n - 1 } else { n };
                        out.extend_from_slice(&ring.0[..open]);
                    }
                }
                out
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

pub type AttrValue = serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub attributes: Vec<AttrValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn vertices_skip_ring_closure() {
        let g = Geometry::polygon(polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)]);
        assert_eq!(g.vertices().len(), 4);
        assert_eq!(g.coords().count(), 5);
        assert!(g.is_valid());
        assert!((g.area() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn validity_recomputed_on_deserialize() {
        let bowtie = Shape::Polygon(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)
        ]]));
        let text = serde_json::to_string(&bowtie).unwrap();
        let g: Geometry = serde_json::from_str(&text).unwrap();
        assert!(!g.is_valid(), "bow-tie must deserialize as invalid");
        assert_eq!(g.geometry_type(), GeometryType::Polygon);
    }
}
