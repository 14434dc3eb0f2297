use std::f64::consts::PI;
use std::fmt;

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::model::{Geometry, Shape};

const EARTH_RADIUS: f64 = 6_378_137.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// Coordinate reference identified by its EPSG code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(pub u32);

impl Crs {
    pub const WGS84: Crs = Crs(4326);
    pub const WEB_MERCATOR: Crs = Crs(3857);
}

impl Default for Crs {
    fn default() -> Self { Crs::WEB_MERCATOR }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

fn to_mercator(c: Coord<f64>) -> Coord<f64> {
    let lat = c.y.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    Coord {
        x: EARTH_RADIUS * c.x.to_radians(),
        y: EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln(),
    }
}

fn to_geographic(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (c.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (c.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Move a geometry between coordinate references. Only the identity and the
/// WGS84 / spherical mercator pair are known.
pub fn reproject(g: &Geometry, from: Crs, to: Crs) -> Result<Geometry, GeometryError> {
    let f: fn(Coord<f64>) -> Coord<f64> = match (from, to) {
        (a, b) if a == b => return Ok(g.clone()),
        (Crs::WGS84, Crs::WEB_MERCATOR) => to_mercator,
        (Crs::WEB_MERCATOR, Crs::WGS84) => to_geographic,
        _ => return Err(GeometryError::UnsupportedTransform { from, to }),
    };
    let shape = match g.shape() {
        Shape::Line(l) => Shape::Line(l.map_coords(f)),
        Shape::Polygon(p) => Shape::Polygon(p.map_coords(f)),
    };
    let out = Geometry::new(shape);
    if out.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    Ok(out)
}
