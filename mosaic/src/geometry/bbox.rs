use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in map units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bbox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Bbox {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    pub fn around(c: Coord<f64>, radius: f64) -> Self {
        Bbox::new(c.x - radius, c.y - radius, c.x + radius, c.y + radius)
    }

    pub fn from_coords<'a, I: IntoIterator<Item = &'a Coord<f64>>>(coords: I) -> Option<Self> {
        let mut it = coords.into_iter().filter(|c| c.x.is_finite() && c.y.is_finite());
        let first = it.next()?;
        let mut b = Bbox { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for c in it {
            b.min_x = b.min_x.min(c.x);
            b.min_y = b.min_y.min(c.y);
            b.max_x = b.max_x.max(c.x);
            b.max_y = b.max_y.max(c.y);
        }
        Some(b)
    }

    pub fn union(&self, o: &Bbox) -> Bbox {
        Bbox {
            min_x: self.min_x.min(o.min_x),
            min_y: self.min_y.min(o.min_y),
            max_x: self.max_x.max(o.max_x),
            max_y: self.max_y.max(o.max_y),
        }
    }

    /// Closed-interval overlap test; boxes that only share an edge intersect.
    pub fn intersects(&self, o: &Bbox) -> bool {
        !(self.max_x < o.min_x || o.max_x < self.min_x || self.max_y < o.min_y || o.max_y < self.min_y)
    }

    pub fn pad(&self, pad: f64) -> Bbox {
        Bbox {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }

    pub fn contains_point(&self, c: Coord<f64>) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    pub fn width(&self) -> f64 { self.max_x - self.min_x }
    pub fn height(&self) -> f64 { self.max_y - self.min_y }
}

impl From<Rect<f64>> for Bbox {
    fn from(r: Rect<f64>) -> Self {
        Bbox { min_x: r.min().x, min_y: r.min().y, max_x: r.max().x, max_y: r.max().y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edge_counts_as_intersecting() {
        let a = Bbox::new(0.0, 0.0, 1.0, 1.0);
        let b = Bbox::new(1.0, 0.0, 2.0, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&Bbox::new(1.5, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn new_normalizes_corners() {
        let b = Bbox::new(5.0, 4.0, -1.0, 2.0);
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (-1.0, 2.0, 5.0, 4.0));
        assert!(b.contains_point(Coord { x: 0.0, y: 3.0 }));
    }
}
