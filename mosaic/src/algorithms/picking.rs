use geo::Coord;

use crate::algorithms::winding::multi_covers;
use crate::geometry::math::distance_to_line;
use crate::layers::LayerId;
use crate::model::{Feature, FeatureId, Shape};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pick {
    pub layer: LayerId,
    pub feature: FeatureId,
}

/// Topmost feature under `p`. `stack` is ordered bottom to top; within a layer
/// later features win. Polygons are hit boundary-inclusive within `tol`,
/// lines when `p` is within `tol` of them.
pub fn pick_topmost(stack: &[(LayerId, Vec<Feature>)], p: Coord<f64>, tol: f64) -> Option<Pick> {
    for (layer, features) in stack.iter().rev() {
        for f in features.iter().rev() {
            match f.geometry.shape() {
                Shape::Polygon(mp) => {
                    if multi_covers(mp, p, tol) {
                        return Some(Pick { layer: *layer, feature: f.id });
                    }
                }
                Shape::Line(l) => {
                    if distance_to_line(l, p) <= tol {
                        return Some(Pick { layer: *layer, feature: f.id });
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Geometry;
    use geo::polygon;

    fn feat(id: u64, x0: f64) -> Feature {
        Feature {
            id: FeatureId(id),
            geometry: Geometry::polygon(polygon![(x: x0, y: 0.0), (x: x0 + 4.0, y: 0.0), (x: x0 + 4.0, y: 4.0), (x: x0, y: 4.0)]),
            attributes: Vec::new(),
        }
    }

    #[test]
    fn top_layer_wins_and_edge_counts() {
        let stack = vec![(LayerId(1), vec![feat(1, 0.0)]), (LayerId(2), vec![feat(7, 2.0)])];
        let hit = pick_topmost(&stack, Coord { x: 3.0, y: 1.0 }, 1e-6).unwrap();
        assert_eq!((hit.layer, hit.feature), (LayerId(2), FeatureId(7)));
        let edge = pick_topmost(&stack, Coord { x: 0.0, y: 2.0 }, 1e-6).unwrap();
        assert_eq!(edge.feature, FeatureId(1));
        assert!(pick_topmost(&stack, Coord { x: 9.0, y: 9.0 }, 1e-6).is_none());
    }
}
