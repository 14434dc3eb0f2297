pub mod error;
pub mod grid;
pub mod layers;
pub mod model;
pub mod store;
pub mod topology;
pub mod geometry {
    pub mod bbox;
    pub mod intersect;
    pub mod math;
    pub mod tolerance;
    pub mod transform;
}
pub mod algorithms {
    pub mod boolean;
    pub mod buffer;
    pub mod picking;
    pub mod planarize;
    pub mod polygonize;
    pub mod substring;
    pub mod validity;
    pub mod winding;
}

pub use algorithms::boolean::{difference, explode, intersection, union, union_all, BoolOp};
pub use algorithms::buffer::{buffer_point, resolve_side, single_sided_buffer, Side};
pub use algorithms::polygonize::polygonize;
pub use algorithms::substring::{forward_arc, interpolate, line_length, line_locate_point, line_substring, nearest_ring};
pub use algorithms::validity::{filter_degenerate, is_valid, repair};
pub use error::{GeometryError, StoreError};
pub use geometry::bbox::Bbox;
pub use geometry::transform::{reproject, Crs};
pub use layers::{Field, FieldKind, LayerEvent, LayerId, LayerInfo};
pub use model::{AttrValue, Feature, FeatureId, Geometry, GeometryType, Shape};
pub use store::{FeatureStore, MemoryStore};
pub use topology::{insert_vertex, sync, SyncReport};
