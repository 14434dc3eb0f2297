use thiserror::Error;

use crate::geometry::transform::Crs;
use crate::layers::LayerId;
use crate::model::{FeatureId, GeometryType};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum GeometryError {
    #[error("geometry is empty")]
    Empty,
    #[error("degenerate geometry: {0}")]
    Degenerate(&'static str),
    #[error("invalid geometry: {0}")]
    Invalid(String),
    #[error("{op} is not defined for {kind:?} geometries")]
    Unsupported { op: &'static str, kind: GeometryType },
    #[error("no transform from {from} to {to}")]
    UnsupportedTransform { from: Crs, to: Crs },
    #[error("coordinate is not finite")]
    NonFinite,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum StoreError {
    #[error("layer {0} not found")]
    LayerNotFound(LayerId),
    #[error("feature {feature} not found in layer {layer}")]
    FeatureNotFound { layer: LayerId, feature: FeatureId },
    #[error("layer {0} is not in editing mode")]
    NotEditable(LayerId),
    #[error("layer {layer} holds {expected:?} features, got {got:?}")]
    GeometryTypeMismatch { layer: LayerId, expected: GeometryType, got: GeometryType },
    #[error("store backend: {0}")]
    Backend(String),
}
