use mosaic::{GeometryError, StoreError};
use thiserror::Error;

/// Missing selection that stops a tool before any geometry is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("no source layers selected")]
    MissingSourceLayers,
    #[error("missing target layer")]
    MissingTargetLayer,
    #[error("no restrictive layers selected")]
    MissingRestrictiveLayers,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ToolError {
    #[error(transparent)]
    Configuration(#[from] ConfigIssue),
    #[error("geometry error: {0}")]
    Validation(GeometryError),
    #[error("no space to fill")]
    NoSpace,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("bad tool configuration: {0}")]
    Config(String),
}

impl ToolError {
    /// Errors the operator should see as a warning.
    pub fn is_user_visible(&self) -> bool {
        match self {
            ToolError::Configuration(_) | ToolError::Validation(_) | ToolError::NoSpace | ToolError::Store(_) => true,
            ToolError::Geometry(GeometryError::Degenerate(_)) => false,
            ToolError::Geometry(_) | ToolError::Config(_) => true,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ToolError::Configuration(_) | ToolError::Config(_) => "Configuration",
            ToolError::Validation(_) | ToolError::Geometry(_) => "Geometry error",
            ToolError::NoSpace => "Painter",
            ToolError::Store(_) => "Data store",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::Configuration(ConfigIssue::MissingSourceLayers) => "missing_source_layers",
            ToolError::Configuration(ConfigIssue::MissingTargetLayer) => "missing_target_layer",
            ToolError::Configuration(ConfigIssue::MissingRestrictiveLayers) => "missing_restrictive_layers",
            ToolError::Validation(_) => "invalid_geometry",
            ToolError::NoSpace => "no_space",
            ToolError::Store(_) => "store",
            ToolError::Geometry(_) => "geometry",
            ToolError::Config(_) => "bad_config",
        }
    }
}
