//! Interactive editing engines on top of the `mosaic` kernel.
//!
//! Each engine is a small state machine fed with [`InputEvent`]s by a host
//! (see [`Toolbox`]). Engines never talk to a concrete store or renderer:
//! everything goes through the [`ToolContext`] seams.

pub mod config;
pub mod cutter;
pub mod error;
pub mod layer_cache;
pub mod painter;
pub mod side_buffer;
pub mod surface;
pub mod toolbox;

use mosaic::{FeatureId, FeatureStore, LayerId, LayerInfo};

pub use config::{CutterConfig, LayerScope, PainterConfig, SideBufferConfig, ToolConfig};
pub use cutter::Cutter;
pub use error::{ConfigIssue, ToolError};
pub use painter::Painter;
pub use side_buffer::SideBuffer;
pub use surface::{Button, DevicePoint, InputEvent, Key, MapSurface, PreviewStyle, RecordingSurface, SnapResult};
pub use toolbox::{ToolKind, Toolbox};

pub struct ToolContext<'a> {
    pub store: &'a mut dyn FeatureStore,
    pub surface: &'a mut dyn MapSurface,
}

impl<'a> ToolContext<'a> {
    pub fn new(store: &'a mut dyn FeatureStore, surface: &'a mut dyn MapSurface) -> Self {
        ToolContext { store, surface }
    }
}

/// What a commit wrote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitReport {
    pub layer: Option<LayerId>,
    pub added: Vec<FeatureId>,
    /// Source features replaced by their remainders.
    pub replaced: Vec<(LayerId, FeatureId)>,
    /// Vertices inserted into neighbours.
    pub synced: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ignored,
    Updated,
    /// The engine waits for [`Engine::choose_layer`] with one of these.
    ChooseLayer(Vec<LayerInfo>),
    Committed(CommitReport),
    Cancelled,
}

pub trait Engine {
    fn name(&self) -> &'static str;
    fn handle(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> Result<Outcome, ToolError>;

    /// Answer to [`Outcome::ChooseLayer`]; `None` cancels.
    fn choose_layer(&mut self, _ctx: &mut ToolContext<'_>, _layer: Option<LayerId>) -> Result<Outcome, ToolError> {
        Ok(Outcome::Ignored)
    }

    /// Drop the session and any preview.
    fn cancel(&mut self, surface: &mut dyn MapSurface);
    /// Swap in a new configuration; an invalid one is rejected and the old one kept.
    fn configure(&mut self, config: ToolConfig) -> Result<(), ToolError>;
}
