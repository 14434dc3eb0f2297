//! Host side: one active engine at a time.

use log::{debug, warn};
use mosaic::{FeatureStore, LayerId};
use serde::{Deserialize, Serialize};

use crate::config::ToolConfig;
use crate::cutter::Cutter;
use crate::error::ToolError;
use crate::painter::Painter;
use crate::side_buffer::SideBuffer;
use crate::surface::{InputEvent, MapSurface};
use crate::{Engine, Outcome, ToolContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Cutter,
    SideBuffer,
    Painter,
}

pub struct Toolbox {
    config: ToolConfig,
    active: Option<(ToolKind, Box<dyn Engine>)>,
}

impl Toolbox {
    pub fn new(config: ToolConfig) -> Self { Toolbox { config, active: None } }

    pub fn config(&self) -> &ToolConfig { &self.config }

    pub fn set_config(&mut self, config: ToolConfig) -> Result<(), ToolError> {
        config.validate()?;
        if let Some((_, engine)) = self.active.as_mut() {
            engine.configure(config.clone())?;
        }
        self.config = config;
        Ok(())
    }

    pub fn active(&self) -> Option<ToolKind> { self.active.as_ref().map(|(k, _)| *k) }

    /// Switch to `kind`, dropping whatever session the previous engine had.
    pub fn activate(&mut self, kind: ToolKind, store: &mut dyn FeatureStore, surface: &mut dyn MapSurface) {
        self.deactivate(surface);
        let engine: Box<dyn Engine> = match kind {
            ToolKind::Cutter => Box::new(Cutter::new(store, self.config.clone())),
            ToolKind::SideBuffer => Box::new(SideBuffer::new(store, self.config.clone())),
            ToolKind::Painter => Box::new(Painter::new(store, self.config.clone())),
        };
        debug!("{} active", engine.name());
        self.active = Some((kind, engine));
    }

    pub fn deactivate(&mut self, surface: &mut dyn MapSurface) {
        if let Some((_, mut engine)) = self.active.take() {
            engine.cancel(surface);
            debug!("{} deactivated", engine.name());
        }
    }

    pub fn handle(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> Result<Outcome, ToolError> {
        let Some((_, engine)) = self.active.as_mut() else { return Ok(Outcome::Ignored) };
        let result = engine.handle(ctx, event);
        Self::report(engine.name(), ctx, result)
    }

    pub fn choose_layer(&mut self, ctx: &mut ToolContext<'_>, layer: Option<LayerId>) -> Result<Outcome, ToolError> {
        let Some((_, engine)) = self.active.as_mut() else { return Ok(Outcome::Ignored) };
        let result = engine.choose_layer(ctx, layer);
        Self::report(engine.name(), ctx, result)
    }

    fn report(
        name: &str,
        ctx: &mut ToolContext<'_>,
        result: Result<Outcome, ToolError>,
    ) -> Result<Outcome, ToolError> {
        if let Err(e) = &result {
            if e.is_user_visible() {
                warn!("{}: {}", name, e);
                ctx.surface.warn(e.title(), &e.to_string());
            } else {
                debug!("{}: {}", name, e);
            }
        }
        result
    }
}
