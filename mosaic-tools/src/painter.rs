//! Fill the enclosed gap around a click.

use std::mem;

use geo::{Coord, LineString};
use log::{debug, info};
use mosaic::algorithms::winding::multi_covers;
use mosaic::geometry::tolerance::EPS_POS;
use mosaic::{
    buffer_point, difference, explode, filter_degenerate, intersection, polygonize, sync, FeatureStore, Geometry,
    GeometryType, LayerId, LayerInfo,
};

use crate::config::ToolConfig;
use crate::error::{ConfigIssue, ToolError};
use crate::layer_cache::LayerCache;
use crate::surface::{Button, InputEvent, Key, MapSurface, PreviewStyle};
use crate::{CommitReport, Engine, Outcome, ToolContext};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PainterState {
    #[default]
    Idle,
    /// Gap computed, waiting for the host to name a destination.
    AwaitTarget { fill: Geometry, restrictive: Vec<LayerId> },
}

pub struct Painter {
    config: ToolConfig,
    cache: LayerCache,
    state: PainterState,
}

fn covers(g: &Geometry, p: Coord<f64>) -> bool { g.as_polygon().map_or(false, |mp| multi_covers(mp, p, EPS_POS)) }

impl Painter {
    pub fn new(store: &mut dyn FeatureStore, config: ToolConfig) -> Self {
        Painter { config, cache: LayerCache::new(store), state: PainterState::Idle }
    }

    pub fn state(&self) -> &PainterState { &self.state }
    pub fn config(&self) -> &ToolConfig { &self.config }

    fn refresh(&mut self, store: &dyn FeatureStore) {
        let removed = self.cache.refresh(store);
        if !removed.is_empty() {
            self.config.painter.forget(&removed);
        }
    }

    /// Polygon and line layers that bound the fill.
    fn restrictive_layers(&self) -> (Vec<LayerId>, Vec<LayerId>) {
        let cfg = &self.config.painter;
        let layers = self.cache.layers();
        let polygons =
            if cfg.include_polygons { cfg.scope.candidates(layers, GeometryType::Polygon) } else { Vec::new() };
        let lines = if cfg.include_lines { cfg.scope.candidates(layers, GeometryType::Line) } else { Vec::new() };
        (polygons, lines)
    }

    fn target(&self) -> Option<LayerInfo> {
        self.config
            .painter
            .target_layer
            .and_then(|id| self.cache.get(id))
            .filter(|l| l.geometry_type == GeometryType::Polygon)
            .cloned()
    }

    /// The gap part containing `p`, if any.
    pub fn fill_at(
        &self,
        store: &dyn FeatureStore,
        p: Coord<f64>,
        polygons: &[LayerId],
        lines: &[LayerId],
    ) -> Result<Option<Geometry>, ToolError> {
        let disk = buffer_point(p, self.config.painter.search_radius, self.config.segments);
        let Some(bbox) = disk.bbox() else { return Ok(None) };

        let from_polygons = if polygons.is_empty() {
            None
        } else {
            let mut rest = disk.clone();
            for &layer in polygons {
                for f in store.query(layer, &bbox)? {
                    if covers(&f.geometry, p) {
                        return Err(ToolError::NoSpace);
                    }
                    if f.geometry.geometry_type() == GeometryType::Polygon {
                        rest = difference(&rest, &f.geometry)?;
                    }
                }
            }
            // First part wins when several cover the click.
            Some(explode(&rest).into_iter().find(|part| covers(part, p)))
        };

        let from_lines = if lines.is_empty() {
            None
        } else {
            let mut net: Vec<LineString<f64>> = Vec::new();
            for &layer in lines {
                for f in store.query(layer, &bbox)? {
                    if let Some(l) = f.geometry.as_line() {
                        net.push(l.clone());
                    }
                }
            }
            if let Some(mp) = disk.as_polygon() {
                net.extend(mp.0.iter().map(|poly| poly.exterior().clone()));
            }
            Some(polygonize(&net).into_iter().find(|face| covers(face, p)))
        };

        let candidate = match (from_polygons, from_lines) {
            (Some(Some(a)), Some(Some(b))) => Some(intersection(&a, &b)?),
            (Some(_), Some(_)) => None,
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => None,
        };
        let Some(candidate) = candidate else { return Ok(None) };
        Ok(filter_degenerate(explode(&candidate), self.config.min_part_area).into_iter().find(|part| covers(part, p)))
    }

    fn commit(
        &self,
        store: &mut dyn FeatureStore,
        fill: Geometry,
        restrictive: &[LayerId],
        dest: &LayerInfo,
    ) -> Result<CommitReport, ToolError> {
        let mut report = CommitReport { layer: Some(dest.id), ..CommitReport::default() };
        report.synced = sync(store, &fill, restrictive, self.config.snap_tolerance)?.inserted;
        let attributes = store.default_attributes(dest.id)?;
        if !store.is_editable(dest.id)? {
            store.start_editing(dest.id)?;
        }
        report.added.push(store.add_feature(dest.id, fill, attributes)?);
        info!("painter: filled gap into {}, {} vertices synced", dest.id, report.synced);
        Ok(report)
    }

    fn paint(&mut self, ctx: &mut ToolContext<'_>, p: Coord<f64>) -> Result<Outcome, ToolError> {
        let (polygons, lines) = self.restrictive_layers();
        if polygons.is_empty() && lines.is_empty() {
            return Err(ConfigIssue::MissingRestrictiveLayers.into());
        }
        let ask = self.config.painter.ask_target_layer;
        let target = if ask { None } else { Some(self.target().ok_or(ConfigIssue::MissingTargetLayer)?) };

        let Some(fill) = self.fill_at(&*ctx.store, p, &polygons, &lines)? else {
            debug!("painter: no enclosed gap at ({}, {})", p.x, p.y);
            return Ok(Outcome::Ignored);
        };
        let restrictive: Vec<LayerId> = polygons.into_iter().chain(lines).collect();
        match target {
            Some(dest) => {
                ctx.surface.reset();
                Ok(Outcome::Committed(self.commit(&mut *ctx.store, fill, &restrictive, &dest)?))
            }
            None => {
                ctx.surface.show(&fill, PreviewStyle::Result);
                self.state = PainterState::AwaitTarget { fill, restrictive };
                Ok(Outcome::ChooseLayer(self.cache.of_type(GeometryType::Polygon)))
            }
        }
    }
}

impl Engine for Painter {
    fn name(&self) -> &'static str { "painter" }

    fn handle(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> Result<Outcome, ToolError> {
        self.refresh(&*ctx.store);
        match *event {
            InputEvent::Press { button: Button::Primary, at } if self.state == PainterState::Idle => {
                let p = ctx.surface.to_world(at);
                self.paint(ctx, p)
            }
            InputEvent::Key(Key::Escape) if self.state != PainterState::Idle => {
                self.cancel(&mut *ctx.surface);
                Ok(Outcome::Cancelled)
            }
            _ => Ok(Outcome::Ignored),
        }
    }

    fn choose_layer(&mut self, ctx: &mut ToolContext<'_>, layer: Option<LayerId>) -> Result<Outcome, ToolError> {
        self.refresh(&*ctx.store);
        let PainterState::AwaitTarget { fill, restrictive } = mem::take(&mut self.state) else {
            return Ok(Outcome::Ignored);
        };
        ctx.surface.reset();
        let Some(layer) = layer else { return Ok(Outcome::Cancelled) };
        let dest = self
            .cache
            .get(layer)
            .filter(|l| l.geometry_type == GeometryType::Polygon)
            .cloned()
            .ok_or(ConfigIssue::MissingTargetLayer)?;
        let live: Vec<LayerId> = restrictive.into_iter().filter(|id| self.cache.get(*id).is_some()).collect();
        Ok(Outcome::Committed(self.commit(&mut *ctx.store, fill, &live, &dest)?))
    }

    fn cancel(&mut self, surface: &mut dyn MapSurface) {
        self.state = PainterState::Idle;
        surface.reset();
    }

    fn configure(&mut self, config: ToolConfig) -> Result<(), ToolError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
