//! Cut a drawn polygon out of source layers and deposit what was removed into
//! a target layer.

use std::mem;

use geo::{Coord, LineString};
use log::{debug, info, warn};
use mosaic::{
    difference, explode, filter_degenerate, intersection, repair, reproject, sync, union_all, Crs, FeatureStore,
    Geometry, GeometryType, LayerId, LayerInfo,
};

use crate::config::ToolConfig;
use crate::error::{ConfigIssue, ToolError};
use crate::layer_cache::LayerCache;
use crate::surface::{Button, InputEvent, Key, MapSurface, PreviewStyle};
use crate::{CommitReport, Engine, Outcome, ToolContext};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum CutterState {
    #[default]
    Idle,
    Drawing { points: Vec<Coord<f64>> },
}

pub struct Cutter {
    config: ToolConfig,
    cache: LayerCache,
    state: CutterState,
}

fn sketch(points: &[Coord<f64>]) -> Option<Geometry> {
    match points.len() {
        0 | 1 => None,
        2 => Some(Geometry::line(LineString::from(points.to_vec()))),
        _ => Some(Geometry::from_ring(points)),
    }
}

impl Cutter {
    pub fn new(store: &mut dyn FeatureStore, config: ToolConfig) -> Self {
        Cutter { config, cache: LayerCache::new(store), state: CutterState::Idle }
    }

    pub fn state(&self) -> &CutterState { &self.state }
    pub fn config(&self) -> &ToolConfig { &self.config }

    fn refresh(&mut self, store: &dyn FeatureStore) {
        let removed = self.cache.refresh(store);
        if !removed.is_empty() {
            self.config.cutter.forget(&removed);
        }
    }

    fn resolve_layers(&self) -> Result<(Vec<LayerInfo>, LayerInfo), ToolError> {
        let sources: Vec<LayerInfo> = self
            .cache
            .of_type(GeometryType::Polygon)
            .into_iter()
            .filter(|l| self.config.cutter.source_layers.contains(&l.id))
            .collect();
        if sources.is_empty() {
            return Err(ConfigIssue::MissingSourceLayers.into());
        }
        let target = self
            .config
            .cutter
            .target_layer
            .and_then(|id| self.cache.get(id))
            .filter(|l| l.geometry_type == GeometryType::Polygon)
            .cloned()
            .ok_or(ConfigIssue::MissingTargetLayer)?;
        Ok((sources, target))
    }

    /// Run a finished sketch.
    fn finish(&mut self, store: &mut dyn FeatureStore, points: Vec<Coord<f64>>) -> Result<Outcome, ToolError> {
        if points.len() < 3 {
            debug!("cutter: {} points, nothing to cut", points.len());
            return Ok(Outcome::Cancelled);
        }
        let (sources, target) = self.resolve_layers()?;
        let cutter = repair(&Geometry::from_ring(&points)).map_err(ToolError::Validation)?;
        let map_crs = self.config.map_crs;

        // Every projection happens before the first write.
        let mut plans: Vec<(LayerId, Crs, Geometry)> = Vec::with_capacity(sources.len());
        for src in &sources {
            let local = if src.crs == map_crs { cutter.clone() } else { reproject(&cutter, map_crs, src.crs)? };
            plans.push((src.id, src.crs, local));
        }

        let mut removed = Vec::new();
        let mut report = CommitReport { layer: Some(target.id), ..CommitReport::default() };
        let mut failure = None;
        for (layer, crs, local) in &plans {
            if let Err(e) = self.cut_layer(store, *layer, *crs, local, &mut removed, &mut report) {
                warn!("cutter stopped in {}: {}", layer, e);
                failure = Some(e);
                break;
            }
        }

        let mut sync_layers: Vec<LayerId> = sources.iter().map(|l| l.id).collect();
        if !sync_layers.contains(&target.id) {
            sync_layers.push(target.id);
        }
        let deposited = self.deposit(store, &removed, &target, &sync_layers, &mut report);
        match (failure, deposited) {
            (Some(e), Err(d)) => {
                warn!("cutter could not deposit removed material: {}", d);
                Err(e)
            }
            (Some(e), Ok(())) => Err(e),
            (None, Err(d)) => Err(d),
            (None, Ok(())) => {
                info!(
                    "cut {} features, {} parts into {}",
                    report.replaced.len(),
                    report.added.len(),
                    target.id
                );
                Ok(Outcome::Committed(report))
            }
        }
    }

    fn cut_layer(
        &self,
        store: &mut dyn FeatureStore,
        layer: LayerId,
        crs: Crs,
        cutter: &Geometry,
        removed: &mut Vec<Geometry>,
        report: &mut CommitReport,
    ) -> Result<(), ToolError> {
        let Some(bbox) = cutter.bbox() else { return Ok(()) };
        for feature in store.query(layer, &bbox)? {
            let taken = intersection(&feature.geometry, cutter)?;
            if taken.is_empty() {
                continue;
            }
            // Remainder parts keep any area; only empty or unrepairable parts go.
            let remainder = filter_degenerate(explode(&difference(&feature.geometry, cutter)?), 0.0);
            if !store.is_editable(layer)? {
                store.start_editing(layer)?;
            }
            store.replace_feature(layer, feature.id, remainder)?;
            removed.push(if crs == self.config.map_crs { taken } else { reproject(&taken, crs, self.config.map_crs)? });
            report.replaced.push((layer, feature.id));
        }
        Ok(())
    }

    fn deposit(
        &self,
        store: &mut dyn FeatureStore,
        removed: &[Geometry],
        target: &LayerInfo,
        sync_layers: &[LayerId],
        report: &mut CommitReport,
    ) -> Result<(), ToolError> {
        if removed.is_empty() {
            return Ok(());
        }
        let parts = filter_degenerate(explode(&union_all(removed)?), self.config.min_part_area);
        if parts.is_empty() {
            return Ok(());
        }
        let attributes = store.default_attributes(target.id)?;
        if !store.is_editable(target.id)? {
            store.start_editing(target.id)?;
        }
        for part in parts {
            let part = if target.crs == self.config.map_crs {
                part
            } else {
                reproject(&part, self.config.map_crs, target.crs)?
            };
            report.synced += sync(store, &part, sync_layers, self.config.snap_tolerance)?.inserted;
            report.added.push(store.add_feature(target.id, part, attributes.clone())?);
        }
        Ok(())
    }
}

impl Engine for Cutter {
    fn name(&self) -> &'static str { "cutter" }

    fn handle(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> Result<Outcome, ToolError> {
        self.refresh(&*ctx.store);
        match *event {
            InputEvent::Press { button: Button::Primary, at } => {
                let p = ctx.surface.snap(at).point;
                let mut points = match mem::take(&mut self.state) {
                    CutterState::Drawing { points } => points,
                    CutterState::Idle => Vec::new(),
                };
                points.push(p);
                if let Some(g) = sketch(&points) {
                    ctx.surface.show(&g, PreviewStyle::Sketch);
                }
                self.state = CutterState::Drawing { points };
                Ok(Outcome::Updated)
            }
            InputEvent::Move { at } => {
                let CutterState::Drawing { points } = &self.state else { return Ok(Outcome::Ignored) };
                let mut live = points.clone();
                live.push(ctx.surface.to_world(at));
                if let Some(g) = sketch(&live) {
                    ctx.surface.show(&g, PreviewStyle::Rubber);
                }
                Ok(Outcome::Updated)
            }
            InputEvent::Press { button: Button::Secondary, .. } => {
                let CutterState::Drawing { points } = mem::take(&mut self.state) else { return Ok(Outcome::Ignored) };
                ctx.surface.reset();
                self.finish(&mut *ctx.store, points)
            }
            InputEvent::Key(Key::Escape) => {
                if self.state == CutterState::Idle {
                    return Ok(Outcome::Ignored);
                }
                self.cancel(&mut *ctx.surface);
                Ok(Outcome::Cancelled)
            }
        }
    }

    fn cancel(&mut self, surface: &mut dyn MapSurface) {
        self.state = CutterState::Idle;
        surface.reset();
    }

    fn configure(&mut self, config: ToolConfig) -> Result<(), ToolError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
