//! One-sided offset band along a stretch of a polygon's boundary.
//!
//! The operator picks a polygon, two positions on its nearest ring and an
//! offset; the band is clipped against visible polygon layers and written to
//! a layer chosen at the end.

use std::mem;

use geo::{Coord, LineString, MultiPolygon};
use log::{debug, info};
use mosaic::algorithms::picking::pick_topmost;
use mosaic::geometry::math::distance_to_line;
use mosaic::{
    difference, explode, filter_degenerate, line_locate_point, line_substring, nearest_ring, resolve_side,
    single_sided_buffer, sync, AttrValue, Bbox, FeatureId, FeatureStore, FieldKind, Geometry, GeometryType, LayerId,
    LayerInfo, Side,
};

use crate::config::ToolConfig;
use crate::error::{ConfigIssue, ToolError};
use crate::layer_cache::LayerCache;
use crate::surface::{Button, InputEvent, Key, MapSurface, PreviewStyle};
use crate::{CommitReport, Engine, Outcome, ToolContext};

#[derive(Clone, Debug, PartialEq)]
pub struct Offset {
    pub distance: f64,
    pub side: Side,
    pub band: Geometry,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SideBufferState {
    #[default]
    SelectFeature,
    PickStart {
        layer: LayerId,
        feature: FeatureId,
        outline: MultiPolygon<f64>,
    },
    PickEnd {
        layer: LayerId,
        feature: FeatureId,
        boundary: LineString<f64>,
        start: f64,
    },
    SetOffset {
        path: LineString<f64>,
        offset: Option<Offset>,
    },
    ChooseLayer {
        band: Geometry,
        distance: f64,
    },
}

pub struct SideBuffer {
    config: ToolConfig,
    cache: LayerCache,
    state: SideBufferState,
}

/// `raw` rounded down to a whole number of `quantum` steps.
pub fn quantize(raw: f64, quantum: f64) -> f64 { (raw / quantum).floor() * quantum }

fn width_value(kind: FieldKind, distance: f64) -> AttrValue {
    match kind {
        FieldKind::Integer => AttrValue::from(distance.round() as i64),
        FieldKind::Text => AttrValue::from(distance.to_string()),
        FieldKind::Real | FieldKind::Boolean => AttrValue::from(distance),
    }
}

impl SideBuffer {
    pub fn new(store: &mut dyn FeatureStore, config: ToolConfig) -> Self {
        SideBuffer { config, cache: LayerCache::new(store), state: SideBufferState::SelectFeature }
    }

    pub fn state(&self) -> &SideBufferState { &self.state }
    pub fn config(&self) -> &ToolConfig { &self.config }

    fn refresh(&mut self, store: &dyn FeatureStore) {
        let removed = self.cache.refresh(store);
        if removed.is_empty() {
            return;
        }
        self.config.side_buffer.forget(&removed);
        let gone = match &self.state {
            SideBufferState::PickStart { layer, .. } | SideBufferState::PickEnd { layer, .. } => {
                removed.contains(layer)
            }
            _ => false,
        };
        if gone {
            debug!("side buffer: selected layer removed");
            self.state = SideBufferState::SelectFeature;
        }
    }

    fn select(
        &mut self,
        store: &dyn FeatureStore,
        surface: &mut dyn MapSurface,
        p: Coord<f64>,
    ) -> Result<Outcome, ToolError> {
        surface.reset();
        self.state = SideBufferState::SelectFeature;
        let tol = self.config.snap_tolerance;
        let area = Bbox::around(p, tol);
        let mut stack = Vec::new();
        for layer in self.config.side_buffer.scope.candidates(self.cache.layers(), GeometryType::Polygon) {
            stack.push((layer, store.query(layer, &area)?));
        }
        let Some(hit) = pick_topmost(&stack, p, tol) else { return Ok(Outcome::Ignored) };
        let picked = stack
            .iter()
            .find(|(l, _)| *l == hit.layer)
            .and_then(|(_, fs)| fs.iter().find(|f| f.id == hit.feature));
        let Some(outline) = picked.and_then(|f| f.geometry.as_polygon()).cloned() else { return Ok(Outcome::Ignored) };
        debug!("side buffer: picked {} in {}", hit.feature, hit.layer);
        surface.show(&Geometry::multi_polygon(outline.clone()), PreviewStyle::Selection);
        self.state = SideBufferState::PickStart { layer: hit.layer, feature: hit.feature, outline };
        Ok(Outcome::Updated)
    }

    fn on_press(&mut self, ctx: &mut ToolContext<'_>, p: Coord<f64>) -> Result<Outcome, ToolError> {
        match mem::take(&mut self.state) {
            SideBufferState::SelectFeature => self.select(&*ctx.store, &mut *ctx.surface, p),
            SideBufferState::PickStart { layer, feature, outline } => {
                let Some(boundary) = nearest_ring(&outline, p) else { return Ok(Outcome::Ignored) };
                let start = line_locate_point(&boundary, p);
                ctx.surface.show(&Geometry::line(boundary.clone()), PreviewStyle::Selection);
                self.state = SideBufferState::PickEnd { layer, feature, boundary, start };
                Ok(Outcome::Updated)
            }
            SideBufferState::PickEnd { layer, feature, boundary, start } => {
                let end = line_locate_point(&boundary, p);
                match line_substring(&boundary, start, end) {
                    Ok(path) => {
                        ctx.surface.show(&Geometry::line(path.clone()), PreviewStyle::Path);
                        self.state = SideBufferState::SetOffset { path, offset: None };
                        Ok(Outcome::Updated)
                    }
                    Err(e) => {
                        debug!("side buffer: end ignored, {}", e);
                        self.state = SideBufferState::PickEnd { layer, feature, boundary, start };
                        Ok(Outcome::Ignored)
                    }
                }
            }
            SideBufferState::SetOffset { offset: Some(offset), .. } if !offset.band.is_empty() => {
                let layers = self.cache.visible(GeometryType::Polygon);
                self.state = SideBufferState::ChooseLayer { band: offset.band, distance: offset.distance };
                Ok(Outcome::ChooseLayer(layers))
            }
            state @ (SideBufferState::SetOffset { .. } | SideBufferState::ChooseLayer { .. }) => {
                self.state = state;
                Ok(Outcome::Ignored)
            }
        }
    }

    fn on_move(&mut self, ctx: &mut ToolContext<'_>, p: Coord<f64>) -> Result<Outcome, ToolError> {
        match &mut self.state {
            SideBufferState::PickStart { outline, .. } => {
                if let Some(ring) = nearest_ring(outline, p) {
                    ctx.surface.show(&Geometry::line(ring), PreviewStyle::Path);
                }
                Ok(Outcome::Updated)
            }
            SideBufferState::PickEnd { boundary, start, .. } => {
                let end = line_locate_point(boundary, p);
                match line_substring(boundary, *start, end) {
                    Ok(path) => ctx.surface.show(&Geometry::line(path), PreviewStyle::Path),
                    Err(_) => ctx.surface.hide(),
                }
                Ok(Outcome::Updated)
            }
            SideBufferState::SetOffset { path, offset } => {
                let distance = quantize(distance_to_line(path, p), self.config.side_buffer.offset_quantum);
                let side = resolve_side(path, p);
                let band = single_sided_buffer(path, distance, side, self.config.segments)?;
                ctx.surface.show(&band, PreviewStyle::Result);
                ctx.surface.feedback(&format!("{}", distance));
                *offset = Some(Offset { distance, side, band });
                Ok(Outcome::Updated)
            }
            SideBufferState::SelectFeature | SideBufferState::ChooseLayer { .. } => Ok(Outcome::Ignored),
        }
    }

    fn commit(
        &self,
        store: &mut dyn FeatureStore,
        band: Geometry,
        distance: f64,
        dest: &LayerInfo,
    ) -> Result<CommitReport, ToolError> {
        let clip_layers: Vec<LayerId> = self.cache.visible(GeometryType::Polygon).iter().map(|l| l.id).collect();
        let mut shape = band;
        if let Some(bbox) = shape.bbox() {
            for &layer in &clip_layers {
                for f in store.query(layer, &bbox)? {
                    if f.geometry.geometry_type() == GeometryType::Polygon {
                        shape = difference(&shape, &f.geometry)?;
                    }
                }
            }
        }
        let parts = filter_degenerate(explode(&shape), self.config.min_part_area);
        let mut report = CommitReport { layer: Some(dest.id), ..CommitReport::default() };
        if parts.is_empty() {
            debug!("side buffer: nothing left after clipping");
            return Ok(report);
        }
        let mut attributes = store.default_attributes(dest.id)?;
        if let Some(i) = dest.field_index(&self.config.side_buffer.width_fields) {
            if let Some(slot) = attributes.get_mut(i) {
                *slot = width_value(dest.fields[i].kind, distance);
            }
        }
        if !store.is_editable(dest.id)? {
            store.start_editing(dest.id)?;
        }
        for part in parts {
            report.synced += sync(store, &part, &clip_layers, self.config.snap_tolerance)?.inserted;
            report.added.push(store.add_feature(dest.id, part, attributes.clone())?);
        }
        info!("side buffer: {} parts of width {} into {}", report.added.len(), distance, dest.id);
        Ok(report)
    }
}

impl Engine for SideBuffer {
    fn name(&self) -> &'static str { "side_buffer" }

    fn handle(&mut self, ctx: &mut ToolContext<'_>, event: &InputEvent) -> Result<Outcome, ToolError> {
        self.refresh(&*ctx.store);
        match *event {
            InputEvent::Press { button: Button::Primary, at } => {
                let p = ctx.surface.snap(at).point;
                self.on_press(ctx, p)
            }
            InputEvent::Move { at } => {
                let p = ctx.surface.to_world(at);
                self.on_move(ctx, p)
            }
            InputEvent::Key(Key::Escape) => {
                if self.state == SideBufferState::SelectFeature {
                    return Ok(Outcome::Ignored);
                }
                self.cancel(&mut *ctx.surface);
                Ok(Outcome::Cancelled)
            }
            InputEvent::Press { button: Button::Secondary, .. } => Ok(Outcome::Ignored),
        }
    }

    fn choose_layer(&mut self, ctx: &mut ToolContext<'_>, layer: Option<LayerId>) -> Result<Outcome, ToolError> {
        self.refresh(&*ctx.store);
        let SideBufferState::ChooseLayer { band, distance } = mem::take(&mut self.state) else {
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
        let report = self.commit(&mut *ctx.store, band, distance, &dest)?;
        Ok(Outcome::Committed(report))
    }

    fn cancel(&mut self, surface: &mut dyn MapSurface) {
        self.state = SideBufferState::SelectFeature;
        surface.reset();
    }

    fn configure(&mut self, config: ToolConfig) -> Result<(), ToolError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
