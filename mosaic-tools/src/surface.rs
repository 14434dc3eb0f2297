//! Input and preview surface seam.

use geo::Coord;
use mosaic::geometry::math::dist;
use mosaic::Geometry;

/// Pointer position in device (screen) units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
}

impl DevicePoint {
    pub fn new(x: f64, y: f64) -> Self { DevicePoint { x, y } }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapResult {
    /// True when `point` is an existing vertex.
    pub hit: bool,
    pub point: Coord<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewStyle {
    /// Points placed so far.
    Sketch,
    /// Sketch plus the cursor.
    Rubber,
    Selection,
    Path,
    Result,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Press { button: Button, at: DevicePoint },
    Move { at: DevicePoint },
    Key(Key),
}

impl InputEvent {
    pub fn click(x: f64, y: f64) -> Self {
        InputEvent::Press { button: Button::Primary, at: DevicePoint::new(x, y) }
    }

    pub fn finish(x: f64, y: f64) -> Self {
        InputEvent::Press { button: Button::Secondary, at: DevicePoint::new(x, y) }
    }

    pub fn hover(x: f64, y: f64) -> Self { InputEvent::Move { at: DevicePoint::new(x, y) } }
}

pub trait MapSurface {
    fn to_world(&self, p: DevicePoint) -> Coord<f64>;
    fn snap(&mut self, p: DevicePoint) -> SnapResult;
    /// Replace the preview drawn with `style`.
    fn show(&mut self, geometry: &Geometry, style: PreviewStyle);
    fn hide(&mut self);
    fn reset(&mut self);
    fn feedback(&mut self, text: &str);
    fn warn(&mut self, title: &str, message: &str);
}

/// Headless surface: device and world units coincide, snapping goes to the
/// nearest registered vertex within tolerance, and everything drawn is kept
/// for inspection.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub snap_targets: Vec<Coord<f64>>,
    pub snap_tolerance: f64,
    pub previews: Vec<(PreviewStyle, Geometry)>,
    pub feedback: Vec<String>,
    pub warnings: Vec<(String, String)>,
}

impl RecordingSurface {
    pub fn new() -> Self { RecordingSurface::default() }

    pub fn preview(&self, style: PreviewStyle) -> Option<&Geometry> {
        self.previews.iter().find(|(s, _)| *s == style).map(|(_, g)| g)
    }
}

impl MapSurface for RecordingSurface {
    fn to_world(&self, p: DevicePoint) -> Coord<f64> { Coord { x: p.x, y: p.y } }

    fn snap(&mut self, p: DevicePoint) -> SnapResult {
        let raw = self.to_world(p);
        self.snap_targets
            .iter()
            .map(|c| (dist(*c, raw), *c))
            .filter(|(d, _)| *d <= self.snap_tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or(SnapResult { hit: false, point: raw }, |(_, c)| SnapResult { hit: true, point: c })
    }

    fn show(&mut self, geometry: &Geometry, style: PreviewStyle) {
        self.previews.retain(|(s, _)| *s != style);
        self.previews.push((style, geometry.clone()));
    }

    fn hide(&mut self) { self.previews.clear(); }

    fn reset(&mut self) { self.previews.clear(); }

    fn feedback(&mut self, text: &str) { self.feedback.push(text.to_string()); }

    fn warn(&mut self, title: &str, message: &str) {
        self.warnings.push((title.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_nearest_target_within_tolerance() {
        let mut s = RecordingSurface { snap_tolerance: 0.5, ..RecordingSurface::new() };
        s.snap_targets = vec![Coord { x: 1.0, y: 1.0 }, Coord { x: 1.3, y: 1.0 }];
        let hit = s.snap(DevicePoint::new(1.25, 1.1));
        assert!(hit.hit);
        assert_eq!(hit.point, Coord { x: 1.3, y: 1.0 });
        let miss = s.snap(DevicePoint::new(5.0, 5.0));
        assert!(!miss.hit);
        assert_eq!(miss.point, Coord { x: 5.0, y: 5.0 });
    }
}
