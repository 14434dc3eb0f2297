//! Tool settings, loaded from JSON.

use std::collections::BTreeSet;

use mosaic::geometry::tolerance::{DEFAULT_SEGMENTS, DEFAULT_SNAP_TOLERANCE, MIN_PART_AREA};
use mosaic::{Crs, GeometryType, LayerId, LayerInfo};
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Which layers a tool draws its candidates from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerScope {
    All,
    #[default]
    Visible,
    Selected { layers: Vec<LayerId> },
}

impl LayerScope {
    /// Layers of type `ty` in this scope, in stacking order.
    pub fn candidates(&self, layers: &[LayerInfo], ty: GeometryType) -> Vec<LayerId> {
        layers
            .iter()
            .filter(|l| l.geometry_type == ty)
            .filter(|l| match self {
                LayerScope::All => true,
                LayerScope::Visible => l.visible,
                LayerScope::Selected { layers } => layers.contains(&l.id),
            })
            .map(|l| l.id)
            .collect()
    }

    fn forget(&mut self, removed: &[LayerId]) {
        if let LayerScope::Selected { layers } = self {
            layers.retain(|id| !removed.contains(id));
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutterConfig {
    pub source_layers: BTreeSet<LayerId>,
    pub target_layer: Option<LayerId>,
}

impl CutterConfig {
    pub(crate) fn forget(&mut self, removed: &[LayerId]) {
        self.source_layers.retain(|id| !removed.contains(id));
        if self.target_layer.map_or(false, |t| removed.contains(&t)) {
            self.target_layer = None;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideBufferConfig {
    pub offset_quantum: f64,
    pub scope: LayerScope,
    /// Destination field names that receive the offset, matched ignoring case.
    pub width_fields: Vec<String>,
}

impl Default for SideBufferConfig {
    fn default() -> Self {
        SideBufferConfig {
            offset_quantum: 1.0,
            scope: LayerScope::Visible,
            width_fields: vec!["width".into(), "szerokosc".into()],
        }
    }
}

impl SideBufferConfig {
    pub(crate) fn forget(&mut self, removed: &[LayerId]) {
        self.scope.forget(removed);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainterConfig {
    pub search_radius: f64,
    pub scope: LayerScope,
    pub include_polygons: bool,
    pub include_lines: bool,
    pub ask_target_layer: bool,
    pub target_layer: Option<LayerId>,
}

impl Default for PainterConfig {
    fn default() -> Self {
        PainterConfig {
            search_radius: 100.0,
            scope: LayerScope::Visible,
            include_polygons: true,
            include_lines: false,
            ask_target_layer: false,
            target_layer: None,
        }
    }
}

impl PainterConfig {
    pub(crate) fn forget(&mut self, removed: &[LayerId]) {
        self.scope.forget(removed);
        if self.target_layer.map_or(false, |t| removed.contains(&t)) {
            self.target_layer = None;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub snap_tolerance: f64,
    pub min_part_area: f64,
    pub segments: u32,
    pub map_crs: Crs,
    pub cutter: CutterConfig,
    pub side_buffer: SideBufferConfig,
    pub painter: PainterConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            min_part_area: MIN_PART_AREA,
            segments: DEFAULT_SEGMENTS,
            map_crs: Crs::default(),
            cutter: CutterConfig::default(),
            side_buffer: SideBufferConfig::default(),
            painter: PainterConfig::default(),
        }
    }
}

impl ToolConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ToolError> {
        let cfg: ToolConfig = serde_json::from_str(text).map_err(|e| ToolError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_string(&self) -> Result<String, ToolError> {
        serde_json::to_string_pretty(self).map_err(|e| ToolError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ToolError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ToolError::Config(format!("{} must be positive, got {}", name, v)))
            }
        };
        positive("snap_tolerance", self.snap_tolerance)?;
        positive("side_buffer.offset_quantum", self.side_buffer.offset_quantum)?;
        positive("painter.search_radius", self.painter.search_radius)?;
        if !(self.min_part_area.is_finite() && self.min_part_area >= 0.0) {
            return Err(ToolError::Config(format!("min_part_area must be >= 0, got {}", self.min_part_area)));
        }
        if self.segments == 0 {
            return Err(ToolError::Config("segments must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic::Field;

    fn info(id: u32, ty: GeometryType, visible: bool) -> LayerInfo {
        LayerInfo {
            id: LayerId(id),
            name: format!("l{}", id),
            geometry_type: ty,
            visible,
            crs: Crs::default(),
            fields: Vec::<Field>::new(),
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ToolConfig::from_json_str(
            r#"{ "cutter": { "source_layers": [1, 2], "target_layer": 3 },
                 "painter": { "scope": { "kind": "selected", "layers": [4] }, "include_lines": true } }"#,
        )
        .unwrap();
        assert_eq!(cfg.cutter.source_layers.len(), 2);
        assert_eq!(cfg.cutter.target_layer, Some(LayerId(3)));
        assert_eq!(cfg.painter.scope, LayerScope::Selected { layers: vec![LayerId(4)] });
        assert!(cfg.painter.include_polygons && cfg.painter.include_lines);
        assert_eq!(cfg.segments, 20);
        assert_eq!(cfg.side_buffer.width_fields, vec!["width".to_string(), "szerokosc".to_string()]);
    }

    #[test]
    fn rejects_non_positive_values() {
        let err = ToolConfig::from_json_str(r#"{ "side_buffer": { "offset_quantum": 0 } }"#).unwrap_err();
        assert!(matches!(err, ToolError::Config(msg) if msg.contains("offset_quantum")));
        assert!(matches!(ToolConfig::from_json_str("{ nope"), Err(ToolError::Config(_))));
    }

    #[test]
    fn scope_candidates() {
        let layers = vec![
            info(1, GeometryType::Polygon, true),
            info(2, GeometryType::Polygon, false),
            info(3, GeometryType::Line, true),
        ];
        assert_eq!(LayerScope::All.candidates(&layers, GeometryType::Polygon), vec![LayerId(1), LayerId(2)]);
        assert_eq!(LayerScope::Visible.candidates(&layers, GeometryType::Polygon), vec![LayerId(1)]);
        let sel = LayerScope::Selected { layers: vec![LayerId(2), LayerId(3)] };
        assert_eq!(sel.candidates(&layers, GeometryType::Line), vec![LayerId(3)]);
    }

    #[test]
    fn forgetting_removed_layers() {
        let mut c = CutterConfig {
            source_layers: [LayerId(1), LayerId(2)].into_iter().collect(),
            target_layer: Some(LayerId(2)),
        };
        c.forget(&[LayerId(2)]);
        assert_eq!(c.source_layers.len(), 1);
        assert_eq!(c.target_layer, None);
    }
}
