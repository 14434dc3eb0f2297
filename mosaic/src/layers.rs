use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::geometry::transform::Crs;
use crate::model::{AttrValue, GeometryType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "L{}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    Boolean,
}

/// One column of a layer's attribute schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub default: AttrValue,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field { name: name.into(), kind, default: AttrValue::Null }
    }

    pub fn with_default(mut self, default: AttrValue) -> Self {
        self.default = default;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub geometry_type: GeometryType,
    pub visible: bool,
    pub crs: Crs,
    pub fields: Vec<Field>,
}

impl LayerInfo {
    /// Index of the first field whose name matches one of `names`, ignoring case.
    pub fn field_index(&self, names: &[String]) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| names.iter().any(|n| f.name.eq_ignore_ascii_case(n)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerEvent {
    Added(Vec<LayerInfo>),
    Removed(Vec<LayerId>),
    VisibilityChanged(LayerId, bool),
}

/// Ordered layer registry (bottom to top) that broadcasts structural changes.
#[derive(Debug, Default)]
pub struct LayerSystem {
    layers: Vec<LayerInfo>,
    subscribers: Vec<Sender<LayerEvent>>,
    next_id: u32,
}

impl LayerSystem {
    pub fn new() -> Self { LayerSystem::default() }

    fn next_id(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    fn emit(&mut self, ev: LayerEvent) {
        // Receivers dropped by their engines are forgotten here.
        self.subscribers.retain(|tx| tx.send(ev.clone()).is_ok());
    }

    pub fn subscribe(&mut self) -> Receiver<LayerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Create a visible layer on top of the stack, returns its id
    pub fn create_layer(
        &mut self,
        name: impl Into<String>,
        geometry_type: GeometryType,
        crs: Crs,
        fields: Vec<Field>,
    ) -> LayerId {
        let id = self.next_id();
        let info = LayerInfo { id, name: name.into(), geometry_type, visible: true, crs, fields };
        self.layers.push(info.clone());
        log::debug!("layer {} ({:?}) added", id, geometry_type);
        self.emit(LayerEvent::Added(vec![info]));
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Option<LayerInfo> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        let removed = self.layers.remove(idx);
        log::debug!("layer {} removed", id);
        self.emit(LayerEvent::Removed(vec![id]));
        Some(removed)
    }

    /// Returns false when the layer does not exist.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) else { return false };
        if layer.visible == visible {
            return true;
        }
        layer.visible = visible;
        self.emit(LayerEvent::VisibilityChanged(id, visible));
        true
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layers in stacking order (bottom to top)
    pub fn layers_ordered(&self) -> &[LayerInfo] { &self.layers }
}
