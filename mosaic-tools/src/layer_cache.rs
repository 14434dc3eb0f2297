//! Layer list derived from store events.

use crossbeam_channel::Receiver;
use mosaic::{FeatureStore, GeometryType, LayerEvent, LayerId, LayerInfo};

#[derive(Debug)]
pub struct LayerCache {
    events: Receiver<LayerEvent>,
    layers: Vec<LayerInfo>,
}

impl LayerCache {
    pub fn new(store: &mut dyn FeatureStore) -> Self {
        let events = store.subscribe();
        LayerCache { events, layers: store.layers() }
    }

    /// Drain pending events and rebuild from the store if any arrived.
    /// Returns the ids of removed layers.
    pub fn refresh(&mut self, store: &dyn FeatureStore) -> Vec<LayerId> {
        let mut removed = Vec::new();
        let mut dirty = false;
        for event in self.events.try_iter() {
            dirty = true;
            match event {
                LayerEvent::Removed(ids) => removed.extend(ids),
                LayerEvent::Added(infos) => log::debug!("{} layers added", infos.len()),
                LayerEvent::VisibilityChanged(id, visible) => log::trace!("{} visible={}", id, visible),
            }
        }
        if dirty {
            self.layers = store.layers();
        }
        removed
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> &[LayerInfo] { &self.layers }

    pub fn get(&self, id: LayerId) -> Option<&LayerInfo> { self.layers.iter().find(|l| l.id == id) }

    pub fn visible(&self, ty: GeometryType) -> Vec<LayerInfo> {
        self.layers.iter().filter(|l| l.visible && l.geometry_type == ty).cloned().collect()
    }

    pub fn of_type(&self, ty: GeometryType) -> Vec<LayerInfo> {
        self.layers.iter().filter(|l| l.geometry_type == ty).cloned().collect()
    }
}
