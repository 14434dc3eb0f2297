//! Feature storage seam.
//!
//! Engines only talk to [`FeatureStore`]; [`MemoryStore`] is the in-process
//! implementation used by tests, the bench binary and hosts without a backend.

use std::collections::{BTreeMap, HashMap};

use crossbeam_channel::Receiver;

use crate::error::StoreError;
use crate::geometry::bbox::Bbox;
use crate::geometry::transform::Crs;
use crate::grid::GridIndex;
use crate::layers::{Field, LayerEvent, LayerId, LayerInfo, LayerSystem};
use crate::model::{AttrValue, Feature, FeatureId, Geometry, GeometryType};

pub trait FeatureStore {
    /// Layers bottom to top.
    fn layers(&self) -> Vec<LayerInfo>;
    fn layer(&self, id: LayerId) -> Option<LayerInfo>;
    /// Features whose bounding box intersects `bbox`.
    fn query(&self, layer: LayerId, bbox: &Bbox) -> Result<Vec<Feature>, StoreError>;
    fn feature(&self, layer: LayerId, id: FeatureId) -> Result<Feature, StoreError>;
    fn add_feature(
        &mut self,
        layer: LayerId,
        geometry: Geometry,
        attributes: Vec<AttrValue>,
    ) -> Result<FeatureId, StoreError>;
    fn delete_feature(&mut self, layer: LayerId, id: FeatureId) -> Result<Feature, StoreError>;
    fn change_geometry(&mut self, layer: LayerId, id: FeatureId, geometry: Geometry) -> Result<(), StoreError>;
    fn is_editable(&self, layer: LayerId) -> Result<bool, StoreError>;
    fn start_editing(&mut self, layer: LayerId) -> Result<(), StoreError>;
    fn subscribe(&mut self) -> Receiver<LayerEvent>;

    fn default_attributes(&self, layer: LayerId) -> Result<Vec<AttrValue>, StoreError> {
        let info = self.layer(layer).ok_or(StoreError::LayerNotFound(layer))?;
        Ok(info.fields.iter().map(|f| f.default.clone()).collect())
    }

    /// Delete `id` and insert one feature per part, each carrying the original
    /// attributes. Either the whole couplet lands or nothing does.
    fn replace_feature(
        &mut self,
        layer: LayerId,
        id: FeatureId,
        parts: Vec<Geometry>,
    ) -> Result<Vec<FeatureId>, StoreError> {
        let original = self.feature(layer, id)?;
        let mut added = Vec::with_capacity(parts.len());
        for part in parts {
            match self.add_feature(layer, part, original.attributes.clone()) {
                Ok(fid) => added.push(fid),
                Err(e) => {
                    for fid in added {
                        let _ = self.delete_feature(layer, fid);
                    }
                    return Err(e);
                }
            }
        }
        if let Err(e) = self.delete_feature(layer, id) {
            for fid in added {
                let _ = self.delete_feature(layer, fid);
            }
            return Err(e);
        }
        Ok(added)
    }
}

#[derive(Debug)]
struct LayerData {
    features: BTreeMap<FeatureId, Feature>,
    index: GridIndex<FeatureId>,
    next_id: u64,
    editable: bool,
}

impl LayerData {
    fn new(cell: f64) -> Self {
        LayerData { features: BTreeMap::new(), index: GridIndex::new(cell), next_id: 0, editable: false }
    }

    fn put(&mut self, geometry: Geometry, attributes: Vec<AttrValue>) -> FeatureId {
        self.next_id += 1;
        let id = FeatureId(self.next_id);
        if let Some(b) = geometry.bbox() {
            self.index.insert(id, b);
        }
        self.features.insert(id, Feature { id, geometry, attributes });
        id
    }
}

/// In-memory feature store with a grid index per layer.
#[derive(Debug)]
pub struct MemoryStore {
    registry: LayerSystem,
    data: HashMap<LayerId, LayerData>,
    cell: f64,
}

impl Default for MemoryStore {
    fn default() -> Self { MemoryStore::new() }
}

impl MemoryStore {
    pub fn new() -> Self { MemoryStore::with_cell_size(64.0) }

    pub fn with_cell_size(cell: f64) -> Self {
        MemoryStore { registry: LayerSystem::new(), data: HashMap::new(), cell }
    }

    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        geometry_type: GeometryType,
        crs: Crs,
        fields: Vec<Field>,
    ) -> LayerId {
        let id = self.registry.create_layer(name, geometry_type, crs, fields);
        self.data.insert(id, LayerData::new(self.cell));
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Option<LayerInfo> {
        self.data.remove(&id);
        self.registry.remove_layer(id)
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), StoreError> {
        if self.registry.set_visible(id, visible) { Ok(()) } else { Err(StoreError::LayerNotFound(id)) }
    }

    /// Initial data load; does not count as a session edit and skips the editable check.
    pub fn load_feature(
        &mut self,
        layer: LayerId,
        geometry: Geometry,
        attributes: Vec<AttrValue>,
    ) -> Result<FeatureId, StoreError> {
        self.check_type(layer, &geometry)?;
        let data = self.data.get_mut(&layer).ok_or(StoreError::LayerNotFound(layer))?;
        Ok(data.put(geometry, attributes))
    }

    /// All features of a layer in id order.
    pub fn features(&self, layer: LayerId) -> Result<Vec<Feature>, StoreError> {
        let data = self.data.get(&layer).ok_or(StoreError::LayerNotFound(layer))?;
        Ok(data.features.values().cloned().collect())
    }

    fn check_type(&self, layer: LayerId, geometry: &Geometry) -> Result<(), StoreError> {
        let info = self.registry.get_layer(layer).ok_or(StoreError::LayerNotFound(layer))?;
        if info.geometry_type != geometry.geometry_type() {
            return Err(StoreError::GeometryTypeMismatch {
                layer,
                expected: info.geometry_type,
                got: geometry.geometry_type(),
            });
        }
        Ok(())
    }

    fn editable_data(&mut self, layer: LayerId) -> Result<&mut LayerData, StoreError> {
        let data = self.data.get_mut(&layer).ok_or(StoreError::LayerNotFound(layer))?;
        if !data.editable {
            return Err(StoreError::NotEditable(layer));
        }
        Ok(data)
    }
}

impl FeatureStore for MemoryStore {
    fn layers(&self) -> Vec<LayerInfo> { self.registry.layers_ordered().to_vec() }

    fn layer(&self, id: LayerId) -> Option<LayerInfo> { self.registry.get_layer(id).cloned() }

    fn query(&self, layer: LayerId, bbox: &Bbox) -> Result<Vec<Feature>, StoreError> {
        let data = self.data.get(&layer).ok_or(StoreError::LayerNotFound(layer))?;
        Ok(data
            .index
            .query(bbox)
            .into_iter()
            .filter_map(|id| data.features.get(&id).cloned())
            .collect())
    }

    fn feature(&self, layer: LayerId, id: FeatureId) -> Result<Feature, StoreError> {
        let data = self.data.get(&layer).ok_or(StoreError::LayerNotFound(layer))?;
        data.features.get(&id).cloned().ok_or(StoreError::FeatureNotFound { layer, feature: id })
    }

    fn add_feature(
        &mut self,
        layer: LayerId,
        geometry: Geometry,
        attributes: Vec<AttrValue>,
    ) -> Result<FeatureId, StoreError> {
        self.check_type(layer, &geometry)?;
        let data = self.editable_data(layer)?;
        let id = data.put(geometry, attributes);
        log::trace!("added {} to {}", id, layer);
        Ok(id)
    }

    fn delete_feature(&mut self, layer: LayerId, id: FeatureId) -> Result<Feature, StoreError> {
        let data = self.editable_data(layer)?;
        let f = data.features.remove(&id).ok_or(StoreError::FeatureNotFound { layer, feature: id })?;
        data.index.remove(id);
        log::trace!("deleted {} from {}", id, layer);
        Ok(f)
    }

    fn change_geometry(&mut self, layer: LayerId, id: FeatureId, geometry: Geometry) -> Result<(), StoreError> {
        self.check_type(layer, &geometry)?;
        let data = self.editable_data(layer)?;
        let f = data.features.get_mut(&id).ok_or(StoreError::FeatureNotFound { layer, feature: id })?;
        match geometry.bbox() {
            Some(b) => data.index.insert(id, b),
            None => data.index.remove(id),
        }
        f.geometry = geometry;
        Ok(())
    }

    fn is_editable(&self, layer: LayerId) -> Result<bool, StoreError> {
        self.data.get(&layer).map(|d| d.editable).ok_or(StoreError::LayerNotFound(layer))
    }

    fn start_editing(&mut self, layer: LayerId) -> Result<(), StoreError> {
        let data = self.data.get_mut(&layer).ok_or(StoreError::LayerNotFound(layer))?;
        if !data.editable {
            log::debug!("{} switched to editing", layer);
            data.editable = true;
        }
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<LayerEvent> { self.registry.subscribe() }

    fn replace_feature(
        &mut self,
        layer: LayerId,
        id: FeatureId,
        parts: Vec<Geometry>,
    ) -> Result<Vec<FeatureId>, StoreError> {
        for p in &parts {
            self.check_type(layer, p)?;
        }
        let data = self.editable_data(layer)?;
        let original = data.features.remove(&id).ok_or(StoreError::FeatureNotFound { layer, feature: id })?;
        data.index.remove(id);
        Ok(parts.into_iter().map(|p| data.put(p, original.attributes.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    fn square(x0: f64, y0: f64, s: f64) -> Geometry {
        Geometry::polygon(polygon![(x: x0, y: y0), (x: x0 + s, y: y0), (x: x0 + s, y: y0 + s), (x: x0, y: y0 + s)])
    }

    #[test]
    fn writes_need_editing_mode() {
        let mut st = MemoryStore::new();
        let l = st.add_layer("p", GeometryType::Polygon, Crs::default(), Vec::new());
        assert_eq!(st.add_feature(l, square(0.0, 0.0, 1.0), Vec::new()), Err(StoreError::NotEditable(l)));
        assert!(!st.is_editable(l).unwrap());
        st.start_editing(l).unwrap();
        assert!(st.add_feature(l, square(0.0, 0.0, 1.0), Vec::new()).is_ok());
        assert!(st.is_editable(l).unwrap());
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut st = MemoryStore::new();
        let l = st.add_layer("p", GeometryType::Polygon, Crs::default(), Vec::new());
        st.start_editing(l).unwrap();
        let line = Geometry::line(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert!(matches!(
            st.add_feature(l, line, Vec::new()),
            Err(StoreError::GeometryTypeMismatch { expected: GeometryType::Polygon, .. })
        ));
    }

    #[test]
    fn query_uses_index_and_replace_keeps_attributes() {
        let mut st = MemoryStore::with_cell_size(5.0);
        let l = st.add_layer("p", GeometryType::Polygon, Crs::default(), Vec::new());
        let a = st.load_feature(l, square(0.0, 0.0, 2.0), vec![AttrValue::from("a")]).unwrap();
        st.load_feature(l, square(100.0, 100.0, 2.0), vec![AttrValue::from("b")]).unwrap();
        let hits = st.query(l, &Bbox::new(1.0, 1.0, 3.0, 3.0)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, a);

        st.start_editing(l).unwrap();
        let new_ids = st.replace_feature(l, a, vec![square(0.0, 0.0, 1.0), square(1.5, 0.0, 0.5)]).unwrap();
        assert_eq!(new_ids.len(), 2);
        assert!(matches!(st.feature(l, a), Err(StoreError::FeatureNotFound { .. })));
        for id in new_ids {
            assert_eq!(st.feature(l, id).unwrap().attributes, vec![AttrValue::from("a")]);
        }
        assert_eq!(st.features(l).unwrap().len(), 3);
    }

    #[test]
    fn failed_replace_leaves_layer_untouched() {
        let mut st = MemoryStore::new();
        let l = st.add_layer("p", GeometryType::Polygon, Crs::default(), Vec::new());
        let a = st.load_feature(l, square(0.0, 0.0, 2.0), Vec::new()).unwrap();
        st.start_editing(l).unwrap();
        let line = Geometry::line(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        assert!(st.replace_feature(l, a, vec![square(0.0, 0.0, 1.0), line]).is_err());
        assert_eq!(st.features(l).unwrap().len(), 1);
        assert!(st.feature(l, a).is_ok());
    }

    #[test]
    fn removing_layer_notifies_subscribers() {
        let mut st = MemoryStore::new();
        let rx = st.subscribe();
        let l = st.add_layer("p", GeometryType::Polygon, Crs::default(), Vec::new());
        st.remove_layer(l);
        let evs: Vec<LayerEvent> = rx.try_iter().collect();
        assert!(matches!(evs.last(), Some(LayerEvent::Removed(ids)) if ids == &vec![l]));
        assert!(st.query(l, &Bbox::new(0.0, 0.0, 1.0, 1.0)).is_err());
    }
}
