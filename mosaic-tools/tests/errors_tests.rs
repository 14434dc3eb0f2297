use crossbeam_channel::Receiver;
use geo::polygon;
use mosaic::{
    AttrValue, Bbox, Crs, Feature, FeatureId, FeatureStore, Geometry, GeometryType, LayerEvent, LayerId, LayerInfo,
    MemoryStore, StoreError,
};
use mosaic_tools::{
    ConfigIssue, Cutter, Engine, InputEvent, Outcome, RecordingSurface, ToolConfig, ToolContext, ToolError,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
    Geometry::polygon(polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)])
}

/// Delegates to a [`MemoryStore`] but refuses the n-th feature replacement.
struct FlakyStore {
    inner: MemoryStore,
    fail_on: usize,
    replaced: usize,
}

impl FeatureStore for FlakyStore {
    fn layers(&self) -> Vec<LayerInfo> { self.inner.layers() }
    fn layer(&self, id: LayerId) -> Option<LayerInfo> { self.inner.layer(id) }
    fn query(&self, layer: LayerId, bbox: &Bbox) -> Result<Vec<Feature>, StoreError> {
        self.inner.query(layer, bbox)
    }
    fn feature(&self, layer: LayerId, id: FeatureId) -> Result<Feature, StoreError> {
        self.inner.feature(layer, id)
    }
    fn add_feature(
        &mut self,
        layer: LayerId,
        geometry: Geometry,
        attributes: Vec<AttrValue>,
    ) -> Result<FeatureId, StoreError> {
        self.inner.add_feature(layer, geometry, attributes)
    }
    fn delete_feature(&mut self, layer: LayerId, id: FeatureId) -> Result<Feature, StoreError> {
        self.inner.delete_feature(layer, id)
    }
    fn change_geometry(&mut self, layer: LayerId, id: FeatureId, geometry: Geometry) -> Result<(), StoreError> {
        self.inner.change_geometry(layer, id, geometry)
    }
    fn is_editable(&self, layer: LayerId) -> Result<bool, StoreError> { self.inner.is_editable(layer) }
    fn start_editing(&mut self, layer: LayerId) -> Result<(), StoreError> { self.inner.start_editing(layer) }
    fn subscribe(&mut self) -> Receiver<LayerEvent> { self.inner.subscribe() }

    fn replace_feature(
        &mut self,
        layer: LayerId,
        id: FeatureId,
        parts: Vec<Geometry>,
    ) -> Result<Vec<FeatureId>, StoreError> {
        self.replaced += 1;
        if self.replaced == self.fail_on {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.replace_feature(layer, id, parts)
    }
}

fn draw(cutter: &mut Cutter, ctx: &mut ToolContext<'_>, ring: &[(f64, f64)]) -> Result<Outcome, ToolError> {
    for &(x, y) in ring {
        cutter.handle(ctx, &InputEvent::click(x, y))?;
    }
    cutter.handle(ctx, &InputEvent::finish(0.0, 0.0))
}

#[test]
fn failed_couplet_keeps_earlier_ones_and_their_material() {
    let mut inner = MemoryStore::new();
    let parcels = inner.add_layer("parcels", GeometryType::Polygon, Crs::default(), Vec::new());
    let cuttings = inner.add_layer("cuttings", GeometryType::Polygon, Crs::default(), Vec::new());
    let first = inner.load_feature(parcels, rect(0.0, 0.0, 10.0, 10.0), Vec::new()).unwrap();
    let second = inner.load_feature(parcels, rect(20.0, 0.0, 30.0, 10.0), Vec::new()).unwrap();
    let mut st = FlakyStore { inner, fail_on: 2, replaced: 0 };

    let mut config = ToolConfig::default();
    config.cutter.source_layers.insert(parcels);
    config.cutter.target_layer = Some(cuttings);
    let mut cutter = Cutter::new(&mut st, config);
    let mut surface = RecordingSurface::new();
    let mut ctx = ToolContext::new(&mut st, &mut surface);

    let err = draw(&mut cutter, &mut ctx, &[(8.0, 4.0), (22.0, 4.0), (22.0, 6.0), (8.0, 6.0)]).unwrap_err();
    assert_eq!(err, ToolError::Store(StoreError::Backend("disk full".into())));
    assert_eq!(err.code(), "store");

    let left = st.inner.features(parcels).unwrap();
    assert_eq!(left.len(), 2);
    assert!(left.iter().all(|f| f.id != first), "first couplet applied");
    let notched = left.iter().find(|f| f.id != second).unwrap();
    assert!((notched.geometry.area() - 96.0).abs() < 1e-6);
    let untouched = st.inner.feature(parcels, second).unwrap();
    assert!((untouched.geometry.area() - 100.0).abs() < 1e-9);

    let moved = st.inner.features(cuttings).unwrap();
    assert_eq!(moved.len(), 1);
    assert!((moved[0].geometry.area() - 4.0).abs() < 1e-6);
}

#[test]
fn collinear_sketch_is_a_validation_error() {
    let mut st = MemoryStore::new();
    let parcels = st.add_layer("parcels", GeometryType::Polygon, Crs::default(), Vec::new());
    let cuttings = st.add_layer("cuttings", GeometryType::Polygon, Crs::default(), Vec::new());
    st.load_feature(parcels, rect(0.0, 0.0, 10.0, 10.0), Vec::new()).unwrap();
    let mut config = ToolConfig::default();
    config.cutter.source_layers.insert(parcels);
    config.cutter.target_layer = Some(cuttings);
    let mut cutter = Cutter::new(&mut st, config);
    let mut surface = RecordingSurface::new();
    let mut ctx = ToolContext::new(&mut st, &mut surface);

    let err = draw(&mut cutter, &mut ctx, &[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]).unwrap_err();
    assert!(matches!(err, ToolError::Validation(_)), "got {:?}", err);
    assert_eq!(err.code(), "invalid_geometry");
    assert!(!st.is_editable(parcels).unwrap());
    assert!(!st.is_editable(cuttings).unwrap());
}

#[test]
fn removed_target_layer_is_forgotten() {
    let mut st = MemoryStore::new();
    let parcels = st.add_layer("parcels", GeometryType::Polygon, Crs::default(), Vec::new());
    let cuttings = st.add_layer("cuttings", GeometryType::Polygon, Crs::default(), Vec::new());
    st.load_feature(parcels, rect(0.0, 0.0, 10.0, 10.0), Vec::new()).unwrap();
    let mut config = ToolConfig::default();
    config.cutter.source_layers.insert(parcels);
    config.cutter.target_layer = Some(cuttings);
    let mut cutter = Cutter::new(&mut st, config);

    st.remove_layer(cuttings);
    let mut surface = RecordingSurface::new();
    let mut ctx = ToolContext::new(&mut st, &mut surface);
    let err = draw(&mut cutter, &mut ctx, &[(8.0, 4.0), (12.0, 4.0), (12.0, 6.0), (8.0, 6.0)]).unwrap_err();
    assert_eq!(err, ToolError::Configuration(ConfigIssue::MissingTargetLayer));
    assert_eq!(cutter.config().cutter.target_layer, None);
    assert!(!st.is_editable(parcels).unwrap());
    assert!((st.features(parcels).unwrap()[0].geometry.area() - 100.0).abs() < 1e-9);
}

#[test]
fn removed_source_layer_leaves_nothing_to_cut() {
    let mut st = MemoryStore::new();
    let parcels = st.add_layer("parcels", GeometryType::Polygon, Crs::default(), Vec::new());
    let cuttings = st.add_layer("cuttings", GeometryType::Polygon, Crs::default(), Vec::new());
    let mut config = ToolConfig::default();
    config.cutter.source_layers.insert(parcels);
    config.cutter.target_layer = Some(cuttings);
    let mut cutter = Cutter::new(&mut st, config);

    st.remove_layer(parcels);
    let mut surface = RecordingSurface::new();
    let mut ctx = ToolContext::new(&mut st, &mut surface);
    let err = draw(&mut cutter, &mut ctx, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).unwrap_err();
    assert_eq!(err, ToolError::Configuration(ConfigIssue::MissingSourceLayers));
    assert!(cutter.config().cutter.source_layers.is_empty());
}
