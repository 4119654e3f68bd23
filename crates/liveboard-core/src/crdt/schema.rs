//! Loro document schema and operations.

use super::convert::{layer_from_loro, layer_to_loro, patch_to_loro};
use super::{DocumentError, DocumentMutation, DocumentResult};
use crate::color::Color;
use crate::config::{CanvasConfig, DEFAULT_LAYER_SIZE, MAX_LAYERS};
use crate::layer::{Layer, LayerId, LayerKind, LayerPatch};
use kurbo::{Point, Vec2};
use loro::{
    Container, ExportMode, LoroDoc, LoroList, LoroMap, LoroValue, ValueOrContainer, VersionVector,
};
use std::collections::HashMap;

/// Key for the layer map in the document.
pub const LAYERS_KEY: &str = "layers";
/// Key for the paint-order list in the document.
pub const LAYER_IDS_KEY: &str = "layer_ids";

/// The shared, CRDT-backed board document.
///
/// Layers live in an id-keyed map, one nested map per layer with one entry
/// per field. Paint order is a separate list of ids. Every mutation is
/// applied and committed locally right away; replicas exchange the
/// resulting update bytes through [`export_updates`](Self::export_updates)
/// and [`reconcile`](Self::reconcile).
pub struct LayerDocument {
    doc: LoroDoc,
    max_layers: usize,
    layer_size: f64,
}

impl LayerDocument {
    /// Create a new empty document with default limits.
    pub fn new() -> Self {
        Self {
            doc: LoroDoc::new(),
            max_layers: MAX_LAYERS,
            layer_size: DEFAULT_LAYER_SIZE,
        }
    }

    /// Create a new empty document using the limits from `config`.
    pub fn with_config(config: &CanvasConfig) -> Self {
        let mut document = Self::new();
        document.configure(config);
        document
    }

    /// Create a document from a snapshot exported by another replica.
    pub fn from_snapshot(bytes: &[u8]) -> DocumentResult<Self> {
        let document = Self::new();
        document.doc.import(bytes)?;
        Ok(document)
    }

    /// Apply the limits from `config`.
    pub fn configure(&mut self, config: &CanvasConfig) {
        self.max_layers = config.max_layers;
        self.layer_size = config.default_layer_size;
    }

    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    /// Get the underlying LoroDoc.
    pub fn loro_doc(&self) -> &LoroDoc {
        &self.doc
    }

    fn layers_map(&self) -> LoroMap {
        self.doc.get_map(LAYERS_KEY)
    }

    fn layer_ids_list(&self) -> LoroList {
        self.doc.get_list(LAYER_IDS_KEY)
    }

    fn layer_map(&self, id: &LayerId) -> Option<LoroMap> {
        match self.layers_map().get(id.as_str())? {
            ValueOrContainer::Container(Container::Map(map)) => Some(map),
            _ => None,
        }
    }

    // --- Reads ---

    /// Layer ids in paint order (back to front).
    pub fn layer_ids(&self) -> Vec<LayerId> {
        let list = self.layer_ids_list();
        let mut result = Vec::with_capacity(list.len());
        for i in 0..list.len() {
            if let Some(ValueOrContainer::Value(LoroValue::String(id))) = list.get(i) {
                result.push(LayerId::from(id.to_string()));
            }
        }
        result
    }

    /// Number of entries in the paint-order list.
    pub fn layer_count(&self) -> usize {
        self.layer_ids_list().len()
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.layer_map(id).is_some()
    }

    /// Get a layer by id.
    pub fn layer(&self, id: &LayerId) -> Option<Layer> {
        match self.layer_map(id)?.get_deep_value() {
            LoroValue::Map(map) => layer_from_loro(&map),
            _ => None,
        }
    }

    /// All layers keyed by id.
    pub fn layers(&self) -> HashMap<LayerId, Layer> {
        let mut result = HashMap::new();
        if let LoroValue::Map(map) = self.layers_map().get_deep_value() {
            for (id, value) in map.iter() {
                if let LoroValue::Map(layer_map) = value {
                    if let Some(layer) = layer_from_loro(layer_map) {
                        result.insert(LayerId::from(id.as_str()), layer);
                    }
                }
            }
        }
        result
    }

    /// Layers in paint order. Ids without a layer record are skipped.
    pub fn layers_ordered(&self) -> Vec<(LayerId, Layer)> {
        let mut layers = self.layers();
        self.layer_ids()
            .into_iter()
            .filter_map(|id| layers.remove(&id).map(|layer| (id, layer)))
            .collect()
    }

    fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layer_ids().iter().position(|other| other == id)
    }

    // --- Mutations ---

    /// Apply a mutation to the local replica and commit it.
    ///
    /// Returns the mutation that undoes it, or `None` if nothing changed
    /// (unknown id, empty patch, id already present).
    pub fn apply_local(
        &mut self,
        mutation: &DocumentMutation,
    ) -> DocumentResult<Option<DocumentMutation>> {
        let inverse = match mutation {
            DocumentMutation::Insert { id, layer, index } => {
                self.apply_insert(id, layer, *index)?
            }
            DocumentMutation::Update { id, patch } => self.apply_update(id, patch)?,
            DocumentMutation::Delete { id } => self.apply_delete(id)?,
        };
        if inverse.is_some() {
            self.doc.commit();
        }
        Ok(inverse)
    }

    fn apply_insert(
        &mut self,
        id: &LayerId,
        layer: &Layer,
        index: usize,
    ) -> DocumentResult<Option<DocumentMutation>> {
        if self.contains(id) {
            log::debug!("layer {id} already exists, insert skipped");
            return Ok(None);
        }
        let ids = self.layer_ids_list();
        if ids.len() >= self.max_layers {
            return Err(DocumentError::LayerLimitReached(self.max_layers));
        }

        let layer_map = self.layers_map().insert_container(id.as_str(), LoroMap::new())?;
        layer_to_loro(layer, &layer_map)?;

        let value = LoroValue::String(id.to_string().into());
        if index >= ids.len() {
            ids.push(value)?;
        } else {
            ids.insert(index, value)?;
        }

        Ok(Some(DocumentMutation::Delete { id: id.clone() }))
    }

    fn apply_update(
        &mut self,
        id: &LayerId,
        patch: &LayerPatch,
    ) -> DocumentResult<Option<DocumentMutation>> {
        if patch.is_empty() {
            return Ok(None);
        }
        let (Some(layer_map), Some(current)) = (self.layer_map(id), self.layer(id)) else {
            return Ok(None);
        };

        let previous = current.snapshot_of(patch);
        patch_to_loro(patch, &layer_map)?;

        Ok(Some(DocumentMutation::Update {
            id: id.clone(),
            patch: previous,
        }))
    }

    fn apply_delete(&mut self, id: &LayerId) -> DocumentResult<Option<DocumentMutation>> {
        let Some(layer) = self.layer(id) else {
            return Ok(None);
        };
        let index = self.index_of(id).unwrap_or(usize::MAX);

        self.layers_map().delete(id.as_str())?;

        let ids = self.layer_ids_list();
        for i in (0..ids.len()).rev() {
            if let Some(ValueOrContainer::Value(LoroValue::String(s))) = ids.get(i) {
                if s.as_ref() == id.as_str() {
                    ids.delete(i, 1)?;
                }
            }
        }

        Ok(Some(DocumentMutation::Insert {
            id: id.clone(),
            layer,
            index,
        }))
    }

    /// Append a new layer of `kind` with its top-left corner at `position`.
    ///
    /// Fails with [`DocumentError::LayerLimitReached`] without touching the
    /// document when the board is full.
    pub fn insert_layer(
        &mut self,
        kind: LayerKind,
        position: Point,
        fill: Color,
    ) -> DocumentResult<LayerId> {
        let mutation = self.insert_mutation(kind, position, fill);
        self.apply_local(&mutation)?;
        Ok(mutation.layer_id().clone())
    }

    /// Build (without applying) the mutation that appends a new layer.
    pub fn insert_mutation(&self, kind: LayerKind, position: Point, fill: Color) -> DocumentMutation {
        DocumentMutation::Insert {
            id: LayerId::generate(),
            layer: Layer::new(kind, position, self.layer_size, self.layer_size, fill),
            index: self.layer_count(),
        }
    }

    /// Merge `patch` into the layer at `id`. Returns `false` if the layer
    /// does not exist.
    pub fn update_layer_fields(&mut self, id: &LayerId, patch: LayerPatch) -> DocumentResult<bool> {
        let mutation = DocumentMutation::Update {
            id: id.clone(),
            patch,
        };
        Ok(self.apply_local(&mutation)?.is_some())
    }

    /// Move every existing layer in `ids` by `offset`. Returns how many
    /// layers moved.
    pub fn translate_layers(&mut self, ids: &[LayerId], offset: Vec2) -> DocumentResult<usize> {
        let mut moved = 0;
        for mutation in self.translation_mutations(ids, offset) {
            if self.apply_local(&mutation)?.is_some() {
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// One position update per existing layer in `ids`, each relative to
    /// that layer's current position.
    pub fn translation_mutations(&self, ids: &[LayerId], offset: Vec2) -> Vec<DocumentMutation> {
        ids.iter()
            .filter_map(|id| {
                let layer = self.layer(id)?;
                Some(DocumentMutation::Update {
                    id: id.clone(),
                    patch: LayerPatch::position(Point::new(layer.x + offset.x, layer.y + offset.y)),
                })
            })
            .collect()
    }

    /// Delete the layer at `id`. Returns `false` if it did not exist.
    pub fn delete_layer(&mut self, id: &LayerId) -> DocumentResult<bool> {
        let mutation = DocumentMutation::Delete { id: id.clone() };
        Ok(self.apply_local(&mutation)?.is_some())
    }

    // --- Replication ---

    /// Export the document as a snapshot (full state).
    pub fn export_snapshot(&self) -> DocumentResult<Vec<u8>> {
        self.doc
            .export(ExportMode::Snapshot)
            .map_err(|e| DocumentError::Encode(e.to_string()))
    }

    /// Export incremental updates since a version.
    pub fn export_updates(&self, since: &VersionVector) -> DocumentResult<Vec<u8>> {
        self.doc
            .export(ExportMode::updates(since))
            .map_err(|e| DocumentError::Encode(e.to_string()))
    }

    /// Merge updates produced by another replica.
    pub fn reconcile(&mut self, remote_delta: &[u8]) -> DocumentResult<()> {
        self.doc.import(remote_delta)?;
        Ok(())
    }

    /// Get the current version vector.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }
}

impl Default for LayerDocument {
    fn default() -> Self {
        Self::new()
    }
}
