//! One connection's view of a shared board.
//!
//! A [`Room`] ties together the shared [`LayerDocument`], the local
//! [`PresenceBroadcaster`] and the [`HistoryManager`]. Every mutation made
//! through the room is applied locally right away and its inverse is
//! recorded, so undo and redo only ever touch what this connection did.

use crate::color::{Color, connection_id_to_color};
use crate::config::CanvasConfig;
use crate::crdt::{DocumentError, DocumentMutation, DocumentResult, LayerDocument, VersionVector};
use crate::geometry::{Xywh, bounding_box};
use crate::history::{HistoryEntry, HistoryManager, HistoryOp};
use crate::layer::{Layer, LayerId, LayerKind, LayerPatch};
use crate::presence::{
    ConnectionId, PresenceBroadcaster, PresenceEvent, PresenceOptions, PresenceUpdate,
};
use kurbo::{Point, Vec2};
use std::collections::HashMap;

pub struct Room {
    document: LayerDocument,
    presence: PresenceBroadcaster,
    history: HistoryManager,
    /// Document version at the last `take_document_updates` call.
    exported: VersionVector,
}

impl Room {
    pub fn new(connection_id: ConnectionId, config: &CanvasConfig) -> Self {
        Self::from_document(LayerDocument::with_config(config), connection_id, config)
    }

    /// Join a board from a snapshot exported by another connection.
    pub fn from_snapshot(
        bytes: &[u8],
        connection_id: ConnectionId,
        config: &CanvasConfig,
    ) -> DocumentResult<Self> {
        let mut document = LayerDocument::from_snapshot(bytes)?;
        document.configure(config);
        Ok(Self::from_document(document, connection_id, config))
    }

    fn from_document(document: LayerDocument, connection_id: ConnectionId, config: &CanvasConfig) -> Self {
        let exported = document.version();
        Self {
            document,
            presence: PresenceBroadcaster::new(connection_id),
            history: HistoryManager::new(config.max_history),
            exported,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        self.presence.connection_id()
    }

    pub fn document(&self) -> &LayerDocument {
        &self.document
    }

    pub fn presence(&self) -> &PresenceBroadcaster {
        &self.presence
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    // --- Mutations ---

    fn apply_and_record(&mut self, mutation: &DocumentMutation) -> DocumentResult<bool> {
        match self.document.apply_local(mutation)? {
            Some(inverse) => {
                self.history.record(HistoryOp::Document(inverse));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run `f` as one undo step. Inside an already open batch, `f` just
    /// joins it.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> DocumentResult<T>) -> DocumentResult<T> {
        let opened = self.history.begin_batch().is_ok();
        let result = f(self);
        if opened {
            self.history.resume();
        }
        result
    }

    /// Append a new layer. Fails with [`DocumentError::LayerLimitReached`]
    /// when the board is full, in which case nothing is recorded.
    pub fn insert_layer(
        &mut self,
        kind: LayerKind,
        position: Point,
        fill: Color,
    ) -> DocumentResult<LayerId> {
        let mutation = self.document.insert_mutation(kind, position, fill);
        self.apply_and_record(&mutation)?;
        Ok(mutation.layer_id().clone())
    }

    pub fn update_layer_fields(&mut self, id: &LayerId, patch: LayerPatch) -> DocumentResult<bool> {
        self.apply_and_record(&DocumentMutation::Update {
            id: id.clone(),
            patch,
        })
    }

    /// Move layers by `offset` as one undo step. Returns how many moved.
    pub fn translate_layers(&mut self, ids: &[LayerId], offset: Vec2) -> DocumentResult<usize> {
        let mutations = self.document.translation_mutations(ids, offset);
        self.batch(|room| {
            let mut moved = 0;
            for mutation in &mutations {
                if room.apply_and_record(mutation)? {
                    moved += 1;
                }
            }
            Ok(moved)
        })
    }

    /// Delete layers as one undo step. Returns how many were deleted.
    pub fn delete_layers(&mut self, ids: &[LayerId]) -> DocumentResult<usize> {
        self.batch(|room| {
            let mut deleted = 0;
            for id in ids {
                if room.apply_and_record(&DocumentMutation::Delete { id: id.clone() })? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
    }

    /// Update the local presence. Only selection changes can be recorded;
    /// cursor moves never enter history.
    pub fn set_my_presence(&mut self, update: PresenceUpdate, options: PresenceOptions) {
        let previous = self.presence.set_my_presence(update);
        if let (true, Some(previous)) = (options.add_to_history, previous) {
            self.history.record(HistoryOp::Selection(previous));
        }
    }

    // --- History ---

    /// Undo the last recorded step. Returns `false` if there was nothing to
    /// undo or a batch is still open.
    ///
    /// If applying fails part way, the ops already reverted go to the redo
    /// stack, the rest stay on the undo stack, and the error is returned.
    pub fn undo(&mut self) -> DocumentResult<bool> {
        if self.history.is_paused() {
            log::debug!("undo ignored while history is paused");
            return Ok(false);
        }
        let Some(entry) = self.history.pop_undo() else {
            return Ok(false);
        };
        let (redo, failure) = self.apply_entry(entry);
        if !redo.is_empty() {
            self.history.push_redo(redo);
        }
        if let Some((remaining, err)) = failure {
            self.history.push_undo(remaining);
            return Err(err);
        }
        Ok(true)
    }

    /// Redo the last undone step. Failures are handled like in
    /// [`undo`](Self::undo), with the stacks swapped.
    pub fn redo(&mut self) -> DocumentResult<bool> {
        if self.history.is_paused() {
            log::debug!("redo ignored while history is paused");
            return Ok(false);
        }
        let Some(entry) = self.history.pop_redo() else {
            return Ok(false);
        };
        let (undo, failure) = self.apply_entry(entry);
        if !undo.is_empty() {
            self.history.push_undo(undo);
        }
        if let Some((remaining, err)) = failure {
            self.history.push_redo(remaining);
            return Err(err);
        }
        Ok(true)
    }

    /// Apply an entry back to front and return the entry that reverts what
    /// was applied.
    ///
    /// Ops that no longer apply (layer deleted remotely, board full) are
    /// skipped. On any other error, applying stops and the unapplied ops
    /// (the failing one included) come back with the error.
    fn apply_entry(
        &mut self,
        entry: HistoryEntry,
    ) -> (HistoryEntry, Option<(HistoryEntry, DocumentError)>) {
        let mut pending = entry.into_ops();
        let mut reverted = Vec::with_capacity(pending.len());

        while let Some(op) = pending.pop() {
            match op {
                HistoryOp::Document(mutation) => match self.document.apply_local(&mutation) {
                    Ok(Some(inverse)) => reverted.push(HistoryOp::Document(inverse)),
                    Ok(None) => {
                        log::debug!("history op on layer {} no longer applies", mutation.layer_id());
                    }
                    Err(DocumentError::LayerLimitReached(max)) => {
                        log::debug!("cannot restore layer {}: limit of {max} reached", mutation.layer_id());
                    }
                    Err(err) => {
                        log::warn!("history op on layer {} failed: {err}", mutation.layer_id());
                        pending.push(HistoryOp::Document(mutation));
                        return (
                            HistoryEntry::new(reverted),
                            Some((HistoryEntry::new(pending), err)),
                        );
                    }
                },
                HistoryOp::Selection(selection) => {
                    if let Some(previous) = self
                        .presence
                        .set_my_presence(PresenceUpdate::selection(selection))
                    {
                        reverted.push(HistoryOp::Selection(previous));
                    }
                }
            }
        }
        (HistoryEntry::new(reverted), None)
    }

    /// Start grouping recorded changes into one undo step.
    pub fn pause_history(&mut self) {
        self.history.pause();
    }

    /// Close the current group.
    pub fn resume_history(&mut self) {
        self.history.resume();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Reads ---

    /// The local selection, without ids whose layers no longer exist.
    pub fn my_selection(&self) -> Vec<LayerId> {
        self.presence
            .my_presence()
            .selection
            .iter()
            .filter(|id| self.document.contains(id))
            .cloned()
            .collect()
    }

    /// Selected layers that still exist, in selection order.
    pub fn selected_layers(&self) -> Vec<(LayerId, Layer)> {
        self.presence
            .my_presence()
            .selection
            .iter()
            .filter_map(|id| self.document.layer(id).map(|layer| (id.clone(), layer)))
            .collect()
    }

    /// Bounding box of the local selection.
    pub fn selection_bounds(&self) -> Option<Xywh> {
        let layers = self.selected_layers();
        bounding_box(layers.iter().map(|(_, layer)| layer))
    }

    /// Layers selected by other connections, with the color of the
    /// connection selecting them. When several connections select the same
    /// layer, the smallest connection id wins.
    pub fn layer_selection_colors(&self) -> HashMap<LayerId, Color> {
        let mut selections: Vec<_> = self.presence.others_selections().collect();
        selections.sort_by(|a, b| a.0.cmp(b.0));

        let mut colors = HashMap::new();
        for (connection_id, selection) in selections {
            let color = connection_id_to_color(connection_id.as_str());
            for id in selection {
                colors.entry(id.clone()).or_insert(color);
            }
        }
        colors
    }

    // --- Replication ---

    /// Document updates made since the previous call, or `None` if the
    /// document has not changed.
    pub fn take_document_updates(&mut self) -> DocumentResult<Option<Vec<u8>>> {
        let version = self.document.version();
        if version == self.exported {
            return Ok(None);
        }
        let bytes = self.document.export_updates(&self.exported)?;
        self.exported = version;
        Ok(Some(bytes))
    }

    /// Full document state for a connection that is joining.
    pub fn export_snapshot(&self) -> DocumentResult<Vec<u8>> {
        self.document.export_snapshot()
    }

    /// Merge document updates from another connection.
    pub fn reconcile(&mut self, remote_delta: &[u8]) -> DocumentResult<()> {
        self.document.reconcile(remote_delta)
    }

    pub fn take_presence_messages(&mut self) -> Vec<String> {
        self.presence.take_outgoing()
    }

    pub fn handle_presence_message(&mut self, json: &str) -> Option<PresenceEvent> {
        self.presence.handle_message(json)
    }

    /// Announce that this connection is going away.
    pub fn leave(&mut self) {
        self.presence.leave();
    }
}
