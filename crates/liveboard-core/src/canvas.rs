//! Canvas interaction state machine.
//!
//! The controller turns raw pointer and toolbar events into room mutations.
//!
//! ## State Transitions
//!
//! ```text
//! None        -> Pressing       (pointer down on empty canvas)
//! Pressing    -> SelectionNet   (pointer moved more than the threshold)
//! *           -> Translating    (pointer down on a layer)
//! *           -> Resizing       (pointer down on a resize handle)
//! *           -> Inserting      (insert tool picked)
//! *           -> Pencil         (pencil tool picked)
//!
//! Any -> None                   (pointer up, finalizes the gesture)
//! ```
//!
//! A gesture from pointer down to pointer up is one undo step.

use crate::camera::Camera;
use crate::color::Color;
use crate::config::CanvasConfig;
use crate::crdt::{DocumentError, DocumentResult};
use crate::geometry::{Side, Xywh, find_intersecting_layers_with_rectangle, resize_bound};
use crate::input::{CanvasEvent, Tool};
use crate::layer::{Layer, LayerId, LayerKind, LayerPatch};
use crate::presence::{ConnectionId, PresenceOptions, PresenceUpdate};
use crate::room::Room;
use crate::selection::{Handle, resize_handles};
use kurbo::{Point, Vec2};
use std::collections::HashMap;

/// What the local user is doing on the canvas. Points are in canvas
/// coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CanvasState {
    /// No active gesture.
    #[default]
    None,
    /// Pointer is down on empty canvas but has not moved far yet.
    Pressing { origin: Point },
    /// Drag rectangle selecting layers it overlaps.
    SelectionNet { origin: Point, current: Point },
    /// Moving the selection. `current` is the last pointer position.
    Translating { current: Point },
    /// Dragging a handle of the selection box.
    Resizing { initial_bounds: Xywh, corner: Side },
    /// Insert tool armed; the layer is created on pointer up.
    Inserting { layer_kind: LayerKind },
    Pencil,
}

/// Drives one connection's canvas.
pub struct CanvasController {
    room: Room,
    camera: Camera,
    state: CanvasState,
    /// Fill for newly inserted layers.
    last_used_color: Color,
    config: CanvasConfig,
}

impl CanvasController {
    pub fn new(connection_id: ConnectionId, config: CanvasConfig) -> Self {
        let room = Room::new(connection_id, &config);
        Self::with_room(room, config)
    }

    /// Drive an existing room, e.g. one joined from a snapshot.
    pub fn with_room(room: Room, config: CanvasConfig) -> Self {
        Self {
            room,
            camera: Camera::new(),
            state: CanvasState::None,
            last_used_color: config.default_fill,
            config,
        }
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Mutable access for replication (`reconcile`, message pumping).
    pub fn room_mut(&mut self) -> &mut Room {
        &mut self.room
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn last_used_color(&self) -> Color {
        self.last_used_color
    }

    /// Dispatch a single event.
    pub fn handle_event(&mut self, event: CanvasEvent) -> DocumentResult<()> {
        match event {
            CanvasEvent::PointerDown { position } => self.pointer_down(position),
            CanvasEvent::PointerMove { position } => self.pointer_move(position)?,
            CanvasEvent::PointerUp { position } => self.pointer_up(position)?,
            CanvasEvent::PointerLeave => self.pointer_leave(),
            CanvasEvent::LayerPointerDown { layer_id, position } => {
                self.layer_pointer_down(&layer_id, position)
            }
            CanvasEvent::ResizeHandleDown { side, bounds } => self.resize_handle_down(side, bounds),
            CanvasEvent::Wheel { delta } => self.wheel(delta),
            CanvasEvent::SelectTool { tool } => self.select_tool(tool),
            CanvasEvent::Undo => {
                self.undo()?;
            }
            CanvasEvent::Redo => {
                self.redo()?;
            }
            CanvasEvent::SetFill { color } => self.set_fill(color)?,
            CanvasEvent::DeleteSelection => self.delete_selection()?,
        }
        Ok(())
    }

    // --- Pointer ---

    pub fn pointer_down(&mut self, screen: Point) {
        if matches!(self.state, CanvasState::Inserting { .. }) {
            return;
        }
        let origin = self.camera.screen_to_canvas(screen);
        self.state = CanvasState::Pressing { origin };
    }

    pub fn pointer_move(&mut self, screen: Point) -> DocumentResult<()> {
        let current = self.camera.screen_to_canvas(screen);

        match self.state.clone() {
            CanvasState::Pressing { origin } => self.start_selection_net(origin, current),
            CanvasState::SelectionNet { origin, .. } => self.update_selection_net(origin, current),
            CanvasState::Translating { current: last } => self.translate_selection(last, current)?,
            CanvasState::Resizing {
                initial_bounds,
                corner,
            } => self.resize_selection(initial_bounds, corner, current)?,
            CanvasState::None | CanvasState::Inserting { .. } | CanvasState::Pencil => {}
        }

        self.room
            .set_my_presence(PresenceUpdate::cursor(Some(current)), PresenceOptions::default());
        Ok(())
    }

    pub fn pointer_leave(&mut self) {
        self.room
            .set_my_presence(PresenceUpdate::cursor(None), PresenceOptions::default());
    }

    /// Pointer pressed on a layer: select it (unless already selected) and
    /// start moving the selection.
    pub fn layer_pointer_down(&mut self, layer_id: &LayerId, screen: Point) {
        if matches!(self.state, CanvasState::Inserting { .. } | CanvasState::Pencil) {
            return;
        }

        self.room.pause_history();
        let current = self.camera.screen_to_canvas(screen);

        if !self.room.my_selection().contains(layer_id) {
            self.room.set_my_presence(
                PresenceUpdate::selection(vec![layer_id.clone()]),
                PresenceOptions::WITH_HISTORY,
            );
        }
        self.state = CanvasState::Translating { current };
    }

    /// Pointer pressed on a handle of the selection box.
    pub fn resize_handle_down(&mut self, corner: Side, initial_bounds: Xywh) {
        self.room.pause_history();
        self.state = CanvasState::Resizing {
            initial_bounds,
            corner,
        };
    }

    pub fn pointer_up(&mut self, screen: Point) -> DocumentResult<()> {
        let point = self.camera.screen_to_canvas(screen);
        // Joins the gesture batch if one is open.
        self.room.pause_history();

        let result = match std::mem::take(&mut self.state) {
            CanvasState::None | CanvasState::Pressing { .. } => {
                self.unselect_layers();
                Ok(())
            }
            CanvasState::Inserting { layer_kind } => self.insert_layer(layer_kind, point),
            _ => Ok(()),
        };

        self.room.resume_history();
        result
    }

    pub fn wheel(&mut self, delta: Vec2) {
        self.camera.scroll(delta);
    }

    pub fn select_tool(&mut self, tool: Tool) {
        self.state = match tool {
            Tool::Select => CanvasState::None,
            Tool::Insert(layer_kind) => CanvasState::Inserting { layer_kind },
            Tool::Pencil => CanvasState::Pencil,
        };
    }

    // --- Gesture steps ---

    fn start_selection_net(&mut self, origin: Point, current: Point) {
        let distance = (current.x - origin.x).abs() + (current.y - origin.y).abs();
        if distance > self.config.selection_net_threshold {
            self.state = CanvasState::SelectionNet { origin, current };
        }
    }

    fn update_selection_net(&mut self, origin: Point, current: Point) {
        self.state = CanvasState::SelectionNet { origin, current };

        let document = self.room.document();
        let ids = find_intersecting_layers_with_rectangle(
            &document.layer_ids(),
            &document.layers(),
            origin,
            current,
        );
        self.room
            .set_my_presence(PresenceUpdate::selection(ids), PresenceOptions::default());
    }

    fn translate_selection(&mut self, last: Point, current: Point) -> DocumentResult<()> {
        let offset = current - last;
        let selection = self.room.my_selection();
        self.room.translate_layers(&selection, offset)?;
        self.state = CanvasState::Translating { current };
        Ok(())
    }

    fn resize_selection(&mut self, initial_bounds: Xywh, corner: Side, point: Point) -> DocumentResult<()> {
        let bounds = resize_bound(initial_bounds, corner, point);
        let Some((id, _)) = self.room.selected_layers().into_iter().next() else {
            log::debug!("resize without a selected layer");
            return Ok(());
        };
        self.room.update_layer_fields(&id, LayerPatch::from(bounds))?;
        Ok(())
    }

    fn unselect_layers(&mut self) {
        if !self.room.presence().my_presence().selection.is_empty() {
            self.room
                .set_my_presence(PresenceUpdate::selection(Vec::new()), PresenceOptions::WITH_HISTORY);
        }
    }

    fn insert_layer(&mut self, kind: LayerKind, position: Point) -> DocumentResult<()> {
        match self.room.insert_layer(kind, position, self.last_used_color) {
            Ok(id) => {
                self.room
                    .set_my_presence(PresenceUpdate::selection(vec![id]), PresenceOptions::WITH_HISTORY);
                Ok(())
            }
            Err(DocumentError::LayerLimitReached(max)) => {
                log::debug!("insert ignored, board already has {max} layers");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    // --- Commands ---

    pub fn undo(&mut self) -> DocumentResult<bool> {
        self.room.undo()
    }

    pub fn redo(&mut self) -> DocumentResult<bool> {
        self.room.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.room.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.room.can_redo()
    }

    /// Remember `color` for new layers and fill the selection with it.
    pub fn set_fill(&mut self, color: Color) -> DocumentResult<()> {
        self.last_used_color = color;
        let selection = self.room.my_selection();
        self.room.batch(|room| {
            for id in &selection {
                room.update_layer_fields(id, LayerPatch::fill(color))?;
            }
            Ok(())
        })
    }

    /// Delete the selected layers and clear the selection.
    pub fn delete_selection(&mut self) -> DocumentResult<()> {
        let selection = self.room.my_selection();
        if selection.is_empty() {
            return Ok(());
        }
        self.room.batch(|room| {
            room.delete_layers(&selection)?;
            room.set_my_presence(PresenceUpdate::selection(Vec::new()), PresenceOptions::WITH_HISTORY);
            Ok(())
        })
    }

    // --- Read model ---

    /// Layers in paint order.
    pub fn layers_ordered(&self) -> Vec<(LayerId, Layer)> {
        self.room.document().layers_ordered()
    }

    pub fn selection_bounds(&self) -> Option<Xywh> {
        self.room.selection_bounds()
    }

    /// Resize handles, shown only when exactly one layer is selected.
    pub fn selection_handles(&self) -> Vec<Handle> {
        if self.room.my_selection().len() != 1 {
            return Vec::new();
        }
        self.selection_bounds().map(resize_handles).unwrap_or_default()
    }

    /// The selection net rectangle while one is being dragged.
    pub fn selection_net_rect(&self) -> Option<Xywh> {
        match self.state {
            CanvasState::SelectionNet { origin, current } => Some(Xywh::from_points(origin, current)),
            _ => None,
        }
    }

    pub fn layer_selection_colors(&self) -> HashMap<LayerId, Color> {
        self.room.layer_selection_colors()
    }
}
