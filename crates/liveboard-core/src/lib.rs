//! Liveboard Core Library
//!
//! Interaction core of the Liveboard collaborative whiteboard: the canvas
//! state machine, selection geometry, the CRDT-backed layer document and
//! per-connection presence with undo/redo.

pub mod camera;
pub mod canvas;
pub mod color;
pub mod config;
pub mod crdt;
pub mod geometry;
pub mod history;
pub mod input;
pub mod layer;
pub mod presence;
pub mod room;
pub mod selection;

pub use camera::Camera;
pub use canvas::{CanvasController, CanvasState};
pub use color::{Color, connection_id_to_color};
pub use config::CanvasConfig;
pub use crdt::{DocumentError, DocumentMutation, DocumentResult, LayerDocument};
pub use geometry::{Side, Xywh, bounding_box, find_intersecting_layers_with_rectangle, resize_bound};
pub use history::{HistoryError, HistoryManager};
pub use input::{CanvasEvent, Tool};
pub use layer::{Layer, LayerId, LayerKind, LayerPatch};
pub use presence::{ConnectionId, Presence, PresenceBroadcaster, PresenceOptions, PresenceUpdate};
pub use room::Room;
pub use selection::Handle;
