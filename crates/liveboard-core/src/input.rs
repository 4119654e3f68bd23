//! Events fed into the canvas controller.

use crate::color::Color;
use crate::geometry::{Side, Xywh};
use crate::layer::{LayerId, LayerKind};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// The active toolbar tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tool", content = "kind", rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    /// Insert a layer of this kind on the next pointer release.
    Insert(LayerKind),
    Pencil,
}

/// A user gesture or command. Pointer positions are in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEvent {
    PointerDown { position: Point },
    PointerMove { position: Point },
    PointerUp { position: Point },
    PointerLeave,
    /// Pointer pressed on a layer.
    LayerPointerDown { layer_id: LayerId, position: Point },
    /// Pointer pressed on a resize handle of the selection box.
    ResizeHandleDown { side: Side, bounds: Xywh },
    Wheel { delta: Vec2 },
    SelectTool { tool: Tool },
    Undo,
    Redo,
    SetFill { color: Color },
    DeleteSelection,
}

impl CanvasEvent {
    /// Screen position carried by pointer events.
    pub fn position(&self) -> Option<Point> {
        match self {
            CanvasEvent::PointerDown { position }
            | CanvasEvent::PointerMove { position }
            | CanvasEvent::PointerUp { position }
            | CanvasEvent::LayerPointerDown { position, .. } => Some(*position),
            _ => None,
        }
    }
}
