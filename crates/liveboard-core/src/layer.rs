//! Layer records stored in the shared document.

use crate::color::Color;
use crate::geometry::Xywh;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a layer. Opaque and globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of shape a layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Rectangle,
    Ellipse,
    Path,
    Text,
    Note,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Rectangle => "rectangle",
            LayerKind::Ellipse => "ellipse",
            LayerKind::Path => "path",
            LayerKind::Text => "text",
            LayerKind::Note => "note",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rectangle" => Some(LayerKind::Rectangle),
            "ellipse" => Some(LayerKind::Ellipse),
            "path" => Some(LayerKind::Path),
            "text" => Some(LayerKind::Text),
            "note" => Some(LayerKind::Note),
            _ => None,
        }
    }
}

/// A single shape on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Color,
}

impl Layer {
    /// Create a layer with its top-left corner at `position`.
    pub fn new(kind: LayerKind, position: Point, width: f64, height: f64, fill: Color) -> Self {
        Self {
            kind,
            x: position.x,
            y: position.y,
            width,
            height,
            fill,
        }
    }

    /// Geometry of the layer.
    pub fn bounds(&self) -> Xywh {
        Xywh::new(self.x, self.y, self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        self.bounds().into()
    }

    /// Apply every field set in `patch`.
    pub fn apply_patch(&mut self, patch: &LayerPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
    }

    /// The current values of the fields that `patch` would overwrite.
    pub fn snapshot_of(&self, patch: &LayerPatch) -> LayerPatch {
        LayerPatch {
            x: patch.x.map(|_| self.x),
            y: patch.y.map(|_| self.y),
            width: patch.width.map(|_| self.width),
            height: patch.height.map(|_| self.height),
            fill: patch.fill.map(|_| self.fill),
        }
    }
}

/// A partial update to a layer. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

impl LayerPatch {
    pub fn position(position: Point) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Self::default()
        }
    }

    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.fill.is_none()
    }
}

impl From<Xywh> for LayerPatch {
    fn from(bounds: Xywh) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
            fill: None,
        }
    }
}
