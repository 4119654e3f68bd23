//! Local pan offset of the board view.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Camera holds the view translation for the canvas.
///
/// The camera belongs to one connection and is never shared. It only pans;
/// canvas coordinates are screen coordinates minus the offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform from canvas to screen coordinates, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset)
    }

    /// Convert a screen point to canvas coordinates.
    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        screen_point - self.offset
    }

    /// Convert a canvas point to screen coordinates.
    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        canvas_point + self.offset
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Apply a wheel event. Scrolling moves the view against the wheel delta.
    pub fn scroll(&mut self, wheel_delta: Vec2) {
        self.offset -= wheel_delta;
    }

    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
    }
}
