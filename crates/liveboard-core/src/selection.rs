//! Resize handles drawn around the selection box.

use crate::geometry::{Side, Xywh};
use kurbo::{Point, Rect};

/// Handle edge length in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;

/// A resize handle with its position and the side it drags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Center of the handle, in canvas coordinates.
    pub position: Point,
    pub side: Side,
}

impl Handle {
    pub fn new(position: Point, side: Side) -> Self {
        Self { position, side }
    }

    /// Square to paint for this handle.
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.position, (HANDLE_SIZE, HANDLE_SIZE))
    }

    /// Check if a point hits this handle square, grown by `tolerance`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.rect().inflate(tolerance, tolerance).contains(point)
    }
}

/// The eight handles of a selection box: four corners and four edge
/// midpoints, clockwise from the top-left corner.
pub fn resize_handles(bounds: Xywh) -> Vec<Handle> {
    let b = bounds.normalized();
    let center = b.center();

    Side::ALL
        .iter()
        .map(|&side| {
            let x = if side.has_left() {
                b.x
            } else if side.has_right() {
                b.right()
            } else {
                center.x
            };
            let y = if side.has_top() {
                b.y
            } else if side.has_bottom() {
                b.bottom()
            } else {
                center.y
            };
            Handle::new(Point::new(x, y), side)
        })
        .collect()
}

/// Side of the first handle under `point`, corners first.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<Side> {
    handles
        .iter()
        .filter(|handle| handle.side.is_corner())
        .chain(handles.iter().filter(|handle| !handle.side.is_corner()))
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.side)
}
